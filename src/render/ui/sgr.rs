//! Conversion of SGR-annotated display strings into ratatui spans.

use crate::format::strip_markup;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;
use regex::Regex;
use std::sync::LazyLock;

static SGR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[([0-9;]*)m").expect("SGR regex pattern is valid"));

/// Split `text` into spans, layering each SGR sequence onto `base`.
///
/// Escape sequences other than SGR are dropped.
pub fn to_spans(text: &str, base: Style) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    let mut style = base;
    let mut last = 0;

    for captures in SGR_PATTERN.captures_iter(text) {
        let Some(whole) = captures.get(0) else {
            continue;
        };
        push_text(&mut spans, &text[last..whole.start()], style);
        let params = captures.get(1).map_or("", |m| m.as_str());
        style = apply_params(style, base, params);
        last = whole.end();
    }
    push_text(&mut spans, &text[last..], style);
    spans
}

fn push_text(spans: &mut Vec<Span<'static>>, text: &str, style: Style) {
    if text.is_empty() {
        return;
    }
    let clean = strip_markup(text);
    if !clean.is_empty() {
        spans.push(Span::styled(clean.into_owned(), style));
    }
}

fn apply_params(mut style: Style, base: Style, params: &str) -> Style {
    if params.is_empty() {
        return base;
    }
    let codes: Vec<u16> = params
        .split(';')
        .map(|p| p.parse().unwrap_or(0))
        .collect();

    let mut i = 0;
    while i < codes.len() {
        match codes[i] {
            0 => style = base,
            1 => style = style.add_modifier(Modifier::BOLD),
            2 => style = style.add_modifier(Modifier::DIM),
            3 => style = style.add_modifier(Modifier::ITALIC),
            4 => style = style.add_modifier(Modifier::UNDERLINED),
            7 => style = style.add_modifier(Modifier::REVERSED),
            22 => style = style.remove_modifier(Modifier::BOLD | Modifier::DIM),
            23 => style = style.remove_modifier(Modifier::ITALIC),
            24 => style = style.remove_modifier(Modifier::UNDERLINED),
            27 => style = style.remove_modifier(Modifier::REVERSED),
            code @ 30..=37 => style = style.fg(Color::Indexed((code - 30) as u8)),
            code @ 90..=97 => style = style.fg(Color::Indexed((code - 90 + 8) as u8)),
            code @ 40..=47 => style = style.bg(Color::Indexed((code - 40) as u8)),
            code @ 100..=107 => style = style.bg(Color::Indexed((code - 100 + 8) as u8)),
            39 => style = Style { fg: base.fg, ..style },
            49 => style = Style { bg: base.bg, ..style },
            code @ (38 | 48) => {
                let (color, used) = extended_color(&codes[i + 1..]);
                if let Some(color) = color {
                    style = if code == 38 {
                        style.fg(color)
                    } else {
                        style.bg(color)
                    };
                }
                i += used;
            }
            _ => {}
        }
        i += 1;
    }
    style
}

/// Parse `5;n` or `2;r;g;b`, returning the colour and how many codes were consumed.
fn extended_color(rest: &[u16]) -> (Option<Color>, usize) {
    let channel = |i: usize| rest.get(i).map(|&v| v.min(255) as u8);
    match rest.first() {
        Some(5) => (channel(1).map(Color::Indexed), 2),
        Some(2) => match (channel(1), channel(2), channel(3)) {
            (Some(r), Some(g), Some(b)) => (Some(Color::Rgb(r, g, b)), 4),
            _ => (None, rest.len()),
        },
        _ => (None, 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Paint;

    fn texts(spans: &[Span<'_>]) -> Vec<String> {
        spans.iter().map(|s| s.content.to_string()).collect()
    }

    #[test]
    fn plain_text_is_one_span() {
        let base = Style::default().fg(Color::Indexed(245));
        let spans = to_spans("hello", base);
        assert_eq!(texts(&spans), vec!["hello"]);
        assert_eq!(spans[0].style, base);
    }

    #[test]
    fn paint_round_trips_into_styles() {
        let marked = format!("a {} b", Paint::fg(0).on(11).bold().apply("hit"));
        let spans = to_spans(&marked, Style::default());
        assert_eq!(texts(&spans), vec!["a ", "hit", " b"]);
        assert_eq!(spans[1].style.fg, Some(Color::Indexed(0)));
        assert_eq!(spans[1].style.bg, Some(Color::Indexed(11)));
        assert!(spans[1].style.add_modifier.contains(Modifier::BOLD));
        assert_eq!(spans[2].style, Style::default());
    }

    #[test]
    fn basic_and_bright_colors() {
        let spans = to_spans("\x1b[31mred\x1b[0m\x1b[92mgreen", Style::default());
        assert_eq!(spans[0].style.fg, Some(Color::Indexed(1)));
        assert_eq!(spans[1].style.fg, Some(Color::Indexed(10)));
    }

    #[test]
    fn truecolor_and_non_sgr_sequences() {
        let spans = to_spans("\x1b[38;2;1;2;3mrgb\x1b[2K tail", Style::default());
        assert_eq!(texts(&spans), vec!["rgb tail"]);
        assert_eq!(spans[0].style.fg, Some(Color::Rgb(1, 2, 3)));
    }

    #[test]
    fn reset_returns_to_base_style() {
        let base = Style::default().fg(Color::Indexed(15));
        let spans = to_spans("\x1b[1;38;5;9mx\x1b[0my", base);
        assert_eq!(spans[1].style, base);
    }
}
