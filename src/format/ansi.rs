//! ANSI markup handling.
//!
//! Display strings carry SGR colour sequences produced by the formatter and the search
//! highlighter. Searching always runs on the stripped text, the renderer parses the markup
//! back into styles.

use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

/// CSI, OSC and two-byte escape sequences.
static MARKUP_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)
        \x1b\[[0-9;?]*[A-Za-z]                # CSI
        | \x1b\][^\x07\x1b]*(?:\x07|\x1b\\)   # OSC, BEL or ST terminated
        | \x1b[()][A-Za-z0-9]                 # charset selection
        | \x1b[A-Za-z]                        # simple escapes
        ",
    )
    .expect("markup regex pattern is valid")
});

pub const RESET: &str = "\x1b[0m";

/// Remove every escape sequence, borrowing when there is nothing to strip.
pub fn strip_markup(input: &str) -> Cow<'_, str> {
    if !input.contains('\x1b') {
        return Cow::Borrowed(input);
    }
    MARKUP_PATTERN.replace_all(input, "")
}

/// A set of SGR attributes using 256-colour palette indices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Paint {
    pub fg: Option<u8>,
    pub bg: Option<u8>,
    pub bold: bool,
}

impl Paint {
    pub const fn fg(color: u8) -> Self {
        Self {
            fg: Some(color),
            bg: None,
            bold: false,
        }
    }

    pub const fn on(self, color: u8) -> Self {
        Self {
            bg: Some(color),
            ..self
        }
    }

    pub const fn bold(self) -> Self {
        Self { bold: true, ..self }
    }

    pub fn is_plain(&self) -> bool {
        self.fg.is_none() && self.bg.is_none() && !self.bold
    }

    /// The opening escape sequence, empty for a plain paint.
    pub fn prefix(&self) -> String {
        if self.is_plain() {
            return String::new();
        }
        let mut codes: Vec<String> = Vec::with_capacity(3);
        if self.bold {
            codes.push("1".to_string());
        }
        if let Some(fg) = self.fg {
            codes.push(format!("38;5;{fg}"));
        }
        if let Some(bg) = self.bg {
            codes.push(format!("48;5;{bg}"));
        }
        format!("\x1b[{}m", codes.join(";"))
    }

    /// Wrap `text` in this paint followed by a reset.
    pub fn apply(&self, text: &str) -> String {
        if self.is_plain() || text.is_empty() {
            return text.to_string();
        }
        format!("{}{}{}", self.prefix(), text, RESET)
    }
}
