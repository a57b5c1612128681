//! Color theme and styling definitions using ratatui colors.
//!
//! Themes are built from the configured `ColorScheme` palette indices.

use crate::config::ColorScheme;
use crate::render::ui::state::StatusKind;
use ratatui::style::{Color, Modifier, Style};

/// Color theme for terminal UI elements
#[derive(Debug, Clone)]
pub struct ColorTheme {
    pub header: Style,
    pub controls: Style,
    pub border: Style,

    /// Status line, per status source
    pub search_prompt: Style,
    pub match_counter: Style,
    pub info: Style,
    pub loading: Style,
    pub error: Style,

    /// Zebra striping for record rows
    pub even_row: Style,
    pub odd_row: Style,

    /// Selected record
    pub cursor: Style,

    /// Indicator drawn in front of a selected row that already carries search highlights
    pub cursor_marker: Style,
}

impl Default for ColorTheme {
    fn default() -> Self {
        Self::from_scheme(&ColorScheme::default())
    }
}

impl ColorTheme {
    pub fn from_scheme(colors: &ColorScheme) -> Self {
        Self {
            header: Style::default()
                .fg(Color::Indexed(colors.header))
                .add_modifier(Modifier::BOLD),
            controls: Style::default().fg(Color::DarkGray),
            border: Style::default().fg(Color::Indexed(colors.header)),
            search_prompt: Style::default()
                .fg(Color::Indexed(colors.search))
                .add_modifier(Modifier::BOLD),
            match_counter: Style::default().fg(Color::Indexed(colors.match_counter)),
            info: Style::default().fg(Color::Indexed(colors.search)),
            loading: Style::default().fg(Color::Indexed(colors.header)),
            error: Style::default()
                .fg(Color::Indexed(colors.error))
                .add_modifier(Modifier::BOLD),
            even_row: Style::default().fg(Color::Indexed(colors.even_row)),
            odd_row: Style::default().fg(Color::Indexed(colors.odd_row)),
            cursor: Style::default()
                .fg(Color::Indexed(colors.cursor_fg))
                .bg(Color::Indexed(colors.cursor_bg)),
            cursor_marker: Style::default()
                .fg(Color::Indexed(colors.current_match_bg))
                .add_modifier(Modifier::BOLD),
        }
    }

    /// Create a monochrome theme for terminals without color support
    pub fn monochrome() -> Self {
        let plain = Style::default();
        Self {
            header: plain.add_modifier(Modifier::BOLD),
            controls: plain,
            border: plain,
            search_prompt: plain.add_modifier(Modifier::BOLD),
            match_counter: plain,
            info: plain,
            loading: plain,
            error: plain.add_modifier(Modifier::BOLD),
            even_row: plain,
            odd_row: plain,
            cursor: plain.add_modifier(Modifier::REVERSED),
            cursor_marker: plain.add_modifier(Modifier::BOLD),
        }
    }

    pub fn status(&self, kind: StatusKind) -> Style {
        match kind {
            StatusKind::Search => self.search_prompt,
            StatusKind::Matches => self.match_counter,
            StatusKind::Info => self.info,
            StatusKind::Loading => self.loading,
            StatusKind::Error => self.error,
        }
    }

    /// Zebra style for a record at `position` in the store's view.
    pub fn row(&self, position: usize) -> Style {
        if position % 2 == 0 {
            self.even_row
        } else {
            self.odd_row
        }
    }
}
