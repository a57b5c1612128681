//! Turning raw log text into display text.
//!
//! The formatter is a pure function of `(raw text, mode)`: it never looks at other records
//! and always produces the same output for the same input, so records can be re-derived
//! from their original text at any time.

pub mod access_log;
pub mod ansi;
pub mod json;

pub use ansi::{strip_markup, Paint};

use crate::config::FormatOptions;
use chrono::{DateTime, Local, Utc};

/// How records are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    /// Original text, trimmed.
    Raw,
    /// Access logs compacted and colourised, JSON pretty-printed.
    #[default]
    Formatted,
}

impl DisplayMode {
    pub fn toggled(self) -> Self {
        match self {
            DisplayMode::Raw => DisplayMode::Formatted,
            DisplayMode::Formatted => DisplayMode::Raw,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DisplayMode::Raw => "Raw",
            DisplayMode::Formatted => "Formatted",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Formatter {
    options: FormatOptions,
}

impl Formatter {
    pub fn new(options: FormatOptions) -> Self {
        Self { options }
    }

    /// Derive display text from `raw`.
    pub fn format(&self, raw: &str, mode: DisplayMode) -> String {
        let trimmed = raw.trim();
        match mode {
            DisplayMode::Raw => trimmed.to_string(),
            DisplayMode::Formatted => self.decorate(trimmed),
        }
    }

    /// Prefix display text with the record's wall-clock time.
    pub fn compose_line(&self, captured_at: DateTime<Utc>, display_text: &str) -> String {
        let local: DateTime<Local> = captured_at.into();
        format!("[{}] {}", local.format("%H:%M:%S"), display_text)
    }

    fn decorate(&self, text: &str) -> String {
        if self.options.parse_access_logs {
            if let Some(entry) = access_log::parse(text) {
                return entry.render(self.options.colorize_fields);
            }
        }
        if self.options.pretty_json {
            return json::prettify(text, &self.options.json_indent).into_owned();
        }
        text.to_string()
    }
}
