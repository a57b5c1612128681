//! Viewer configuration.
//!
//! Every tunable the session, viewport and renderer rely on lives here as a named field,
//! including the rows reserved for chrome around the log area. Values are static for a
//! session. With the `config` feature, a TOML file can override any subset of them.

use crate::error::{Result, RltailError};
use std::path::PathBuf;
use std::time::Duration;

#[cfg(feature = "config")]
use std::path::Path;

/// Session-wide settings.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config", derive(serde::Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct ViewerConfig {
    /// Maximum number of records held in memory.
    pub capacity: usize,
    /// Terminal size assumed until the first resize event arrives.
    pub default_width: u16,
    pub default_height: u16,
    /// Rows used by the header, status, controls and border around the log area.
    pub reserved_rows: u16,
    pub refresh_interval_secs: u64,
    pub logs_per_fetch: usize,
    pub initial_window_hours: u64,
    /// Wider windows tried, in order, when the initial window comes back empty.
    pub window_escalation_hours: Vec<u64>,
    /// Follow-up pages requested while the source reports more data.
    pub max_initial_pages: usize,
    pub poll_lookback_secs: u64,
    /// Shorter poll window used while following.
    pub follow_lookback_secs: u64,
    pub fetch_timeout_secs: u64,
    /// Delay before re-running a search after the buffer wrapped.
    pub research_delay_ms: u64,
    /// Records re-derived around the cursor per movement after a mode toggle.
    pub lazy_reformat_batch: usize,
    pub start_formatted: bool,
    pub start_following: bool,
    /// Interpret search queries as regular expressions instead of literals.
    pub regex_search: bool,
    pub format: FormatOptions,
    pub colors: ColorScheme,
    pub log_file: Option<PathBuf>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            capacity: 5000,
            default_width: 80,
            default_height: 24,
            reserved_rows: 5,
            refresh_interval_secs: 5,
            logs_per_fetch: 500,
            initial_window_hours: 2,
            window_escalation_hours: vec![24, 24 * 7, 24 * 30],
            max_initial_pages: 3,
            poll_lookback_secs: 120,
            follow_lookback_secs: 60,
            fetch_timeout_secs: 10,
            research_delay_ms: 50,
            lazy_reformat_batch: 200,
            start_formatted: true,
            start_following: true,
            regex_search: false,
            format: FormatOptions::default(),
            colors: ColorScheme::default(),
            log_file: None,
        }
    }
}

impl ViewerConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn research_delay(&self) -> Duration {
        Duration::from_millis(self.research_delay_ms)
    }

    pub fn initial_window(&self) -> chrono::Duration {
        hours(self.initial_window_hours)
    }

    /// The window to use after `step` escalations, if any remain.
    pub fn escalated_window(&self, step: usize) -> Option<chrono::Duration> {
        if step == 0 {
            return Some(self.initial_window());
        }
        self.window_escalation_hours
            .get(step - 1)
            .map(|&h| hours(h))
    }

    pub fn poll_lookback(&self, following: bool) -> chrono::Duration {
        let secs = if following {
            self.follow_lookback_secs
        } else {
            self.poll_lookback_secs
        };
        chrono::Duration::seconds(secs.min(MAX_SECS) as i64)
    }

    /// Number of log rows that fit in a terminal of `rows` lines.
    pub fn display_height(&self, rows: u16) -> usize {
        rows.saturating_sub(self.reserved_rows).max(1) as usize
    }

    /// Reject settings the session cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(RltailError::config("capacity must be at least 1"));
        }
        if self.logs_per_fetch == 0 {
            return Err(RltailError::config("logs_per_fetch must be at least 1"));
        }
        if self.refresh_interval_secs == 0 {
            return Err(RltailError::config("refresh_interval_secs must be at least 1"));
        }
        if self.fetch_timeout_secs == 0 {
            return Err(RltailError::config("fetch_timeout_secs must be at least 1"));
        }
        if self.initial_window_hours == 0 {
            return Err(RltailError::config("initial_window_hours must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(feature = "config")]
impl ViewerConfig {
    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| RltailError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load the given TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            RltailError::file_error(format!("Cannot read config {}", path.display()), e)
        })?;
        Self::from_toml_str(&text)
    }

    /// `<config dir>/rltail/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("rltail").join("config.toml"))
    }

    /// Load the user's config file if one exists, defaults otherwise.
    ///
    /// Also returns the file that was read so the caller can report it once logging is up.
    pub fn discover() -> Result<(Self, Option<PathBuf>)> {
        match Self::default_path() {
            Some(path) if path.is_file() => Ok((Self::load(&path)?, Some(path))),
            _ => Ok((Self::default(), None)),
        }
    }
}

// chrono durations are bounded by i64 milliseconds.
const MAX_SECS: u64 = i64::MAX as u64 / 1000;

fn hours(h: u64) -> chrono::Duration {
    chrono::Duration::hours(h.min(MAX_SECS / 3600) as i64)
}

/// Options handed to the formatter.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config", derive(serde::Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct FormatOptions {
    pub pretty_json: bool,
    pub json_indent: String,
    pub parse_access_logs: bool,
    pub colorize_fields: bool,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            pretty_json: true,
            json_indent: "  ".to_string(),
            parse_access_logs: true,
            colorize_fields: true,
        }
    }
}

/// ANSI 256-colour indices for the interface.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config", derive(serde::Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct ColorScheme {
    pub header: u8,
    pub search: u8,
    pub match_counter: u8,
    pub error: u8,
    pub even_row: u8,
    pub odd_row: u8,
    pub cursor_bg: u8,
    pub cursor_fg: u8,
    pub match_bg: u8,
    pub match_fg: u8,
    pub current_match_bg: u8,
    pub current_match_fg: u8,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            header: 12,
            search: 11,
            match_counter: 10,
            error: 9,
            even_row: 245,
            odd_row: 15,
            cursor_bg: 8,
            cursor_fg: 15,
            match_bg: 10,
            match_fg: 0,
            current_match_bg: 11,
            current_match_fg: 0,
        }
    }
}
