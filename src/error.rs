//! Error types and handling infrastructure for rltail.
//!
//! A single `thiserror` enum covers every failure the library can report. None of these are
//! fatal to a viewing session: the session converts them into status text and keeps running.
//! Only the binary's startup path (argument parsing, terminal setup) turns them into an exit.

use thiserror::Error;

/// The main error type for rltail operations.
#[derive(Error, Debug)]
pub enum RltailError {
    /// The log source failed or timed out. Retried on the next scheduled poll.
    #[error("Log source unavailable: {message}")]
    SourceUnavailable { message: String },

    /// A search expression could not be compiled. The previous match set is kept.
    #[error("Invalid search pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// The source returned nothing for the widest time window tried.
    #[error("No logs found in the last {window}")]
    EmptyResult { window: String },

    /// File system related errors (file not found, permission denied, etc.)
    #[error("File operation failed: {message}")]
    FileError {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration loading or validation errors
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// UI and terminal related errors
    #[error("UI operation failed: {message}")]
    UIError { message: String },

    /// No clipboard helper available or the helper failed
    #[error("Clipboard error: {message}")]
    ClipboardError { message: String },

    /// Generic error for cases not covered by specific variants
    #[error("Operation failed: {message}")]
    Other { message: String },
}

/// Standard Result type for rltail operations.
pub type Result<T> = std::result::Result<T, RltailError>;

impl RltailError {
    /// Create a SourceUnavailable error with a descriptive message
    pub fn source_unavailable(message: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            message: message.into(),
        }
    }

    /// Create an InvalidPattern error for the given expression
    pub fn invalid_pattern(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    /// Create an EmptyResult error naming the widest window searched
    pub fn empty_result(window: impl Into<String>) -> Self {
        Self::EmptyResult {
            window: window.into(),
        }
    }

    /// Create a FileError from an io::Error with additional context
    pub fn file_error(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::FileError {
            message: message.into(),
            source,
        }
    }

    /// Create a ConfigError with a descriptive message
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a UIError with a descriptive message
    pub fn ui(message: impl Into<String>) -> Self {
        Self::UIError {
            message: message.into(),
        }
    }

    /// Create a ClipboardError with a descriptive message
    pub fn clipboard(message: impl Into<String>) -> Self {
        Self::ClipboardError {
            message: message.into(),
        }
    }

    /// Create a generic Other error with a descriptive message
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// True for failures the session retries on its own schedule.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::SourceUnavailable { .. } | Self::InvalidPattern { .. } | Self::EmptyResult { .. }
        )
    }
}

impl From<std::io::Error> for RltailError {
    fn from(err: std::io::Error) -> Self {
        let message = match err.kind() {
            std::io::ErrorKind::NotFound => "File not found",
            std::io::ErrorKind::PermissionDenied => "Permission denied",
            _ => "IO operation failed",
        };
        Self::FileError {
            message: message.to_string(),
            source: err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let unavailable = RltailError::source_unavailable("fetch timed out after 10s");
        assert_eq!(
            unavailable.to_string(),
            "Log source unavailable: fetch timed out after 10s"
        );

        let pattern = RltailError::invalid_pattern("(", "unclosed group");
        assert_eq!(
            pattern.to_string(),
            "Invalid search pattern '(': unclosed group"
        );

        let empty = RltailError::empty_result("1 month");
        assert_eq!(empty.to_string(), "No logs found in the last 1 month");
    }

    #[test]
    fn test_error_constructors() {
        assert!(matches!(
            RltailError::config("bad capacity"),
            RltailError::ConfigError { .. }
        ));
        assert!(matches!(
            RltailError::ui("Terminal resize failed"),
            RltailError::UIError { .. }
        ));
        assert!(matches!(
            RltailError::clipboard("no helper"),
            RltailError::ClipboardError { .. }
        ));
        assert!(matches!(
            RltailError::other("Unknown error"),
            RltailError::Other { .. }
        ));
    }

    #[test]
    fn core_errors_are_recoverable() {
        assert!(RltailError::source_unavailable("x").is_recoverable());
        assert!(RltailError::invalid_pattern("[", "x").is_recoverable());
        assert!(RltailError::empty_result("2 hours").is_recoverable());
        assert!(!RltailError::ui("x").is_recoverable());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: RltailError = io_err.into();

        match err {
            RltailError::FileError { message, .. } => {
                assert_eq!(message, "File not found");
            }
            _ => panic!("Expected FileError variant"),
        }
    }
}
