//! Validation for files handed to the file source.
//!
//! A tailed file may legitimately be empty when the viewer starts, so unlike a pager only
//! existence, type and readability are checked.

use crate::error::{Result, RltailError};
use std::fs::File;
use std::path::Path;

/// Validate that a path points to a readable regular file.
///
/// # Error Cases
/// - Path does not exist
/// - Path points to a directory or other non-file
/// - File is not readable due to permissions
pub fn validate_log_path(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(RltailError::file_error(
            format!("File does not exist: {}", path.display()),
            std::io::Error::new(std::io::ErrorKind::NotFound, "File not found"),
        ));
    }

    let metadata = std::fs::metadata(path)
        .map_err(|e| RltailError::file_error("Failed to read file metadata", e))?;

    if !metadata.is_file() {
        return Err(RltailError::file_error(
            format!("Path is not a file: {}", path.display()),
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "Not a file"),
        ));
    }

    File::open(path).map_err(|e| RltailError::file_error("Cannot open file for reading", e))?;

    Ok(())
}
