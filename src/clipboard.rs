//! System clipboard access through the platform's command-line helpers.
//!
//! Copying blocks on a child process, so the runtime calls [`copy_to_clipboard`] from
//! `spawn_blocking` and reports the outcome back to the session.

use crate::error::{Result, RltailError};
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// Helpers tried in order; the first one found on `PATH` wins.
const HELPERS: &[(&str, &[&str])] = &[
    ("pbcopy", &[]),
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("xsel", &["--clipboard", "--input"]),
    ("clip", &[]),
];

/// A clipboard command resolved on this machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardHelper {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl ClipboardHelper {
    /// Find the first available helper.
    pub fn detect() -> Option<Self> {
        HELPERS.iter().find_map(|(name, args)| {
            which::which(name).ok().map(|program| Self {
                program,
                args: args.iter().map(|a| a.to_string()).collect(),
            })
        })
    }

    /// Pipe `text` to the helper's stdin and wait for it to exit.
    pub fn copy(&self, text: &str) -> Result<()> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                RltailError::clipboard(format!("failed to start {}: {e}", self.program.display()))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .map_err(|e| RltailError::clipboard(format!("failed to write: {e}")))?;
        }

        let status = child
            .wait()
            .map_err(|e| RltailError::clipboard(format!("failed to wait: {e}")))?;
        if !status.success() {
            return Err(RltailError::clipboard(format!(
                "{} exited with {status}",
                self.program.display()
            )));
        }
        Ok(())
    }
}

/// Copy `text` with whichever helper the platform provides.
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    let helper = ClipboardHelper::detect()
        .ok_or_else(|| RltailError::clipboard("no clipboard utility found"))?;
    log::debug!("Copying {} bytes via {}", text.len(), helper.program.display());
    helper.copy(text)
}
