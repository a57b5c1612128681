//! Rendering subsystem.
//!
//! The session produces a `ViewState` per processed message; everything under `ui` turns that
//! frame into terminal output.

pub mod ui;

pub use ui::{ColorTheme, TerminalUI, UIRenderer, ViewState};
