//! # rltail - Terminal Log Tail Viewer
//!
//! A live log viewer that keeps the most recent records in a bounded ring buffer and lets
//! you search, page and follow them while new records keep arriving.
//!
//! ## Features
//!
//! - **Bounded memory**: a fixed-capacity record store evicts the oldest records first
//! - **Consistent search**: matches are discarded on every wrap and re-run shortly after
//! - **Follow mode**: the cursor tracks the newest record until you scroll away
//! - **Formatting**: access-log compaction and JSON pretty-printing, toggled live
//! - **Terminal UI**: less-like keys on a ratatui interface
//!
//! ## Architecture
//!
//! - [`error`] - Centralized error types and handling
//! - [`store`] - Ring buffer of formatted records
//! - [`search`] - Match index and highlight cache
//! - [`viewport`] - Cursor and follow controller
//! - [`session`] - State machine tying the three together
//! - [`source`] - Paginated log sources
//! - [`render::ui`](crate::render::ui) - Terminal user interface components
//! - [`app`] - Runtime that executes session effects

// Core modules
pub mod config;
pub mod error;
pub mod format;
pub mod search;
pub mod store;
pub mod viewport;

// Session and its collaborators
pub mod app;
pub mod clipboard;
pub mod input;
pub mod render;
pub mod session;
pub mod source;

// Re-export commonly used types for convenience
pub use error::{Result, RltailError};

// Public API surface for external usage
pub use app::Application;
pub use config::ViewerConfig;
pub use session::{Session, SessionEffect, SessionMessage};
pub use source::{FileSource, LogSource, MemorySource};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
