//! Search over the record store.
//!
//! Matching always runs on display lines with markup stripped, so results reflect what the
//! user reads regardless of display mode. Highlights are precomputed per search or per
//! navigation step rather than per frame.

pub mod index;
pub mod pattern;

pub use index::{
    advance, highlight_all, highlight_line, refresh_current, search, HighlightMarkers,
    MatchSet, MatchTraversal,
};
pub use pattern::{SearchOptions, SearchPattern};
