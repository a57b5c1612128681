//! Frame model handed to the renderer.
//!
//! The session rebuilds a `ViewState` once per processed message. Renderers only read it,
//! so drawing the same state twice produces the same frame.

/// Everything needed to draw one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    /// Header text: tool, source and current time range.
    pub title: String,

    /// Visible records, oldest first.
    pub rows: Vec<ViewRow>,

    /// Index into `rows` of the selected record, if it is visible.
    pub cursor_row: Option<usize>,

    pub status: Option<StatusLine>,

    /// Key help plus mode, follow state and position.
    pub controls: String,

    /// Terminal dimensions the rows were sliced for.
    pub width: u16,
    pub height: u16,

    /// Shown instead of rows while the store is empty.
    pub empty_message: Option<String>,
}

impl ViewState {
    pub fn new(title: impl Into<String>, width: u16, height: u16) -> Self {
        Self {
            title: title.into(),
            rows: Vec::new(),
            cursor_row: None,
            status: None,
            controls: String::new(),
            width,
            height,
            empty_message: None,
        }
    }

    /// The row under the cursor.
    pub fn cursor(&self) -> Option<&ViewRow> {
        self.cursor_row.and_then(|i| self.rows.get(i))
    }

    pub fn status_text(&self) -> Option<&str> {
        self.status.as_ref().map(|s| s.text.as_str())
    }
}

/// One visible record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewRow {
    /// Position in the store's view.
    pub position: usize,
    /// Display line, possibly carrying ANSI markup and embedded newlines.
    pub text: String,
    /// The text comes from the search highlight cache.
    pub highlighted: bool,
}

/// Which status source won; drives styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Search,
    Matches,
    Info,
    Loading,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub kind: StatusKind,
    pub text: String,
}

impl StatusLine {
    pub fn new(kind: StatusKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}
