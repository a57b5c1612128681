//! Match sets over a store view and their precomputed highlight cache.
//!
//! A `MatchSet` holds view positions, so it is only meaningful against the view it was
//! computed from. Whoever owns the store must discard it when the store wraps.

use crate::error::Result;
use crate::format::{strip_markup, Paint};
use crate::search::pattern::{SearchOptions, SearchPattern};
use crate::store::Record;
use std::collections::HashMap;

/// Direction for stepping through matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTraversal {
    Next,
    Previous,
}

/// Ordered view positions matching a query, plus the selected one.
#[derive(Debug, Clone, Default)]
pub struct MatchSet {
    pattern: Option<SearchPattern>,
    positions: Vec<usize>,
    current: usize,
}

impl MatchSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn pattern(&self) -> Option<&SearchPattern> {
        self.pattern.as_ref()
    }

    pub fn query(&self) -> Option<&str> {
        self.pattern.as_ref().map(SearchPattern::query)
    }

    pub fn positions(&self) -> &[usize] {
        &self.positions
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Index of the selected match within `positions`.
    pub fn current_index(&self) -> Option<usize> {
        (!self.positions.is_empty()).then_some(self.current)
    }

    /// View position of the selected match.
    pub fn current_position(&self) -> Option<usize> {
        self.positions.get(self.current).copied()
    }

    pub fn select(&mut self, index: usize) {
        if index < self.positions.len() {
            self.current = index;
        }
    }

    /// Select the most recent match.
    pub fn select_last(&mut self) {
        self.current = self.positions.len().saturating_sub(1);
    }

    /// Select the last match at or before `position`, or the most recent one if none is.
    pub fn select_nearest_before(&mut self, position: usize) {
        match self.positions.partition_point(|&p| p <= position) {
            0 => self.select_last(),
            n => self.current = n - 1,
        }
    }
}

/// Scan `view` once for records whose stripped display line matches `query`.
///
/// An empty query yields an empty set. A query that fails to compile is an error and the
/// caller keeps whatever set it had.
pub fn search(query: &str, options: &SearchOptions, view: &[&Record]) -> Result<MatchSet> {
    if query.is_empty() {
        return Ok(MatchSet::empty());
    }
    let pattern = SearchPattern::compile(query, options)?;
    let positions = view
        .iter()
        .enumerate()
        .filter(|(_, record)| pattern.is_match(&strip_markup(record.display_line())))
        .map(|(position, _)| position)
        .collect();

    Ok(MatchSet {
        pattern: Some(pattern),
        positions,
        current: 0,
    })
}

/// Step through matches with wraparound. Returns `current` unchanged for an empty set.
pub fn advance(set: &MatchSet, current: usize, traversal: MatchTraversal) -> usize {
    let len = set.len();
    if len == 0 {
        return current;
    }
    let current = current.min(len - 1);
    match traversal {
        MatchTraversal::Next => (current + 1) % len,
        MatchTraversal::Previous => (current + len - 1) % len,
    }
}

/// Styles wrapped around matched spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighlightMarkers {
    pub highlight: Paint,
    pub current: Paint,
}

impl Default for HighlightMarkers {
    fn default() -> Self {
        Self {
            highlight: Paint::fg(0).on(10),
            current: Paint::fg(0).on(11).bold(),
        }
    }
}

/// Render the stripped display line with each match span painted.
pub fn highlight_line(
    pattern: &SearchPattern,
    line: &str,
    is_current: bool,
    markers: &HighlightMarkers,
) -> String {
    let clean = strip_markup(line);
    let paint = if is_current {
        markers.current
    } else {
        markers.highlight
    };

    let mut out = String::with_capacity(clean.len() + 32);
    let mut last = 0;
    for (start, end) in pattern.find_spans(&clean) {
        out.push_str(&clean[last..start]);
        out.push_str(&paint.apply(&clean[start..end]));
        last = end;
    }
    out.push_str(&clean[last..]);
    out
}

/// Precompute highlighted strings for every matched position.
pub fn highlight_all(
    set: &MatchSet,
    view: &[&Record],
    current_position: Option<usize>,
    markers: &HighlightMarkers,
) -> HashMap<usize, String> {
    let Some(pattern) = set.pattern() else {
        return HashMap::new();
    };
    set.positions()
        .iter()
        .filter_map(|&position| {
            let record = view.get(position)?;
            let line = highlight_line(
                pattern,
                record.display_line(),
                Some(position) == current_position,
                markers,
            );
            Some((position, line))
        })
        .collect()
}

/// Re-render only the rows whose "current" status changed after navigation.
pub fn refresh_current(
    highlights: &mut HashMap<usize, String>,
    set: &MatchSet,
    view: &[&Record],
    previous_position: Option<usize>,
    markers: &HighlightMarkers,
) {
    let Some(pattern) = set.pattern() else {
        return;
    };
    let current_position = set.current_position();
    for position in [previous_position, current_position].into_iter().flatten() {
        if let Some(record) = view.get(position) {
            let line = highlight_line(
                pattern,
                record.display_line(),
                Some(position) == current_position,
                markers,
            );
            highlights.insert(position, line);
        }
    }
}
