//! Search prompt, active match set and highlight cache as the session sees them.

use crate::error::Result;
use crate::search::{
    self, advance, highlight_all, refresh_current, HighlightMarkers, MatchSet, MatchTraversal,
    SearchOptions,
};
use crate::store::Record;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct SearchState {
    options: SearchOptions,
    markers: HighlightMarkers,
    prompt: Option<String>,
    /// Last executed query; stays set through zero-match results so it can be re-run.
    query: Option<String>,
    matches: MatchSet,
    highlights: HashMap<usize, String>,
    generation: u64,
    pending: Option<u64>,
}

impl SearchState {
    pub fn new(options: SearchOptions, markers: HighlightMarkers) -> Self {
        Self {
            options,
            markers,
            ..Self::default()
        }
    }

    pub fn prompt(&self) -> Option<&str> {
        self.prompt.as_deref()
    }

    pub fn open_prompt(&mut self) {
        self.prompt = Some(String::new());
    }

    pub fn edit_prompt(&mut self, buffer: String) {
        self.prompt = Some(buffer);
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn matches(&self) -> &MatchSet {
        &self.matches
    }

    pub fn has_matches(&self) -> bool {
        !self.matches.is_empty()
    }

    pub fn highlight(&self, position: usize) -> Option<&str> {
        self.highlights.get(&position).map(String::as_str)
    }

    pub fn is_awaiting_research(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop prompt, query, matches and any scheduled re-search.
    pub fn clear(&mut self) {
        self.prompt = None;
        self.query = None;
        self.discard_matches();
        self.pending = None;
    }

    /// Run `query` against `view`, selecting the most recent match.
    ///
    /// On a compile error everything stays as it was. Returns the number of matches.
    pub fn execute(&mut self, query: &str, view: &[&Record]) -> Result<usize> {
        self.prompt = None;
        let mut set = search::search(query, &self.options, view)?;
        set.select_last();
        self.pending = None;
        self.install(query, set, view);
        Ok(self.matches.len())
    }

    /// Positions shifted under the match set: discard it, and when a query is active hand
    /// back the generation of a re-search to schedule.
    pub fn invalidate(&mut self) -> Option<u64> {
        self.discard_matches();
        self.query.as_ref()?;
        self.generation = self.generation.wrapping_add(1);
        self.pending = Some(self.generation);
        self.pending
    }

    /// Whether a deferred re-search with this generation is still wanted.
    pub fn take_pending(&mut self, generation: u64) -> Option<String> {
        if self.pending != Some(generation) {
            return None;
        }
        self.pending = None;
        self.query.clone()
    }

    /// Re-run the active query after eviction, selecting the match nearest the cursor.
    pub fn rerun(&mut self, query: &str, view: &[&Record], cursor: usize) -> Result<usize> {
        let mut set = search::search(query, &self.options, view)?;
        set.select_nearest_before(cursor);
        self.install(query, set, view);
        Ok(self.matches.len())
    }

    /// Move the current match with wraparound. Returns its view position.
    pub fn step(&mut self, traversal: MatchTraversal, view: &[&Record]) -> Option<usize> {
        let current = self.matches.current_index()?;
        let previous = self.matches.current_position();
        self.matches
            .select(advance(&self.matches, current, traversal));
        refresh_current(
            &mut self.highlights,
            &self.matches,
            view,
            previous,
            &self.markers,
        );
        self.matches.current_position()
    }

    fn install(&mut self, query: &str, set: MatchSet, view: &[&Record]) {
        self.highlights = highlight_all(&set, view, set.current_position(), &self.markers);
        self.matches = set;
        self.query = (!query.is_empty()).then(|| query.to_string());
    }

    fn discard_matches(&mut self) {
        self.matches = MatchSet::empty();
        self.highlights.clear();
    }
}
