//! Bounded in-memory record storage.
//!
//! `RecordStore` is a fixed-capacity ring buffer. Appending is O(1); once full, every
//! append overwrites the oldest record and reports the wrap so that anything indexing the
//! store by position (match sets, the cursor) can be invalidated. Positions used by callers
//! are always *view positions*: 0 is the oldest record currently held.

use crate::format::{DisplayMode, Formatter};
use chrono::{DateTime, Utc};

/// One ingested log line with its derived display forms.
///
/// Records are immutable; re-deriving for a new display mode produces a new record that
/// replaces the old one in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    captured_at: DateTime<Utc>,
    original_text: String,
    display_text: String,
    display_line: String,
    mode: DisplayMode,
}

impl Record {
    pub fn new(
        captured_at: DateTime<Utc>,
        original_text: impl Into<String>,
        formatter: &Formatter,
        mode: DisplayMode,
    ) -> Self {
        let original_text = original_text.into();
        let display_text = formatter.format(&original_text, mode);
        let display_line = formatter.compose_line(captured_at, &display_text);
        Self {
            captured_at,
            original_text,
            display_text,
            display_line,
            mode,
        }
    }

    /// A copy of this record derived for `mode`, sharing the original text.
    pub fn rederive(&self, formatter: &Formatter, mode: DisplayMode) -> Self {
        Self::new(self.captured_at, self.original_text.clone(), formatter, mode)
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn original_text(&self) -> &str {
        &self.original_text
    }

    pub fn display_text(&self) -> &str {
        &self.display_text
    }

    /// Timestamp plus display text; what is searched and rendered.
    pub fn display_line(&self) -> &str {
        &self.display_line
    }

    /// The mode the display forms were derived for.
    pub fn mode(&self) -> DisplayMode {
        self.mode
    }
}

/// Fixed-capacity ring buffer of records in arrival order.
#[derive(Debug, Clone)]
pub struct RecordStore {
    slots: Vec<Record>,
    /// Slot holding the oldest record once the buffer has filled.
    oldest: usize,
    capacity: usize,
}

impl RecordStore {
    /// Create an empty store. A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: Vec::with_capacity(capacity),
            oldest: 0,
            capacity,
        }
    }

    /// Add a record, returning `true` when the oldest record was overwritten.
    pub fn append(&mut self, record: Record) -> bool {
        if self.slots.len() < self.capacity {
            self.slots.push(record);
            return false;
        }
        self.slots[self.oldest] = record;
        self.oldest = (self.oldest + 1) % self.capacity;
        true
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Record> + '_ {
        let (newer, older) = self.slots.split_at(self.oldest);
        older.iter().chain(newer.iter())
    }

    /// Materialise the chronological view.
    pub fn view(&self) -> Vec<&Record> {
        self.iter().collect()
    }

    pub fn get(&self, position: usize) -> Option<&Record> {
        if position >= self.slots.len() {
            return None;
        }
        self.slots.get(self.slot_of(position))
    }

    /// Replace the record at a view position. Out-of-range positions are ignored.
    pub fn update_at(&mut self, position: usize, record: Record) -> bool {
        if position >= self.slots.len() {
            return false;
        }
        let slot = self.slot_of(position);
        self.slots[slot] = record;
        true
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.oldest = 0;
    }

    fn slot_of(&self, position: usize) -> usize {
        (self.oldest + position) % self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn record(text: &str) -> Record {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Record::new(at, text, &Formatter::default(), DisplayMode::Raw)
    }

    fn texts(store: &RecordStore) -> Vec<String> {
        store
            .view()
            .into_iter()
            .map(|r| r.original_text().to_string())
            .collect()
    }

    #[test]
    fn test_append_below_capacity() {
        let mut store = RecordStore::new(3);
        assert!(store.is_empty());
        assert!(!store.append(record("A")));
        assert!(!store.append(record("B")));
        assert_eq!(store.len(), 2);
        assert_eq!(texts(&store), vec!["A", "B"]);
    }

    #[test]
    fn test_wraparound_keeps_last_capacity_records() {
        let mut store = RecordStore::new(3);
        let wraps: Vec<bool> = ["A", "B", "C", "D", "E"]
            .iter()
            .map(|t| store.append(record(t)))
            .collect();

        assert_eq!(wraps, vec![false, false, false, true, true]);
        assert_eq!(store.len(), 3);
        assert_eq!(texts(&store), vec!["C", "D", "E"]);
        assert_eq!(store.get(0).unwrap().original_text(), "C");
        assert_eq!(store.get(2).unwrap().original_text(), "E");
    }

    #[test]
    fn update_at_replaces_in_view_order() {
        let mut store = RecordStore::new(3);
        for t in ["A", "B", "C", "D"] {
            store.append(record(t));
        }
        assert!(store.update_at(0, record("B2")));
        assert_eq!(texts(&store), vec!["B2", "C", "D"]);
    }

    #[test]
    fn update_at_out_of_bounds_is_ignored() {
        let mut store = RecordStore::new(3);
        store.append(record("A"));
        assert!(!store.update_at(1, record("X")));
        assert!(!store.update_at(99, record("X")));
        assert_eq!(texts(&store), vec!["A"]);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let mut store = RecordStore::new(0);
        assert_eq!(store.capacity(), 1);
        assert!(!store.append(record("A")));
        assert!(store.append(record("B")));
        assert_eq!(texts(&store), vec!["B"]);
    }

    #[test]
    fn clear_resets_ring() {
        let mut store = RecordStore::new(2);
        for t in ["A", "B", "C"] {
            store.append(record(t));
        }
        store.clear();
        assert!(store.is_empty());
        store.append(record("D"));
        assert_eq!(texts(&store), vec!["D"]);
    }

    #[test]
    fn rederive_keeps_original_text() {
        let raw = record("  {\"a\":1}  ");
        let formatted = raw.rederive(&Formatter::default(), DisplayMode::Formatted);
        assert_eq!(formatted.original_text(), raw.original_text());
        assert_eq!(formatted.mode(), DisplayMode::Formatted);
        assert_eq!(formatted.display_text(), "{\n  \"a\": 1\n}");
        assert!(formatted.display_line().ends_with(formatted.display_text()));
    }

    proptest! {
        #[test]
        fn len_and_wrap_follow_capacity(capacity in 1usize..16, appends in 0usize..64) {
            let mut store = RecordStore::new(capacity);
            for i in 0..appends {
                let wrapped = store.append(record(&i.to_string()));
                prop_assert_eq!(wrapped, i >= capacity);
            }
            prop_assert_eq!(store.len(), appends.min(capacity));
        }

        #[test]
        fn view_holds_last_records_in_order(capacity in 1usize..16, appends in 0usize..64) {
            let mut store = RecordStore::new(capacity);
            for i in 0..appends {
                store.append(record(&i.to_string()));
            }
            let expected: Vec<String> = (appends.saturating_sub(capacity)..appends)
                .map(|i| i.to_string())
                .collect();
            prop_assert_eq!(texts(&store), expected);
            let first: Vec<Record> = store.view().into_iter().cloned().collect();
            let second: Vec<Record> = store.view().into_iter().cloned().collect();
            prop_assert_eq!(first, second);
        }
    }
}
