//! In-memory source for tests, benches and demos.

use crate::error::{Result, RltailError};
use crate::source::{FetchPage, FetchRequest, LogSource, RawRecord};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::time::Duration;

#[derive(Debug, Default)]
struct MemoryState {
    records: Vec<RawRecord>,
    failure: Option<String>,
    latency: Option<Duration>,
    fetches: usize,
}

/// A `LogSource` backed by a vector that can grow while the viewer runs.
///
/// The continuation token is an index into the filtered result list.
#[derive(Debug, Default)]
pub struct MemorySource {
    name: String,
    state: Mutex<MemoryState>,
}

impl MemorySource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(MemoryState::default()),
        }
    }

    pub fn with_records(name: impl Into<String>, records: Vec<RawRecord>) -> Self {
        let source = Self::new(name);
        source.state.lock().records = records;
        source
    }

    pub fn push(&self, record: RawRecord) {
        self.state.lock().records.push(record);
    }

    /// Make every fetch fail with `message` until cleared with `None`.
    pub fn set_failure(&self, message: Option<String>) {
        self.state.lock().failure = message;
    }

    /// Delay every fetch, to exercise timeouts.
    pub fn set_latency(&self, latency: Option<Duration>) {
        self.state.lock().latency = latency;
    }

    pub fn fetch_count(&self) -> usize {
        self.state.lock().fetches
    }
}

#[async_trait]
impl LogSource for MemorySource {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchPage> {
        let latency = {
            let mut state = self.state.lock();
            state.fetches += 1;
            state.latency
        };
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let state = self.state.lock();
        if let Some(message) = &state.failure {
            return Err(RltailError::source_unavailable(message.clone()));
        }

        let offset = match request.token.as_deref() {
            Some(token) => token.parse::<usize>().map_err(|_| {
                RltailError::source_unavailable(format!("invalid continuation token '{token}'"))
            })?,
            None => 0,
        };

        let mut matching = state
            .records
            .iter()
            .filter(|r| r.timestamp >= request.start && r.timestamp <= request.end)
            .skip(offset);
        let records: Vec<RawRecord> = matching.by_ref().take(request.limit).cloned().collect();
        let more = matching.next().is_some();

        Ok(FetchPage {
            next_token: more.then(|| (offset + records.len()).to_string()),
            records,
        })
    }

    fn describe(&self) -> String {
        self.name.clone()
    }
}
