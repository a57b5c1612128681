//! Log sources.
//!
//! A source answers paginated time-range queries with timestamped text. The session never
//! calls a source directly: it emits fetch plans, the runtime runs them through
//! [`fetch_with_timeout`] and feeds the outcome back as a message.

pub mod file;
pub mod memory;
pub mod validation;

pub use file::FileSource;
pub use memory::MemorySource;

use crate::error::{Result, RltailError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// One record as delivered by a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub timestamp: DateTime<Utc>,
    pub text: String,
}

impl RawRecord {
    pub fn new(timestamp: DateTime<Utc>, text: impl Into<String>) -> Self {
        Self {
            timestamp,
            text: text.into(),
        }
    }
}

/// A time-range query, optionally continuing a previous page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub limit: usize,
    pub token: Option<String>,
}

/// Records in source order plus a continuation token when more are available.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchPage {
    pub records: Vec<RawRecord>,
    pub next_token: Option<String>,
}

/// Paginated access to a stream of timestamped log lines.
///
/// Implementations must be thread-safe: fetches run on tokio tasks.
#[async_trait]
pub trait LogSource: Send + Sync {
    /// Return records in `[start, end]`, at most `limit` of them.
    ///
    /// Records need not be globally ordered. A returned `next_token` means more records
    /// are available for the same query when passed back as `token`.
    async fn fetch(&self, request: FetchRequest) -> Result<FetchPage>;

    /// Short human-readable name shown in the header.
    fn describe(&self) -> String;
}

/// Run one fetch bounded by `timeout`. Every failure comes back as `SourceUnavailable`.
pub async fn fetch_with_timeout(
    source: &dyn LogSource,
    request: FetchRequest,
    timeout: Duration,
) -> Result<FetchPage> {
    match tokio::time::timeout(timeout, source.fetch(request)).await {
        Ok(Ok(page)) => Ok(page),
        Ok(Err(err @ RltailError::SourceUnavailable { .. })) => Err(err),
        Ok(Err(err)) => Err(RltailError::source_unavailable(err.to_string())),
        Err(_) => Err(RltailError::source_unavailable(format!(
            "fetch timed out after {}s",
            timeout.as_secs_f32()
        ))),
    }
}
