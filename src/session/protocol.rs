//! Messages the session consumes and effects it asks the runtime to perform.

use crate::error::Result;
use crate::input::InputAction;
use crate::source::{FetchPage, FetchRequest};
use chrono::{DateTime, Duration, Utc};

/// Why a fetch was issued. Determines how its result is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOrigin {
    /// First load of an epoch, including follow-up pages and widened windows.
    Initial,
    /// Periodic refresh for new records.
    Poll,
    /// Older records requested by the user.
    History,
}

/// Time range of a planned fetch.
///
/// Relative windows are resolved against the wall clock by the runtime when the fetch
/// starts, so the session itself never reads the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchWindow {
    Relative {
        lookback: Duration,
        ends_ago: Duration,
        not_before: Option<DateTime<Utc>>,
    },
    Fixed {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl FetchWindow {
    /// The window `[now - lookback, now]`.
    pub fn last(lookback: Duration) -> Self {
        FetchWindow::Relative {
            lookback,
            ends_ago: Duration::zero(),
            not_before: None,
        }
    }

    pub fn resolve(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        match *self {
            FetchWindow::Fixed { start, end } => (start, end),
            FetchWindow::Relative {
                lookback,
                ends_ago,
                not_before,
            } => {
                let end = now - ends_ago;
                let mut start = end - lookback;
                if let Some(floor) = not_before {
                    start = start.max(floor);
                }
                (start.min(end), end)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchPlan {
    pub origin: FetchOrigin,
    pub epoch: u64,
    pub window: FetchWindow,
    pub limit: usize,
    pub token: Option<String>,
}

impl FetchPlan {
    pub fn request(&self, now: DateTime<Utc>) -> FetchRequest {
        let (start, end) = self.window.resolve(now);
        FetchRequest {
            start,
            end,
            limit: self.limit,
            token: self.token.clone(),
        }
    }
}

/// Everything that can happen to a session, processed one at a time in arrival order.
#[derive(Debug)]
pub enum SessionMessage {
    Input(InputAction),
    /// Refresh cadence elapsed.
    Tick,
    Fetched {
        epoch: u64,
        origin: FetchOrigin,
        /// The request as it was sent, so follow-up pages can reuse its window.
        request: FetchRequest,
        result: Result<FetchPage>,
    },
    /// A re-search scheduled after the buffer wrapped.
    DeferredSearch {
        generation: u64,
    },
    ClipboardDone(Result<()>),
}

/// Side effects requested by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEffect {
    Fetch(FetchPlan),
    /// Deliver a `Tick` after the delay.
    ScheduleTick(std::time::Duration),
    /// Deliver `DeferredSearch { generation }` after the delay.
    ScheduleSearch {
        generation: u64,
        delay: std::time::Duration,
    },
    CopyToClipboard(String),
    Quit,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn relative_window_respects_floor() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let window = FetchWindow::Relative {
            lookback: Duration::minutes(2),
            ends_ago: Duration::zero(),
            not_before: Some(now - Duration::seconds(30)),
        };
        assert_eq!(window.resolve(now), (now - Duration::seconds(30), now));

        let open = FetchWindow::last(Duration::minutes(2));
        assert_eq!(open.resolve(now), (now - Duration::minutes(2), now));
    }

    #[test]
    fn floor_in_the_future_collapses_to_empty_range() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let window = FetchWindow::Relative {
            lookback: Duration::minutes(1),
            ends_ago: Duration::zero(),
            not_before: Some(now + Duration::seconds(5)),
        };
        assert_eq!(window.resolve(now), (now, now));
    }

    #[test]
    fn history_window_ends_in_the_past() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let plan = FetchPlan {
            origin: FetchOrigin::History,
            epoch: 0,
            window: FetchWindow::Relative {
                lookback: Duration::hours(2),
                ends_ago: Duration::hours(4),
                not_before: None,
            },
            limit: 10,
            token: None,
        };
        let request = plan.request(now);
        assert_eq!(request.end, now - Duration::hours(4));
        assert_eq!(request.start, now - Duration::hours(6));
        assert_eq!(request.limit, 10);
    }
}
