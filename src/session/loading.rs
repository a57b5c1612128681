//! Fetch bookkeeping: load epochs, initial pagination, window widening, polls and history.

use crate::config::ViewerConfig;
use crate::session::protocol::{FetchOrigin, FetchPlan, FetchWindow};
use crate::source::FetchRequest;
use chrono::{DateTime, Duration, Utc};

/// What to do after an initial page has been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitialOutcome {
    /// Request the next page of the same window.
    NextPage(FetchPlan),
    /// Nothing found yet; retry with a wider window.
    Widen { plan: FetchPlan, window: Duration },
    /// Every window came back empty.
    Exhausted { window: Duration },
    Complete,
}

#[derive(Debug, Clone, Default)]
pub struct LoadState {
    epoch: u64,
    loading_initial: bool,
    initial_in_flight: bool,
    pages: usize,
    escalation: usize,
    poll_in_flight: bool,
    history_in_flight: bool,
    history_depth: i32,
    /// Newest timestamp ingested from the live edge; polls start after it.
    latest_seen: Option<DateTime<Utc>>,
}

impl LoadState {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_loading_initial(&self) -> bool {
        self.loading_initial
    }

    pub fn initial_in_flight(&self) -> bool {
        self.initial_in_flight
    }

    /// An initial page or a history window is on its way. Polls run silently.
    pub fn is_busy(&self) -> bool {
        self.initial_in_flight || self.history_in_flight
    }

    /// Window currently used by the initial load.
    pub fn current_window(&self, config: &ViewerConfig) -> Duration {
        config
            .escalated_window(self.escalation)
            .unwrap_or_else(|| config.initial_window())
    }

    /// Start over with a new epoch. Results of older epochs are dropped on arrival.
    pub fn begin_epoch(&mut self, config: &ViewerConfig) -> FetchPlan {
        let epoch = self.epoch.wrapping_add(1);
        *self = LoadState {
            epoch,
            ..LoadState::default()
        };
        self.loading_initial = true;
        self.initial_plan(config)
    }

    /// First page of the current window, also used to retry a failed initial fetch.
    pub fn initial_plan(&mut self, config: &ViewerConfig) -> FetchPlan {
        self.initial_in_flight = true;
        self.pages = 0;
        self.plan(
            FetchOrigin::Initial,
            config,
            FetchWindow::last(self.current_window(config)),
            None,
        )
    }

    /// Whether an arriving result still belongs to the current load.
    pub fn accepts(&self, origin: FetchOrigin, epoch: u64) -> bool {
        if epoch != self.epoch {
            return false;
        }
        match origin {
            FetchOrigin::Initial => self.loading_initial && self.initial_in_flight,
            FetchOrigin::Poll => self.poll_in_flight,
            FetchOrigin::History => self.history_in_flight,
        }
    }

    /// Clear the in-flight flag for a result that arrived.
    pub fn settle(&mut self, origin: FetchOrigin) {
        match origin {
            FetchOrigin::Initial => self.initial_in_flight = false,
            FetchOrigin::Poll => self.poll_in_flight = false,
            FetchOrigin::History => self.history_in_flight = false,
        }
    }

    /// Decide how the initial load continues after a page was applied.
    pub fn after_initial_page(
        &mut self,
        config: &ViewerConfig,
        request: &FetchRequest,
        received: usize,
        next_token: Option<String>,
        store_empty: bool,
    ) -> InitialOutcome {
        self.pages += 1;

        if let Some(token) = next_token {
            if received > 0 && self.pages <= config.max_initial_pages {
                self.initial_in_flight = true;
                let window = FetchWindow::Fixed {
                    start: request.start,
                    end: request.end,
                };
                return InitialOutcome::NextPage(self.plan(
                    FetchOrigin::Initial,
                    config,
                    window,
                    Some(token),
                ));
            }
        }

        if store_empty {
            if let Some(window) = config.escalated_window(self.escalation + 1) {
                self.escalation += 1;
                let plan = self.initial_plan(config);
                return InitialOutcome::Widen { plan, window };
            }
            self.loading_initial = false;
            return InitialOutcome::Exhausted {
                window: self.current_window(config),
            };
        }

        self.loading_initial = false;
        InitialOutcome::Complete
    }

    /// A page of the live edge, if one may be issued now.
    pub fn poll_plan(&mut self, config: &ViewerConfig, following: bool) -> Option<FetchPlan> {
        if self.loading_initial || self.poll_in_flight {
            return None;
        }
        self.poll_in_flight = true;
        let window = FetchWindow::Relative {
            lookback: config.poll_lookback(following),
            ends_ago: Duration::zero(),
            not_before: self.latest_seen.map(|t| t + Duration::milliseconds(1)),
        };
        Some(self.plan(FetchOrigin::Poll, config, window, None))
    }

    /// Continue a poll whose page was cut off by the limit.
    pub fn poll_continuation(
        &mut self,
        config: &ViewerConfig,
        request: &FetchRequest,
        token: String,
    ) -> FetchPlan {
        self.poll_in_flight = true;
        let window = FetchWindow::Fixed {
            start: request.start,
            end: request.end,
        };
        self.plan(FetchOrigin::Poll, config, window, Some(token))
    }

    /// The next older window, stepping one initial window further back per request.
    pub fn history_plan(&mut self, config: &ViewerConfig) -> Option<FetchPlan> {
        if self.loading_initial || self.history_in_flight {
            return None;
        }
        self.history_in_flight = true;
        let span = config.initial_window();
        let window = FetchWindow::Relative {
            lookback: span,
            ends_ago: span * (self.history_depth + 1),
            not_before: None,
        };
        Some(self.plan(FetchOrigin::History, config, window, None))
    }

    pub fn history_loaded(&mut self) {
        self.history_depth = self.history_depth.saturating_add(1);
    }

    /// Track the live edge. History records never move it.
    pub fn observe(&mut self, origin: FetchOrigin, timestamp: DateTime<Utc>) {
        if origin == FetchOrigin::History {
            return;
        }
        if self.latest_seen.map_or(true, |seen| timestamp > seen) {
            self.latest_seen = Some(timestamp);
        }
    }

    fn plan(
        &self,
        origin: FetchOrigin,
        config: &ViewerConfig,
        window: FetchWindow,
        token: Option<String>,
    ) -> FetchPlan {
        FetchPlan {
            origin,
            epoch: self.epoch,
            window,
            limit: config.logs_per_fetch,
            token,
        }
    }
}

/// Human-readable size of a window: hours, days, weeks or months.
pub fn describe_window(window: Duration) -> String {
    let hours = window.num_hours().max(1);
    let (count, unit) = if hours < 24 {
        (hours, "hour")
    } else if hours < 24 * 7 {
        (hours / 24, "day")
    } else if hours < 24 * 30 {
        (hours / (24 * 7), "week")
    } else {
        (hours / (24 * 30), "month")
    };
    if count == 1 {
        format!("1 {unit}")
    } else {
        format!("{count} {unit}s")
    }
}
