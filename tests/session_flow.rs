//! End-to-end session behaviour against an in-memory source.
//!
//! The harness plays the runtime's role by hand: fetch effects run against the source
//! immediately, timers are fired only when a test asks for them.

use chrono::{Duration as ChronoDuration, Utc};
use rltail::input::InputAction;
use rltail::session::{FetchPlan, SessionEffect, SessionMessage};
use rltail::source::{fetch_with_timeout, LogSource, MemorySource, RawRecord};
use rltail::{Session, ViewerConfig};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

struct Harness {
    session: Session,
    source: Arc<MemorySource>,
    pending_fetches: VecDeque<FetchPlan>,
    pending_searches: Vec<u64>,
    copied: Vec<String>,
}

impl Harness {
    fn new(config: ViewerConfig, source: Arc<MemorySource>) -> Self {
        let mut session = Session::new(config, source.describe());
        let effects = session.start();
        let mut harness = Self {
            session,
            source,
            pending_fetches: VecDeque::new(),
            pending_searches: Vec::new(),
            copied: Vec::new(),
        };
        harness.absorb(effects);
        harness
    }

    fn absorb(&mut self, effects: Vec<SessionEffect>) {
        for effect in effects {
            match effect {
                SessionEffect::Fetch(plan) => self.pending_fetches.push_back(plan),
                SessionEffect::ScheduleSearch { generation, .. } => {
                    self.pending_searches.push(generation)
                }
                SessionEffect::CopyToClipboard(text) => self.copied.push(text),
                SessionEffect::ScheduleTick(_) | SessionEffect::Quit => {}
            }
        }
    }

    fn send(&mut self, message: SessionMessage) {
        let effects = self.session.handle(message);
        self.absorb(effects);
    }

    fn key(&mut self, action: InputAction) {
        self.send(SessionMessage::Input(action));
    }

    /// Run queued fetches, including follow-up pages, until none are left.
    async fn settle(&mut self) {
        while let Some(plan) = self.pending_fetches.pop_front() {
            let request = plan.request(Utc::now());
            let result =
                fetch_with_timeout(self.source.as_ref(), request.clone(), Duration::from_secs(1))
                    .await;
            self.send(SessionMessage::Fetched {
                epoch: plan.epoch,
                origin: plan.origin,
                request,
                result,
            });
        }
    }

    async fn tick(&mut self) {
        self.send(SessionMessage::Tick);
        self.settle().await;
    }

    fn fire_deferred_searches(&mut self) {
        for generation in std::mem::take(&mut self.pending_searches) {
            self.send(SessionMessage::DeferredSearch { generation });
        }
    }

    fn originals(&self) -> Vec<String> {
        self.session
            .store()
            .iter()
            .map(|r| r.original_text().to_string())
            .collect()
    }

    fn status(&self) -> Option<String> {
        self.session.view_state().status_text().map(str::to_string)
    }
}

fn record(minutes_ago: i64, text: &str) -> RawRecord {
    RawRecord::new(Utc::now() - ChronoDuration::minutes(minutes_ago), text)
}

fn raw_config(capacity: usize) -> ViewerConfig {
    ViewerConfig {
        capacity,
        start_formatted: false,
        ..ViewerConfig::default()
    }
}

#[tokio::test]
async fn initial_load_fills_store_and_follows() {
    let source = Arc::new(MemorySource::with_records(
        "memory",
        vec![record(30, "one"), record(20, "two"), record(10, "three")],
    ));
    let mut harness = Harness::new(raw_config(100), source);
    harness.settle().await;

    assert_eq!(harness.originals(), vec!["one", "two", "three"]);
    assert_eq!(harness.session.viewport().cursor(), 2);
    assert!(harness.session.viewport().is_following());
    assert_eq!(harness.status(), None);
}

#[tokio::test]
async fn wrap_invalidates_then_research_restores_matches() {
    let source = Arc::new(MemorySource::with_records(
        "memory",
        vec![
            record(40, "error: disk"),
            record(30, "ok"),
            record(20, "error: net"),
        ],
    ));
    let mut harness = Harness::new(raw_config(3), Arc::clone(&source));
    harness.settle().await;

    harness.key(InputAction::ExecuteSearch {
        pattern: "error".into(),
    });
    assert_eq!(harness.session.search_state().matches().positions(), &[0, 2]);
    assert!(harness
        .status()
        .unwrap()
        .starts_with("Matches: 2/2 (follow disabled)"));

    source.push(record(0, "error: late"));
    harness.tick().await;

    assert_eq!(harness.originals(), vec!["ok", "error: net", "error: late"]);
    assert!(harness.session.search_state().matches().is_empty());
    assert!(harness.session.view_state().rows.iter().all(|r| !r.highlighted));
    assert_eq!(harness.status().as_deref(), Some("Log buffer rolled over"));

    harness.fire_deferred_searches();
    assert_eq!(harness.session.search_state().matches().positions(), &[1, 2]);
    assert!(harness
        .session
        .view_state()
        .rows
        .iter()
        .any(|r| r.highlighted));
}

#[tokio::test]
async fn search_navigation_wraps_around() {
    let source = Arc::new(MemorySource::with_records(
        "memory",
        vec![
            record(50, "GET /a"),
            record(40, "POST /b"),
            record(30, "GET /c"),
            record(20, "GET /d"),
        ],
    ));
    let mut harness = Harness::new(raw_config(50), source);
    harness.settle().await;

    harness.key(InputAction::ExecuteSearch {
        pattern: "get".into(),
    });
    let matches = harness.session.search_state().matches();
    assert_eq!(matches.positions(), &[0, 2, 3]);
    assert_eq!(matches.current_index(), Some(2));
    assert!(harness
        .status()
        .unwrap()
        .starts_with("Matches: 3/3 (follow disabled)"));

    harness.key(InputAction::NextMatch);
    assert_eq!(harness.session.viewport().cursor(), 0);
    harness.key(InputAction::PreviousMatch);
    assert_eq!(harness.session.viewport().cursor(), 3);
    assert!(!harness.session.viewport().is_following());
}

#[tokio::test]
async fn failing_source_reports_and_recovers() {
    let source = Arc::new(MemorySource::with_records(
        "memory",
        vec![record(5, "hello")],
    ));
    source.set_failure(Some("connection refused".into()));
    let mut harness = Harness::new(raw_config(10), Arc::clone(&source));
    harness.settle().await;

    assert!(harness.session.store().is_empty());
    assert_eq!(
        harness.status().as_deref(),
        Some("Error: Log source unavailable: connection refused")
    );

    // Every retry that fails leaves the error on screen.
    for _ in 0..2 {
        harness.tick().await;
        assert!(harness.session.store().is_empty());
        assert!(harness.status().unwrap().contains("connection refused"));
    }

    source.set_failure(None);
    harness.tick().await;
    assert_eq!(harness.originals(), vec!["hello"]);
    assert_eq!(harness.status(), None);
}

#[tokio::test]
async fn empty_source_reports_widest_window() {
    let source = Arc::new(MemorySource::new("memory"));
    let mut harness = Harness::new(raw_config(10), Arc::clone(&source));
    harness.settle().await;

    assert!(harness.session.store().is_empty());
    assert_eq!(harness.status().as_deref(), Some("No logs found in the last 1 month"));
    // Initial window plus each widening step.
    assert_eq!(source.fetch_count(), 4);
}

#[tokio::test]
async fn reload_starts_a_fresh_epoch() {
    let source = Arc::new(MemorySource::with_records(
        "memory",
        vec![record(5, "first")],
    ));
    let mut harness = Harness::new(raw_config(10), Arc::clone(&source));
    harness.settle().await;
    let epoch = harness.session.epoch();

    harness.key(InputAction::ExecuteSearch {
        pattern: "first".into(),
    });
    harness.key(InputAction::Reload);
    assert!(harness.session.store().is_empty());
    assert!(harness.session.search_state().query().is_none());

    harness.settle().await;
    assert_eq!(harness.session.epoch(), epoch + 1);
    assert_eq!(harness.originals(), vec!["first"]);
}

#[tokio::test]
async fn copy_uses_original_text() {
    let source = Arc::new(MemorySource::with_records(
        "memory",
        vec![record(5, r#"  {"level":"info","msg":"ready"}  "#)],
    ));
    let mut harness = Harness::new(ViewerConfig::default(), source);
    harness.settle().await;

    harness.key(InputAction::CopyLine);
    assert_eq!(harness.copied, vec![r#"  {"level":"info","msg":"ready"}  "#]);
}
