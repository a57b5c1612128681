//! Effect execution.
//!
//! Every effect the session emits becomes a detached tokio task whose result is posted back
//! onto the session channel. Nothing here touches session state.

use crate::clipboard::copy_to_clipboard;
use crate::error::Result;
use crate::session::{FetchPlan, SessionEffect, SessionMessage};
use crate::source::{fetch_with_timeout, LogSource};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

/// Copies text somewhere; runs on a blocking thread.
pub type Copier = Arc<dyn Fn(&str) -> Result<()> + Send + Sync>;

pub struct EffectRunner {
    tx: UnboundedSender<SessionMessage>,
    source: Arc<dyn LogSource>,
    fetch_timeout: Duration,
    copier: Copier,
}

impl EffectRunner {
    pub fn new(
        tx: UnboundedSender<SessionMessage>,
        source: Arc<dyn LogSource>,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            tx,
            source,
            fetch_timeout,
            copier: Arc::new(|text: &str| copy_to_clipboard(text)),
        }
    }

    /// Replace the system clipboard, e.g. in tests.
    pub fn with_copier(mut self, copier: Copier) -> Self {
        self.copier = copier;
        self
    }

    /// Start every effect. Returns false once `Quit` was among them.
    pub fn execute_all(&self, effects: Vec<SessionEffect>) -> bool {
        effects
            .into_iter()
            .fold(true, |running, effect| self.execute(effect) && running)
    }

    pub fn execute(&self, effect: SessionEffect) -> bool {
        match effect {
            SessionEffect::Fetch(plan) => self.spawn_fetch(plan),
            SessionEffect::ScheduleTick(delay) => self.deliver_after(delay, SessionMessage::Tick),
            SessionEffect::ScheduleSearch { generation, delay } => {
                self.deliver_after(delay, SessionMessage::DeferredSearch { generation })
            }
            SessionEffect::CopyToClipboard(text) => self.spawn_copy(text),
            SessionEffect::Quit => return false,
        }
        true
    }

    fn spawn_fetch(&self, plan: FetchPlan) {
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        let timeout = self.fetch_timeout;

        tokio::spawn(async move {
            let request = plan.request(Utc::now());
            log::debug!(
                "Fetching {:?} epoch {} [{} .. {}] limit {}",
                plan.origin,
                plan.epoch,
                request.start,
                request.end,
                request.limit
            );
            let result = fetch_with_timeout(source.as_ref(), request.clone(), timeout).await;
            // The receiver only goes away when the session loop has ended.
            let _ = tx.send(SessionMessage::Fetched {
                epoch: plan.epoch,
                origin: plan.origin,
                request,
                result,
            });
        });
    }

    fn deliver_after(&self, delay: Duration, message: SessionMessage) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(message);
        });
    }

    fn spawn_copy(&self, text: String) {
        let tx = self.tx.clone();
        let copier = Arc::clone(&self.copier);
        tokio::task::spawn_blocking(move || {
            let result = copier(&text);
            let _ = tx.send(SessionMessage::ClipboardDone(result));
        });
    }
}
