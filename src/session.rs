//! Session orchestration.
//!
//! `Session` is a synchronous state machine over the record store, the match set and the
//! viewport. It consumes one [`SessionMessage`] at a time and answers with
//! [`SessionEffect`]s; fetching, timers and the clipboard are performed by the runtime,
//! whose results come back as further messages. Nothing here blocks or reads the clock,
//! so every transition can be driven directly from tests.
//!
//! Consistency rules upheld by every handler:
//! - a buffer wrap discards the match set before the frame is rebuilt, and re-runs an
//!   active query only from a later `DeferredSearch` message;
//! - the cursor is clamped after every store mutation and every movement;
//! - results from a superseded load epoch are dropped.

pub mod frame;
pub mod loading;
pub mod protocol;
pub mod search_state;

pub use protocol::{FetchOrigin, FetchPlan, FetchWindow, SessionEffect, SessionMessage};

use crate::config::{ColorScheme, ViewerConfig};
use crate::error::{Result, RltailError};
use crate::format::{DisplayMode, Formatter, Paint};
use crate::input::InputAction;
use crate::render::ui::state::ViewState;
use crate::search::{HighlightMarkers, MatchTraversal, SearchOptions};
use crate::source::{FetchPage, FetchRequest, RawRecord};
use crate::store::{Record, RecordStore};
use crate::viewport::Viewport;
use loading::{describe_window, InitialOutcome, LoadState};
use search_state::SearchState;

pub struct Session {
    config: ViewerConfig,
    source_name: String,
    formatter: Formatter,
    store: RecordStore,
    viewport: Viewport,
    mode: DisplayMode,
    search: SearchState,
    load: LoadState,
    /// Transient message, cleared by the next key press.
    notice: Option<String>,
    /// Last fetch failure, cleared by the next successful fetch.
    fetch_error: Option<String>,
    /// Set when every initial window came back empty, cleared when records arrive.
    empty_notice: Option<String>,
    /// Some records still carry display forms of the previous mode.
    reformat_pending: bool,
    width: u16,
    height: u16,
    view: ViewState,
    finished: bool,
}

impl Session {
    pub fn new(config: ViewerConfig, source_name: impl Into<String>) -> Self {
        let mode = if config.start_formatted {
            DisplayMode::Formatted
        } else {
            DisplayMode::Raw
        };
        let options = SearchOptions {
            case_insensitive: true,
            regex_mode: config.regex_search,
        };
        let search = SearchState::new(options, highlight_markers(&config.colors));

        let mut session = Self {
            formatter: Formatter::new(config.format.clone()),
            store: RecordStore::new(config.capacity),
            viewport: Viewport::new(config.start_following),
            mode,
            search,
            load: LoadState::default(),
            notice: None,
            fetch_error: None,
            empty_notice: None,
            reformat_pending: false,
            width: config.default_width,
            height: config.default_height,
            view: ViewState::new(String::new(), config.default_width, config.default_height),
            finished: false,
            source_name: source_name.into(),
            config,
        };
        session.refresh_view();
        session
    }

    /// Begin the first load and the refresh cadence.
    pub fn start(&mut self) -> Vec<SessionEffect> {
        let plan = self.load.begin_epoch(&self.config);
        log::info!(
            "Loading logs from {} (last {})",
            self.source_name,
            describe_window(self.load.current_window(&self.config))
        );
        self.refresh_view();
        vec![
            SessionEffect::Fetch(plan),
            SessionEffect::ScheduleTick(self.config.refresh_interval()),
        ]
    }

    /// Process one message to completion and rebuild the frame.
    pub fn handle(&mut self, message: SessionMessage) -> Vec<SessionEffect> {
        let mut effects = Vec::new();
        match message {
            SessionMessage::Input(action) => self.on_input(action, &mut effects),
            SessionMessage::Tick => self.on_tick(&mut effects),
            SessionMessage::Fetched {
                epoch,
                origin,
                request,
                result,
            } => self.on_fetched(epoch, origin, &request, result, &mut effects),
            SessionMessage::DeferredSearch { generation } => self.on_deferred_search(generation),
            SessionMessage::ClipboardDone(result) => self.on_clipboard(result),
        }
        self.refresh_view();
        effects
    }

    pub fn view_state(&self) -> &ViewState {
        &self.view
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn search_state(&self) -> &SearchState {
        &self.search
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.mode
    }

    pub fn epoch(&self) -> u64 {
        self.load.epoch()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn on_input(&mut self, action: InputAction, effects: &mut Vec<SessionEffect>) {
        if !matches!(action, InputAction::Resize { .. }) {
            self.notice = None;
        }
        let len = self.store.len();
        let page = self.page_size() as isize;

        match action {
            InputAction::Scroll { direction, lines } => self.move_cursor(direction.delta(lines)),
            InputAction::PageUp => self.move_cursor(-page),
            InputAction::PageDown => self.move_cursor(page),
            InputAction::GoToStart => {
                self.viewport.jump_to_start(len);
                self.reformat_near_cursor();
            }
            InputAction::GoToEnd => {
                self.viewport.jump_to_end(len);
                self.reformat_near_cursor();
            }
            InputAction::StartSearch => {
                self.search.open_prompt();
                self.viewport.set_follow(false, len);
            }
            InputAction::UpdateSearchBuffer { buffer } => self.search.edit_prompt(buffer),
            InputAction::CancelSearch | InputAction::ClearSearch => self.search.clear(),
            InputAction::ExecuteSearch { pattern } => self.execute_search(&pattern),
            InputAction::NextMatch => self.step_match(MatchTraversal::Next),
            InputAction::PreviousMatch => self.step_match(MatchTraversal::Previous),
            InputAction::ToggleFormat => self.toggle_mode(),
            InputAction::ToggleFollow => self.toggle_follow(),
            InputAction::LoadHistory => {
                if let Some(plan) = self.load.history_plan(&self.config) {
                    self.notice = Some("Loading older logs...".to_string());
                    effects.push(SessionEffect::Fetch(plan));
                }
            }
            InputAction::CopyLine => match self.store.get(self.viewport.cursor()) {
                Some(record) => effects.push(SessionEffect::CopyToClipboard(
                    record.original_text().to_string(),
                )),
                None => self.notice = Some("Nothing to copy".to_string()),
            },
            InputAction::Reload => self.reload(effects),
            InputAction::Resize { width, height } => {
                self.width = width;
                self.height = height;
                self.viewport.clamp_cursor(len);
            }
            InputAction::Quit => {
                self.finished = true;
                effects.push(SessionEffect::Quit);
            }
            InputAction::NoAction | InputAction::InvalidInput => {}
        }
    }

    fn on_tick(&mut self, effects: &mut Vec<SessionEffect>) {
        effects.push(SessionEffect::ScheduleTick(self.config.refresh_interval()));
        if self.load.is_loading_initial() {
            if !self.load.initial_in_flight() {
                log::debug!("Retrying initial fetch");
                effects.push(SessionEffect::Fetch(self.load.initial_plan(&self.config)));
            }
        } else if let Some(plan) = self
            .load
            .poll_plan(&self.config, self.viewport.is_following())
        {
            effects.push(SessionEffect::Fetch(plan));
        }
    }

    fn on_fetched(
        &mut self,
        epoch: u64,
        origin: FetchOrigin,
        request: &FetchRequest,
        result: Result<FetchPage>,
        effects: &mut Vec<SessionEffect>,
    ) {
        if !self.load.accepts(origin, epoch) {
            log::debug!("Dropping stale {origin:?} result from epoch {epoch}");
            return;
        }
        self.load.settle(origin);

        let page = match result {
            Ok(page) => page,
            Err(err) => {
                if err.is_recoverable() {
                    log::warn!("{origin:?} fetch failed: {err}");
                } else {
                    log::error!("{origin:?} fetch failed: {err}");
                }
                self.fetch_error = Some(err.to_string());
                return;
            }
        };
        self.fetch_error = None;

        let received = page.records.len();
        let next_token = page.next_token;
        self.ingest(origin, page.records, effects);

        match origin {
            FetchOrigin::Initial => {
                let outcome = self.load.after_initial_page(
                    &self.config,
                    request,
                    received,
                    next_token,
                    self.store.is_empty(),
                );
                match outcome {
                    InitialOutcome::NextPage(plan) => effects.push(SessionEffect::Fetch(plan)),
                    InitialOutcome::Widen { plan, window } => {
                        self.notice = Some(format!(
                            "No logs found, expanding search to {}...",
                            describe_window(window)
                        ));
                        effects.push(SessionEffect::Fetch(plan));
                    }
                    InitialOutcome::Exhausted { window } => {
                        let empty = RltailError::empty_result(describe_window(window));
                        log::info!("{empty}");
                        self.notice = None;
                        self.empty_notice = Some(empty.to_string());
                    }
                    InitialOutcome::Complete => {
                        log::info!("Initial load complete with {} records", self.store.len());
                    }
                }
            }
            FetchOrigin::Poll => {
                if let Some(token) = next_token.filter(|_| received > 0) {
                    let plan = self.load.poll_continuation(&self.config, request, token);
                    effects.push(SessionEffect::Fetch(plan));
                }
            }
            FetchOrigin::History => {
                self.load.history_loaded();
                self.notice = Some(if received == 0 {
                    "No older logs found".to_string()
                } else {
                    format!("Loaded {received} older logs")
                });
            }
        }
    }

    /// Append a batch. A wrap invalidates matches now and schedules any re-search for later.
    fn ingest(
        &mut self,
        origin: FetchOrigin,
        records: Vec<RawRecord>,
        effects: &mut Vec<SessionEffect>,
    ) {
        if records.is_empty() {
            return;
        }
        let mut evicted = 0usize;
        for raw in records {
            self.load.observe(origin, raw.timestamp);
            let record = Record::new(raw.timestamp, raw.text, &self.formatter, self.mode);
            if self.store.append(record) {
                evicted += 1;
            }
        }
        self.empty_notice = None;

        let len = self.store.len();
        if evicted == 0 {
            self.viewport.clamp_cursor(len);
            return;
        }

        self.viewport.shift_for_eviction(evicted, len);
        if let Some(generation) = self.search.invalidate() {
            log::debug!("Buffer wrapped by {evicted}, re-search {generation} scheduled");
            self.notice = Some("Log buffer rolled over".to_string());
            effects.push(SessionEffect::ScheduleSearch {
                generation,
                delay: self.config.research_delay(),
            });
        }
    }

    fn on_deferred_search(&mut self, generation: u64) {
        let Some(query) = self.search.take_pending(generation) else {
            log::debug!("Skipping superseded re-search {generation}");
            return;
        };
        if self.reformat_pending {
            self.reformat_all();
        }
        let view = self.store.view();
        match self.search.rerun(&query, &view, self.viewport.cursor()) {
            Ok(count) => log::debug!("Re-search for '{query}' found {count} matches"),
            Err(err) => self.notice = Some(err.to_string()),
        }
    }

    fn on_clipboard(&mut self, result: Result<()>) {
        self.notice = Some(match result {
            Ok(()) => "Copied to clipboard".to_string(),
            Err(err) => {
                log::warn!("{err}");
                err.to_string()
            }
        });
    }

    fn execute_search(&mut self, query: &str) {
        // Matching reads display lines, so every record must reflect the current mode.
        if self.reformat_pending {
            self.reformat_all();
        }
        let len = self.store.len();
        let view = self.store.view();
        match self.search.execute(query, &view) {
            Err(err) => {
                log::debug!("{err}");
                self.notice = Some(err.to_string());
            }
            Ok(0) => self.notice = Some(format!("No matches found for '{query}'")),
            Ok(count) => {
                if let Some(position) = self.search.matches().current_position() {
                    self.viewport.center_on(position, len);
                }
                self.notice = Some(format!("Found {count} matches"));
            }
        }
    }

    fn step_match(&mut self, traversal: MatchTraversal) {
        if !self.search.has_matches() {
            self.notice = Some(match self.search.query() {
                Some(query) => format!("No matches found for '{query}'"),
                None => "No active search".to_string(),
            });
            return;
        }
        let len = self.store.len();
        let view = self.store.view();
        if let Some(position) = self.search.step(traversal, &view) {
            self.viewport.center_on(position, len);
        }
    }

    fn toggle_mode(&mut self) {
        self.mode = self.mode.toggled();
        self.search.clear();
        self.reformat_pending = true;

        let (start, end) = self
            .viewport
            .visible_range(self.store.len(), self.page_size());
        self.reformat_range(start, end);
        self.reformat_near_cursor();
        log::debug!("Display mode switched to {}", self.mode.label());
        self.notice = Some(format!("{} mode enabled", self.mode.label()));
    }

    fn toggle_follow(&mut self) {
        let following = self.viewport.toggle_follow(self.store.len());
        if following {
            self.search.clear();
            self.reformat_near_cursor();
        }
        self.notice = Some(
            if following {
                "Follow mode enabled"
            } else {
                "Follow mode disabled"
            }
            .to_string(),
        );
    }

    fn reload(&mut self, effects: &mut Vec<SessionEffect>) {
        self.store.clear();
        self.search.clear();
        self.viewport.reset(self.config.start_following);
        self.fetch_error = None;
        self.empty_notice = None;
        self.reformat_pending = false;

        let plan = self.load.begin_epoch(&self.config);
        log::info!("Reloading logs, epoch {}", plan.epoch);
        self.notice = Some("Reloading logs...".to_string());
        effects.push(SessionEffect::Fetch(plan));
    }

    fn move_cursor(&mut self, delta: isize) {
        self.viewport.move_by(delta, self.store.len());
        self.reformat_near_cursor();
    }

    fn page_size(&self) -> usize {
        self.config.display_height(self.height)
    }

    fn reformat_near_cursor(&mut self) {
        if !self.reformat_pending {
            return;
        }
        let batch = self.config.lazy_reformat_batch.max(1);
        let start = self.viewport.cursor().saturating_sub(batch / 2);
        let end = (start + batch).min(self.store.len());
        self.reformat_range(start, end);
    }

    fn reformat_all(&mut self) {
        self.reformat_range(0, self.store.len());
        self.reformat_pending = false;
    }

    /// Re-derive display forms in `[start, end)` for records still in another mode.
    fn reformat_range(&mut self, start: usize, end: usize) {
        for position in start..end {
            let fresh = match self.store.get(position) {
                Some(record) if record.mode() != self.mode => {
                    record.rederive(&self.formatter, self.mode)
                }
                _ => continue,
            };
            self.store.update_at(position, fresh);
        }
    }
}

fn highlight_markers(colors: &ColorScheme) -> HighlightMarkers {
    HighlightMarkers {
        highlight: Paint::fg(colors.match_fg).on(colors.match_bg),
        current: Paint::fg(colors.current_match_fg)
            .on(colors.current_match_bg)
            .bold(),
    }
}
