//! Building the renderer's `ViewState` from session state.

use super::loading::describe_window;
use super::Session;
use crate::render::ui::state::{StatusKind, StatusLine, ViewRow, ViewState};

const EMPTY_MESSAGE: &str = "No logs yet";

impl Session {
    /// Recompute the frame. Runs once at the end of every handled message.
    pub(super) fn refresh_view(&mut self) {
        let len = self.store.len();
        let height = self.page_size();
        let (start, end) = self.viewport.visible_range(len, height);
        self.reformat_range(start, end);

        let rows = (start..end)
            .filter_map(|position| {
                let record = self.store.get(position)?;
                let row = match self.search.highlight(position) {
                    Some(marked) => ViewRow {
                        position,
                        text: marked.to_string(),
                        highlighted: true,
                    },
                    None => ViewRow {
                        position,
                        text: record.display_line().to_string(),
                        highlighted: false,
                    },
                };
                Some(row)
            })
            .collect();

        self.view = ViewState {
            title: format!(
                "rltail: {} (last {})",
                self.source_name,
                describe_window(self.load.current_window(&self.config))
            ),
            rows,
            cursor_row: (len > 0).then(|| self.viewport.cursor() - start),
            status: self.status_line(),
            controls: self.controls(),
            width: self.width,
            height: self.height,
            empty_message: (len == 0).then(|| EMPTY_MESSAGE.to_string()),
        };
    }

    /// Prompt, then match counter, then notice, then loading, then fetch error.
    fn status_line(&self) -> Option<StatusLine> {
        if let Some(prompt) = self.search.prompt() {
            return Some(StatusLine::new(
                StatusKind::Search,
                format!("Search: {prompt}_ (follow disabled)"),
            ));
        }
        let matches = self.search.matches();
        if let Some(index) = matches.current_index() {
            return Some(StatusLine::new(
                StatusKind::Matches,
                format!(
                    "Matches: {}/{} (follow disabled) | n=next, N=prev, /=new search",
                    index + 1,
                    matches.len()
                ),
            ));
        }
        if let Some(notice) = &self.notice {
            return Some(StatusLine::new(StatusKind::Info, notice.clone()));
        }
        if self.load.is_busy() {
            return Some(StatusLine::new(StatusKind::Loading, "Loading logs..."));
        }
        if let Some(error) = &self.fetch_error {
            return Some(StatusLine::new(StatusKind::Error, format!("Error: {error}")));
        }
        self.empty_notice
            .as_ref()
            .map(|empty| StatusLine::new(StatusKind::Info, empty.clone()))
    }

    fn controls(&self) -> String {
        let following = self.viewport.is_following()
            && self.search.prompt().is_none()
            && !self.search.has_matches();
        let len = self.store.len();
        let position = if len == 0 {
            "0/0".to_string()
        } else {
            format!("{}/{}", self.viewport.cursor() + 1, len)
        };
        format!(
            "/ search, Esc clear, n/N next/prev, J format ({}), F follow ({}), H history, y copy, r reload, q quit | {} logs",
            self.mode.label(),
            if following { "ON" } else { "OFF" },
            position
        )
    }
}
