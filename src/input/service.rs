//! Key mapping and the input thread.
//!
//! Terminal events become `InputAction`s through a two-state machine: browsing, where
//! keys are commands, and the search prompt, where keys edit the query.

use crate::error::Result;
use crate::input::raw::{ScrollDirection, TerminalEvent, TerminalEvents};
use crate::session::SessionMessage;
use ratatui::crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputState {
    Browsing,
    SearchPrompt,
}

/// User intents understood by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputAction {
    Scroll {
        direction: ScrollDirection,
        lines: u64,
    },
    PageUp,
    PageDown,
    GoToStart,
    GoToEnd,
    StartSearch,
    UpdateSearchBuffer {
        buffer: String,
    },
    CancelSearch,
    ExecuteSearch {
        pattern: String,
    },
    ClearSearch,
    NextMatch,
    PreviousMatch,
    ToggleFormat,
    ToggleFollow,
    LoadHistory,
    CopyLine,
    Reload,
    Resize {
        width: u16,
        height: u16,
    },
    Quit,
    NoAction,
    InvalidInput,
}

pub struct InputStateMachine {
    state: InputState,
    search_buffer: String,
}

impl InputStateMachine {
    pub fn new() -> Self {
        Self {
            state: InputState::Browsing,
            search_buffer: String::new(),
        }
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) -> InputAction {
        if key.kind != KeyEventKind::Press {
            return InputAction::NoAction;
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return match self.state {
                InputState::Browsing => InputAction::Quit,
                InputState::SearchPrompt => self.leave_prompt(),
            };
        }
        match self.state {
            InputState::Browsing => self.browse_key(key),
            InputState::SearchPrompt => self.prompt_key(key),
        }
    }

    fn browse_key(&mut self, key: KeyEvent) -> InputAction {
        let control = key.modifiers.contains(KeyModifiers::CONTROL);
        if key.modifiers.contains(KeyModifiers::ALT) {
            return InputAction::InvalidInput;
        }

        match (key.code, control) {
            (KeyCode::Char('f'), true) => InputAction::PageDown,
            (KeyCode::Char('b'), true) => InputAction::PageUp,
            (_, true) => InputAction::InvalidInput,
            (KeyCode::Char('j') | KeyCode::Down, false) => InputAction::Scroll {
                direction: ScrollDirection::Down,
                lines: 1,
            },
            (KeyCode::Char('k') | KeyCode::Up, false) => InputAction::Scroll {
                direction: ScrollDirection::Up,
                lines: 1,
            },
            (KeyCode::Char(' ') | KeyCode::Char('f') | KeyCode::PageDown, false) => {
                InputAction::PageDown
            }
            (KeyCode::Char('b') | KeyCode::PageUp, false) => InputAction::PageUp,
            (KeyCode::Char('g') | KeyCode::Home, false) => InputAction::GoToStart,
            (KeyCode::Char('G') | KeyCode::End, false) => InputAction::GoToEnd,
            (KeyCode::Char('/'), false) => {
                self.state = InputState::SearchPrompt;
                self.search_buffer.clear();
                InputAction::StartSearch
            }
            (KeyCode::Esc, false) => InputAction::ClearSearch,
            (KeyCode::Char('n'), false) => InputAction::NextMatch,
            (KeyCode::Char('N'), false) => InputAction::PreviousMatch,
            (KeyCode::Char('J'), false) => InputAction::ToggleFormat,
            (KeyCode::Char('F'), false) => InputAction::ToggleFollow,
            (KeyCode::Char('H'), false) => InputAction::LoadHistory,
            (KeyCode::Char('y'), false) => InputAction::CopyLine,
            (KeyCode::Char('r'), false) => InputAction::Reload,
            (KeyCode::Char('q'), false) => InputAction::Quit,
            _ => InputAction::InvalidInput,
        }
    }

    fn prompt_key(&mut self, key: KeyEvent) -> InputAction {
        match key.code {
            KeyCode::Esc => self.leave_prompt(),
            KeyCode::Enter => {
                let pattern = std::mem::take(&mut self.search_buffer);
                self.state = InputState::Browsing;
                if pattern.is_empty() {
                    InputAction::CancelSearch
                } else {
                    InputAction::ExecuteSearch { pattern }
                }
            }
            KeyCode::Backspace => {
                if self.search_buffer.pop().is_none() {
                    return self.leave_prompt();
                }
                InputAction::UpdateSearchBuffer {
                    buffer: self.search_buffer.clone(),
                }
            }
            KeyCode::Char(ch)
                if !ch.is_control()
                    && !key
                        .modifiers
                        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                self.search_buffer.push(ch);
                InputAction::UpdateSearchBuffer {
                    buffer: self.search_buffer.clone(),
                }
            }
            _ => InputAction::InvalidInput,
        }
    }

    fn leave_prompt(&mut self) -> InputAction {
        self.state = InputState::Browsing;
        self.search_buffer.clear();
        InputAction::CancelSearch
    }

    pub fn search_buffer(&self) -> &str {
        &self.search_buffer
    }

    pub fn state(&self) -> InputState {
        self.state
    }
}

impl Default for InputStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

/// Turns terminal events into actions.
#[derive(Default)]
pub struct InputService {
    state_machine: InputStateMachine,
    events: TerminalEvents,
}

impl InputService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block up to `timeout` and return every action that became ready.
    pub fn poll_actions(&mut self, timeout: Option<Duration>) -> Result<Vec<InputAction>> {
        let mut actions = Vec::new();
        if let Some(event) = self.events.poll(timeout)? {
            actions.extend(self.map_event(event));
            while let Some(event) = self.events.next_ready() {
                actions.extend(self.map_event(event));
            }
        }
        Ok(actions)
    }

    pub fn process_event(&mut self, event: Event) -> Vec<InputAction> {
        self.events.push_event(event);
        let mut actions = Vec::new();
        while let Some(event) = self.events.next_ready() {
            actions.extend(self.map_event(event));
        }
        actions
    }

    fn map_event(&mut self, event: TerminalEvent) -> Option<InputAction> {
        let action = match event {
            TerminalEvent::Key(key) => self.state_machine.handle_key_event(key),
            TerminalEvent::Resize { width, height } => InputAction::Resize { width, height },
            TerminalEvent::Scroll { direction, lines } => InputAction::Scroll { direction, lines },
        };
        match action {
            InputAction::NoAction | InputAction::InvalidInput => None,
            action => Some(action),
        }
    }
}

/// Poll the terminal on a dedicated thread and forward actions to the session loop.
pub fn spawn_input_thread(
    tx: UnboundedSender<SessionMessage>,
    shutdown: Arc<AtomicBool>,
    poll_interval: Duration,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut service = InputService::new();
        while !shutdown.load(Ordering::SeqCst) {
            match service.poll_actions(Some(poll_interval)) {
                Ok(actions) => {
                    for action in actions {
                        if tx.send(SessionMessage::Input(action)).is_err() {
                            return;
                        }
                    }
                }
                Err(err) => {
                    log::error!("Input thread error: {err}");
                    break;
                }
            }
        }
        log::debug!("Input thread stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::{MouseEvent, MouseEventKind};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(ch: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL)
    }

    fn type_query(machine: &mut InputStateMachine, query: &str) -> Vec<InputAction> {
        query
            .chars()
            .map(|c| machine.handle_key_event(key(KeyCode::Char(c))))
            .collect()
    }

    #[test]
    fn browsing_keys_map_to_commands() {
        let mut machine = InputStateMachine::new();
        let cases = [
            (key(KeyCode::Char('J')), InputAction::ToggleFormat),
            (key(KeyCode::Char('F')), InputAction::ToggleFollow),
            (key(KeyCode::Char('H')), InputAction::LoadHistory),
            (key(KeyCode::Char('y')), InputAction::CopyLine),
            (key(KeyCode::Char('r')), InputAction::Reload),
            (key(KeyCode::Esc), InputAction::ClearSearch),
            (key(KeyCode::Home), InputAction::GoToStart),
            (key(KeyCode::End), InputAction::GoToEnd),
            (ctrl('f'), InputAction::PageDown),
            (ctrl('b'), InputAction::PageUp),
            (ctrl('c'), InputAction::Quit),
            (key(KeyCode::Char('q')), InputAction::Quit),
            (key(KeyCode::Char('x')), InputAction::InvalidInput),
        ];
        for (event, expected) in cases {
            assert_eq!(machine.handle_key_event(event), expected, "{event:?}");
        }
    }

    #[test]
    fn search_prompt_edits_and_executes() {
        let mut machine = InputStateMachine::new();
        assert_eq!(
            machine.handle_key_event(key(KeyCode::Char('/'))),
            InputAction::StartSearch
        );
        assert_eq!(machine.state(), InputState::SearchPrompt);

        let typed = type_query(&mut machine, "eRr");
        assert_eq!(
            typed.last(),
            Some(&InputAction::UpdateSearchBuffer {
                buffer: "eRr".into()
            })
        );
        // Command keys are literal text while the prompt is open.
        assert_eq!(
            machine.handle_key_event(key(KeyCode::Char('q'))),
            InputAction::UpdateSearchBuffer {
                buffer: "eRrq".into()
            }
        );
        machine.handle_key_event(key(KeyCode::Backspace));

        assert_eq!(
            machine.handle_key_event(key(KeyCode::Enter)),
            InputAction::ExecuteSearch {
                pattern: "eRr".into()
            }
        );
        assert_eq!(machine.state(), InputState::Browsing);
        assert_eq!(machine.search_buffer(), "");
    }

    #[test]
    fn prompt_cancels_on_escape_empty_backspace_and_blank_enter() {
        let mut machine = InputStateMachine::new();

        machine.handle_key_event(key(KeyCode::Char('/')));
        type_query(&mut machine, "ab");
        assert_eq!(
            machine.handle_key_event(key(KeyCode::Esc)),
            InputAction::CancelSearch
        );

        machine.handle_key_event(key(KeyCode::Char('/')));
        assert_eq!(
            machine.handle_key_event(key(KeyCode::Backspace)),
            InputAction::CancelSearch
        );
        assert_eq!(machine.state(), InputState::Browsing);

        machine.handle_key_event(key(KeyCode::Char('/')));
        assert_eq!(
            machine.handle_key_event(key(KeyCode::Enter)),
            InputAction::CancelSearch
        );
    }

    #[test]
    fn wheel_and_resize_events_become_actions() {
        let mut service = InputService::new();
        let scroll = Event::Mouse(MouseEvent {
            kind: MouseEventKind::ScrollUp,
            column: 0,
            row: 0,
            modifiers: KeyModifiers::NONE,
        });
        assert!(service.process_event(scroll.clone()).is_empty());
        assert!(service.process_event(scroll).is_empty());

        let actions = service.process_event(Event::Resize(100, 30));
        assert_eq!(
            actions,
            vec![
                InputAction::Scroll {
                    direction: ScrollDirection::Up,
                    lines: 6,
                },
                InputAction::Resize {
                    width: 100,
                    height: 30,
                },
            ]
        );
    }

    #[test]
    fn invalid_keys_are_dropped_by_the_service() {
        let mut service = InputService::new();
        assert!(service
            .process_event(Event::Key(key(KeyCode::Char('z'))))
            .is_empty());
        assert_eq!(
            service.process_event(Event::Key(key(KeyCode::Char('j')))),
            vec![InputAction::Scroll {
                direction: ScrollDirection::Down,
                lines: 1
            }]
        );
    }
}
