//! Terminal event collection.
//!
//! Polls crossterm, folds bursts of mouse-wheel ticks into a single scroll step and hands
//! the remaining events to the key mapper in arrival order.

use crate::error::{Result, RltailError};
use ratatui::crossterm::event::{self, Event, KeyEvent, KeyEventKind, MouseEvent, MouseEventKind};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Wheel ticks closer together than this are merged.
const WHEEL_MERGE_WINDOW_MS: u64 = 12;
/// Records moved per wheel tick.
const WHEEL_LINES: u64 = 3;
const DEFAULT_POLL_TIMEOUT_MS: u64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
}

impl ScrollDirection {
    /// Signed record delta for `lines` steps in this direction.
    pub fn delta(self, lines: u64) -> isize {
        let lines = isize::try_from(lines).unwrap_or(isize::MAX);
        match self {
            ScrollDirection::Up => -lines,
            ScrollDirection::Down => lines,
        }
    }
}

/// Events surfaced by [`TerminalEvents`].
#[derive(Debug, Clone, PartialEq)]
pub enum TerminalEvent {
    Key(KeyEvent),
    Resize { width: u16, height: u16 },
    Scroll { direction: ScrollDirection, lines: u64 },
}

/// Merges consecutive same-direction wheel ticks.
#[derive(Debug, Clone)]
pub struct WheelAccumulator {
    window: Duration,
    pending: Option<PendingWheel>,
}

#[derive(Debug, Clone)]
struct PendingWheel {
    direction: ScrollDirection,
    lines: u64,
    last_tick: Instant,
}

impl WheelAccumulator {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    /// Record a tick. A direction change hands back the scroll accumulated so far.
    pub fn push(
        &mut self,
        direction: ScrollDirection,
        lines: u64,
        now: Instant,
    ) -> Option<(ScrollDirection, u64)> {
        match &mut self.pending {
            Some(pending) if pending.direction == direction => {
                pending.lines = pending.lines.saturating_add(lines);
                pending.last_tick = now;
                None
            }
            _ => {
                let flushed = self.take();
                self.pending = Some(PendingWheel {
                    direction,
                    lines,
                    last_tick: now,
                });
                flushed
            }
        }
    }

    /// Hand back the accumulated scroll once no tick arrived for a full window.
    pub fn take_if_settled(&mut self, now: Instant) -> Option<(ScrollDirection, u64)> {
        let settled = self
            .pending
            .as_ref()
            .is_some_and(|p| now.duration_since(p.last_tick) >= self.window);
        if settled {
            self.take()
        } else {
            None
        }
    }

    pub fn take(&mut self) -> Option<(ScrollDirection, u64)> {
        self.pending.take().map(|p| (p.direction, p.lines))
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_none()
    }
}

impl Default for WheelAccumulator {
    fn default() -> Self {
        Self::new(Duration::from_millis(WHEEL_MERGE_WINDOW_MS))
    }
}

#[derive(Debug, Default)]
pub struct TerminalEvents {
    wheel: WheelAccumulator,
    queue: VecDeque<TerminalEvent>,
}

impl TerminalEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_idle(&self) -> bool {
        self.queue.is_empty() && self.wheel.is_empty()
    }

    /// Feed an event without touching the terminal.
    pub fn push_event(&mut self, event: Event) {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                self.queue.push_back(TerminalEvent::Key(key));
            }
            Event::Resize(width, height) => {
                self.flush_wheel();
                self.queue.push_back(TerminalEvent::Resize { width, height });
            }
            Event::Mouse(mouse) => self.push_mouse(mouse),
            _ => {}
        }
    }

    /// Next ready event: a settled wheel scroll first, then queued events.
    pub fn next_ready(&mut self) -> Option<TerminalEvent> {
        self.wheel
            .take_if_settled(Instant::now())
            .map(|(direction, lines)| TerminalEvent::Scroll { direction, lines })
            .or_else(|| self.queue.pop_front())
    }

    /// Wait up to `timeout` for the next event.
    pub fn poll(&mut self, timeout: Option<Duration>) -> Result<Option<TerminalEvent>> {
        if let Some(ready) = self.next_ready() {
            return Ok(Some(ready));
        }

        let timeout = timeout.unwrap_or(Duration::from_millis(DEFAULT_POLL_TIMEOUT_MS));
        let available = event::poll(timeout)
            .map_err(|e| RltailError::ui(format!("Failed to poll terminal events: {e}")))?;
        if available {
            let event = event::read()
                .map_err(|e| RltailError::ui(format!("Failed to read terminal event: {e}")))?;
            self.push_event(event);
        }
        Ok(self.next_ready())
    }

    fn push_mouse(&mut self, mouse: MouseEvent) {
        let direction = match mouse.kind {
            MouseEventKind::ScrollUp => ScrollDirection::Up,
            MouseEventKind::ScrollDown => ScrollDirection::Down,
            _ => return,
        };
        if let Some((direction, lines)) = self.wheel.push(direction, WHEEL_LINES, Instant::now()) {
            self.queue
                .push_back(TerminalEvent::Scroll { direction, lines });
        }
    }

    fn flush_wheel(&mut self) {
        if let Some((direction, lines)) = self.wheel.take() {
            self.queue
                .push_back(TerminalEvent::Scroll { direction, lines });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::{KeyCode, KeyEventState, KeyModifiers};

    fn wheel(kind: MouseEventKind) -> Event {
        Event::Mouse(MouseEvent {
            kind,
            column: 0,
            row: 0,
            modifiers: KeyModifiers::NONE,
        })
    }

    #[test]
    fn merges_ticks_in_the_same_direction() {
        let mut wheel = WheelAccumulator::new(Duration::from_millis(10));
        let now = Instant::now();
        assert!(wheel.push(ScrollDirection::Down, 1, now).is_none());
        assert!(wheel
            .push(ScrollDirection::Down, 2, now + Duration::from_millis(5))
            .is_none());

        assert!(wheel.take_if_settled(now + Duration::from_millis(6)).is_none());
        assert_eq!(
            wheel.take_if_settled(now + Duration::from_millis(20)),
            Some((ScrollDirection::Down, 3))
        );
        assert!(wheel.is_empty());
    }

    #[test]
    fn direction_change_flushes_previous_scroll() {
        let mut wheel = WheelAccumulator::new(Duration::from_millis(10));
        let now = Instant::now();
        wheel.push(ScrollDirection::Up, 1, now);
        assert_eq!(
            wheel.push(ScrollDirection::Down, 1, now),
            Some((ScrollDirection::Up, 1))
        );
        assert_eq!(wheel.take(), Some((ScrollDirection::Down, 1)));
    }

    #[test]
    fn resize_flushes_pending_scroll_first() {
        let mut events = TerminalEvents::new();
        events.push_event(wheel(MouseEventKind::ScrollDown));
        events.push_event(Event::Resize(80, 40));

        assert_eq!(
            events.next_ready(),
            Some(TerminalEvent::Scroll {
                direction: ScrollDirection::Down,
                lines: WHEEL_LINES
            })
        );
        assert_eq!(
            events.next_ready(),
            Some(TerminalEvent::Resize {
                width: 80,
                height: 40
            })
        );
        assert!(events.is_idle());
    }

    #[test]
    fn key_releases_are_ignored() {
        let mut events = TerminalEvents::new();
        events.push_event(Event::Key(KeyEvent {
            code: KeyCode::Char('j'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        }));
        assert!(events.next_ready().is_none());

        events.push_event(Event::Key(KeyEvent::new(
            KeyCode::Char('j'),
            KeyModifiers::NONE,
        )));
        assert!(matches!(events.next_ready(), Some(TerminalEvent::Key(_))));
    }

    #[test]
    fn scroll_delta_is_signed() {
        assert_eq!(ScrollDirection::Up.delta(3), -3);
        assert_eq!(ScrollDirection::Down.delta(2), 2);
    }
}
