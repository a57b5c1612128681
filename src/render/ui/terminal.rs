//! Terminal UI implementation using ratatui
//!
//! This module provides the concrete implementation of `UIRenderer`. It draws whatever the
//! session put in the `ViewState` and owns no log data itself.

use crate::error::Result;
use crate::render::ui::{sgr, ColorTheme, UIRenderer, ViewState};
use ratatui::crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
    Frame, Terminal,
};
use std::io::{self, Stdout};

type CrosstermTerminal = Terminal<CrosstermBackend<Stdout>>;

const CURSOR_MARKER: &str = "▌ ";
const CURSOR_CONTINUATION: &str = "  ";

/// Terminal UI implementation with ratatui backend
pub struct TerminalUI {
    terminal: Option<CrosstermTerminal>,
    theme: ColorTheme,
}

/// Record lines ready for the content block.
struct ContentLines {
    lines: Vec<Line<'static>>,
    /// First and one-past-last line of the selected record.
    cursor_span: Option<(usize, usize)>,
}

impl TerminalUI {
    /// Create a new terminal UI instance with the default theme
    pub fn new() -> Result<Self> {
        Ok(Self {
            terminal: None,
            theme: ColorTheme::default(),
        })
    }

    /// Create terminal UI with custom theme
    pub fn with_theme(theme: ColorTheme) -> Result<Self> {
        Ok(Self {
            terminal: None,
            theme,
        })
    }

    /// Header, status line, bordered records, key help.
    fn draw_frame(frame: &mut Frame, view_state: &ViewState, theme: &ColorTheme) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(
                [
                    Constraint::Length(1),
                    Constraint::Length(1),
                    Constraint::Min(0),
                    Constraint::Length(1),
                ]
                .as_ref(),
            )
            .split(frame.size());

        frame.render_widget(
            Paragraph::new(view_state.title.as_str()).style(theme.header),
            chunks[0],
        );

        if let Some(status) = &view_state.status {
            frame.render_widget(
                Paragraph::new(status.text.as_str()).style(theme.status(status.kind)),
                chunks[1],
            );
        }

        Self::render_content(frame, chunks[2], view_state, theme);

        frame.render_widget(
            Paragraph::new(view_state.controls.as_str()).style(theme.controls),
            chunks[3],
        );
    }

    fn render_content(frame: &mut Frame, area: Rect, view_state: &ViewState, theme: &ColorTheme) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Double)
            .border_style(theme.border);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if view_state.rows.is_empty() {
            if let Some(message) = &view_state.empty_message {
                let placeholder = Paragraph::new(message.as_str())
                    .style(theme.controls)
                    .alignment(Alignment::Center);
                frame.render_widget(placeholder, inner);
            }
            return;
        }

        let content = Self::content_lines(view_state, theme);
        let offset = Self::scroll_offset(&content, inner.height as usize);
        let paragraph = Paragraph::new(content.lines).scroll((offset as u16, 0));
        frame.render_widget(paragraph, inner);
    }

    /// Expand rows into physical lines, styling the selected record.
    fn content_lines(view_state: &ViewState, theme: &ColorTheme) -> ContentLines {
        let mut lines = Vec::new();
        let mut cursor_span = None;

        for (index, row) in view_state.rows.iter().enumerate() {
            let selected = view_state.cursor_row == Some(index);
            let start = lines.len();

            // A highlighted row keeps its match colours and gets a marker instead of the
            // cursor background.
            let base = if selected && !row.highlighted {
                theme.cursor
            } else {
                theme.row(row.position)
            };

            for (part_index, part) in row.text.split('\n').enumerate() {
                let mut spans = Vec::new();
                if selected && row.highlighted {
                    let marker = if part_index == 0 {
                        CURSOR_MARKER
                    } else {
                        CURSOR_CONTINUATION
                    };
                    spans.push(Span::styled(marker, theme.cursor_marker));
                }
                spans.extend(sgr::to_spans(part, base));
                let line = Line::from(spans);
                lines.push(if selected && !row.highlighted {
                    line.style(theme.cursor)
                } else {
                    line
                });
            }

            if selected {
                cursor_span = Some((start, lines.len()));
            }
        }

        ContentLines { lines, cursor_span }
    }

    /// Scroll so the selected record's last line is visible without hiding its first.
    fn scroll_offset(content: &ContentLines, height: usize) -> usize {
        let total = content.lines.len();
        if height == 0 || total <= height {
            return 0;
        }
        match content.cursor_span {
            Some((start, end)) => end.saturating_sub(height).min(start),
            // Without a selection, pin to the newest lines.
            None => total - height,
        }
    }
}

impl UIRenderer for TerminalUI {
    fn render(&mut self, view_state: &ViewState) -> Result<()> {
        if let Some(ref mut terminal) = self.terminal {
            let theme = &self.theme;
            terminal.draw(move |frame| Self::draw_frame(frame, view_state, theme))?;
        }
        Ok(())
    }

    fn initialize(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.hide_cursor()?;
        self.terminal = Some(terminal);

        Ok(())
    }

    fn cleanup(&mut self) -> Result<()> {
        if let Some(mut terminal) = self.terminal.take() {
            disable_raw_mode()?;
            execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture)?;
            terminal.show_cursor()?;
        }
        Ok(())
    }

    fn get_terminal_size(&self) -> Result<(u16, u16)> {
        let (cols, rows) = ratatui::crossterm::terminal::size()?;
        Ok((cols, rows))
    }
}

impl Drop for TerminalUI {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}
