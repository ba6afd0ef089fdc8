//! Single-line text input with a byte-offset cursor.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Position, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use unicode_width::UnicodeWidthStr;

use super::theme::THEME;

/// Editable text buffer shared by the chat input bar and the settings form.
#[derive(Debug, Default, Clone)]
pub struct InputBar {
    text: String,
    /// Cursor position within `text` (byte offset, always on a char boundary).
    cursor: usize,
}

impl InputBar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer pre-filled with `text`, cursor at the end.
    pub fn with_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let cursor = text.len();
        Self { text, cursor }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Take the current input and reset it.
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.text)
    }

    /// Applies an editing key. Returns `true` if the key was consumed.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        match (key.modifiers, key.code) {
            (m, KeyCode::Char(c)) if !m.contains(KeyModifiers::CONTROL) => {
                self.text.insert(self.cursor, c);
                self.cursor += c.len_utf8();
            }
            (_, KeyCode::Backspace) => {
                if self.cursor > 0 {
                    let prev = self.prev_boundary();
                    self.text.drain(prev..self.cursor);
                    self.cursor = prev;
                }
            }
            (_, KeyCode::Delete) => {
                if self.cursor < self.text.len() {
                    let next = self.next_boundary();
                    self.text.drain(self.cursor..next);
                }
            }
            (_, KeyCode::Left) => self.cursor = self.prev_boundary(),
            (_, KeyCode::Right) => self.cursor = self.next_boundary(),
            (_, KeyCode::Home) => self.cursor = 0,
            (_, KeyCode::End) => self.cursor = self.text.len(),
            _ => return false,
        }
        true
    }

    fn prev_boundary(&self) -> usize {
        self.text[..self.cursor]
            .char_indices()
            .last()
            .map(|(i, _)| i)
            .unwrap_or(0)
    }

    fn next_boundary(&self) -> usize {
        self.text[self.cursor..]
            .char_indices()
            .nth(1)
            .map(|(i, _)| self.cursor + i)
            .unwrap_or(self.text.len())
    }

    /// Display width of the text left of the cursor.
    fn cursor_column(&self, masked: bool) -> u16 {
        let before = &self.text[..self.cursor];
        let width = if masked {
            before.chars().count()
        } else {
            before.width()
        };
        u16::try_from(width).unwrap_or(u16::MAX)
    }

    /// Draws the bordered input box and places the terminal cursor.
    ///
    /// `masked` replaces every character with `•`; `placeholder` is shown
    /// dimmed while the buffer is empty.
    pub fn render(
        &self,
        frame: &mut Frame<'_>,
        area: Rect,
        title: &str,
        placeholder: &str,
        focused: bool,
        masked: bool,
    ) {
        let border = if focused {
            THEME.border_active
        } else {
            THEME.border
        };
        let body = if self.is_empty() {
            Span::styled(placeholder.to_string(), Style::default().fg(THEME.fg_muted))
        } else if masked {
            Span::styled(
                "•".repeat(self.text.chars().count()),
                Style::default().fg(THEME.secret),
            )
        } else {
            Span::styled(self.text.clone(), Style::default().fg(THEME.fg))
        };

        // Keep the cursor visible by scrolling horizontally.
        let inner_width = area.width.saturating_sub(2);
        let column = self.cursor_column(masked);
        let offset = column.saturating_sub(inner_width.saturating_sub(1));

        let widget = Paragraph::new(Line::from(body))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(border))
                    .title(Span::styled(
                        format!(" {title} "),
                        Style::default().fg(THEME.fg_dim),
                    )),
            )
            .scroll((0, offset));
        frame.render_widget(widget, area);

        if focused {
            frame.set_cursor_position(Position {
                x: area.x + 1 + column - offset,
                y: area.y + 1,
            });
        }
    }
}
