//! Virtualized, bottom-anchored conversation list.
//!
//! Only messages that intersect the viewport are wrapped, walking backwards
//! from the newest one until the viewport plus the scroll offset is filled.

use proto::{Message, Role};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::Paragraph,
};
use tracing::trace;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::theme::THEME;

/// Blank rows kept above the first line.
pub const TOP_PADDING: u16 = 1;
/// Blank rows kept between the last line and the input bar.
pub const BOTTOM_PADDING: u16 = 1;
/// Body indent under a role label.
const INDENT: &str = "  ";

/// Scroll state for the message list.
#[derive(Debug, Default, Clone)]
pub struct MessageList {
    /// Rows scrolled up from the bottom; 0 follows the newest message.
    scroll: usize,
}

/// Lines chosen for one frame.
#[derive(Debug, Default)]
pub struct Viewport {
    pub lines: Vec<Line<'static>>,
    /// Scroll offset after clamping to the available content.
    pub scroll: usize,
    /// How many messages were wrapped to produce `lines`.
    pub wrapped: usize,
}

impl MessageList {
    #[cfg(test)]
    pub fn scroll(&self) -> usize {
        self.scroll
    }

    pub fn scroll_up(&mut self, rows: usize) {
        self.scroll = self.scroll.saturating_add(rows);
    }

    pub fn scroll_down(&mut self, rows: usize) {
        self.scroll = self.scroll.saturating_sub(rows);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll = 0;
    }

    pub fn render(&mut self, frame: &mut Frame<'_>, area: Rect, messages: &[Message]) {
        let inner = Rect {
            x: area.x + 1,
            y: area.y + TOP_PADDING,
            width: area.width.saturating_sub(2),
            height: area.height.saturating_sub(TOP_PADDING + BOTTOM_PADDING),
        };
        if inner.width == 0 || inner.height == 0 {
            return;
        }
        let viewport = visible_lines(
            messages,
            usize::from(inner.width),
            usize::from(inner.height),
            self.scroll,
        );
        trace!(
            messages = messages.len(),
            wrapped = viewport.wrapped,
            scroll = viewport.scroll,
            "Message list laid out"
        );
        self.scroll = viewport.scroll;
        frame.render_widget(Paragraph::new(Text::from(viewport.lines)), inner);
    }
}

/// Picks the rows to draw for a `width` x `height` viewport scrolled
/// `scroll` rows up from the bottom.
pub fn visible_lines(messages: &[Message], width: usize, height: usize, scroll: usize) -> Viewport {
    let needed = height + scroll;
    let mut blocks: Vec<Vec<Line<'static>>> = Vec::new();
    let mut total = 0usize;

    for (i, message) in messages.iter().enumerate().rev() {
        if total >= needed {
            break;
        }
        let mut lines = message_lines(message, width);
        if i > 0 {
            // Separator above every message but the first.
            lines.insert(0, Line::default());
        }
        total += lines.len();
        blocks.push(lines);
    }
    let wrapped = blocks.len();

    let all: Vec<Line<'static>> = blocks.into_iter().rev().flatten().collect();
    let scroll = scroll.min(all.len().saturating_sub(height));
    let end = all.len() - scroll;
    let start = end.saturating_sub(height);

    Viewport {
        lines: all[start..end].to_vec(),
        scroll,
        wrapped,
    }
}

/// Label line followed by the wrapped, indented body.
fn message_lines(message: &Message, width: usize) -> Vec<Line<'static>> {
    let (label, label_color) = match message.role {
        Role::User => ("You", THEME.user_label),
        Role::Bot => ("ChatGPT", THEME.bot_label),
    };
    let mut lines = vec![Line::from(Span::styled(
        label,
        Style::default()
            .fg(label_color)
            .add_modifier(Modifier::BOLD),
    ))];

    let body_style = if message.failed {
        Style::default().fg(THEME.error)
    } else {
        Style::default().fg(THEME.fg)
    };
    if message.content.is_empty() {
        lines.push(Line::from(Span::styled(
            format!("{INDENT}…"),
            Style::default().fg(THEME.fg_muted),
        )));
        return lines;
    }

    let body_width = width.saturating_sub(INDENT.len()).max(1);
    lines.extend(
        wrap_text(&message.content, body_width)
            .into_iter()
            .map(|row| Line::from(Span::styled(format!("{INDENT}{row}"), body_style))),
    );
    lines
}

/// Word-wraps `text` to `width` display columns. Explicit newlines are kept;
/// words wider than `width` are split between characters.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut rows = Vec::new();

    for paragraph in text.split('\n') {
        let mut row = String::new();
        let mut row_width = 0usize;

        for word in paragraph.split(' ') {
            let word_width = word.width();
            let gap = usize::from(!row.is_empty());

            if row_width + gap + word_width <= width {
                if gap == 1 {
                    row.push(' ');
                }
                row.push_str(word);
                row_width += gap + word_width;
                continue;
            }

            if !row.is_empty() {
                rows.push(std::mem::take(&mut row));
                row_width = 0;
            }
            for c in word.chars() {
                let w = c.width().unwrap_or(0);
                if row_width + w > width && !row.is_empty() {
                    rows.push(std::mem::take(&mut row));
                    row_width = 0;
                }
                row.push(c);
                row_width += w;
            }
        }
        rows.push(row);
    }
    rows
}
