//! Header dropdown choosing between the two model versions.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem},
};

use super::theme::THEME;

/// One selectable model version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelVersion {
    /// Value persisted under `gptVersion`.
    pub key: &'static str,
    /// Label shown in the header.
    pub title: &'static str,
}

/// Entries in display order; the first is the default.
pub const MODEL_VERSIONS: [ModelVersion; 2] = [
    ModelVersion {
        key: "3.5",
        title: "GPT-3.5",
    },
    ModelVersion {
        key: "4",
        title: "GPT-4",
    },
];

/// What a key press did to the dropdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorOutcome {
    /// Dropdown is closed; the key belongs to someone else.
    Ignored,
    /// Key was handled by the open dropdown.
    Consumed,
    /// User picked an entry; the dropdown closed.
    Chosen(&'static str),
}

/// Dropdown state. The persisted key is kept verbatim so that an unknown
/// stored value still resolves to the default model.
#[derive(Debug, Clone)]
pub struct ModelSelector {
    key: String,
    open: bool,
    highlighted: usize,
}

impl Default for ModelSelector {
    fn default() -> Self {
        Self::new(None)
    }
}

impl ModelSelector {
    /// Selector restored from a stored key (`None` → default entry).
    pub fn new(stored: Option<String>) -> Self {
        let key = stored.unwrap_or_else(|| MODEL_VERSIONS[0].key.to_string());
        Self {
            key,
            open: false,
            highlighted: 0,
        }
    }

    /// Raw selected key, as persisted.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Entry shown for the current key; unknown keys display as the default.
    pub fn current(&self) -> ModelVersion {
        MODEL_VERSIONS
            .iter()
            .copied()
            .find(|v| v.key == self.key)
            .unwrap_or(MODEL_VERSIONS[0])
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn open(&mut self) {
        self.highlighted = MODEL_VERSIONS
            .iter()
            .position(|v| v.key == self.current().key)
            .unwrap_or(0);
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    /// Sets the selected key without touching the dropdown.
    pub fn set(&mut self, key: &str) {
        self.key = key.to_string();
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> SelectorOutcome {
        if !self.open {
            return SelectorOutcome::Ignored;
        }
        match key.code {
            KeyCode::Up => {
                self.highlighted = self.highlighted.saturating_sub(1);
            }
            KeyCode::Down => {
                self.highlighted = (self.highlighted + 1).min(MODEL_VERSIONS.len() - 1);
            }
            KeyCode::Enter => {
                let chosen = MODEL_VERSIONS[self.highlighted].key;
                self.key = chosen.to_string();
                self.close();
                return SelectorOutcome::Chosen(chosen);
            }
            KeyCode::Esc => self.close(),
            _ => {}
        }
        SelectorOutcome::Consumed
    }

    /// Header label, e.g. `GPT-3.5 ▾`.
    pub fn label(&self) -> String {
        let arrow = if self.open { '▴' } else { '▾' };
        format!("{} {arrow}", self.current().title)
    }

    /// Draws the open dropdown anchored below `anchor` (the header label).
    pub fn render_dropdown(&self, frame: &mut Frame<'_>, anchor: Rect, bounds: Rect) {
        if !self.open {
            return;
        }
        let width = 18.min(bounds.width);
        let height = (MODEL_VERSIONS.len() as u16 + 2).min(bounds.height);
        let x = anchor
            .x
            .min(bounds.x + bounds.width.saturating_sub(width));
        let y = (anchor.y + 1).min(bounds.y + bounds.height.saturating_sub(height));
        let area = Rect::new(x, y, width, height);

        frame.render_widget(Clear, area);

        let selected = self.current().key;
        let items: Vec<ListItem<'_>> = MODEL_VERSIONS
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let marker = if v.key == selected { "✓ " } else { "  " };
                let mut style = Style::default().fg(THEME.fg);
                if i == self.highlighted {
                    style = style
                        .fg(THEME.dropdown_selected)
                        .add_modifier(Modifier::BOLD);
                }
                ListItem::new(Line::from(Span::styled(format!("{marker}{}", v.title), style)))
            })
            .collect();

        let list = List::new(items).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(THEME.border_active))
                .title(" Model "),
        );
        frame.render_widget(list, area);
    }
}
