//! Credential form: API key and organization id.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};
use tracing::{debug, warn};

use super::input::InputBar;
use super::theme::THEME;
use crate::store::{API_KEY, Credentials, KeyValueStore, ORGANIZATION};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    ApiKey,
    Organization,
}

/// What the router should do after a key press on the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsAction {
    None,
    /// Credentials were written; go back to chat.
    Saved,
    /// Leave without saving.
    Cancel,
    Quit,
}

pub struct SettingsScreen {
    api_key: InputBar,
    organization: InputBar,
    focus: Field,
    error: Option<String>,
}

impl SettingsScreen {
    /// Form pre-filled with whatever is currently stored.
    pub fn new(store: &dyn KeyValueStore) -> Self {
        Self {
            api_key: InputBar::with_text(store.get_string(API_KEY).unwrap_or_default()),
            organization: InputBar::with_text(store.get_string(ORGANIZATION).unwrap_or_default()),
            focus: Field::ApiKey,
            error: None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn focused_input(&mut self) -> &mut InputBar {
        match self.focus {
            Field::ApiKey => &mut self.api_key,
            Field::Organization => &mut self.organization,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, store: &mut dyn KeyValueStore) -> SettingsAction {
        match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('c')) => SettingsAction::Quit,
            (_, KeyCode::Esc) => SettingsAction::Cancel,
            (_, KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down) => {
                self.focus = match self.focus {
                    Field::ApiKey => Field::Organization,
                    Field::Organization => Field::ApiKey,
                };
                SettingsAction::None
            }
            (_, KeyCode::Enter) => self.save(store),
            _ => {
                if self.focused_input().handle_key(key) {
                    self.error = None;
                }
                SettingsAction::None
            }
        }
    }

    fn save(&mut self, store: &mut dyn KeyValueStore) -> SettingsAction {
        let api_key = self.api_key.text().trim();
        let organization_id = self.organization.text().trim();
        if api_key.is_empty() || organization_id.is_empty() {
            self.error = Some("Both the API key and the organization are required".to_string());
            return SettingsAction::None;
        }
        let creds = Credentials {
            api_key: api_key.to_string(),
            organization_id: organization_id.to_string(),
        };
        match creds.write(store) {
            Ok(()) => {
                debug!("Credentials saved");
                self.error = None;
                SettingsAction::Saved
            }
            Err(e) => {
                warn!("Failed to save credentials: {e}");
                self.error = Some(format!("Could not save credentials: {e}"));
                SettingsAction::None
            }
        }
    }

    pub fn render(&self, frame: &mut Frame<'_>, area: Rect) {
        let [column] = Layout::horizontal([Constraint::Length(64)])
            .flex(Flex::Center)
            .areas(area);
        let [title_area, key_area, org_area, message_area, hint_area] = Layout::vertical([
            Constraint::Length(2),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(2),
            Constraint::Length(1),
        ])
        .flex(Flex::Center)
        .areas(column);

        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                "Settings",
                Style::default()
                    .fg(THEME.accent)
                    .add_modifier(Modifier::BOLD),
            ))),
            title_area,
        );
        self.api_key.render(
            frame,
            key_area,
            "API key",
            "sk-…",
            self.focus == Field::ApiKey,
            true,
        );
        self.organization.render(
            frame,
            org_area,
            "Organization",
            "org-…",
            self.focus == Field::Organization,
            false,
        );
        if let Some(error) = self.error() {
            frame.render_widget(
                Paragraph::new(Span::styled(error.to_string(), Style::default().fg(THEME.error))),
                message_area,
            );
        }
        frame.render_widget(
            Paragraph::new(Span::styled(
                "Tab:next field  Enter:save  Esc:back",
                Style::default().fg(THEME.fg_muted),
            )),
            hint_area,
        );
    }
}
