//! Suggestion cards shown while the conversation is empty.

use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use super::theme::THEME;

/// A canned prompt. Sending a card submits `"{title} {subtitle}"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageIdea {
    pub title: &'static str,
    pub subtitle: &'static str,
}

impl MessageIdea {
    /// Text submitted when the card is chosen.
    pub fn prompt(&self) -> String {
        format!("{} {}", self.title, self.subtitle)
    }
}

pub const MESSAGE_IDEAS: [MessageIdea; 3] = [
    MessageIdea {
        title: "Explain React Native",
        subtitle: "like I'm five years old",
    },
    MessageIdea {
        title: "Suggest fun activities",
        subtitle: "for a family visiting San Francisco",
    },
    MessageIdea {
        title: "Recommend a dish",
        subtitle: "to impress a date who's a picky eater",
    },
];

/// Focus over the suggestion cards. `None` means the input bar has focus.
#[derive(Debug, Default, Clone)]
pub struct MessageIdeas {
    focused: Option<usize>,
}

impl MessageIdeas {
    pub fn focused(&self) -> Option<usize> {
        self.focused
    }

    /// Moves focus to the next card, wrapping back to the input bar after
    /// the last one.
    pub fn focus_next(&mut self) {
        self.focused = match self.focused {
            None => Some(0),
            Some(i) if i + 1 < MESSAGE_IDEAS.len() => Some(i + 1),
            Some(_) => None,
        };
    }

    pub fn clear_focus(&mut self) {
        self.focused = None;
    }

    /// Prompt of the focused card.
    pub fn selected_prompt(&self) -> Option<String> {
        self.focused.map(|i| MESSAGE_IDEAS[i].prompt())
    }

    pub fn render(&self, frame: &mut Frame<'_>, area: Rect) {
        let columns = Layout::horizontal([Constraint::Length(26); MESSAGE_IDEAS.len()])
            .flex(Flex::Center)
            .spacing(1)
            .split(area);

        for (i, (idea, cell)) in MESSAGE_IDEAS.iter().zip(columns.iter()).enumerate() {
            let border = if self.focused == Some(i) {
                THEME.border_active
            } else {
                THEME.border
            };
            let text = Text::from(vec![
                Line::from(Span::styled(
                    idea.title,
                    Style::default()
                        .fg(THEME.card_title)
                        .add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    idea.subtitle,
                    Style::default().fg(THEME.card_subtitle),
                )),
            ]);
            let card = Paragraph::new(text).wrap(Wrap { trim: true }).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(border)),
            );
            frame.render_widget(card, *cell);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{Terminal, backend::TestBackend};

    #[test]
    fn focus_cycles_through_cards_and_back_to_input() {
        let mut ideas = MessageIdeas::default();
        assert_eq!(ideas.selected_prompt(), None);
        ideas.focus_next();
        assert_eq!(ideas.focused(), Some(0));
        ideas.focus_next();
        ideas.focus_next();
        assert_eq!(ideas.focused(), Some(2));
        ideas.focus_next();
        assert_eq!(ideas.focused(), None);
    }

    #[test]
    fn selected_prompt_joins_title_and_subtitle() {
        let mut ideas = MessageIdeas::default();
        ideas.focus_next();
        assert_eq!(
            ideas.selected_prompt().as_deref(),
            Some("Explain React Native like I'm five years old")
        );
    }

    #[test]
    fn render_cards() {
        let mut ideas = MessageIdeas::default();
        ideas.focus_next();
        let backend = TestBackend::new(90, 6);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|frame| ideas.render(frame, frame.area()))
            .unwrap();
    }
}
