//! Screen router: chat or settings, with the credential gate in between.

use crossterm::event::KeyEvent;
use proto::ChatEvent;
use ratatui::Frame;
use tokio::sync::mpsc;
use tracing::debug;

use super::chat::{ChatScreen, Gate, ScreenAction};
use super::settings::{SettingsAction, SettingsScreen};
use crate::store::{Credentials, KeyValueStore};

/// Screens the router can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Chat,
    Settings,
}

/// Full state for the TUI session.
pub struct TuiApp {
    route: Route,
    credentials: Box<dyn KeyValueStore>,
    chat: ChatScreen,
    /// Present while the settings route is shown.
    settings: Option<SettingsScreen>,
    should_quit: bool,
}

impl TuiApp {
    pub fn new(chat: ChatScreen, credentials: Box<dyn KeyValueStore>) -> Self {
        let mut app = Self {
            route: Route::Chat,
            credentials,
            chat,
            settings: None,
            should_quit: false,
        };
        app.apply_gate();
        app
    }

    pub fn route(&self) -> Route {
        self.route
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    #[cfg(test)]
    pub fn chat(&self) -> &ChatScreen {
        &self.chat
    }

    /// Runs the chat gate while the chat route is shown, redirecting when it
    /// fails.
    pub fn apply_gate(&mut self) {
        if self.route != Route::Chat {
            return;
        }
        if let Gate::Redirect(route) = self.chat.gate(self.credentials.as_ref()) {
            debug!(?route, "Chat gate redirect");
            self.navigate(route);
        }
    }

    fn navigate(&mut self, route: Route) {
        self.settings = match route {
            Route::Settings => Some(SettingsScreen::new(self.credentials.as_ref())),
            Route::Chat => None,
        };
        self.route = route;
    }

    /// Fragment listener, once the chat client exists.
    pub fn take_subscription(&mut self) -> Option<mpsc::UnboundedReceiver<ChatEvent>> {
        self.chat.take_subscription()
    }

    pub fn on_chat_event(&mut self, event: ChatEvent) {
        self.chat.on_chat_event(event);
    }

    pub fn is_streaming(&self) -> bool {
        self.chat.is_streaming()
    }

    pub fn tick(&mut self) {
        self.chat.tick();
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        match self.route {
            Route::Chat => match self.chat.handle_key(key) {
                ScreenAction::None => {}
                ScreenAction::Quit => self.should_quit = true,
                ScreenAction::OpenSettings => self.navigate(Route::Settings),
            },
            Route::Settings => {
                let Some(settings) = self.settings.as_mut() else {
                    self.navigate(Route::Chat);
                    return;
                };
                match settings.handle_key(key, self.credentials.as_mut()) {
                    SettingsAction::None => {}
                    SettingsAction::Saved => {
                        self.navigate(Route::Chat);
                        self.apply_gate();
                    }
                    SettingsAction::Cancel => {
                        if Credentials::read(self.credentials.as_ref()).is_some() {
                            self.navigate(Route::Chat);
                        } else {
                            // Chat would only redirect back here.
                            self.should_quit = true;
                        }
                    }
                    SettingsAction::Quit => self.should_quit = true,
                }
            }
        }
    }

    /// Render the current route into the frame.
    pub fn render(&mut self, frame: &mut Frame<'_>) {
        self.apply_gate();
        let area = frame.area();
        match (self.route, self.settings.as_ref()) {
            (Route::Settings, Some(settings)) => settings.render(frame, area),
            _ => self.chat.render(frame, area),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::ModelsConfig;
    use crate::store::{API_KEY, MemoryStore, ORGANIZATION};
    use crossterm::event::{KeyCode, KeyModifiers};
    use llm::{ChatClient, ChatEvents, ChatRequest, StreamHandle};
    use proto::LlmError;
    use ratatui::{Terminal, backend::TestBackend};

    #[derive(Default)]
    struct IdleClient {
        events: ChatEvents,
    }

    impl ChatClient for IdleClient {
        fn events(&self) -> &ChatEvents {
            &self.events
        }

        fn stream(&self, _request: ChatRequest) -> Result<StreamHandle, LlmError> {
            Ok(StreamHandle::detached(self.events.next_stream_id()))
        }
    }

    fn app_with(credentials: MemoryStore) -> TuiApp {
        let chat = ChatScreen::new(
            Box::new(|_: &Credentials| Arc::new(IdleClient::default()) as Arc<dyn ChatClient>),
            Box::new(MemoryStore::default()),
            ModelsConfig::default(),
            false,
        );
        TuiApp::new(chat, Box::new(credentials))
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_str(app: &mut TuiApp, text: &str) {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn missing_credentials_redirect_to_settings() {
        let mut app = app_with(MemoryStore::default());
        assert_eq!(app.route(), Route::Settings);
        assert!(app.take_subscription().is_none());
    }

    #[test]
    fn saving_settings_returns_to_ready_chat() {
        let mut app = app_with(MemoryStore::default());
        type_str(&mut app, "sk-1");
        app.handle_key(key(KeyCode::Tab));
        type_str(&mut app, "org-1");
        app.handle_key(key(KeyCode::Enter));

        assert_eq!(app.route(), Route::Chat);
        assert!(app.take_subscription().is_some());
    }

    #[test]
    fn cancel_without_credentials_quits() {
        let mut app = app_with(MemoryStore::default());
        app.handle_key(key(KeyCode::Esc));
        assert!(app.should_quit());
    }

    #[test]
    fn ctrl_s_opens_settings_and_esc_returns() {
        let mut app = app_with(MemoryStore::with(&[(API_KEY, "sk"), (ORGANIZATION, "org")]));
        assert_eq!(app.route(), Route::Chat);
        app.handle_key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL));
        assert_eq!(app.route(), Route::Settings);
        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.route(), Route::Chat);
        assert!(!app.should_quit());
    }

    fn draw(app: &mut TuiApp) -> String {
        let backend = TestBackend::new(100, 30);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| app.render(frame)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn render_without_credentials_shows_only_settings() {
        let mut app = app_with(MemoryStore::default());
        let rendered = draw(&mut app);
        assert!(rendered.contains("Settings"));
        assert!(rendered.contains("API key"));
        assert!(!rendered.contains("How can I help you today?"));
        assert!(!rendered.contains("Message ChatGPT"));
        assert!(!rendered.contains("Explain React Native"));
    }

    #[test]
    fn render_chat_after_submit() {
        let mut app = app_with(MemoryStore::with(&[(API_KEY, "sk"), (ORGANIZATION, "org")]));
        type_str(&mut app, "Hello");
        app.handle_key(key(KeyCode::Enter));
        assert!(app.is_streaming());
        app.tick();

        let rendered = draw(&mut app);
        assert_eq!(app.chat().messages().len(), 2);
        assert!(rendered.contains("You"));
        assert!(rendered.contains("Hello"));
        assert!(!rendered.contains("Settings"));
    }
}
