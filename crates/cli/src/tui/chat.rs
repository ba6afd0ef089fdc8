//! Chat screen: credential gate, submission flow, fragment handling and layout.

use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use llm::{ChatClient, ChatRequest, StreamHandle};
use proto::{ChatEvent, Conversation, Message, ScreenError};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Flex, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::Paragraph,
};
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use super::app::Route;
use super::ideas::MessageIdeas;
use super::input::InputBar;
use super::list::MessageList;
use super::selector::{ModelSelector, SelectorOutcome};
use super::theme::THEME;
use crate::config::ModelsConfig;
use crate::store::{Credentials, GPT_VERSION, KeyValueStore};

/// Spinner animation frames (Braille pattern).
const SPINNER: &[char] = &['⣾', '⣽', '⣻', '⢿', '⡿', '⣟', '⣯', '⣷'];

/// Rows scrolled by PgUp/PgDn.
const PAGE_ROWS: usize = 10;

/// Builds the chat client from stored credentials.
pub type ClientFactory = Box<dyn Fn(&Credentials) -> Arc<dyn ChatClient>>;

/// Outcome of the credential check performed before every render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Credentials are present and the client exists.
    Ready,
    /// Screen must not render; navigate to the given route instead.
    Redirect(Route),
}

/// What the router should do after a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenAction {
    None,
    Quit,
    OpenSettings,
}

/// State of one mounted chat screen.
pub struct ChatScreen {
    factory: ClientFactory,
    /// Built once, the first time the gate passes.
    client: Option<Arc<dyn ChatClient>>,
    /// Listener registered with the client, until the event loop takes it.
    subscription: Option<mpsc::UnboundedReceiver<ChatEvent>>,
    preferences: Box<dyn KeyValueStore>,
    models: ModelsConfig,
    include_history: bool,

    conversation: Conversation,
    /// Stream whose events are currently applied. At most one.
    active: Option<StreamHandle>,

    selector: ModelSelector,
    ideas: MessageIdeas,
    list: MessageList,
    input: InputBar,
    /// Last transient message for the status line.
    notice: Option<String>,
    spinner_tick: u8,
}

impl ChatScreen {
    /// Mounts the screen. The selected model is restored from `preferences`.
    pub fn new(
        factory: ClientFactory,
        preferences: Box<dyn KeyValueStore>,
        models: ModelsConfig,
        include_history: bool,
    ) -> Self {
        let selector = ModelSelector::new(preferences.get_string(GPT_VERSION));
        debug!(version = %selector.key(), "Chat screen mounted");
        Self {
            factory,
            client: None,
            subscription: None,
            preferences,
            models,
            include_history,
            conversation: Conversation::new(),
            active: None,
            selector,
            ideas: MessageIdeas::default(),
            list: MessageList::default(),
            input: InputBar::new(),
            notice: None,
            spinner_tick: 0,
        }
    }

    // ── Gate ─────────────────────────────────────────────────

    /// Checks credentials; builds the client and registers the listener the
    /// first time they are present.
    pub fn gate(&mut self, credentials: &dyn KeyValueStore) -> Gate {
        let Some(creds) = Credentials::read(credentials) else {
            trace!("Credentials missing, redirecting to settings");
            return Gate::Redirect(Route::Settings);
        };
        if self.client.is_none() {
            let client = (self.factory)(&creds);
            self.subscription = Some(client.events().add_listener());
            debug!("Chat client created, listener registered");
            self.client = Some(client);
        }
        Gate::Ready
    }

    /// Hands the fragment listener to the event loop.
    pub fn take_subscription(&mut self) -> Option<mpsc::UnboundedReceiver<ChatEvent>> {
        self.subscription.take()
    }

    // ── Submission ───────────────────────────────────────────

    /// Appends the user's text and an empty reply, then starts streaming.
    /// The text is stored and sent exactly as given; whitespace-only text is
    /// rejected.
    pub fn submit(&mut self, text: &str) -> Result<(), ScreenError> {
        if text.trim().is_empty() {
            return Err(ScreenError::EmptyInput);
        }
        let Some(client) = self.client.clone() else {
            return Err(ScreenError::Unconfigured);
        };
        if self.active.is_some() {
            return Err(ScreenError::StreamActive);
        }

        let mut messages: Vec<Message> = if self.include_history {
            self.conversation
                .messages()
                .iter()
                .filter(|m| !m.failed && !m.content.is_empty())
                .cloned()
                .collect()
        } else {
            Vec::new()
        };
        messages.push(Message::user(text));

        self.conversation.begin_exchange(text);
        self.ideas.clear_focus();
        self.list.scroll_to_bottom();
        self.notice = None;

        let model = self.current_model().to_string();
        debug!(model = %model, prompt_messages = messages.len(), "Submitting message");

        match client.stream(ChatRequest { messages, model }) {
            Ok(handle) => {
                debug!(stream = %handle.id(), "Stream started");
                self.active = Some(handle);
                Ok(())
            }
            Err(e) => {
                warn!("Failed to start stream: {e}");
                self.conversation.fail_last(&e.to_string());
                Err(ScreenError::Llm(e))
            }
        }
    }

    /// Applies one event from the listener. Events of any stream other than
    /// the active one are dropped.
    pub fn on_chat_event(&mut self, event: ChatEvent) {
        let Some(active) = self.active.as_ref() else {
            trace!(stream = %event.stream_id(), "Event with no active stream ignored");
            return;
        };
        if event.stream_id() != active.id() {
            trace!(stream = %event.stream_id(), active = %active.id(), "Stale event ignored");
            return;
        }

        match event {
            ChatEvent::Chunk { payload, .. } => {
                if let Some(delta) = payload.first_delta() {
                    self.conversation.append_to_last(delta);
                }
            }
            ChatEvent::Done { stream_id } => {
                debug!(stream = %stream_id, "Stream finished");
                self.active = None;
            }
            ChatEvent::Failed { stream_id, error } => {
                debug!(stream = %stream_id, "Stream failed");
                self.conversation.fail_last(&error);
                self.active = None;
            }
        }
    }

    /// Cancels the active stream, keeping whatever text already arrived.
    pub fn stop(&mut self) -> bool {
        let Some(mut handle) = self.active.take() else {
            return false;
        };
        handle.cancel();
        if self.conversation.last().is_some_and(|m| m.content.is_empty()) {
            self.conversation.fail_last("stopped before a reply arrived");
        }
        debug!(stream = %handle.id(), "Stream stopped by user");
        true
    }

    /// Removes the listener and cancels any in-flight stream. Safe to call
    /// more than once; also runs on drop.
    pub fn unmount(&mut self) {
        if let Some(mut handle) = self.active.take() {
            handle.cancel();
        }
        self.subscription = None;
        if let Some(client) = &self.client
            && client.events().remove_listener()
        {
            debug!("Chat listener removed");
        }
    }

    // ── Model selection ──────────────────────────────────────

    /// Selects a model version and persists it.
    pub fn select_model(&mut self, key: &str) {
        self.selector.set(key);
        if let Err(e) = self.preferences.set_string(GPT_VERSION, key) {
            warn!("Failed to persist model selection: {e}");
            self.notice = Some(format!("Could not save model choice: {e}"));
        }
        debug!(version = %key, model = %self.models.resolve(key), "Model selected");
    }

    /// Model name the next request would use.
    pub fn current_model(&self) -> &str {
        self.models.resolve(self.selector.key())
    }

    // ── Accessors ────────────────────────────────────────────

    pub fn is_streaming(&self) -> bool {
        self.active.is_some()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Advances the spinner animation.
    pub fn tick(&mut self) {
        self.spinner_tick = self.spinner_tick.wrapping_add(1);
    }

    // ── Input handling ───────────────────────────────────────

    pub fn handle_key(&mut self, key: KeyEvent) -> ScreenAction {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return ScreenAction::Quit;
        }

        match self.selector.handle_key(key) {
            SelectorOutcome::Ignored => {}
            SelectorOutcome::Consumed => return ScreenAction::None,
            SelectorOutcome::Chosen(version) => {
                self.select_model(version);
                return ScreenAction::None;
            }
        }

        match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('t')) => self.selector.open(),
            (KeyModifiers::CONTROL, KeyCode::Char('s')) => return ScreenAction::OpenSettings,
            (_, KeyCode::Esc) => {
                if self.stop() {
                    self.notice = Some("Response stopped".to_string());
                } else if self.ideas.focused().is_some() {
                    self.ideas.clear_focus();
                } else {
                    return ScreenAction::Quit;
                }
            }
            (_, KeyCode::Tab) if self.conversation.is_empty() => self.ideas.focus_next(),
            (_, KeyCode::Enter) => self.submit_from_keyboard(),
            (_, KeyCode::Up) => self.list.scroll_up(1),
            (_, KeyCode::Down) => self.list.scroll_down(1),
            (_, KeyCode::PageUp) => self.list.scroll_up(PAGE_ROWS),
            (_, KeyCode::PageDown) => self.list.scroll_down(PAGE_ROWS),
            _ => {
                if self.input.handle_key(key) {
                    self.ideas.clear_focus();
                }
            }
        }
        ScreenAction::None
    }

    fn submit_from_keyboard(&mut self) {
        let from_card = self.ideas.selected_prompt();
        let text = from_card.clone().unwrap_or_else(|| self.input.text().to_string());
        match self.submit(&text) {
            Ok(()) => {
                if from_card.is_none() {
                    self.input.take();
                }
            }
            Err(ScreenError::EmptyInput) => {}
            Err(e) => self.notice = Some(e.to_string()),
        }
    }

    // ── Rendering ────────────────────────────────────────────

    /// Layout: header(1) | body(fill) | input(3) | status(1)
    pub fn render(&mut self, frame: &mut Frame<'_>, area: Rect) {
        let chunks = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(area);

        let label_area = self.render_header(frame, chunks[0]);
        if self.conversation.is_empty() {
            self.render_empty(frame, chunks[1]);
        } else {
            self.list.render(frame, chunks[1], self.conversation.messages());
        }
        self.input.render(
            frame,
            chunks[2],
            "Message",
            "Message ChatGPT…",
            !self.selector.is_open() && self.ideas.focused().is_none(),
            false,
        );
        self.render_status(frame, chunks[3]);
        self.selector.render_dropdown(frame, label_area, area);
    }

    /// Returns the area of the model label, used to anchor the dropdown.
    fn render_header(&self, frame: &mut Frame<'_>, area: Rect) -> Rect {
        let label = self.selector.label();
        let title = "ChatGPT";
        let label_width = u16::try_from(label.chars().count() + 2).unwrap_or(u16::MAX);
        let title_width = u16::try_from(title.len() + 2).unwrap_or(u16::MAX);

        let [title_area, label_area] = Layout::horizontal([
            Constraint::Length(title_width),
            Constraint::Length(label_width),
        ])
        .flex(Flex::Center)
        .areas(area);

        frame.render_widget(
            Paragraph::new(Span::styled(
                format!(" {title} "),
                Style::default()
                    .fg(THEME.accent)
                    .add_modifier(Modifier::BOLD),
            )),
            title_area,
        );
        let label_style = if self.selector.is_open() {
            Style::default().fg(THEME.dropdown_selected)
        } else {
            Style::default().fg(THEME.fg_dim)
        };
        frame.render_widget(
            Paragraph::new(Span::styled(format!(" {label} "), label_style)),
            label_area,
        );
        label_area
    }

    fn render_empty(&self, frame: &mut Frame<'_>, area: Rect) {
        let [logo_area, cards_area] =
            Layout::vertical([Constraint::Length(7), Constraint::Length(5)])
                .flex(Flex::Center)
                .spacing(1)
                .areas(area);

        let logo_str = concat!(
            "   ▄▄▀▀▀▀▄▄   \n",
            " ▄▀  ▄▄▄▄  ▀▄ \n",
            " █  █    █  █ \n",
            " ▀▄  ▀▀▀▀  ▄▀ \n",
            "   ▀▀▄▄▄▄▀▀   \n",
        );
        let mut logo = Text::styled(
            logo_str,
            Style::default().fg(THEME.logo).add_modifier(Modifier::BOLD),
        );
        logo.push_line(Line::from(""));
        logo.push_line(Line::from(Span::styled(
            "How can I help you today?",
            Style::default().fg(THEME.fg_dim),
        )));
        frame.render_widget(Paragraph::new(logo).alignment(Alignment::Center), logo_area);

        self.ideas.render(frame, cards_area);
    }

    fn render_status(&self, frame: &mut Frame<'_>, area: Rect) {
        let mut spans = Vec::new();
        if self.is_streaming() {
            let spinner = SPINNER[usize::from(self.spinner_tick) % SPINNER.len()];
            spans.push(Span::styled(
                format!(" {spinner} Streaming… "),
                Style::default().fg(THEME.spinner),
            ));
            spans.push(Span::styled(
                "Esc:stop  ",
                Style::default().fg(THEME.fg_muted),
            ));
        } else if self.conversation.is_empty() {
            spans.push(Span::styled(
                " Enter:send  Tab:ideas  Ctrl+T:model  Ctrl+S:settings  Esc:quit  ",
                Style::default().fg(THEME.fg_muted),
            ));
        } else {
            spans.push(Span::styled(
                " Enter:send  ↑↓:scroll  Ctrl+T:model  Ctrl+S:settings  Esc:quit  ",
                Style::default().fg(THEME.fg_muted),
            ));
        }
        if let Some(notice) = self.notice() {
            spans.push(Span::styled(notice.to_string(), Style::default().fg(THEME.warning)));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}

#[cfg(test)]
impl ChatScreen {
    pub fn messages(&self) -> &[Message] {
        self.conversation.messages()
    }
}

impl Drop for ChatScreen {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::store::{API_KEY, MemoryStore, ORGANIZATION};
    use llm::ChatEvents;
    use proto::{ChunkPayload, LlmError, Role, StreamId};
    use ratatui::{Terminal, backend::TestBackend};

    /// Client that records requests and lets the test drive the events.
    #[derive(Default)]
    struct ScriptedClient {
        events: ChatEvents,
        requests: Mutex<Vec<ChatRequest>>,
        refuse: bool,
    }

    impl ScriptedClient {
        fn requests(&self) -> Vec<ChatRequest> {
            self.requests.lock().unwrap().clone()
        }

        fn chunk(&self, id: StreamId, text: &str) {
            self.events.emit(ChatEvent::Chunk {
                stream_id: id,
                payload: ChunkPayload::text(text),
            });
        }
    }

    impl ChatClient for ScriptedClient {
        fn events(&self) -> &ChatEvents {
            &self.events
        }

        fn stream(&self, request: ChatRequest) -> Result<StreamHandle, LlmError> {
            if self.refuse {
                return Err(LlmError::Api("connection refused".into()));
            }
            self.requests.lock().unwrap().push(request);
            Ok(StreamHandle::detached(self.events.next_stream_id()))
        }
    }

    struct Harness {
        screen: ChatScreen,
        client: Arc<ScriptedClient>,
        builds: Arc<AtomicUsize>,
        rx: Option<mpsc::UnboundedReceiver<ChatEvent>>,
    }

    impl Harness {
        fn with_client(client: ScriptedClient, preferences: MemoryStore, history: bool) -> Self {
            let client = Arc::new(client);
            let builds = Arc::new(AtomicUsize::new(0));
            let factory: ClientFactory = {
                let client = client.clone();
                let builds = builds.clone();
                Box::new(move |_creds: &Credentials| {
                    builds.fetch_add(1, Ordering::SeqCst);
                    client.clone() as Arc<dyn ChatClient>
                })
            };
            let screen = ChatScreen::new(
                factory,
                Box::new(preferences),
                ModelsConfig::default(),
                history,
            );
            Self {
                screen,
                client,
                builds,
                rx: None,
            }
        }

        fn new() -> Self {
            Self::with_client(ScriptedClient::default(), MemoryStore::default(), false)
        }

        /// Passes the gate and takes the listener, like the event loop does.
        fn ready(mut self) -> Self {
            assert_eq!(self.screen.gate(&credentials()), Gate::Ready);
            self.rx = self.screen.take_subscription();
            assert!(self.rx.is_some());
            self
        }

        /// Delivers everything queued on the listener.
        fn pump(&mut self) {
            let rx = self.rx.as_mut().expect("subscribed");
            while let Ok(event) = rx.try_recv() {
                self.screen.on_chat_event(event);
            }
        }

        fn last_stream(&self) -> StreamId {
            self.screen.active.as_ref().expect("active stream").id()
        }
    }

    fn credentials() -> MemoryStore {
        MemoryStore::with(&[(API_KEY, "sk-test"), (ORGANIZATION, "org-test")])
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    #[test]
    fn gate_redirects_without_credentials_and_builds_nothing() {
        let mut h = Harness::new();
        assert_eq!(
            h.screen.gate(&MemoryStore::default()),
            Gate::Redirect(Route::Settings)
        );
        assert_eq!(
            h.screen.gate(&MemoryStore::with(&[(API_KEY, "sk")])),
            Gate::Redirect(Route::Settings)
        );
        assert_eq!(h.builds.load(Ordering::SeqCst), 0);
        assert!(h.screen.take_subscription().is_none());
        assert!(matches!(
            h.screen.submit("Hello"),
            Err(ScreenError::Unconfigured)
        ));
        assert!(h.screen.messages().is_empty());
    }

    #[test]
    fn client_is_built_once_per_mount() {
        let mut h = Harness::new();
        for _ in 0..3 {
            assert_eq!(h.screen.gate(&credentials()), Gate::Ready);
        }
        assert_eq!(h.builds.load(Ordering::SeqCst), 1);
        assert!(h.client.events.has_listener());
    }

    #[test]
    fn gate_redirects_again_when_credentials_are_cleared() {
        let mut h = Harness::new().ready();
        assert_eq!(
            h.screen.gate(&MemoryStore::default()),
            Gate::Redirect(Route::Settings)
        );
    }

    #[test]
    fn each_submission_adds_user_and_placeholder() {
        let mut h = Harness::new().ready();
        h.screen.submit("Hello").expect("submit");
        assert_eq!(h.screen.messages().len(), 2);
        assert_eq!(h.screen.messages()[0], Message::user("Hello"));
        assert_eq!(h.screen.messages()[1], Message::placeholder());

        let id = h.last_stream();
        h.client.events.emit(ChatEvent::Done { stream_id: id });
        h.pump();
        h.screen.submit("Again").expect("second submit");
        assert_eq!(h.screen.messages().len(), 4);
    }

    #[test]
    fn submitted_text_is_kept_verbatim() {
        let mut h = Harness::new().ready();
        h.screen.submit("  Hello  ").expect("submit");
        assert_eq!(h.screen.messages()[0], Message::user("  Hello  "));
        assert_eq!(
            h.client.requests()[0].messages,
            vec![Message::user("  Hello  ")]
        );
    }

    #[test]
    fn empty_input_changes_nothing() {
        let mut h = Harness::new().ready();
        assert!(matches!(h.screen.submit("   "), Err(ScreenError::EmptyInput)));
        assert!(h.screen.messages().is_empty());
        assert!(h.client.requests().is_empty());
    }

    #[test]
    fn hello_hi_scenario() {
        let mut h = Harness::new().ready();
        h.screen.submit("Hello").expect("submit");
        let id = h.last_stream();
        h.client.chunk(id, "Hi");
        h.client.chunk(id, "!");
        h.client.events.emit(ChatEvent::Done { stream_id: id });
        h.pump();

        assert_eq!(
            h.screen.messages(),
            &[Message::user("Hello"), Message::bot("Hi!")]
        );
        assert!(!h.screen.is_streaming());

        let requests = h.client.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].messages, vec![Message::user("Hello")]);
        assert_eq!(requests[0].model, "gpt-3.5-turbo");
    }

    #[test]
    fn fragments_concatenate_in_delivery_order() {
        let mut h = Harness::new().ready();
        h.screen.submit("Count").expect("submit");
        let id = h.last_stream();
        for part in ["1", ", 2", "", ", 3"] {
            h.client.chunk(id, part);
        }
        h.client.events.emit(ChatEvent::Chunk {
            stream_id: id,
            payload: ChunkPayload::default(),
        });
        h.pump();
        assert_eq!(h.screen.messages()[1].content, "1, 2, 3");
        assert!(h.screen.is_streaming());
    }

    #[test]
    fn second_submission_while_streaming_is_rejected() {
        let mut h = Harness::new().ready();
        h.screen.submit("First").expect("submit");
        assert!(matches!(
            h.screen.submit("Second"),
            Err(ScreenError::StreamActive)
        ));
        assert_eq!(h.screen.messages().len(), 2);
        assert_eq!(h.client.requests().len(), 1);
    }

    #[test]
    fn stream_failure_replaces_placeholder() {
        let mut h = Harness::new().ready();
        h.screen.submit("Hello").expect("submit");
        let id = h.last_stream();
        h.client.chunk(id, "Hal");
        h.client.events.emit(ChatEvent::Failed {
            stream_id: id,
            error: "quota exceeded".into(),
        });
        h.pump();

        let last = &h.screen.messages()[1];
        assert_eq!(last.role, Role::Bot);
        assert!(last.failed);
        assert_eq!(last.content, "Hal\n\nError: quota exceeded");
        assert!(!h.screen.is_streaming());
    }

    #[test]
    fn synchronous_stream_error_fails_placeholder() {
        let client = ScriptedClient {
            refuse: true,
            ..ScriptedClient::default()
        };
        let mut h = Harness::with_client(client, MemoryStore::default(), false).ready();
        let err = h.screen.submit("Hello").expect_err("refused");
        assert!(matches!(err, ScreenError::Llm(_)));
        assert_eq!(h.screen.messages().len(), 2);
        assert!(h.screen.messages()[1].failed);
        assert!(!h.screen.is_streaming());
    }

    #[test]
    fn stale_stream_events_are_ignored() {
        let mut h = Harness::new().ready();
        h.screen.submit("First").expect("submit");
        let first = h.last_stream();
        assert!(h.screen.stop());

        h.screen.submit("Second").expect("submit");
        let second = h.last_stream();
        h.client.chunk(first, "late");
        h.client.events.emit(ChatEvent::Done { stream_id: first });
        h.client.chunk(second, "fresh");
        h.pump();

        assert_eq!(h.screen.messages()[3].content, "fresh");
        assert!(h.screen.is_streaming());
        assert!(h.screen.messages()[1].failed);
    }

    #[test]
    fn events_without_active_stream_are_ignored() {
        let mut h = Harness::new().ready();
        h.screen.on_chat_event(ChatEvent::Chunk {
            stream_id: StreamId(9),
            payload: ChunkPayload::text("orphan"),
        });
        assert!(h.screen.messages().is_empty());
    }

    #[test]
    fn stop_keeps_partial_text() {
        let mut h = Harness::new().ready();
        h.screen.submit("Hello").expect("submit");
        let id = h.last_stream();
        h.client.chunk(id, "Partial");
        h.pump();
        assert!(h.screen.stop());
        assert!(!h.screen.stop());
        assert_eq!(h.screen.messages()[1], Message::bot("Partial"));
    }

    #[test]
    fn include_history_sends_completed_messages_first() {
        let mut h =
            Harness::with_client(ScriptedClient::default(), MemoryStore::default(), true).ready();
        h.screen.submit("Hello").expect("submit");
        let id = h.last_stream();
        h.client.chunk(id, "Hi!");
        h.client.events.emit(ChatEvent::Done { stream_id: id });
        h.pump();
        h.screen.submit("How are you?").expect("submit");

        let requests = h.client.requests();
        assert_eq!(
            requests[1].messages,
            vec![
                Message::user("Hello"),
                Message::bot("Hi!"),
                Message::user("How are you?"),
            ]
        );
    }

    #[test]
    fn selector_persists_and_maps_model() {
        let mut h = Harness::new().ready();
        h.screen.handle_key(ctrl('t'));
        h.screen.handle_key(key(KeyCode::Down));
        h.screen.handle_key(key(KeyCode::Enter));
        assert_eq!(h.screen.current_model(), "gpt-4");
        assert_eq!(
            h.screen.preferences.get_string(GPT_VERSION).as_deref(),
            Some("4")
        );

        h.screen.submit("Hello").expect("submit");
        assert_eq!(h.client.requests()[0].model, "gpt-4");
    }

    #[test]
    fn stored_selection_is_restored_on_mount() {
        let prefs = MemoryStore::with(&[(GPT_VERSION, "4")]);
        let h = Harness::with_client(ScriptedClient::default(), prefs, false);
        assert_eq!(h.screen.current_model(), "gpt-4");

        let prefs = MemoryStore::with(&[(GPT_VERSION, "bogus")]);
        let h = Harness::with_client(ScriptedClient::default(), prefs, false);
        assert_eq!(h.screen.current_model(), "gpt-3.5-turbo");
    }

    #[test]
    fn unmount_is_idempotent_and_cancels() {
        let mut h = Harness::new().ready();
        h.screen.submit("Hello").expect("submit");
        h.screen.unmount();
        h.screen.unmount();
        assert!(!h.screen.is_streaming());
        assert!(!h.client.events.has_listener());
    }

    #[test]
    fn unmount_without_any_event_never_fails() {
        let mut h = Harness::new();
        h.screen.unmount();
        let mut h = Harness::new().ready();
        h.screen.unmount();
        drop(h.screen);
    }

    #[test]
    fn keyboard_submission_clears_input() {
        let mut h = Harness::new().ready();
        for c in "Hello".chars() {
            h.screen.handle_key(key(KeyCode::Char(c)));
        }
        h.screen.handle_key(key(KeyCode::Enter));
        assert_eq!(h.screen.messages()[0], Message::user("Hello"));
        assert!(h.screen.input.is_empty());
    }

    #[test]
    fn streaming_rejection_keeps_typed_text_and_sets_notice() {
        let mut h = Harness::new().ready();
        h.screen.submit("First").expect("submit");
        h.screen.handle_key(key(KeyCode::Char('x')));
        h.screen.handle_key(key(KeyCode::Enter));
        assert_eq!(h.screen.input.text(), "x");
        assert!(h.screen.notice().is_some_and(|n| n.contains("still streaming")));
    }

    #[test]
    fn suggestion_card_uses_submission_flow() {
        let mut h = Harness::new().ready();
        h.screen.handle_key(key(KeyCode::Tab));
        h.screen.handle_key(key(KeyCode::Enter));
        assert_eq!(
            h.screen.messages()[0].content,
            "Explain React Native like I'm five years old"
        );
        assert_eq!(h.screen.messages().len(), 2);
    }

    #[test]
    fn escape_stops_stream_then_quits() {
        let mut h = Harness::new().ready();
        h.screen.submit("Hello").expect("submit");
        assert_eq!(h.screen.handle_key(key(KeyCode::Esc)), ScreenAction::None);
        assert!(!h.screen.is_streaming());
        assert_eq!(h.screen.handle_key(key(KeyCode::Esc)), ScreenAction::Quit);
        assert_eq!(h.screen.handle_key(ctrl('s')), ScreenAction::OpenSettings);
    }

    fn draw(screen: &mut ChatScreen) -> String {
        let backend = TestBackend::new(100, 30);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|frame| screen.render(frame, frame.area()))
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn render_empty_state_shows_cards_not_list() {
        let mut h = Harness::new().ready();
        let rendered = draw(&mut h.screen);
        assert!(rendered.contains("How can I help you today?"));
        assert!(rendered.contains("Explain React Native"));
        assert!(rendered.contains("Recommend a dish"));
        assert!(!rendered.contains("You"));
    }

    #[test]
    fn render_conversation_replaces_cards() {
        let mut h = Harness::new().ready();
        h.screen.submit("Hello").expect("submit");
        let id = h.last_stream();
        h.client.chunk(id, "Hi there");
        h.pump();
        h.screen.tick();

        let rendered = draw(&mut h.screen);
        assert!(!rendered.contains("Explain React Native"));
        assert!(!rendered.contains("How can I help you today?"));
        assert!(rendered.contains("You"));
        assert!(rendered.contains("ChatGPT"));
        assert!(rendered.contains("Hi there"));
        assert!(rendered.contains("Streaming"));
    }

    #[test]
    fn render_open_dropdown_lists_both_models() {
        let mut h = Harness::new().ready();
        h.screen.handle_key(ctrl('t'));
        let rendered = draw(&mut h.screen);
        assert!(rendered.contains("Model"));
        assert!(rendered.contains("GPT-3.5"));
        assert!(rendered.contains("GPT-4"));
    }
}
