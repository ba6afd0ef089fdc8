//! Append-only conversation owned by the chat screen.

use crate::message::{Message, Role};

/// Ordered list of messages; insertion order is the only order.
///
/// Only the last entry is ever mutated after it is pushed, and only while it
/// is a bot reply being filled in. Entries are never removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// Creates an empty conversation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the user's text followed by an empty bot placeholder.
    pub fn begin_exchange(&mut self, text: impl Into<String>) {
        self.messages.push(Message::user(text));
        self.messages.push(Message::placeholder());
    }

    /// Appends `delta` to the trailing bot message.
    ///
    /// Returns `false` (and leaves everything untouched) when the delta is
    /// empty or the last entry is not a bot message.
    pub fn append_to_last(&mut self, delta: &str) -> bool {
        if delta.is_empty() {
            return false;
        }
        match self.messages.last_mut() {
            Some(last) if last.role == Role::Bot => {
                last.content.push_str(delta);
                true
            }
            _ => false,
        }
    }

    /// Turns the trailing bot message into an error-state message.
    ///
    /// Partial content that already streamed in is kept above the error line.
    pub fn fail_last(&mut self, error: &str) -> bool {
        match self.messages.last_mut() {
            Some(last) if last.role == Role::Bot => {
                let notice = format!("Error: {error}");
                if last.content.is_empty() {
                    last.content = notice;
                } else {
                    last.content = format!("{}\n\n{notice}", last.content);
                }
                last.failed = true;
                true
            }
            _ => false,
        }
    }

    /// All messages in conversation order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Most recent message.
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether nothing has been sent yet.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
