//! Streaming chat client abstraction.

use proto::{LlmError, Message, StreamId};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::events::ChatEvents;

/// Request to start a streamed completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    /// Messages sent as the prompt, oldest first.
    pub messages: Vec<Message>,
    /// Target model id.
    pub model: String,
}

impl ChatRequest {
    /// Request carrying a single user message.
    pub fn single(text: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::user(text)],
            model: model.into(),
        }
    }
}

/// Streaming chat client.
///
/// `stream` returns as soon as the request is dispatched; the response
/// arrives later as [`proto::ChatEvent`]s on the listener registered with
/// [`ChatClient::events`].
pub trait ChatClient: Send + Sync {
    /// Listener registry this client emits to.
    fn events(&self) -> &ChatEvents;

    /// Starts a streamed completion.
    fn stream(&self, request: ChatRequest) -> Result<StreamHandle, LlmError>;
}

/// Owner of one in-flight stream.
///
/// Cancelling or dropping the handle aborts the network task; events already
/// delivered stay delivered.
#[derive(Debug)]
pub struct StreamHandle {
    id: StreamId,
    task: Option<JoinHandle<()>>,
}

impl StreamHandle {
    /// Wraps the task driving stream `id`.
    pub fn new(id: StreamId, task: JoinHandle<()>) -> Self {
        Self {
            id,
            task: Some(task),
        }
    }

    /// Handle for a stream with no background task (already complete or
    /// driven elsewhere).
    pub fn detached(id: StreamId) -> Self {
        Self { id, task: None }
    }

    /// Id carried by every event of this stream.
    pub fn id(&self) -> StreamId {
        self.id
    }

    /// Aborts the stream task. Safe to call more than once.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take()
            && !task.is_finished()
        {
            debug!(stream = %self.id, "Cancelling stream");
            task.abort();
        }
    }

    /// Whether the background task has stopped (or never existed).
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}
