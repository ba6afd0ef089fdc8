use serde::{Deserialize, Serialize};

/// Identifier the client assigns to each started stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StreamId(pub u64);

impl std::fmt::Display for StreamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "stream-{}", self.0)
    }
}

/// Incremental text of one candidate completion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delta {
    /// Text fragment, absent on role-only or final chunks.
    #[serde(default)]
    pub content: Option<String>,
}

/// One candidate inside a streamed chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceDelta {
    /// Fragment carried by this candidate.
    #[serde(default)]
    pub delta: Delta,
}

/// Payload of a "fragment received" event.
///
/// Shape-compatible with a chat-completion chunk, so the JSON of a chunk
/// deserializes straight into it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkPayload {
    /// Zero or more candidates; only the first is ever consulted.
    #[serde(default)]
    pub choices: Vec<ChoiceDelta>,
}

impl ChunkPayload {
    /// Payload with a single candidate carrying `text`.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            choices: vec![ChoiceDelta {
                delta: Delta {
                    content: Some(text.into()),
                },
            }],
        }
    }

    /// The first candidate's non-empty text delta.
    pub fn first_delta(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.delta.content.as_deref())
            .filter(|s| !s.is_empty())
    }
}

/// Events a chat client delivers to its registered listener
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// A fragment of the response arrived.
    Chunk {
        stream_id: StreamId,
        payload: ChunkPayload,
    },
    /// The stream finished normally.
    Done { stream_id: StreamId },
    /// The stream ended with an error.
    Failed { stream_id: StreamId, error: String },
}

impl ChatEvent {
    /// Stream this event belongs to.
    pub fn stream_id(&self) -> StreamId {
        match self {
            ChatEvent::Chunk { stream_id, .. }
            | ChatEvent::Done { stream_id }
            | ChatEvent::Failed { stream_id, .. } => *stream_id,
        }
    }
}
