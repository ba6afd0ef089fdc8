//! Shared data model for the chat client and the chat screen.
//!
//! This crate defines the conversation types, the streaming event payloads
//! and strongly-typed error enums shared across the workspace.

pub mod conversation;
pub mod error;
pub mod event;
pub mod message;

/// Re-export of the append-only conversation.
pub use conversation::Conversation;
/// Re-export of all error types.
pub use error::*;
/// Re-export of streaming event types.
pub use event::{ChatEvent, ChoiceDelta, ChunkPayload, Delta, StreamId};
/// Re-export of message types.
pub use message::{Message, Role};
