//! Streaming chat client used by the chat screen.

pub mod client;
pub mod events;
pub mod openai;

/// Client trait, request type and cancellable stream handle.
pub use client::{ChatClient, ChatRequest, StreamHandle};
/// Single-listener event registry.
pub use events::ChatEvents;
/// OpenAI-compatible streaming client.
pub use openai::OpenAiChatClient;
