//! OpenAI-compatible streaming client built on `async-openai`.

use async_openai::{
    Client,
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest,
        CreateChatCompletionRequestArgs, CreateChatCompletionStreamResponse,
    },
};
use futures_util::StreamExt;
use proto::{ChatEvent, ChoiceDelta, ChunkPayload, Delta, LlmError, Message, Role, StreamId};
use tracing::{debug, warn};

use crate::client::{ChatClient, ChatRequest, StreamHandle};
use crate::events::ChatEvents;

/// Streams chat completions from OpenAI (or any compatible endpoint).
pub struct OpenAiChatClient {
    client: Client<OpenAIConfig>,
    events: ChatEvents,
}

impl OpenAiChatClient {
    /// Creates a client for the default OpenAI API base URL.
    pub fn new(api_key: impl Into<String>, organization_id: impl Into<String>) -> Self {
        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_org_id(organization_id);
        Self {
            client: Client::with_config(config),
            events: ChatEvents::new(),
        }
    }

    /// Creates a client with a custom API base URL.
    pub fn with_base_url(
        api_key: impl Into<String>,
        organization_id: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_org_id(organization_id)
            .with_api_base(base_url);
        Self {
            client: Client::with_config(config),
            events: ChatEvents::new(),
        }
    }
}

impl ChatClient for OpenAiChatClient {
    fn events(&self) -> &ChatEvents {
        &self.events
    }

    fn stream(&self, req: ChatRequest) -> Result<StreamHandle, LlmError> {
        let request = build_request(&req)?;
        let stream_id = self.events.next_stream_id();
        debug!(
            stream = %stream_id,
            model = %req.model,
            messages = %req.messages.len(),
            "Starting chat stream"
        );

        let client = self.client.clone();
        let events = self.events.clone();
        let task = tokio::spawn(async move {
            run_stream(client, request, stream_id, events).await;
        });
        Ok(StreamHandle::new(stream_id, task))
    }
}

/// Drives one stream to completion, emitting every chunk as it arrives.
async fn run_stream(
    client: Client<OpenAIConfig>,
    request: CreateChatCompletionRequest,
    stream_id: StreamId,
    events: ChatEvents,
) {
    let mut stream = match client.chat().create_stream(request).await {
        Ok(stream) => stream,
        Err(e) => {
            let error = describe_error(e);
            warn!(stream = %stream_id, error = %error, "Chat stream failed to start");
            events.emit(ChatEvent::Failed { stream_id, error });
            return;
        }
    };

    let mut chunks = 0usize;
    while let Some(item) = stream.next().await {
        match item {
            Ok(chunk) => {
                chunks += 1;
                events.emit(ChatEvent::Chunk {
                    stream_id,
                    payload: convert_chunk(chunk),
                });
            }
            Err(e) => {
                let error = describe_error(e);
                warn!(stream = %stream_id, chunks, error = %error, "Chat stream failed");
                events.emit(ChatEvent::Failed { stream_id, error });
                return;
            }
        }
    }

    debug!(stream = %stream_id, chunks, "Chat stream finished");
    events.emit(ChatEvent::Done { stream_id });
}

/// Builds the streaming chat-completion request.
fn build_request(req: &ChatRequest) -> Result<CreateChatCompletionRequest, LlmError> {
    if req.model.trim().is_empty() {
        return Err(LlmError::Serialization("model must not be empty".to_string()));
    }
    let messages: Vec<ChatCompletionRequestMessage> = req
        .messages
        .iter()
        .map(convert_message)
        .collect::<Result<_, _>>()?;

    CreateChatCompletionRequestArgs::default()
        .model(&req.model)
        .messages(messages)
        .stream(true)
        .build()
        .map_err(|e| LlmError::Serialization(e.to_string()))
}

/// Converts a conversation message into OpenAI request format.
fn convert_message(m: &Message) -> Result<ChatCompletionRequestMessage, LlmError> {
    match m.role {
        Role::User => Ok(ChatCompletionRequestMessage::User(
            ChatCompletionRequestUserMessageArgs::default()
                .content(m.content.clone())
                .build()
                .map_err(|e| LlmError::Serialization(e.to_string()))?,
        )),
        Role::Bot => Ok(ChatCompletionRequestMessage::Assistant(
            ChatCompletionRequestAssistantMessageArgs::default()
                .content(m.content.clone())
                .build()
                .map_err(|e| LlmError::Serialization(e.to_string()))?,
        )),
    }
}

/// Keeps only what the screen consumes: each candidate's text delta.
fn convert_chunk(chunk: CreateChatCompletionStreamResponse) -> ChunkPayload {
    ChunkPayload {
        choices: chunk
            .choices
            .into_iter()
            .map(|choice| ChoiceDelta {
                delta: Delta {
                    content: choice.delta.content,
                },
            })
            .collect(),
    }
}

/// Renders a client error with a hint for the common account problems.
fn describe_error(e: OpenAIError) -> String {
    let msg = match e {
        OpenAIError::ApiError(api) => api.message,
        other => other.to_string(),
    };
    let lower = msg.to_lowercase();
    let hint = if lower.contains("does not exist") || lower.contains("model_not_found") {
        " Try switching the model with Ctrl+T."
    } else if lower.contains("billing") || lower.contains("quota") {
        " Check your OpenAI billing at https://platform.openai.com."
    } else if lower.contains("401") || lower.contains("api key") || lower.contains("auth") {
        " Check your API key and organization with Ctrl+S."
    } else {
        ""
    };
    format!("{msg}{hint}")
}
