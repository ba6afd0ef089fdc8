use thiserror::Error;

/// Top-level error type
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration loading/validation error.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// LLM provider error.
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// Key-value store error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Chat screen rejected an operation.
    #[error("Screen error: {0}")]
    Screen(#[from] ScreenError),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A field has an invalid value and reason.
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    /// Filesystem read error.
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse error.
    #[error("TOML parse error: {0}")]
    Toml(String),
}

/// LLM provider errors
#[derive(Debug, Clone, Error)]
pub enum LlmError {
    /// Remote API failure.
    #[error("{0}")]
    Api(String),

    /// Provider response schema/content was invalid.
    #[error("Invalid response from LLM: {0}")]
    InvalidResponse(String),

    /// Request could not be built or serialized.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Key-value store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem read/write error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored file is not valid TOML.
    #[error("TOML parse error: {0}")]
    Toml(String),

    /// Values could not be serialized back to disk.
    #[error("Serialize error: {0}")]
    Serialize(String),
}

/// Reasons the chat screen refuses a submission
#[derive(Debug, Error)]
pub enum ScreenError {
    /// Nothing to send after trimming.
    #[error("Message is empty")]
    EmptyInput,

    /// A previous response has not finished streaming.
    #[error("A response is still streaming. Press Esc to stop it first.")]
    StreamActive,

    /// Credentials are missing, so no chat client exists yet.
    #[error("API key and organization are not configured")]
    Unconfigured,

    /// The client refused to start the stream.
    #[error(transparent)]
    Llm(#[from] LlmError),
}
