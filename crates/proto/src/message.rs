use serde::{Deserialize, Serialize};

/// Author of a conversation entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Text typed by the person at the keyboard.
    User,
    /// Text streamed back by the model.
    Bot,
}

impl Role {
    /// Role name understood by chat-completion APIs.
    pub fn wire_name(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Bot => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Bot => write!(f, "bot"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = crate::error::LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "bot" | "assistant" => Ok(Role::Bot),
            other => Err(crate::error::LlmError::InvalidResponse(format!(
                "unknown role '{other}'"
            ))),
        }
    }
}

/// One entry of a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who wrote it.
    pub role: Role,
    /// Text body; grows while a bot reply streams in.
    pub content: String,
    /// Set when the reply stream ended in an error.
    #[serde(default)]
    pub failed: bool,
}

impl Message {
    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            failed: false,
        }
    }

    /// Creates a bot message.
    pub fn bot(content: impl Into<String>) -> Self {
        Self {
            role: Role::Bot,
            content: content.into(),
            failed: false,
        }
    }

    /// Empty bot message waiting for streamed fragments.
    pub fn placeholder() -> Self {
        Self::bot(String::new())
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn role_display_and_parse_round_trip() {
        for role in [Role::User, Role::Bot] {
            let parsed = Role::from_str(&role.to_string()).expect("role should parse");
            assert_eq!(parsed, role);
        }
    }

    #[test]
    fn role_parse_accepts_wire_assistant_name() {
        assert_eq!(Role::from_str("assistant").expect("parse"), Role::Bot);
        assert!(Role::from_str("system").is_err());
    }

    #[test]
    fn wire_names_match_chat_completion_roles() {
        assert_eq!(Role::User.wire_name(), "user");
        assert_eq!(Role::Bot.wire_name(), "assistant");
    }

    #[test]
    fn placeholder_is_empty_bot_message() {
        let msg = Message::placeholder();
        assert_eq!(msg.role, Role::Bot);
        assert!(msg.content.is_empty());
        assert!(!msg.failed);
    }

    #[test]
    fn message_deserializes_without_failed_flag() {
        let msg: Message =
            serde_json::from_str(r#"{"role":"user","content":"hi"}"#).expect("deserialize");
        assert_eq!(msg, Message::user("hi"));
    }
}
