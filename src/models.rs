use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Title given to a conversation until one is suggested for it.
pub const PLACEHOLDER_TITLE: &str = "New Chat";

pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "You are a helpful assistant.";

/// Prefix that makes a failed exchange render as an error callout.
pub const ERROR_PREFIX: &str = "**Error:** ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self { role, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    /// Synthetic assistant turn carrying a failed request's error text.
    pub fn error(text: impl std::fmt::Display) -> Self {
        Self::assistant(format!("{ERROR_PREFIX}{text}"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl Conversation {
    pub fn new(id: i64) -> Self {
        Self { id, title: PLACEHOLDER_TITLE.to_string(), messages: Vec::new() }
    }

    pub fn has_placeholder_title(&self) -> bool {
        self.title == PLACEHOLDER_TITLE
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub api_key: String,
    pub system_instruction: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            system_instruction: DEFAULT_SYSTEM_INSTRUCTION.to_string(),
        }
    }
}

impl SessionSettings {
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

// ── Presentation contract ────────────────────────────────────────────────────

/// Read model handed to the front end after every intent.
#[derive(Debug, Clone, Serialize)]
pub struct ChatSnapshot {
    pub conversations: Vec<Arc<Conversation>>,
    pub current_index: usize,
    pub is_sending: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConversationMatch {
    pub index: usize,
    pub id: i64,
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct SettingsUpdate {
    pub api_key: Option<String>,
    pub system_instruction: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SettingsView {
    pub has_api_key: bool,
    pub system_instruction: String,
}

impl From<&SessionSettings> for SettingsView {
    fn from(s: &SessionSettings) -> Self {
        Self {
            has_api_key: s.has_api_key(),
            system_instruction: s.system_instruction.clone(),
        }
    }
}

/// Blocking notice raised instead of sending.
#[derive(Debug, Serialize)]
pub struct Notice {
    pub title: String,
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversation_serializes_with_lowercase_roles() {
        let mut conv = Conversation::new(7);
        conv.messages.push(Message::user("Hello"));
        conv.messages.push(Message::assistant("Hi there!"));

        let json = serde_json::to_value(&conv).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": 7,
                "title": "New Chat",
                "messages": [
                    {"role": "user", "content": "Hello"},
                    {"role": "assistant", "content": "Hi there!"}
                ]
            })
        );
    }

    #[test]
    fn error_message_is_prefixed() {
        let msg = Message::error("overloaded");
        assert_eq!(msg.role, MessageRole::Assistant);
        assert_eq!(msg.content, "**Error:** overloaded");
    }

    #[test]
    fn whitespace_key_is_not_configured() {
        let mut settings = SessionSettings {
            api_key: "   ".to_string(),
            ..SessionSettings::default()
        };
        assert!(!settings.has_api_key());

        settings.api_key = " abc ".to_string();
        assert!(settings.has_api_key());
    }
}
