use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{deserialize_id, deserialize_nullable_string, deserialize_timestamp};
use crate::sse::Usage;

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "SYSTEM",
            MessageRole::User => "USER",
            MessageRole::Assistant => "ASSISTANT",
        }
    }
}

/// A single entry of a conversation transcript.
///
/// Server copies carry the database id. Messages created locally while a
/// reply is in flight carry a temporary id until the next refetch replaces
/// them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: i64,
    pub role: MessageRole,
    #[serde(default, deserialize_with = "deserialize_nullable_string")]
    pub content: String,
    /// LLM provider that produced an assistant message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Model that produced an assistant message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_in: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_out: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Message {
    fn local(id: i64, role: MessageRole, content: String) -> Self {
        Self {
            id,
            role,
            content,
            provider: None,
            model: None,
            token_in: None,
            token_out: None,
            metadata: None,
            created_at: Utc::now(),
        }
    }

    /// Optimistic copy of a message the user just sent.
    pub fn user(id: i64, content: impl Into<String>) -> Self {
        Self::local(id, MessageRole::User, content.into())
    }

    /// Empty assistant message that deltas are appended to.
    pub fn assistant_placeholder(id: i64) -> Self {
        Self::local(id, MessageRole::Assistant, String::new())
    }

    pub fn is_assistant(&self) -> bool {
        self.role == MessageRole::Assistant
    }

    /// Copy final token accounting onto the message.
    pub fn record_usage(&mut self, usage: Usage) {
        self.token_in = Some(usage.input_tokens);
        self.token_out = Some(usage.output_tokens);
    }

    /// Token accounting, if the backend reported both sides.
    pub fn usage(&self) -> Option<Usage> {
        match (self.token_in, self.token_out) {
            (Some(input), Some(output)) => Some(Usage::new(input, output)),
            _ => None,
        }
    }
}
