use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// Longest message body the backend accepts, in characters.
pub const MAX_CONTENT_CHARS: usize = 32_000;

/// Body of `POST /api/chats/{id}/messages:stream`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageSendReq {
    /// The user's message text
    pub content: String,
    /// Overrides the backend's default model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl MessageSendReq {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            model: None,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Apply the same checks the backend runs before accepting a message.
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.content.trim().is_empty() {
            return Err(ClientError::Validation("Content is required".to_string()));
        }
        if self.content.chars().count() > MAX_CONTENT_CHARS {
            return Err(ClientError::Validation(format!(
                "Content must be at most {} characters",
                MAX_CONTENT_CHARS
            )));
        }
        Ok(())
    }
}
