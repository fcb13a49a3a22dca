//! Stream event types and definitions
//!
//! Contains the StreamEvent enum with every event variant the chat backend
//! emits on a streamed reply, plus the usage and citation payloads they carry.

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Token accounting reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    #[serde(alias = "input_tokens")]
    pub input_tokens: u32,
    #[serde(alias = "output_tokens")]
    pub output_tokens: u32,
}

impl Usage {
    pub fn new(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    /// Combined input and output token count
    pub fn total(&self) -> u32 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}

/// A knowledge-base passage the reply was grounded on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Citation {
    #[serde(default, alias = "doc_id", skip_serializing_if = "Option::is_none")]
    pub doc_id: Option<i64>,
    #[serde(default, alias = "chunk_id", skip_serializing_if = "Option::is_none")]
    pub chunk_id: Option<i64>,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

/// Side-channel data that never changes message content.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MetaEvent {
    pub usage: Option<Usage>,
    pub citations: Vec<Citation>,
}

/// Typed events decoded from the reply stream
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Incremental text fragment of the assistant reply
    Delta { text: String },
    /// Citations and usage hints
    Meta(MetaEvent),
    /// Stream completed successfully
    Done { usage: Option<Usage> },
    /// Error reported by the backend mid-stream
    Error(ApiError),
    /// Well-formed frame with a tag this client does not know
    Unknown { event_type: String, data: String },
}

impl StreamEvent {
    /// Returns the wire tag of the event.
    pub fn event_type_name(&self) -> &str {
        match self {
            StreamEvent::Delta { .. } => "delta",
            StreamEvent::Meta(_) => "meta",
            StreamEvent::Done { .. } => "done",
            StreamEvent::Error(_) => "error",
            StreamEvent::Unknown { event_type, .. } => event_type,
        }
    }

    /// Whether this event ends the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Done { .. } | StreamEvent::Error(_))
    }
}
