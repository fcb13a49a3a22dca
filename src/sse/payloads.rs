//! Stream payload deserialization structs
//!
//! Internal structs used to deserialize the JSON `data:` payloads of the
//! reply stream. The backend also sends a `type` field inside every payload;
//! it is ignored here because the `event:` line already carries the tag.

use serde::Deserialize;

use crate::error::ApiError;
use crate::sse::events::{Citation, Usage};

/// delta payload
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DeltaPayload {
    #[serde(default)]
    pub delta: Option<String>,
}

/// meta payload
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MetaPayload {
    #[serde(default)]
    pub usage: Option<Usage>,
    #[serde(default)]
    pub citations: Option<Vec<Citation>>,
}

/// done payload
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DonePayload {
    #[serde(default)]
    pub usage: Option<Usage>,
}

/// Error payload.
///
/// The backend nests the failure under `error`; a bare
/// `{success, code, message, traceId}` object is accepted as well.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorPayload {
    #[serde(default)]
    pub error: Option<ApiError>,
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, rename = "traceId", alias = "trace_id")]
    pub trace_id: Option<String>,
}

impl ErrorPayload {
    pub fn into_api_error(self) -> Option<ApiError> {
        if let Some(error) = self.error {
            return Some(error);
        }
        let code = self.code?;
        Some(ApiError {
            success: self.success.unwrap_or(false),
            code,
            message: self.message.unwrap_or_default(),
            trace_id: self.trace_id,
        })
    }
}
