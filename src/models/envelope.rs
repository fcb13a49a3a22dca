use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ClientError};

/// Wrapper the backend puts around every non-streaming response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(
        default,
        alias = "traceId",
        skip_serializing_if = "Option::is_none"
    )]
    pub trace_id: Option<String>,
}

impl<T> ApiEnvelope<T> {
    /// The failure part of the envelope, in stream error form.
    pub fn to_api_error(&self) -> ApiError {
        ApiError {
            success: self.success,
            code: self.code.clone(),
            message: self.message.clone(),
            trace_id: self.trace_id.clone(),
        }
    }

    /// Unwrap `data` from a successful envelope.
    pub fn into_data(self, operation: &str) -> Result<T, ClientError> {
        if !self.success {
            return Err(ClientError::Api(self.to_api_error()));
        }
        self.data.ok_or_else(|| ClientError::MissingData {
            operation: operation.to_string(),
        })
    }
}
