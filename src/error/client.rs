//! Errors from the request/response side of the client.

use thiserror::Error;

use super::api::{ApiError, CODE_VALIDATION_FAILED};
use super::transcript::TranscriptError;
use crate::traits::HttpError;

/// Error type for client operations outside the stream callbacks.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport-level failure
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    /// Non-success status without a structured body
    #[error("Server error ({status}): {message}")]
    Status { status: u16, message: String },

    /// Structured failure reported by the backend
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Body could not be (de)serialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Successful envelope without the expected `data`
    #[error("Response to {operation} carried no data")]
    MissingData { operation: String },

    /// Request rejected before it was sent
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Transcript(#[from] TranscriptError),
}

impl ClientError {
    /// Check if the failure is likely transient.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Http(err) => err.is_retryable(),
            ClientError::Status { status, .. } => {
                *status >= 500 || *status == 429 || *status == 408
            }
            ClientError::Api(err) => err.code == "RATE_LIMITED" || err.code == "LLM_TIMEOUT",
            _ => false,
        }
    }

    /// Express this error in the structured shape the stream callbacks use.
    pub fn to_api_error(&self) -> ApiError {
        match self {
            ClientError::Api(err) => err.clone(),
            ClientError::Status { status, .. } => ApiError::from_status(*status),
            ClientError::Http(err) => ApiError::stream_error(err.to_string()),
            ClientError::Validation(message) => ApiError::new(CODE_VALIDATION_FAILED, message),
            ClientError::Json(err) => ApiError::new("INVALID_RESPONSE", err.to_string()),
            ClientError::MissingData { .. } => ApiError::new("INVALID_RESPONSE", self.to_string()),
            ClientError::Transcript(err) => ApiError::new(err.error_code(), err.to_string()),
        }
    }
}
