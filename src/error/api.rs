//! Structured failure shape shared by stream and request errors.
//!
//! The backend wraps every failure in `{success, code, message, traceId}`.
//! Transport failures detected locally are mapped onto the same shape so a
//! consumer never has to tell a dropped connection from a server-reported
//! error.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Code used when the response carried no readable body.
pub const CODE_NO_BODY: &str = "NO_BODY";

/// Code used for network and read faults during a stream.
pub const CODE_STREAM_ERROR: &str = "STREAM_ERROR";

/// Code the backend uses for request validation failures.
pub const CODE_VALIDATION_FAILED: &str = "VALIDATION_FAILED";

/// A structured failure, either reported by the backend or synthesized
/// locally from a transport fault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("[{code}] {message}")]
pub struct ApiError {
    #[serde(default)]
    pub success: bool,
    pub code: String,
    #[serde(default)]
    pub message: String,
    #[serde(
        default,
        rename = "traceId",
        alias = "trace_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub trace_id: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            code: code.into(),
            message: message.into(),
            trace_id: None,
        }
    }

    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    /// Non-success HTTP status without a structured body.
    pub fn http_status(status: u16, reason: &str) -> Self {
        let message = if reason.is_empty() {
            format!("Request failed ({})", status)
        } else {
            format!("Request failed: {}", reason)
        };
        Self::new(format!("HTTP_{}", status), message)
    }

    /// Non-success HTTP status, using the canonical reason phrase.
    pub fn from_status(status: u16) -> Self {
        let reason = reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|code| code.canonical_reason())
            .unwrap_or_default();
        Self::http_status(status, reason)
    }

    /// Response arrived without a body to read.
    pub fn no_body() -> Self {
        Self::new(CODE_NO_BODY, "Unable to read response")
    }

    /// Network or read fault while streaming.
    pub fn stream_error(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.trim().is_empty() {
            Self::new(CODE_STREAM_ERROR, "Stream connection failed")
        } else {
            Self::new(CODE_STREAM_ERROR, message)
        }
    }

    pub fn is_auth_error(&self) -> bool {
        self.code.starts_with("AUTH_")
    }

    pub fn is_validation_error(&self) -> bool {
        self.code == CODE_VALIDATION_FAILED
    }

    /// Whether the failure was synthesized from an HTTP status code.
    pub fn http_status_code(&self) -> Option<u16> {
        self.code.strip_prefix("HTTP_")?.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_error() {
        let err = ApiError::http_status(503, "Service Unavailable");
        assert_eq!(err.code, "HTTP_503");
        assert_eq!(err.message, "Request failed: Service Unavailable");
        assert_eq!(err.http_status_code(), Some(503));
        assert!(!err.success);
    }

    #[test]
    fn test_from_status_uses_reason_phrase() {
        let err = ApiError::from_status(502);
        assert_eq!(err.code, "HTTP_502");
        assert_eq!(err.message, "Request failed: Bad Gateway");
    }

    #[test]
    fn test_http_status_without_reason() {
        let err = ApiError::http_status(599, "");
        assert_eq!(err.message, "Request failed (599)");
    }

    #[test]
    fn test_stream_error_falls_back_to_default_message() {
        assert_eq!(ApiError::stream_error("").message, "Stream connection failed");
        assert_eq!(ApiError::stream_error("reset by peer").message, "reset by peer");
        assert_eq!(ApiError::stream_error("x").code, CODE_STREAM_ERROR);
    }

    #[test]
    fn test_deserialize_trace_id_variants() {
        let camel: ApiError =
            serde_json::from_str(r#"{"success":false,"code":"X","message":"m","traceId":"t"}"#)
                .unwrap();
        let snake: ApiError =
            serde_json::from_str(r#"{"success":false,"code":"X","message":"m","trace_id":"t"}"#)
                .unwrap();
        assert_eq!(camel, snake);
        assert_eq!(camel.trace_id.as_deref(), Some("t"));
    }

    #[test]
    fn test_serialize_uses_camel_case_trace_id() {
        let err = ApiError::new("RATE_LIMITED", "slow down").with_trace_id("abc");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["traceId"], "abc");
        assert_eq!(json["success"], false);
    }

    #[test]
    fn test_classification_helpers() {
        assert!(ApiError::new("AUTH_INVALID_TOKEN", "").is_auth_error());
        assert!(ApiError::new(CODE_VALIDATION_FAILED, "").is_validation_error());
        assert_eq!(ApiError::new("RATE_LIMITED", "").http_status_code(), None);
    }

    #[test]
    fn test_display() {
        let err = ApiError::new("RATE_LIMITED", "Too many requests");
        assert_eq!(err.to_string(), "[RATE_LIMITED] Too many requests");
    }
}
