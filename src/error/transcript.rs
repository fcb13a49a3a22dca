//! Transcript state errors.

use thiserror::Error;

/// Rejected transcript mutations. The transcript is left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TranscriptError {
    #[error("No conversation is selected")]
    NoTranscript,

    #[error("Please wait for the current response to complete before sending another message")]
    AlreadyStreaming,
}

impl TranscriptError {
    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            TranscriptError::NoTranscript => "NO_CHAT_SELECTED",
            TranscriptError::AlreadyStreaming => "STREAM_IN_PROGRESS",
        }
    }
}
