//! Error handling for the chat client.
//!
//! - **`ApiError`**: the `{success, code, message, traceId}` shape every
//!   failure is reported in, whether the backend sent it mid-stream or the
//!   client synthesized it from a transport fault
//! - **`ClientError`**: request/response failures outside the stream
//! - **`TranscriptError`**: rejected transcript mutations
//!
//! # Stream failure taxonomy
//!
//! | Kind | Source | Surfaced as |
//! |------|--------|-------------|
//! | Transport | network fault, non-2xx, no body | `on_error(ApiError)` |
//! | Protocol | `error` frame from the server | `on_error(ApiError)` |
//! | Malformed frame | undecodable frame | dropped inside the decoder |
//! | Cancelled | caller abort | no callback |

mod api;
mod client;
mod transcript;

pub use api::{ApiError, CODE_NO_BODY, CODE_STREAM_ERROR, CODE_VALIDATION_FAILED};
pub use client::ClientError;
pub use transcript::TranscriptError;

/// Type alias for Results using ClientError.
pub type ClientResult<T> = Result<T, ClientError>;
