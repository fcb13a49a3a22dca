//! Trait abstractions for dependency injection and testability.
//!
//! # Traits
//!
//! - [`HttpClient`] - HTTP client operations (GET, streaming POST)
//! - [`StreamCallbacks`] - Receiver of decoded stream events

pub mod callbacks;
pub mod http;

pub use callbacks::{NoopCallbacks, StreamCallbacks};
pub use http::{ByteStream, Headers, HttpClient, HttpError, Response, StreamResponse};
