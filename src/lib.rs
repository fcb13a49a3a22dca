//! streamchat - streaming chat client core
//!
//! Consumes a server-sent event stream carrying an assistant reply and folds
//! it into the conversation transcript.
//!
//! - [`sse`] - chunk to line to event decoding
//! - [`client`] - stream client, cancellation, conversation endpoints
//! - [`transcript`] - ordered messages and the open assistant reply
//! - [`session`] - the two wired together for one conversation
//!
//! This library exposes modules for use in integration tests.

pub mod adapters;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod session;
pub mod sse;
pub mod traits;
pub mod transcript;
