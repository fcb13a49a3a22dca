//! Network side of the chat client.
//!
//! - [`StreamClient`] - streams one assistant reply and reports its events
//! - [`ChatApi`] - conversation endpoints the stream is reconciled against
//! - [`ChannelCallbacks`] - forwards stream events as [`StreamMessage`]s

mod api;
mod cancel;
mod channel;
mod stream;

pub use api::ChatApi;
pub use cancel::{cancel_pair, CancelHandle, CancelSignal};
pub use channel::{ChannelCallbacks, StreamMessage};
pub use stream::{StreamClient, StreamHandle, StreamOutcome};
