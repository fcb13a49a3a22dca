//! Forwarding stream callbacks over a channel.
//!
//! The read loop runs on its own task; the transcript lives with its owner.
//! [`ChannelCallbacks`] turns each callback into a [`StreamMessage`] so the
//! owner applies every mutation from one place.

use tokio::sync::mpsc;

use crate::error::ApiError;
use crate::sse::{MetaEvent, Usage};
use crate::traits::StreamCallbacks;

/// One stream callback, as data.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamMessage {
    Delta(String),
    Meta(MetaEvent),
    Done(Option<Usage>),
    Error(ApiError),
}

impl StreamMessage {
    /// Whether this message ends the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamMessage::Done(_) | StreamMessage::Error(_))
    }
}

/// Callbacks that forward every event to an unbounded channel.
///
/// Sends to a closed channel are ignored; the receiver going away does not
/// stop the stream.
#[derive(Debug, Clone)]
pub struct ChannelCallbacks {
    tx: mpsc::UnboundedSender<StreamMessage>,
}

impl ChannelCallbacks {
    pub fn new(tx: mpsc::UnboundedSender<StreamMessage>) -> Self {
        Self { tx }
    }

    /// Create callbacks together with the receiving end.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<StreamMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    fn send(&self, message: StreamMessage) {
        if self.tx.send(message).is_err() {
            tracing::debug!("stream receiver dropped, event discarded");
        }
    }
}

impl StreamCallbacks for ChannelCallbacks {
    fn on_delta(&mut self, delta: &str) {
        self.send(StreamMessage::Delta(delta.to_string()));
    }

    fn on_meta(&mut self, meta: &MetaEvent) {
        self.send(StreamMessage::Meta(meta.clone()));
    }

    fn on_done(&mut self, usage: Option<Usage>) {
        self.send(StreamMessage::Done(usage));
    }

    fn on_error(&mut self, error: &ApiError) {
        self.send(StreamMessage::Error(error.clone()));
    }
}
