//! Stream callback trait.
//!
//! The stream client reports decoded events through this trait, one call per
//! event, in delivery order. Every method has a no-op default so consumers
//! implement only what they observe.

use crate::error::ApiError;
use crate::sse::{MetaEvent, Usage};

/// Receiver of stream events.
///
/// Per stream invocation, `on_delta` and `on_meta` may fire any number of
/// times, followed by at most one of `on_done` or `on_error`. A cancelled
/// stream ends without either.
pub trait StreamCallbacks: Send {
    /// A non-empty text fragment of the reply.
    fn on_delta(&mut self, _delta: &str) {}

    /// Citations or usage hints; never changes message content.
    fn on_meta(&mut self, _meta: &MetaEvent) {}

    /// The reply finished normally.
    fn on_done(&mut self, _usage: Option<Usage>) {}

    /// The reply failed, either in transport or as reported by the server.
    fn on_error(&mut self, _error: &ApiError) {}
}

impl<C: StreamCallbacks + ?Sized> StreamCallbacks for Box<C> {
    fn on_delta(&mut self, delta: &str) {
        (**self).on_delta(delta)
    }

    fn on_meta(&mut self, meta: &MetaEvent) {
        (**self).on_meta(meta)
    }

    fn on_done(&mut self, usage: Option<Usage>) {
        (**self).on_done(usage)
    }

    fn on_error(&mut self, error: &ApiError) {
        (**self).on_error(error)
    }
}

/// Callbacks that ignore every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCallbacks;

impl StreamCallbacks for NoopCallbacks {}
