//! Reply stream client.
//!
//! Sends the request through an [`HttpClient`], feeds every chunk of the
//! response through a [`LineReassembler`] and a [`FrameDecoder`], and reports
//! the decoded events to [`StreamCallbacks`] in order.

use futures_util::StreamExt;
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::cancel::{cancel_pair, CancelHandle, CancelSignal};
use crate::error::{ApiError, ClientError};
use crate::sse::{FrameDecoder, LineReassembler, StreamEvent, Usage};
use crate::traits::{Headers, HttpClient, HttpError, StreamCallbacks, StreamResponse};

/// How a stream invocation ended.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamOutcome {
    /// A `done` frame arrived
    Completed(Option<Usage>),
    /// Transport fault or server-reported error; `on_error` was called
    Failed(ApiError),
    /// Caller aborted; no terminal callback was made
    Cancelled,
    /// Input ran out without a `done` frame
    Ended,
}

impl StreamOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, StreamOutcome::Completed(_))
    }

    pub fn error(&self) -> Option<&ApiError> {
        match self {
            StreamOutcome::Failed(err) => Some(err),
            _ => None,
        }
    }

    pub fn usage(&self) -> Option<Usage> {
        match self {
            StreamOutcome::Completed(usage) => *usage,
            _ => None,
        }
    }
}

/// A stream running on its own task.
#[derive(Debug)]
pub struct StreamHandle {
    cancel: CancelHandle,
    task: JoinHandle<StreamOutcome>,
}

impl StreamHandle {
    /// Abort the stream. No error callback fires and no delta is delivered
    /// after this returns.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// A handle that can cancel this stream from elsewhere.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the read loop to finish.
    pub async fn join(self) -> StreamOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(err) if err.is_cancelled() => StreamOutcome::Cancelled,
            Err(err) => {
                warn!("reply stream task failed: {}", err);
                StreamOutcome::Failed(ApiError::stream_error(err.to_string()))
            }
        }
    }
}

/// Client for streamed replies.
#[derive(Clone)]
pub struct StreamClient {
    http: Arc<dyn HttpClient>,
    headers: Headers,
}

impl std::fmt::Debug for StreamClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamClient")
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl StreamClient {
    pub fn new(http: Arc<dyn HttpClient>) -> Self {
        Self {
            http,
            headers: Headers::new(),
        }
    }

    /// Extra headers sent with every stream request.
    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    /// Start a stream on a new task and return its handle.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open<B, C>(
        &self,
        endpoint: &str,
        body: &B,
        mut callbacks: C,
    ) -> Result<StreamHandle, ClientError>
    where
        B: Serialize + ?Sized,
        C: StreamCallbacks + 'static,
    {
        let body = serde_json::to_string(body)?;
        let (cancel, signal) = cancel_pair();
        let client = self.clone();
        let endpoint = endpoint.to_string();

        let task = tokio::spawn(async move {
            client
                .read_loop(&endpoint, body, &mut callbacks, signal)
                .await
        });

        Ok(StreamHandle { cancel, task })
    }

    /// Run a stream on the current task.
    ///
    /// Fails only if `body` cannot be serialized; every stream failure is
    /// reported through `callbacks` and the returned outcome.
    pub async fn run<B, C>(
        &self,
        endpoint: &str,
        body: &B,
        callbacks: &mut C,
        cancel: CancelSignal,
    ) -> Result<StreamOutcome, ClientError>
    where
        B: Serialize + ?Sized,
        C: StreamCallbacks + ?Sized,
    {
        let body = serde_json::to_string(body)?;
        Ok(self.read_loop(endpoint, body, callbacks, cancel).await)
    }

    async fn read_loop<C>(
        &self,
        endpoint: &str,
        body: String,
        callbacks: &mut C,
        mut cancel: CancelSignal,
    ) -> StreamOutcome
    where
        C: StreamCallbacks + ?Sized,
    {
        if cancel.is_cancelled() {
            return cancelled(endpoint);
        }

        debug!(endpoint, "sending stream request");
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return cancelled(endpoint),
            response = self.http.post_stream(endpoint, &body, &self.headers) => response,
        };

        let response = match response {
            Ok(response) => response,
            Err(HttpError::Cancelled) => return cancelled(endpoint),
            Err(err) => return fail(callbacks, ApiError::stream_error(err.to_string())),
        };

        if !response.is_success() {
            return fail(callbacks, status_error(response));
        }

        let Some(mut stream) = response.body else {
            return fail(callbacks, ApiError::no_body());
        };

        let mut lines = LineReassembler::new();
        let mut decoder = FrameDecoder::new();

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return cancelled(endpoint),
                next = stream.next() => next,
            };

            match next {
                Some(Ok(chunk)) => {
                    let events = decoder.consume(lines.feed_bytes(&chunk));
                    if let Some(outcome) = dispatch(events, callbacks, &cancel) {
                        return outcome;
                    }
                }
                Some(Err(HttpError::Cancelled)) => return cancelled(endpoint),
                Some(Err(err)) => {
                    return fail(callbacks, ApiError::stream_error(err.to_string()));
                }
                None => {
                    let mut events = decoder.consume(lines.flush());
                    events.extend(decoder.finish());
                    if let Some(outcome) = dispatch(events, callbacks, &cancel) {
                        return outcome;
                    }
                    info!(
                        endpoint,
                        dropped_frames = decoder.dropped_frames(),
                        "reply stream ended without done"
                    );
                    return StreamOutcome::Ended;
                }
            }
        }
    }
}

fn cancelled(endpoint: &str) -> StreamOutcome {
    info!(endpoint, "reply stream cancelled");
    StreamOutcome::Cancelled
}

fn fail<C: StreamCallbacks + ?Sized>(callbacks: &mut C, error: ApiError) -> StreamOutcome {
    warn!(code = %error.code, "reply stream failed: {}", error.message);
    callbacks.on_error(&error);
    StreamOutcome::Failed(error)
}

/// Error for a non-success status. The body is dropped unread.
fn status_error(response: StreamResponse) -> ApiError {
    debug!(
        status = response.status,
        has_body = response.body.is_some(),
        "stream request rejected"
    );
    ApiError::http_status(response.status, &response.reason)
}

/// Deliver decoded events in order. Returns the outcome once a terminal
/// event is delivered or cancellation is observed.
fn dispatch<C>(
    events: Vec<StreamEvent>,
    callbacks: &mut C,
    cancel: &CancelSignal,
) -> Option<StreamOutcome>
where
    C: StreamCallbacks + ?Sized,
{
    for event in events {
        if cancel.is_cancelled() {
            info!("reply stream cancelled");
            return Some(StreamOutcome::Cancelled);
        }

        match event {
            StreamEvent::Delta { text } => {
                if !text.is_empty() {
                    callbacks.on_delta(&text);
                }
            }
            StreamEvent::Meta(meta) => callbacks.on_meta(&meta),
            StreamEvent::Done { usage } => {
                debug!(?usage, "reply stream done");
                callbacks.on_done(usage);
                return Some(StreamOutcome::Completed(usage));
            }
            StreamEvent::Error(error) => {
                warn!(code = %error.code, "server reported stream error: {}", error.message);
                callbacks.on_error(&error);
                return Some(StreamOutcome::Failed(error));
            }
            StreamEvent::Unknown { event_type, .. } => {
                debug!(event_type = %event_type, "ignoring unknown stream event");
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sse::MetaEvent;

    #[derive(Default)]
    struct Recorder {
        deltas: Vec<String>,
        metas: usize,
        done: Vec<Option<Usage>>,
        errors: Vec<ApiError>,
        cancel_after_first_delta: Option<CancelHandle>,
    }

    impl StreamCallbacks for Recorder {
        fn on_delta(&mut self, delta: &str) {
            self.deltas.push(delta.to_string());
            if let Some(handle) = &self.cancel_after_first_delta {
                handle.cancel();
            }
        }

        fn on_meta(&mut self, _meta: &MetaEvent) {
            self.metas += 1;
        }

        fn on_done(&mut self, usage: Option<Usage>) {
            self.done.push(usage);
        }

        fn on_error(&mut self, error: &ApiError) {
            self.errors.push(error.clone());
        }
    }

    fn delta(text: &str) -> StreamEvent {
        StreamEvent::Delta {
            text: text.to_string(),
        }
    }

    #[test]
    fn test_dispatch_skips_empty_deltas_and_unknown() {
        let (_handle, signal) = cancel_pair();
        let mut recorder = Recorder::default();
        let events = vec![
            delta(""),
            StreamEvent::Unknown {
                event_type: "ping".to_string(),
                data: "{}".to_string(),
            },
            delta("a"),
            StreamEvent::Meta(MetaEvent::default()),
        ];

        assert!(dispatch(events, &mut recorder, &signal).is_none());
        assert_eq!(recorder.deltas, vec!["a"]);
        assert_eq!(recorder.metas, 1);
    }

    #[test]
    fn test_dispatch_stops_at_terminal_event() {
        let (_handle, signal) = cancel_pair();
        let mut recorder = Recorder::default();
        let error = ApiError::new("LLM_TIMEOUT", "Model timed out");
        let events = vec![
            delta("a"),
            StreamEvent::Error(error.clone()),
            delta("b"),
            StreamEvent::Done { usage: None },
        ];

        let outcome = dispatch(events, &mut recorder, &signal);
        assert_eq!(outcome, Some(StreamOutcome::Failed(error.clone())));
        assert_eq!(recorder.deltas, vec!["a"]);
        assert_eq!(recorder.errors, vec![error]);
        assert!(recorder.done.is_empty());
    }

    #[test]
    fn test_dispatch_observes_cancel_between_events() {
        let (handle, signal) = cancel_pair();
        let mut recorder = Recorder {
            cancel_after_first_delta: Some(handle),
            ..Default::default()
        };

        let outcome = dispatch(vec![delta("a"), delta("b")], &mut recorder, &signal);
        assert_eq!(outcome, Some(StreamOutcome::Cancelled));
        assert_eq!(recorder.deltas, vec!["a"]);
        assert!(recorder.errors.is_empty());
    }

    #[test]
    fn test_outcome_accessors() {
        let done = StreamOutcome::Completed(Some(Usage::new(1, 2)));
        assert!(done.is_completed());
        assert_eq!(done.usage(), Some(Usage::new(1, 2)));
        assert!(done.error().is_none());
        assert!(StreamOutcome::Failed(ApiError::no_body()).error().is_some());
        assert_eq!(StreamOutcome::Ended.usage(), None);
    }
}
