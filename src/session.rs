//! Conversation session.
//!
//! Ties the transcript to the network: sending a message appends the user's
//! text, opens an assistant placeholder and starts the reply stream. Stream
//! events come back as [`StreamMessage`]s which the session applies to the
//! transcript in arrival order.

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::client::{
    CancelHandle, ChannelCallbacks, ChatApi, StreamClient, StreamHandle, StreamMessage,
    StreamOutcome,
};
use crate::error::{ApiError, ClientResult, TranscriptError};
use crate::models::{ChatDetail, MessageSendReq};
use crate::sse::{MetaEvent, Usage};
use crate::transcript::Transcript;

/// A reply being streamed into the session's transcript.
#[derive(Debug)]
pub struct ActiveStream {
    pub handle: StreamHandle,
    pub events: mpsc::UnboundedReceiver<StreamMessage>,
}

/// One conversation and at most one reply in flight.
#[derive(Debug)]
pub struct ChatSession {
    api: ChatApi,
    client: StreamClient,
    transcript: Transcript,
    active: Option<CancelHandle>,
    last_meta: Option<MetaEvent>,
    last_usage: Option<Usage>,
    last_error: Option<ApiError>,
}

impl ChatSession {
    pub fn new(api: ChatApi) -> Self {
        let client = api.stream_client();
        Self {
            api,
            client,
            transcript: Transcript::new(),
            active: None,
            last_meta: None,
            last_usage: None,
            last_error: None,
        }
    }

    pub fn api(&self) -> &ChatApi {
        &self.api
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Citations and usage from the most recent `meta` event.
    pub fn last_meta(&self) -> Option<&MetaEvent> {
        self.last_meta.as_ref()
    }

    /// Final usage of the most recent completed reply.
    pub fn last_usage(&self) -> Option<Usage> {
        self.last_usage
    }

    /// Error of the most recent failed reply.
    pub fn last_error(&self) -> Option<&ApiError> {
        self.last_error.as_ref()
    }

    pub fn is_streaming(&self) -> bool {
        self.transcript.is_streaming()
    }

    /// Switch to `detail`, abandoning any reply in flight.
    pub fn select_chat(&mut self, detail: ChatDetail) {
        self.cancel();
        self.active = None;
        self.transcript.select(detail);
        self.last_meta = None;
        self.last_error = None;
    }

    /// Fetch a conversation and switch to it.
    pub async fn load_chat(&mut self, chat_id: i64) -> ClientResult<()> {
        let detail = self.api.get_chat_detail(chat_id).await?;
        self.select_chat(detail);
        Ok(())
    }

    pub fn clear_current_chat(&mut self) {
        self.cancel();
        self.active = None;
        self.transcript.clear();
        self.last_meta = None;
        self.last_error = None;
    }

    /// Send a message and start streaming the reply.
    ///
    /// The user's message and an empty assistant message are appended before
    /// the request goes out. Feed the returned events to [`apply`] and the
    /// final outcome to [`complete`], or hand the whole stream to
    /// [`drive_with`].
    ///
    /// [`apply`]: ChatSession::apply
    /// [`complete`]: ChatSession::complete
    /// [`drive_with`]: ChatSession::drive_with
    pub fn send_message(&mut self, req: MessageSendReq) -> ClientResult<ActiveStream> {
        req.validate()?;
        let chat_id = self
            .transcript
            .chat_id()
            .ok_or(TranscriptError::NoTranscript)?;
        if self.transcript.is_streaming() {
            return Err(TranscriptError::AlreadyStreaming.into());
        }

        self.transcript.append_user_message(&req.content)?;
        self.transcript.begin_assistant_stream()?;
        self.last_error = None;
        self.last_usage = None;

        let (callbacks, events) = ChannelCallbacks::channel();
        match self.client.open(&self.api.stream_url(chat_id), &req, callbacks) {
            Ok(handle) => {
                info!(chat_id, "reply stream started");
                self.active = Some(handle.cancel_handle());
                Ok(ActiveStream { handle, events })
            }
            Err(err) => {
                self.transcript
                    .finish_stream(&StreamOutcome::Failed(err.to_api_error()));
                Err(err)
            }
        }
    }

    /// Apply one stream event. Returns whether the transcript changed.
    ///
    /// Events still queued when the reply was cancelled are dropped.
    pub fn apply(&mut self, message: StreamMessage) -> bool {
        if !self.accepting_events() {
            debug!("dropping reply event after cancellation");
            return false;
        }
        match message {
            StreamMessage::Delta(text) => self.transcript.append_delta(&text),
            StreamMessage::Meta(meta) => {
                self.last_meta = Some(meta);
                false
            }
            StreamMessage::Done(usage) => {
                self.last_usage = usage;
                false
            }
            StreamMessage::Error(error) => {
                self.last_error = Some(error);
                false
            }
        }
    }

    /// Close the reply with its final outcome.
    pub fn complete(&mut self, outcome: &StreamOutcome) {
        if let StreamOutcome::Failed(error) = outcome {
            self.last_error = Some(error.clone());
        }
        self.transcript.finish_stream(outcome);
        self.active = None;
    }

    /// Cancel the reply in flight. Returns false if there was none.
    ///
    /// The reply stays registered until [`complete`](ChatSession::complete)
    /// so that events already in the channel can be told apart and dropped.
    pub fn cancel(&mut self) -> bool {
        match &self.active {
            Some(handle) if !handle.is_cancelled() => {
                handle.cancel();
                debug!("active reply stream cancelled");
                true
            }
            _ => false,
        }
    }

    fn accepting_events(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|handle| !handle.is_cancelled())
    }

    fn owns(&self, handle: &CancelHandle) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| active.same_stream(handle))
    }

    /// Reconcile the transcript with the server's copy.
    pub async fn refresh(&mut self) -> ClientResult<bool> {
        let chat_id = self
            .transcript
            .chat_id()
            .ok_or(TranscriptError::NoTranscript)?;
        let detail = self.api.get_chat_detail(chat_id).await?;
        Ok(self.transcript.reconcile(detail))
    }

    /// Apply every event of `active` until the stream ends, calling
    /// `on_message` after each one, then close the reply.
    ///
    /// Stops applying as soon as the reply is cancelled, through the session
    /// or any clone of its cancel handle. If the session has moved on to
    /// another chat or reply, the transcript is left alone.
    pub async fn drive_with<F>(&mut self, active: ActiveStream, mut on_message: F) -> StreamOutcome
    where
        F: FnMut(&StreamMessage, &Transcript),
    {
        let ActiveStream { handle, mut events } = active;
        let cancel = handle.cancel_handle();
        let mut interrupted = false;

        while let Some(message) = events.recv().await {
            if cancel.is_cancelled() || !self.owns(&cancel) {
                interrupted = true;
                break;
            }
            let observed = message.clone();
            self.apply(message);
            on_message(&observed, &self.transcript);
        }

        if interrupted {
            cancel.cancel();
        }
        let joined = handle.join().await;
        let outcome = if interrupted {
            StreamOutcome::Cancelled
        } else {
            joined
        };
        if self.owns(&cancel) {
            self.complete(&outcome);
        }
        outcome
    }

    /// [`drive_with`](ChatSession::drive_with) without an observer.
    pub async fn drive(&mut self, active: ActiveStream) -> StreamOutcome {
        self.drive_with(active, |_, _| {}).await
    }
}
