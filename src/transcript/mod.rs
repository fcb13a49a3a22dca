//! Transcript aggregation.
//!
//! [`Transcript`] owns the ordered messages of the selected conversation and
//! the state of the one reply that may be streaming into it:
//!
//! ```text
//! Idle --begin_assistant_stream--> Streaming --end_stream/finish_stream--> Idle
//! ```
//!
//! All methods are synchronous. Stream events reach the transcript through
//! its owner, never directly from the read loop.

mod ids;

pub use ids::TempIdGenerator;

use tracing::debug;

use crate::client::StreamOutcome;
use crate::error::TranscriptError;
use crate::models::{ChatDetail, Message, MessageRole};

/// Messages of the selected conversation plus streaming state.
#[derive(Debug, Default)]
pub struct Transcript {
    chat: Option<ChatDetail>,
    streaming: bool,
    /// Every fragment received since the placeholder opened
    streaming_content: String,
    /// Position of the open assistant placeholder
    open_index: Option<usize>,
    ids: TempIdGenerator,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking `chat`. Any open stream state is dropped.
    pub fn select(&mut self, chat: ChatDetail) {
        debug!(chat_id = chat.id, messages = chat.messages.len(), "transcript selected");
        self.chat = Some(chat);
        self.reset_stream();
    }

    /// Forget the selected conversation.
    pub fn clear(&mut self) {
        self.chat = None;
        self.reset_stream();
    }

    pub fn chat(&self) -> Option<&ChatDetail> {
        self.chat.as_ref()
    }

    pub fn chat_id(&self) -> Option<i64> {
        self.chat.as_ref().map(|c| c.id)
    }

    pub fn messages(&self) -> &[Message] {
        self.chat.as_ref().map(|c| c.messages.as_slice()).unwrap_or(&[])
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages().last()
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    pub fn streaming_content(&self) -> &str {
        &self.streaming_content
    }

    /// The assistant message deltas are currently written to.
    pub fn open_message(&self) -> Option<&Message> {
        self.open_index.and_then(|i| self.messages().get(i))
    }

    /// Append the user's message with a temporary id and return the id.
    pub fn append_user_message(&mut self, content: &str) -> Result<i64, TranscriptError> {
        let id = self.ids.next_id();
        let chat = self.chat.as_mut().ok_or(TranscriptError::NoTranscript)?;
        chat.messages.push(Message::user(id, content));
        Ok(id)
    }

    /// Open an empty assistant message for the reply and return its id.
    pub fn begin_assistant_stream(&mut self) -> Result<i64, TranscriptError> {
        if self.streaming {
            return Err(TranscriptError::AlreadyStreaming);
        }
        let id = self.ids.next_id();
        let chat = self.chat.as_mut().ok_or(TranscriptError::NoTranscript)?;

        chat.messages.push(Message::assistant_placeholder(id));
        self.open_index = Some(chat.messages.len() - 1);
        self.streaming = true;
        self.streaming_content.clear();
        debug!(chat_id = chat.id, message_id = id, "assistant stream opened");
        Ok(id)
    }

    /// Add a fragment of the reply.
    ///
    /// Returns whether the placeholder was updated. Outside a stream this is
    /// a no-op. The placeholder is only written while it is still the last
    /// message and has the assistant role.
    pub fn append_delta(&mut self, fragment: &str) -> bool {
        if !self.streaming {
            debug!("delta outside of a stream ignored");
            return false;
        }
        self.streaming_content.push_str(fragment);

        let Some(index) = self.open_index else {
            return false;
        };
        let Some(chat) = self.chat.as_mut() else {
            return false;
        };
        if index + 1 != chat.messages.len() {
            return false;
        }
        match chat.messages.get_mut(index) {
            Some(message) if message.role == MessageRole::Assistant => {
                message.content.clone_from(&self.streaming_content);
                true
            }
            _ => false,
        }
    }

    /// Close the stream. The placeholder keeps whatever content it has.
    pub fn end_stream(&mut self) {
        if self.streaming {
            debug!(chars = self.streaming_content.chars().count(), "assistant stream closed");
        }
        self.reset_stream();
    }

    /// Apply how the stream ended, then close it.
    ///
    /// A completed reply records its token usage. Any other outcome removes
    /// the placeholder if nothing was written to it.
    pub fn finish_stream(&mut self, outcome: &StreamOutcome) {
        if let (Some(index), Some(chat)) = (self.open_index, self.chat.as_mut()) {
            match outcome {
                StreamOutcome::Completed(usage) => {
                    if let (Some(usage), Some(message)) = (usage, chat.messages.get_mut(index)) {
                        message.record_usage(*usage);
                    }
                }
                StreamOutcome::Failed(_) | StreamOutcome::Cancelled | StreamOutcome::Ended => {
                    let empty = chat
                        .messages
                        .get(index)
                        .map(|m| m.is_assistant() && m.content.is_empty())
                        .unwrap_or(false);
                    if empty {
                        chat.messages.remove(index);
                        debug!(?outcome, "empty assistant placeholder rolled back");
                    }
                }
            }
        }
        self.end_stream();
    }

    /// Replace the messages with the server's copy.
    ///
    /// While a reply is streaming, the server has not stored it yet, so the
    /// open placeholder is carried over onto the end of the new list.
    pub fn replace_messages(&mut self, messages: Vec<Message>) {
        let Some(chat) = self.chat.as_mut() else {
            return;
        };

        let open = self
            .open_index
            .and_then(|i| chat.messages.get(i))
            .cloned();

        chat.messages = messages;
        if let Some(placeholder) = open {
            chat.messages.push(placeholder);
            self.open_index = Some(chat.messages.len() - 1);
        }
    }

    /// Reconcile with a freshly fetched copy of the selected conversation.
    ///
    /// Returns false and changes nothing if `detail` is for another chat.
    pub fn reconcile(&mut self, detail: ChatDetail) -> bool {
        match self.chat.as_mut() {
            Some(chat) if chat.id == detail.id => {
                chat.title = detail.title;
                chat.created_at = detail.created_at;
                chat.updated_at = detail.updated_at;
            }
            _ => return false,
        }
        self.replace_messages(detail.messages);
        true
    }

    fn reset_stream(&mut self) {
        self.streaming = false;
        self.streaming_content.clear();
        self.open_index = None;
    }
}
