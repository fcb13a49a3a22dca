//! Event frame decoding
//!
//! Contains the stateful `FrameDecoder` that accumulates `event:`/`data:`
//! fields across lines (and across network reads) and emits one typed
//! `StreamEvent` per blank-line-terminated frame, plus the stateless
//! `decode_frame` that turns a tag and payload into an event.

use thiserror::Error;
use tracing::debug;

use crate::sse::events::{MetaEvent, StreamEvent};
use crate::sse::payloads::{DeltaPayload, DonePayload, ErrorPayload, MetaPayload};

/// Reasons a complete frame fails to decode.
///
/// These never escape the decoder; they are logged and the frame is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("invalid JSON for '{event_type}' event: {message}")]
    InvalidJson { event_type: String, message: String },

    #[error("error event carried no error object")]
    MissingError,
}

/// Decode one frame's tag and payload into a typed event
pub fn decode_frame(event_type: &str, data: &str) -> Result<StreamEvent, FrameError> {
    let invalid = |e: serde_json::Error| FrameError::InvalidJson {
        event_type: event_type.to_string(),
        message: e.to_string(),
    };

    match event_type {
        "delta" => {
            let payload: DeltaPayload = serde_json::from_str(data).map_err(invalid)?;
            Ok(StreamEvent::Delta {
                text: payload.delta.unwrap_or_default(),
            })
        }
        "meta" => {
            let payload: MetaPayload = serde_json::from_str(data).map_err(invalid)?;
            Ok(StreamEvent::Meta(MetaEvent {
                usage: payload.usage,
                citations: payload.citations.unwrap_or_default(),
            }))
        }
        "done" => {
            let payload: DonePayload = serde_json::from_str(data).map_err(invalid)?;
            Ok(StreamEvent::Done {
                usage: payload.usage,
            })
        }
        "error" => {
            let payload: ErrorPayload = serde_json::from_str(data).map_err(invalid)?;
            payload
                .into_api_error()
                .map(StreamEvent::Error)
                .ok_or(FrameError::MissingError)
        }
        _ => {
            // Unknown tags must still carry well-formed JSON
            serde_json::from_str::<serde_json::Value>(data).map_err(invalid)?;
            Ok(StreamEvent::Unknown {
                event_type: event_type.to_string(),
                data: data.to_string(),
            })
        }
    }
}

/// Stateful decoder that accumulates lines and emits complete events
#[derive(Debug, Default)]
pub struct FrameDecoder {
    /// Tag from the last `event:` line of the current frame
    event_type: String,
    /// Payload from the last `data:` line of the current frame
    event_data: String,
    /// Frames thrown away because they were incomplete or undecodable
    dropped: u64,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line, returning an event if it closed a decodable frame.
    pub fn consume_line(&mut self, line: &str) -> Option<StreamEvent> {
        if let Some(rest) = line.strip_prefix("event:") {
            self.event_type = rest.trim().to_string();
            return None;
        }

        if let Some(rest) = line.strip_prefix("data:") {
            self.event_data = rest.trim().to_string();
            return None;
        }

        if line.is_empty() {
            return self.finish_frame();
        }

        // comments (":" prefix) and unknown fields
        None
    }

    /// Feed a batch of lines in order.
    pub fn consume<I, S>(&mut self, lines: I) -> Vec<StreamEvent>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        lines
            .into_iter()
            .filter_map(|line| self.consume_line(line.as_ref()))
            .collect()
    }

    /// Close the in-flight frame as if a blank line had arrived.
    ///
    /// Used at end of stream, when the producer never sent the final
    /// delimiter.
    pub fn finish(&mut self) -> Option<StreamEvent> {
        self.consume_line("")
    }

    /// Whether any field of the current frame has been seen.
    pub fn has_pending_frame(&self) -> bool {
        !self.event_type.is_empty() || !self.event_data.is_empty()
    }

    /// Number of frames dropped so far.
    pub fn dropped_frames(&self) -> u64 {
        self.dropped
    }

    /// Discard the current frame.
    pub fn reset(&mut self) {
        self.event_type.clear();
        self.event_data.clear();
    }

    fn finish_frame(&mut self) -> Option<StreamEvent> {
        if self.event_type.is_empty() || self.event_data.is_empty() {
            if self.has_pending_frame() {
                debug!(
                    event_type = %self.event_type,
                    "dropping incomplete frame"
                );
                self.dropped += 1;
            }
            self.reset();
            return None;
        }

        let event_type = std::mem::take(&mut self.event_type);
        let event_data = std::mem::take(&mut self.event_data);

        match decode_frame(&event_type, &event_data) {
            Ok(event) => Some(event),
            Err(e) => {
                debug!(error = %e, "dropping malformed frame");
                self.dropped += 1;
                None
            }
        }
    }
}
