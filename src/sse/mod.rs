//! Event-stream parsing for streamed assistant replies.
//!
//! The chat backend answers `POST /api/chats/{id}/messages:stream` with a
//! chunked `text/event-stream` body:
//! - `event: <type>` - event tag (`delta`, `meta`, `done`, `error`)
//! - `data: <json>` - JSON payload line
//! - Empty line - ends the frame
//! - Lines starting with `:` - comments (ignored)
//!
//! # Module structure
//! - `lines` - `LineReassembler`, turns arbitrary chunks into whole lines
//! - `decoder` - `FrameDecoder`, turns lines into typed events
//! - `events` - `StreamEvent` and the payload types it carries
//! - `payloads` - Internal payload deserialization structs

mod decoder;
mod events;
mod lines;
mod payloads;

pub use decoder::{decode_frame, FrameDecoder, FrameError};
pub use events::{Citation, MetaEvent, StreamEvent, Usage};
pub use lines::LineReassembler;
