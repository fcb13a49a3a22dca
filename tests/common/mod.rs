//! Common test utilities for integration tests.
//!
//! Frame builders for the reply event stream and a callback recorder that
//! keeps every event in delivery order.

#![allow(dead_code)]

use serde_json::json;
use streamchat::client::CancelHandle;
use streamchat::error::ApiError;
use streamchat::sse::{MetaEvent, Usage};
use streamchat::traits::StreamCallbacks;

pub const BASE_URL: &str = "http://localhost:8080";

pub fn stream_url(chat_id: i64) -> String {
    format!("{}/api/chats/{}/messages:stream", BASE_URL, chat_id)
}

pub fn chat_url(chat_id: i64) -> String {
    format!("{}/api/chats/{}", BASE_URL, chat_id)
}

pub fn delta_frame(text: &str) -> String {
    format!(
        "event: delta\ndata: {}\n\n",
        json!({"type": "delta", "delta": text})
    )
}

pub fn meta_frame(input: u32, output: u32) -> String {
    format!(
        "event: meta\ndata: {}\n\n",
        json!({
            "type": "meta",
            "usage": {"inputTokens": input, "outputTokens": output},
            "citations": [{"docId": 1, "chunkId": 2, "title": "Guide", "page": 3}]
        })
    )
}

pub fn done_frame(input: u32, output: u32) -> String {
    format!(
        "event: done\ndata: {}\n\n",
        json!({"type": "done", "usage": {"inputTokens": input, "outputTokens": output}})
    )
}

pub fn error_frame(code: &str, message: &str) -> String {
    format!(
        "event: error\ndata: {}\n\n",
        json!({
            "type": "error",
            "error": {"success": false, "code": code, "message": message, "traceId": "trace-1"}
        })
    )
}

/// A `ChatDetail` envelope as the backend returns it.
pub fn chat_detail_envelope(chat_id: i64, messages: serde_json::Value) -> serde_json::Value {
    json!({
        "success": true,
        "code": "OK",
        "message": "success",
        "data": {
            "id": chat_id,
            "title": "Test chat",
            "messages": messages,
            "created_at": "2024-05-02T08:00:00",
            "updated_at": "2024-05-02T08:05:00"
        },
        "timestamp": "2024-05-02T08:05:00+08:00"
    })
}

/// Everything a stream reported, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    Delta(String),
    Meta(MetaEvent),
    Done(Option<Usage>),
    Error(ApiError),
}

#[derive(Debug, Default)]
pub struct RecordingCallbacks {
    pub events: Vec<Recorded>,
    /// Cancelled from inside `on_delta` once this many deltas arrived
    pub cancel_after: Option<(usize, CancelHandle)>,
}

impl RecordingCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancelling_after(deltas: usize, handle: CancelHandle) -> Self {
        Self {
            events: Vec::new(),
            cancel_after: Some((deltas, handle)),
        }
    }

    pub fn deltas(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Recorded::Delta(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn text(&self) -> String {
        self.deltas().concat()
    }

    pub fn errors(&self) -> Vec<ApiError> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Recorded::Error(err) => Some(err.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn terminal_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, Recorded::Done(_) | Recorded::Error(_)))
            .count()
    }
}

impl StreamCallbacks for RecordingCallbacks {
    fn on_delta(&mut self, delta: &str) {
        self.events.push(Recorded::Delta(delta.to_string()));
        if let Some((limit, handle)) = &self.cancel_after {
            if self.deltas().len() >= *limit {
                handle.cancel();
            }
        }
    }

    fn on_meta(&mut self, meta: &MetaEvent) {
        self.events.push(Recorded::Meta(meta.clone()));
    }

    fn on_done(&mut self, usage: Option<Usage>) {
        self.events.push(Recorded::Done(usage));
    }

    fn on_error(&mut self, error: &ApiError) {
        self.events.push(Recorded::Error(error.clone()));
    }
}
