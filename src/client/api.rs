//! Conversation store boundary.
//!
//! The few REST calls the streaming core needs: where to stream a reply to,
//! and the authoritative copy of a conversation to reconcile against.

use std::sync::Arc;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::models::{ApiEnvelope, ChatDetail};
use crate::traits::{Headers, HttpClient};

use super::stream::StreamClient;

/// Thin client for the chat REST API.
#[derive(Clone)]
pub struct ChatApi {
    http: Arc<dyn HttpClient>,
    config: ClientConfig,
}

impl std::fmt::Debug for ChatApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatApi")
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

impl ChatApi {
    pub fn new(http: Arc<dyn HttpClient>, config: ClientConfig) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// `POST` target for streaming a reply into `chat_id`.
    pub fn stream_url(&self, chat_id: i64) -> String {
        self.config
            .api_url(&format!("/chats/{}/messages:stream", chat_id))
    }

    pub fn chat_url(&self, chat_id: i64) -> String {
        self.config.api_url(&format!("/chats/{}", chat_id))
    }

    /// Headers carrying the login session.
    pub fn headers(&self) -> Headers {
        let mut headers = Headers::new();
        if let Some(cookie) = &self.config.session_cookie {
            headers.insert("Cookie".to_string(), cookie.clone());
        }
        headers
    }

    /// A stream client sharing this API's transport and session.
    pub fn stream_client(&self) -> StreamClient {
        StreamClient::new(self.http.clone()).with_headers(self.headers())
    }

    /// Fetch a conversation with its full history.
    pub async fn get_chat_detail(&self, chat_id: i64) -> ClientResult<ChatDetail> {
        let url = self.chat_url(chat_id);
        tracing::debug!(chat_id, "fetching chat detail");

        let response = self.http.get(&url, &self.headers()).await?;

        if !response.is_success() {
            return Err(match response.json::<ApiEnvelope<serde_json::Value>>() {
                Ok(envelope) if !envelope.code.is_empty() => {
                    ClientError::Api(envelope.to_api_error())
                }
                _ => ClientError::Status {
                    status: response.status,
                    message: response.text().unwrap_or_default(),
                },
            });
        }

        let envelope: ApiEnvelope<ChatDetail> = response.json()?;
        envelope.into_data("get_chat_detail")
    }
}
