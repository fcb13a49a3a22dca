use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{deserialize_id, deserialize_nullable_string, deserialize_timestamp};
use super::message::Message;

/// A conversation with its full message history, as returned by
/// `GET /api/chats/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatDetail {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: i64,
    #[serde(default, deserialize_with = "deserialize_nullable_string")]
    pub title: String,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl ChatDetail {
    /// A conversation known only by id, with no history loaded.
    pub fn empty(id: i64) -> Self {
        let now = Utc::now();
        Self {
            id,
            title: String::new(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MessageRole;

    #[test]
    fn test_deserialize_chat_detail() {
        let json = r#"{
            "id": 3,
            "title": "Release notes",
            "messages": [
                {"id": 10, "role": "USER", "content": "Summarize", "created_at": "2024-05-02T08:00:00"},
                {"id": 11, "role": "ASSISTANT", "content": "Sure", "created_at": "2024-05-02T08:00:01"}
            ],
            "created_at": "2024-05-02T07:59:00",
            "updated_at": "2024-05-02T08:00:01"
        }"#;

        let chat: ChatDetail = serde_json::from_str(json).unwrap();
        assert_eq!(chat.id, 3);
        assert_eq!(chat.messages.len(), 2);
        assert_eq!(chat.messages[1].role, MessageRole::Assistant);
        assert!(chat.updated_at > chat.created_at);
    }

    #[test]
    fn test_missing_messages_defaults_to_empty() {
        let json = r#"{"id":1,"title":null,"created_at":"2024-05-02T07:59:00","updated_at":"2024-05-02T07:59:00"}"#;
        let chat: ChatDetail = serde_json::from_str(json).unwrap();
        assert!(chat.messages.is_empty());
        assert_eq!(chat.title, "");
    }

    #[test]
    fn test_empty() {
        let chat = ChatDetail::empty(9);
        assert_eq!(chat.id, 9);
        assert!(chat.messages.is_empty());
    }
}
