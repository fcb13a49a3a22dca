//! Conversation flow: send, stream into the transcript, finish, reconcile.

mod common;

use bytes::Bytes;
use common::*;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use streamchat::adapters::mock::{MockHttpClient, MockResponse};
use streamchat::client::{ChatApi, StreamMessage, StreamOutcome};
use streamchat::config::ClientConfig;
use streamchat::error::{ClientError, TranscriptError};
use streamchat::models::{ChatDetail, MessageRole, MessageSendReq};
use streamchat::session::ChatSession;
use streamchat::sse::Usage;

fn session_with(mock: &MockHttpClient) -> ChatSession {
    let api = ChatApi::new(Arc::new(mock.clone()), ClientConfig::default());
    ChatSession::new(api)
}

#[tokio::test]
async fn test_send_streams_into_transcript() {
    let mock = MockHttpClient::new();
    mock.set_response(
        &stream_url(1),
        MockResponse::sse_bytewise(&format!(
            "{}{}{}",
            delta_frame("Hello"),
            delta_frame(", world"),
            done_frame(4, 2)
        )),
    );
    let mut session = session_with(&mock);
    session.select_chat(ChatDetail::empty(1));

    let active = session.send_message(MessageSendReq::new("Greet me")).unwrap();
    assert!(session.is_streaming());
    assert_eq!(session.transcript().messages().len(), 2);

    let mut seen = Vec::new();
    let outcome = session
        .drive_with(active, |message, transcript| {
            if let StreamMessage::Delta(_) = message {
                seen.push(transcript.last_message().unwrap().content.clone());
            }
        })
        .await;

    assert_eq!(outcome, StreamOutcome::Completed(Some(Usage::new(4, 2))));
    assert_eq!(seen.first().map(String::as_str), Some("Hello"));
    assert_eq!(seen.last().map(String::as_str), Some("Hello, world"));

    let messages = session.transcript().messages();
    assert_eq!(messages[0].role, MessageRole::User);
    assert_eq!(messages[0].content, "Greet me");
    assert_eq!(messages[1].role, MessageRole::Assistant);
    assert_eq!(messages[1].content, "Hello, world");
    assert_eq!(messages[1].usage(), Some(Usage::new(4, 2)));
    assert!(!session.is_streaming());
    assert_eq!(session.last_usage(), Some(Usage::new(4, 2)));
}

#[tokio::test]
async fn test_failed_stream_rolls_back_placeholder() {
    let mock = MockHttpClient::new();
    mock.set_default_response(MockResponse::status(503, "unavailable"));
    let mut session = session_with(&mock);
    session.select_chat(ChatDetail::empty(1));

    let active = session.send_message(MessageSendReq::new("Hi")).unwrap();
    let outcome = session.drive(active).await;

    assert_eq!(outcome.error().unwrap().code, "HTTP_503");
    assert_eq!(session.last_error().unwrap().code, "HTTP_503");
    let messages = session.transcript().messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].role, MessageRole::User);
}

#[tokio::test]
async fn test_error_frame_keeps_partial_reply() {
    let mock = MockHttpClient::new();
    mock.set_default_response(MockResponse::sse([
        delta_frame("Partial"),
        error_frame("LLM_ERROR", "Provider failed"),
    ]));
    let mut session = session_with(&mock);
    session.select_chat(ChatDetail::empty(1));

    let active = session.send_message(MessageSendReq::new("Hi")).unwrap();
    session.drive(active).await;

    assert_eq!(session.last_error().unwrap().code, "LLM_ERROR");
    assert_eq!(session.transcript().last_message().unwrap().content, "Partial");
    assert!(!session.is_streaming());
}

#[tokio::test]
async fn test_cancel_stops_deltas() {
    let mock = MockHttpClient::new();
    mock.set_default_response(MockResponse::pending([delta_frame("Thinking")]));
    let mut session = session_with(&mock);
    session.select_chat(ChatDetail::empty(1));

    let active = session.send_message(MessageSendReq::new("Hi")).unwrap();
    let cancel = active.handle.cancel_handle();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();
    });

    let outcome = tokio::time::timeout(Duration::from_secs(2), session.drive(active))
        .await
        .expect("cancelled stream should finish");

    assert_eq!(outcome, StreamOutcome::Cancelled);
    assert!(session.last_error().is_none());
    assert_eq!(session.transcript().last_message().unwrap().content, "Thinking");
    assert!(!session.is_streaming());
}

#[tokio::test]
async fn test_queued_deltas_are_dropped_after_cancel() {
    let mock = MockHttpClient::new();
    mock.set_default_response(MockResponse::pending([delta_frame("late")]));
    let mut session = session_with(&mock);
    session.select_chat(ChatDetail::empty(1));

    let mut active = session.send_message(MessageSendReq::new("Hi")).unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(session.cancel());
    assert!(!session.cancel());

    let queued = active.events.recv().await.unwrap();
    assert_eq!(queued, StreamMessage::Delta("late".to_string()));
    assert!(!session.apply(queued));

    let outcome = tokio::time::timeout(Duration::from_secs(2), session.drive(active))
        .await
        .expect("cancelled stream should finish");

    assert_eq!(outcome, StreamOutcome::Cancelled);
    let messages = session.transcript().messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].role, MessageRole::User);
    assert!(!session.is_streaming());
}

#[tokio::test]
async fn test_external_cancel_stops_applying_queued_events() {
    let mock = MockHttpClient::new();
    mock.set_default_response(MockResponse::pending([
        delta_frame("one"),
        delta_frame("two"),
    ]));
    let mut session = session_with(&mock);
    session.select_chat(ChatDetail::empty(1));

    let active = session.send_message(MessageSendReq::new("Hi")).unwrap();
    let cancel = active.handle.cancel_handle();
    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.cancel();

    let mut seen = 0;
    let outcome = session
        .drive_with(active, |_, _| seen += 1)
        .await;

    assert_eq!(outcome, StreamOutcome::Cancelled);
    assert_eq!(seen, 0);
    assert_eq!(session.transcript().messages().len(), 1);
}

#[tokio::test]
async fn test_second_send_while_streaming_is_rejected() {
    let mock = MockHttpClient::new();
    mock.set_default_response(MockResponse::pending(Vec::<Bytes>::new()));
    let mut session = session_with(&mock);
    session.select_chat(ChatDetail::empty(1));

    let active = session.send_message(MessageSendReq::new("First")).unwrap();
    let err = session
        .send_message(MessageSendReq::new("Second"))
        .unwrap_err();
    assert!(matches!(
        err,
        ClientError::Transcript(TranscriptError::AlreadyStreaming)
    ));
    assert_eq!(session.transcript().messages().len(), 2);

    assert!(session.cancel());
    assert_eq!(session.drive(active).await, StreamOutcome::Cancelled);
    assert_eq!(session.transcript().messages().len(), 1);
}

#[tokio::test]
async fn test_send_validation_and_selection() {
    let mock = MockHttpClient::new();
    let mut session = session_with(&mock);

    let err = session.send_message(MessageSendReq::new("Hi")).unwrap_err();
    assert!(matches!(
        err,
        ClientError::Transcript(TranscriptError::NoTranscript)
    ));

    session.select_chat(ChatDetail::empty(1));
    let err = session.send_message(MessageSendReq::new("  ")).unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)));
    assert!(session.transcript().messages().is_empty());
    assert!(mock.get_requests().is_empty());
}

#[tokio::test]
async fn test_refresh_reconciles_with_server_copy() {
    let mock = MockHttpClient::new();
    mock.set_response(&stream_url(3), MockResponse::sse([delta_frame("Hi!"), done_frame(1, 1)]));
    mock.set_response(
        &chat_url(3),
        MockResponse::json(
            200,
            &chat_detail_envelope(
                3,
                json!([
                    {"id": 30, "role": "USER", "content": "Hello", "created_at": "2024-05-02T08:00:00"},
                    {"id": 31, "role": "ASSISTANT", "content": "Hi!", "created_at": "2024-05-02T08:00:01"}
                ]),
            ),
        ),
    );
    let mut session = session_with(&mock);
    session.load_chat(3).await.unwrap();
    assert_eq!(session.transcript().chat().unwrap().title, "Test chat");

    let active = session.send_message(MessageSendReq::new("Hello")).unwrap();
    session.drive(active).await;
    let local_ids: Vec<i64> = session.transcript().messages().iter().map(|m| m.id).collect();
    assert_eq!(local_ids.len(), 4);
    assert!(local_ids[2] > 31 && local_ids[3] > local_ids[2]);

    assert!(session.refresh().await.unwrap());
    let ids: Vec<i64> = session.transcript().messages().iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![30, 31]);
}

#[tokio::test]
async fn test_clear_current_chat() {
    let mock = MockHttpClient::new();
    mock.set_default_response(MockResponse::pending(Vec::<Bytes>::new()));
    let mut session = session_with(&mock);
    session.select_chat(ChatDetail::empty(1));

    let active = session.send_message(MessageSendReq::new("Hi")).unwrap();
    session.clear_current_chat();

    assert!(session.transcript().chat().is_none());
    assert!(!session.is_streaming());
    assert_eq!(active.handle.join().await, StreamOutcome::Cancelled);
}
