//! HTTP contract tests for the chat and history clients.

use std::time::Duration;

use hearth_chat::{
    ChatBackend, ChatError, ChatRequest, ContextTurn, HistoryQuery, HistoryService,
    HttpChatBackend, HttpHistoryClient,
};
use hearth_core::{EmotionTag, Persona, Role};
use serde_json::json;
use wiremock::matchers::{body_json, body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn request() -> ChatRequest {
    ChatRequest {
        message: "hello".to_string(),
        persona: Persona::Father,
        user_id: None,
        prior_context: vec![ContextTurn {
            role: Role::Assistant,
            content: "Hey kiddo!".to_string(),
        }],
    }
}

fn chat_backend(server: &MockServer) -> HttpChatBackend {
    HttpChatBackend::new(format!("{}/api", server.uri()), Duration::from_secs(5)).unwrap()
}

// ────────────────────────────────────────────────────────────────────────────
// Chat
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_chat_request_shape() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_json(json!({
            "message": "hello",
            "relation_type": "father",
            "conversation_history": [{"role": "assistant", "content": "Hey kiddo!"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "Good to hear from you.",
            "emotion_detected": "happy",
            "relation_type": "father",
            "timestamp": "2024-05-01T12:00:00.000000"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let reply = chat_backend(&server).send(&request()).await.unwrap();
    assert_eq!(reply.response, "Good to hear from you.");
    assert_eq!(reply.emotion, Some(EmotionTag::happy()));
    assert!(reply.timestamp.is_some());
}

#[tokio::test]
async fn test_chat_sends_user_id_when_known() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({"user_id": 12})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "hi"})))
        .expect(1)
        .mount(&server)
        .await;

    let request = ChatRequest {
        user_id: Some(12),
        ..request()
    };
    let reply = chat_backend(&server).send(&request).await.unwrap();
    assert_eq!(reply.response, "hi");
    assert!(reply.emotion.is_none());
}

#[tokio::test]
async fn test_chat_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .mount(&server)
        .await;

    let err = chat_backend(&server).send(&request()).await.unwrap_err();
    match err {
        ChatError::Server { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "internal error");
        }
        other => panic!("expected server error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_chat_malformed_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = chat_backend(&server).send(&request()).await.unwrap_err();
    assert!(matches!(err, ChatError::Decode(_)), "got {err:?}");
}

#[tokio::test]
async fn test_chat_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"response": "late"}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let backend =
        HttpChatBackend::new(format!("{}/api", server.uri()), Duration::from_millis(50)).unwrap();
    let err = backend.send(&request()).await.unwrap_err();
    assert!(matches!(err, ChatError::Timeout(_)), "got {err:?}");
}

#[tokio::test]
async fn test_chat_unreachable() {
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let backend = HttpChatBackend::new(format!("{}/api", uri), Duration::from_secs(2)).unwrap();
    let err = backend.send(&request()).await.unwrap_err();
    assert!(matches!(err, ChatError::Network(_)), "got {err:?}");
}

// ────────────────────────────────────────────────────────────────────────────
// History
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_history_query_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/history"))
        .and(query_param("limit", "10"))
        .and(query_param("offset", "20"))
        .and(query_param("relation_type", "sister"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "conversations": [{
                "id": 31,
                "user_id": null,
                "relation_type": "sister",
                "message": "guess what",
                "response": "WHAT? Tell me everything!",
                "emotion": "excited",
                "timestamp": "2024-05-02T09:00:00"
            }],
            "total": 31
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client =
        HttpHistoryClient::new(format!("{}/api", server.uri()), Duration::from_secs(5)).unwrap();
    let page = client
        .fetch(&HistoryQuery {
            persona: Some(Persona::Sister),
            limit: 10,
            offset: 20,
            ..HistoryQuery::default()
        })
        .await
        .unwrap();

    assert_eq!(page.total, 31);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].persona(), Some(Persona::Sister));
    assert_eq!(page.items[0].response, "WHAT? Tell me everything!");
}

#[tokio::test]
async fn test_history_empty_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/history"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"conversations": [], "total": 0})),
        )
        .mount(&server)
        .await;

    let client =
        HttpHistoryClient::new(format!("{}/api", server.uri()), Duration::from_secs(5)).unwrap();
    let page = client.fetch(&HistoryQuery::default()).await.unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.total, 0);
}

#[tokio::test]
async fn test_create_user() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/create-user"))
        .and(body_json(json!({"name": "Sam"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 5,
            "name": "Sam",
            "created_at": "2024-05-01T10:00:00"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client =
        HttpHistoryClient::new(format!("{}/api", server.uri()), Duration::from_secs(5)).unwrap();
    let user = client.create_user(" Sam ").await.unwrap();
    assert_eq!(user.id, 5);
    assert_eq!(user.name, "Sam");
}

#[tokio::test]
async fn test_create_user_rejects_blank_name() {
    let client = HttpHistoryClient::new("http://127.0.0.1:9/api", Duration::from_secs(1)).unwrap();
    let err = client.create_user("   ").await.unwrap_err();
    assert!(matches!(err, ChatError::EmptyMessage));
}
