//! Chat API integration tests
//!
//! Runs the full router (auth middleware, handlers, error conversion)
//! against the seeded in-memory store.

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use taskchat::backend::chat::{HistoryResponse, RoomSummary};
use taskchat::backend::server::ServerConfig;
use taskchat::shared::{ChatMessagePayload, SendMessageBody, ServerEvent};

use crate::common::{drain, TestChat, ROOM};

#[tokio::test]
async fn test_missing_credential_is_unauthorized() {
    let chat = TestChat::new().await;
    let server = chat.server();

    let response = server.get("/chat/rooms").await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], 401);
}

#[tokio::test]
async fn test_unknown_credential_is_unauthorized() {
    let chat = TestChat::new().await;
    let response = chat
        .server()
        .get("/chat/rooms")
        .authorization_bearer("nobody")
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_list_rooms_for_leader_and_member() {
    let chat = TestChat::new().await;
    let server = chat.server();

    server
        .post("/chat/rooms/G1/messages")
        .authorization_bearer("u3")
        .json(&json!({"content": "morning"}))
        .await
        .assert_status(StatusCode::CREATED);

    let rooms: Vec<RoomSummary> = server
        .get("/chat/rooms")
        .authorization_bearer("u1")
        .await
        .json();
    assert_eq!(rooms.len(), 1);
    assert_eq!(rooms[0].id, ROOM);
    assert_eq!(rooms[0].name, "Apollo");
    assert_eq!(rooms[0].last_message.as_deref(), Some("morning"));
    assert!(rooms[0].last_message_timestamp.is_some());
    assert_eq!(rooms[0].unread_count, 1);

    // Own messages never count as unread.
    let rooms: Vec<RoomSummary> = server
        .get("/chat/rooms")
        .authorization_bearer("u3")
        .await
        .json();
    assert_eq!(rooms[0].unread_count, 0);

    // bob leads G2 only
    let rooms: Vec<RoomSummary> = server
        .get("/chat/rooms")
        .authorization_bearer("bob")
        .await
        .json();
    assert_eq!(rooms.len(), 1);
    assert_eq!(rooms[0].id, "G2");
    assert!(rooms[0].last_message.is_none());
}

#[tokio::test]
async fn test_post_message_broadcasts_to_subscribers() {
    let chat = TestChat::new().await;
    let (_carol, mut carol_rx) = chat.connect("u3", Some(ROOM)).await;

    let response = chat
        .server()
        .post("/chat/rooms/G1/messages")
        .authorization_bearer("u1")
        .json(&SendMessageBody::text("over http"))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);

    let payload: ChatMessagePayload = response.json();
    assert_eq!(payload.sender_name, "alice");
    assert_eq!(payload.message_type, "TEXT");

    assert_eq!(
        drain(&mut carol_rx),
        vec![ServerEvent::NewMessage { payload }]
    );
}

#[tokio::test]
async fn test_post_message_error_codes() {
    let chat = TestChat::new().await;
    let server = chat.server();

    let not_member = server
        .post("/chat/rooms/G1/messages")
        .authorization_bearer("u2")
        .json(&SendMessageBody::text("hello?"))
        .await;
    assert_eq!(not_member.status_code(), StatusCode::FORBIDDEN);

    let no_room = server
        .post("/chat/rooms/G404/messages")
        .authorization_bearer("u1")
        .json(&SendMessageBody::text("hello?"))
        .await;
    assert_eq!(no_room.status_code(), StatusCode::NOT_FOUND);
    let body: Value = no_room.json();
    assert_eq!(body["error"]["message"], "Chat room G404 not found");

    let empty = server
        .post("/chat/rooms/G1/messages")
        .authorization_bearer("u1")
        .json(&json!({"content": "   "}))
        .await;
    assert_eq!(empty.status_code(), StatusCode::BAD_REQUEST);

    let malformed = server
        .post("/chat/rooms/G1/messages")
        .authorization_bearer("u1")
        .json(&json!({"content": 42}))
        .await;
    assert_eq!(malformed.status_code(), StatusCode::BAD_REQUEST);

    let too_long = server
        .post("/chat/rooms/G1/messages")
        .authorization_bearer("u1")
        .json(&SendMessageBody::text("x".repeat(10_001)))
        .await;
    assert_eq!(too_long.status_code(), StatusCode::BAD_REQUEST);

    // The cap holds for captions on attachments too
    let long_caption = server
        .post("/chat/rooms/G1/messages")
        .authorization_bearer("u1")
        .json(&json!({
            "content": "x".repeat(10_001),
            "message_type": "file",
            "file_url": "/files/f4",
        }))
        .await;
    assert_eq!(long_caption.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = long_caption.json();
    crate::assert_contains!(body["error"]["message"].as_str().unwrap_or_default(), "10000");

    assert!(chat.store.all_messages().await.is_empty());
}

#[tokio::test]
async fn test_post_message_persistence_failure() {
    let chat = TestChat::new().await;
    let (_carol, mut carol_rx) = chat.connect("u3", Some(ROOM)).await;
    chat.store.set_fail_writes(true);

    let response = chat
        .server()
        .post("/chat/rooms/G1/messages")
        .authorization_bearer("u1")
        .json(&SendMessageBody::text("lost"))
        .await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["error"]["message"], "Internal server error");
    crate::assert_quiet!(carol_rx);
}

#[tokio::test]
async fn test_history_pages_newest_first() {
    let config = ServerConfig::builder().page_size(2).max_page_size(3).build().unwrap();
    let chat = TestChat::with_config(config).await;
    let alice = chat.store_user("u1").await;

    for n in 1..=5 {
        let body = SendMessageBody::text(format!("m{n}"));
        crate::assert_ok!(chat.state.chat.send_message(&alice, ROOM, body).await);
    }

    let server = chat.server();
    let first: HistoryResponse = server
        .get("/chat/rooms/G1/messages")
        .authorization_bearer("u3")
        .await
        .json();
    let contents: Vec<&str> = first.messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["m4", "m5"]);
    assert_eq!((first.page, first.pages, first.total), (1, 3, 5));

    let last: HistoryResponse = server
        .get("/chat/rooms/G1/messages")
        .authorization_bearer("u3")
        .add_query_param("page", 3)
        .await
        .json();
    let contents: Vec<&str> = last.messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["m1"]);

    // per_page above the maximum is clamped
    let clamped: HistoryResponse = server
        .get("/chat/rooms/G1/messages")
        .authorization_bearer("u3")
        .add_query_param("per_page", 50)
        .await
        .json();
    assert_eq!(clamped.messages.len(), 3);
    assert_eq!(clamped.pages, 2);

    let bad_query = server
        .get("/chat/rooms/G1/messages")
        .authorization_bearer("u3")
        .add_query_param("page", "first")
        .await;
    assert_eq!(bad_query.status_code(), StatusCode::BAD_REQUEST);

    let outsider = server
        .get("/chat/rooms/G1/messages")
        .authorization_bearer("u2")
        .await;
    assert_eq!(outsider.status_code(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_delete_message_rules() {
    let chat = TestChat::new().await;
    let dave = chat.store_user("u4").await;
    let body = SendMessageBody::text("oops");
    let message = crate::assert_ok!(chat.state.chat.send_message(&dave, ROOM, body).await);
    let path = format!("/chat/rooms/G1/messages/{}", message.id);
    let server = chat.server();

    // Another member may not delete it
    let response = server.delete(&path).authorization_bearer("u3").await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    // The room leader may
    let response = server.delete(&path).authorization_bearer("u1").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body, json!({"success": true}));

    let response = server.delete(&path).authorization_bearer("u4").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let history: HistoryResponse = server
        .get("/chat/rooms/G1/messages")
        .authorization_bearer("u4")
        .await
        .json();
    assert_eq!(history.total, 0);
}

#[tokio::test]
async fn test_mark_room_read() {
    let chat = TestChat::new().await;
    let carol = chat.store_user("u3").await;
    for text in ["one", "two"] {
        let body = SendMessageBody::text(text);
        crate::assert_ok!(chat.state.chat.send_message(&carol, ROOM, body).await);
    }
    let server = chat.server();

    let body: Value = server
        .post("/chat/rooms/G1/read")
        .authorization_bearer("u4")
        .await
        .json();
    assert_eq!(body, json!({"marked": 2}));

    let body: Value = server
        .post("/chat/rooms/G1/read")
        .authorization_bearer("u4")
        .await
        .json();
    assert_eq!(body, json!({"marked": 0}));

    let rooms: Vec<RoomSummary> = server
        .get("/chat/rooms")
        .authorization_bearer("u4")
        .await
        .json();
    assert_eq!(rooms[0].unread_count, 0);
}

#[tokio::test]
async fn test_health_reports_live_connections() {
    let chat = TestChat::new().await;
    let (_alice, _rx) = chat.connect("u1", Some(ROOM)).await;
    let server = chat.server();

    let body: Value = server.get("/health").await.json();
    assert_eq!(body, json!({"status": "ok", "connections": 1, "rooms": 1}));

    let info: Value = server.get("/").await.json();
    assert_eq!(info["name"], "taskchat");

    server.get("/nowhere").await.assert_status(StatusCode::NOT_FOUND);
}
