//! Socket session scenarios
//!
//! Drives `ChatSession` directly: each connection's outbound queue is read
//! back and decoded into `ServerEvent`s.

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use serde_json::json;

use taskchat::backend::auth::{create_token, TOKEN_TTL_SECS};
use taskchat::backend::chat::{Flow, SessionState};
use taskchat::backend::server::ServerConfig;
use taskchat::shared::{SendMessageBody, ServerEvent};

use crate::common::{drain, send_frame, TestChat, OTHER_ROOM, ROOM};

fn new_message(events: &[ServerEvent]) -> Vec<&taskchat::shared::ChatMessagePayload> {
    events
        .iter()
        .filter_map(|event| match event {
            ServerEvent::NewMessage { payload } => Some(payload),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_member_message_reaches_room_and_own_devices() {
    let chat = TestChat::new().await;
    let (mut phone, mut phone_rx) = chat.connect("u1", Some(ROOM)).await;
    let (_laptop, mut laptop_rx) = chat.connect("u1", Some(ROOM)).await;
    let (_carol, mut carol_rx) = chat.connect("u3", Some(ROOM)).await;

    let flow = phone
        .handle_text(&send_frame(ROOM, json!({"content": "hi", "message_type": "text"})))
        .await;
    assert_eq!(flow, Flow::Continue);

    let phone_events = drain(&mut phone_rx);
    assert_eq!(phone_events.len(), 2);
    let payload = assert_matches!(&phone_events[0], ServerEvent::NewMessage { payload } => payload);
    assert_matches!(
        &phone_events[1],
        ServerEvent::MessageSent { message_id: Some(id), success: true, error: None } if *id == payload.id
    );
    assert_eq!(payload.content, "hi");
    assert_eq!(payload.message_type, "TEXT");
    assert_eq!(payload.sender_name, "alice");
    assert_eq!(payload.room_id, ROOM);

    for rx in [&mut laptop_rx, &mut carol_rx] {
        let events = drain(rx);
        assert_eq!(new_message(&events), vec![payload]);
    }
}

#[tokio::test]
async fn test_non_member_subscribe_is_refused() {
    let chat = TestChat::new().await;
    let (_alice, _alice_rx) = chat.connect("u1", Some(ROOM)).await;
    let (mut bob, mut bob_rx) = chat.connect("u2", None).await;

    bob.handle_text(r#"{"type":"subscribe","room_id":"G1"}"#).await;
    assert_matches!(drain(&mut bob_rx).as_slice(), [ServerEvent::Error { code: 403, .. }]);

    bob.handle_text(r#"{"type":"subscribe","roomId":"G404"}"#).await;
    assert_matches!(drain(&mut bob_rx).as_slice(), [ServerEvent::Error { code: 404, .. }]);

    assert_eq!(chat.state.registry.subscribers_of(ROOM).len(), 1);
    assert_eq!(bob.state(), SessionState::Authenticated);
}

#[tokio::test]
async fn test_attachment_kind_without_file_is_rejected() {
    let chat = TestChat::new().await;
    let (mut alice, mut alice_rx) = chat.connect("u1", Some(ROOM)).await;
    let (_carol, mut carol_rx) = chat.connect("u3", Some(ROOM)).await;

    alice
        .handle_text(&send_frame(ROOM, json!({"content": "look", "message_type": "image"})))
        .await;

    let events = drain(&mut alice_rx);
    let error = assert_matches!(
        events.as_slice(),
        [ServerEvent::MessageSent { message_id: None, success: false, error: Some(error) }] => error
    );
    crate::assert_contains!(error, "file_url");
    crate::assert_quiet!(carol_rx);
    assert!(chat.store.all_messages().await.is_empty());
}

#[tokio::test]
async fn test_reply_to_deleted_message_is_rejected() {
    let chat = TestChat::new().await;
    let alice = chat.store_user("u1").await;
    let body = SendMessageBody::text("first");
    let original = crate::assert_ok!(chat.state.chat.send_message(&alice, ROOM, body).await);
    crate::assert_ok!(chat.state.chat.delete_message(&alice, ROOM, &original.id).await);

    let (mut carol, mut carol_rx) = chat.connect("u3", Some(ROOM)).await;
    carol
        .handle_text(&send_frame(
            ROOM,
            json!({"content": "replying", "reply_to_id": original.id}),
        ))
        .await;

    let events = drain(&mut carol_rx);
    assert_matches!(
        events.as_slice(),
        [ServerEvent::MessageSent { success: false, error: Some(error), .. }] if error.contains("reply_to_id")
    );
    assert_eq!(chat.store.all_messages().await.len(), 1);
}

#[tokio::test]
async fn test_user_with_two_connections_receives_on_both() {
    let chat = TestChat::new().await;
    let (_first, mut first_rx) = chat.connect("u3", Some(ROOM)).await;
    let (_second, mut second_rx) = chat.connect("u3", Some(ROOM)).await;
    let (mut dave, mut dave_rx) = chat.connect("u4", Some(ROOM)).await;

    dave.handle_text(&send_frame(ROOM, json!({"content": "standup in 5"}))).await;

    let dave_events = drain(&mut dave_rx);
    let sent = new_message(&dave_events);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].sender_name, "dave");

    assert_eq!(new_message(&drain(&mut first_rx)), sent);
    assert_eq!(new_message(&drain(&mut second_rx)), sent);
    assert_eq!(chat.state.registry.connections_of("u3").len(), 2);
}

#[tokio::test]
async fn test_dropped_connection_does_not_block_others() {
    let chat = TestChat::new().await;
    let (_gone, gone_rx) = chat.connect("u3", Some(ROOM)).await;
    let (_alice, mut alice_rx) = chat.connect("u1", Some(ROOM)).await;
    let (mut dave, mut dave_rx) = chat.connect("u4", Some(ROOM)).await;

    // The writer side of this connection has gone away.
    drop(gone_rx);

    dave.handle_text(&send_frame(ROOM, json!({"content": "still here?"}))).await;

    assert_eq!(new_message(&drain(&mut alice_rx)).len(), 1);
    assert_matches!(
        drain(&mut dave_rx).as_slice(),
        [ServerEvent::NewMessage { .. }, ServerEvent::MessageSent { success: true, .. }]
    );
    // Left for its own session to clean up.
    assert_eq!(chat.state.registry.subscribers_of(ROOM).len(), 3);
}

#[tokio::test]
async fn test_persistence_failure_skips_broadcast() {
    let chat = TestChat::new().await;
    let (mut alice, mut alice_rx) = chat.connect("u1", Some(ROOM)).await;
    let (_carol, mut carol_rx) = chat.connect("u3", Some(ROOM)).await;

    chat.store.set_fail_writes(true);
    alice.handle_text(&send_frame(ROOM, json!({"content": "lost"}))).await;

    assert_eq!(
        drain(&mut alice_rx),
        vec![ServerEvent::message_failed("Internal server error")]
    );
    crate::assert_quiet!(carol_rx);
    assert_eq!(alice.state(), SessionState::Subscribed);
}

#[tokio::test]
async fn test_send_rechecks_membership_without_subscription() {
    let chat = TestChat::new().await;
    let (mut bob, mut bob_rx) = chat.connect("u2", None).await;

    bob.handle_text(&send_frame(ROOM, json!({"content": "let me in"}))).await;
    assert_matches!(
        drain(&mut bob_rx).as_slice(),
        [ServerEvent::MessageSent { success: false, error: Some(error), .. }] if error.starts_with("Access denied")
    );

    // Members may send without subscribing first.
    let (mut dave, mut dave_rx) = chat.connect("u4", None).await;
    dave.handle_text(&send_frame(ROOM, json!({"content": "drive-by"}))).await;
    assert_matches!(
        drain(&mut dave_rx).as_slice(),
        [ServerEvent::MessageSent { success: true, .. }]
    );
}

#[tokio::test]
async fn test_file_and_task_access_rules() {
    let chat = TestChat::new().await;
    let (mut alice, mut alice_rx) = chat.connect("u1", Some(ROOM)).await;

    // Another room's file
    alice
        .handle_text(&send_frame(ROOM, json!({"message_type": "image", "file_url": "f2"})))
        .await;
    assert_matches!(
        drain(&mut alice_rx).as_slice(),
        [ServerEvent::MessageSent { success: false, error: Some(error), .. }] if error.starts_with("Access denied")
    );

    // Deleted file
    alice
        .handle_text(&send_frame(ROOM, json!({"message_type": "file", "file_url": "/files/f3"})))
        .await;
    assert_matches!(
        drain(&mut alice_rx).as_slice(),
        [ServerEvent::MessageSent { success: false, .. }]
    );

    // Own file given as a URL is stored in canonical form
    alice
        .handle_text(&send_frame(
            ROOM,
            json!({"message_type": "IMAGE", "file_url": "https://cdn.example.com/files/f1?size=large"}),
        ))
        .await;
    let events = drain(&mut alice_rx);
    let payload = assert_matches!(&events[0], ServerEvent::NewMessage { payload } => payload);
    assert_eq!(payload.file_url.as_deref(), Some("/files/f1"));
    assert_eq!(payload.message_type, "IMAGE");

    // Task from this room's project carries the full task
    alice
        .handle_text(&send_frame(ROOM, json!({"message_type": "task", "task_id": "t1"})))
        .await;
    let events = drain(&mut alice_rx);
    let payload = assert_matches!(&events[0], ServerEvent::NewMessage { payload } => payload);
    let task = payload.task.as_ref().unwrap();
    assert_eq!(task.id, "t1");
    assert_eq!(task.title, "Task t1");

    // Task from another project
    alice
        .handle_text(&send_frame(ROOM, json!({"message_type": "task", "task_id": "t2"})))
        .await;
    assert_matches!(
        drain(&mut alice_rx).as_slice(),
        [ServerEvent::MessageSent { success: false, .. }]
    );

    // Unknown kind
    alice
        .handle_text(&send_frame(ROOM, json!({"message_type": "sticker", "content": "x"})))
        .await;
    assert_matches!(
        drain(&mut alice_rx).as_slice(),
        [ServerEvent::MessageSent { success: false, .. }]
    );
}

#[tokio::test]
async fn test_member_can_attach_file_shared_into_room() {
    let chat = TestChat::new().await;
    let (mut carol, mut carol_rx) = chat.connect("u3", Some(ROOM)).await;

    carol
        .handle_text(&send_frame(ROOM, json!({"message_type": "video", "file_url": "f4"})))
        .await;

    let events = drain(&mut carol_rx);
    let payload = assert_matches!(&events[0], ServerEvent::NewMessage { payload } => payload);
    assert_eq!(payload.file_url.as_deref(), Some("/files/f4"));
    assert_eq!(payload.content, "");
}

#[tokio::test]
async fn test_handshake_resolves_username_and_email() {
    let chat = TestChat::new().await;

    let (by_name, _rx) = chat.connect("carol", None).await;
    assert_eq!(by_name.user().map(|u| u.id.as_str()), Some("u3"));

    let (by_email, _rx) = chat.connect("dave@example.com", None).await;
    assert_eq!(by_email.user().map(|u| u.id.as_str()), Some("u4"));
}

#[tokio::test]
async fn test_handshake_rejects_inactive_user() {
    let chat = TestChat::new().await;
    chat.store.set_user_active("u3", false).await;

    let (session, mut rx, flow) = chat.open("u3", Some(ROOM)).await;
    assert_eq!(flow, Flow::Close);
    assert_eq!(session.state(), SessionState::Closed);
    assert_matches!(drain(&mut rx).as_slice(), [ServerEvent::Error { code: 401, .. }]);
    assert_eq!(chat.state.registry.connection_count(), 0);
}

#[tokio::test]
async fn test_handshake_accepts_signed_token() {
    let config = ServerConfig::builder().jwt_secret("test-secret").build().unwrap();
    let chat = TestChat::with_config(config).await;
    let token = create_token("test-secret", "u4", TOKEN_TTL_SECS).unwrap();

    let (session, _rx) = chat.connect(&token, Some(ROOM)).await;
    assert_eq!(session.user().map(|u| u.id.as_str()), Some("u4"));
    assert_eq!(session.state(), SessionState::Subscribed);

    let forged = create_token("wrong-secret", "u4", TOKEN_TTL_SECS).unwrap();
    let (_session, _rx, flow) = chat.open(&forged, None).await;
    assert_eq!(flow, Flow::Close);
}

#[tokio::test]
async fn test_handshake_subscribe_failure_keeps_session() {
    let chat = TestChat::new().await;
    let (session, mut rx, flow) = chat.open("u3", Some(OTHER_ROOM)).await;

    assert_eq!(flow, Flow::Continue);
    assert_matches!(
        drain(&mut rx).as_slice(),
        [ServerEvent::Connected { .. }, ServerEvent::Error { code: 403, .. }]
    );
    assert_eq!(session.state(), SessionState::Authenticated);
}

#[tokio::test]
async fn test_close_removes_every_subscription() {
    let chat = TestChat::new().await;
    let (mut alice, _rx) = chat.connect("u1", Some(ROOM)).await;
    alice.handle_text(r#"{"type":"subscribe","room_id":"G1"}"#).await;
    assert_eq!(chat.state.registry.subscribers_of(ROOM).len(), 1);

    alice.close();
    alice.close();
    assert_eq!(alice.state(), SessionState::Closed);
    assert!(chat.state.registry.subscribers_of(ROOM).is_empty());
    assert!(chat.state.registry.connections_of("u1").is_empty());
    assert_eq!(alice.handle_text(r#"{"type":"ping"}"#).await, Flow::Close);
}
