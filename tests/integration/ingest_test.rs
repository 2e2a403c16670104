//! Ingestion edge cases that need a custom collaborator

use std::sync::Arc;

use async_trait::async_trait;
use pretty_assertions::assert_eq;

use taskchat::backend::chat::ChatService;
use taskchat::backend::realtime::{ConnectionHandle, ConnectionRegistry, RoomBroadcaster};
use taskchat::backend::store::{StoreError, StoreResult, Stores, User, UserDirectory};
use taskchat::shared::{SendMessageBody, ServerEvent};

use crate::common::{drain, seeded_store, user, ROOM};

/// User directory whose reads always fail
struct UnreachableUsers;

#[async_trait]
impl UserDirectory for UnreachableUsers {
    async fn find_user_by_id(&self, _id: &str) -> StoreResult<Option<User>> {
        Err(StoreError::rejected("user directory unavailable"))
    }

    async fn find_user_by_username(&self, _username: &str) -> StoreResult<Option<User>> {
        Err(StoreError::rejected("user directory unavailable"))
    }

    async fn find_user_by_email(&self, _email: &str) -> StoreResult<Option<User>> {
        Err(StoreError::rejected("user directory unavailable"))
    }
}

#[tokio::test]
async fn test_committed_message_broadcasts_when_sender_reload_fails() {
    let store = seeded_store().await;
    let mut stores = Stores::from_shared(store.clone());
    stores.users = Arc::new(UnreachableUsers);

    let registry = Arc::new(ConnectionRegistry::new());
    let chat = ChatService::new(stores, RoomBroadcaster::new(registry.clone()));

    let (carol, mut carol_rx) = ConnectionHandle::channel();
    registry.register(carol.clone(), "u3");
    registry.subscribe(carol.id(), ROOM);

    let alice = user("u1", "alice");
    let payload = crate::assert_ok!(
        chat.send_message(&alice, ROOM, SendMessageBody::text("hi")).await
    );

    assert_eq!(payload.sender_name, "alice");
    assert_eq!(payload.sender_avatar.as_deref(), Some("/files/avatar-u1"));
    assert_eq!(store.all_messages().await.len(), 1);
    assert_eq!(drain(&mut carol_rx), vec![ServerEvent::NewMessage { payload }]);
}
