/**
 * Chat Service
 *
 * Room-level operations shared by the HTTP handlers and the socket session:
 * room access checks, the caller's room list, paginated history, soft
 * delete and read tracking. Message creation lives in `ingest.rs` as
 * another `impl ChatService` block.
 *
 * # Room Access
 *
 * A room is a project group. The caller may use it when they lead the group
 * or hold a membership row. Access is checked against the group directory
 * on every call and never cached.
 */

use serde::{Deserialize, Serialize};

use crate::backend::chat::serialize::resolve_payload;
use crate::backend::error::{ChatError, ChatResult};
use crate::backend::realtime::RoomBroadcaster;
use crate::backend::store::{ProjectGroup, Stores, User};
use crate::shared::message::ChatMessagePayload;

/// Entry of the caller's room list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoomSummary {
    pub id: String,
    pub name: String,
    pub last_message: Option<String>,
    pub last_message_timestamp: Option<String>,
    pub unread_count: u64,
}

/// One page of serialized history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryResponse {
    /// Oldest first within the page
    pub messages: Vec<ChatMessagePayload>,
    pub page: u32,
    pub pages: u64,
    pub total: u64,
}

/// Chat operations over the store capabilities and the broadcaster
#[derive(Clone)]
pub struct ChatService {
    pub(crate) stores: Stores,
    pub(crate) broadcaster: RoomBroadcaster,
}

impl ChatService {
    pub fn new(stores: Stores, broadcaster: RoomBroadcaster) -> Self {
        Self {
            stores,
            broadcaster,
        }
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    pub fn broadcaster(&self) -> &RoomBroadcaster {
        &self.broadcaster
    }

    /// Check that a user may use a room
    ///
    /// # Returns
    /// The backing group, `RoomNotFound` if it does not exist, or
    /// `AccessDenied` if the user neither leads it nor belongs to it
    pub async fn authorize_room(&self, user_id: &str, room_id: &str) -> ChatResult<ProjectGroup> {
        let group = self
            .stores
            .groups
            .find_group(room_id)
            .await?
            .ok_or_else(|| ChatError::room_not_found(room_id))?;

        if group.leader_id == user_id || self.stores.groups.is_member(room_id, user_id).await? {
            Ok(group)
        } else {
            tracing::debug!(user_id = %user_id, room_id = %room_id, "[Chat] Room access denied");
            Err(ChatError::access_denied("Not a member of this room"))
        }
    }

    /// Rooms the user belongs to or leads, with their latest message
    pub async fn list_rooms(&self, user: &User) -> ChatResult<Vec<RoomSummary>> {
        let groups = self.stores.groups.groups_for_user(&user.id).await?;
        let mut rooms = Vec::with_capacity(groups.len());

        for group in groups {
            let latest = self.stores.messages.latest_message(&group.id).await?;
            let unread_count = self.stores.messages.unread_count(&group.id, &user.id).await?;
            rooms.push(RoomSummary {
                last_message: latest.as_ref().map(|m| m.content.clone()),
                last_message_timestamp: latest.map(|m| m.created_at),
                id: group.id,
                name: group.name,
                unread_count,
            });
        }

        Ok(rooms)
    }

    /// Page through a room's history
    ///
    /// # Arguments
    /// * `page` - 1-based; page 1 holds the newest messages
    /// * `per_page` - already clamped by the caller
    pub async fn history(
        &self,
        user: &User,
        room_id: &str,
        page: u32,
        per_page: u32,
    ) -> ChatResult<HistoryResponse> {
        self.authorize_room(&user.id, room_id).await?;

        let history = self
            .stores
            .messages
            .room_history(room_id, page, per_page)
            .await?;

        let mut messages = Vec::with_capacity(history.messages.len());
        for message in &history.messages {
            messages.push(resolve_payload(&self.stores, message).await?);
        }

        Ok(HistoryResponse {
            pages: history.pages(),
            messages,
            page: history.page,
            total: history.total,
        })
    }

    /// Soft-delete a message
    ///
    /// Only the sender or the room leader may delete. Events already
    /// broadcast for the message are not retracted.
    pub async fn delete_message(&self, user: &User, room_id: &str, message_id: &str) -> ChatResult<()> {
        let group = self.authorize_room(&user.id, room_id).await?;

        let message = self
            .stores
            .messages
            .find_message(message_id)
            .await?
            .filter(|m| m.room_id == room_id && !m.is_deleted)
            .ok_or_else(|| ChatError::message_not_found(message_id))?;

        if message.sender_id != user.id && group.leader_id != user.id {
            return Err(ChatError::access_denied(
                "Only the sender or the room leader can delete a message",
            ));
        }

        if !self.stores.messages.soft_delete_message(message_id).await? {
            return Err(ChatError::message_not_found(message_id));
        }

        tracing::info!(
            user_id = %user.id,
            room_id = %room_id,
            message_id = %message_id,
            "[Chat] Message deleted"
        );
        Ok(())
    }

    /// Mark every current message in the room as read for the user
    ///
    /// # Returns
    /// Number of messages newly marked
    pub async fn mark_room_read(&self, user: &User, room_id: &str) -> ChatResult<u64> {
        self.authorize_room(&user.id, room_id).await?;
        let marked = self.stores.messages.mark_room_read(room_id, &user.id).await?;
        tracing::debug!(user_id = %user.id, room_id = %room_id, marked, "[Chat] Room marked read");
        Ok(marked)
    }
}
