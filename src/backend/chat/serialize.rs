/**
 * Canonical Message Serialization
 *
 * The one place a `StoredMessage` becomes a `ChatMessagePayload`. The HTTP
 * create route, the socket `send_message` frame and history reads all go
 * through `payload_from_parts`, so the same message always serializes the
 * same way.
 *
 * # Resolution
 *
 * The payload needs the sender's display name and avatar and, for task
 * messages, the full task. At creation time the caller passes the entities
 * it resolved while validating; history reads resolve them again with
 * `resolve_payload`.
 */

use crate::backend::error::ChatResult;
use crate::backend::store::{Stores, StoredMessage, User};
use crate::shared::message::{format_unix_seconds, ChatMessagePayload, MessageKind};
use crate::shared::task::Task;

/// Display name used when the sender no longer exists
pub const UNKNOWN_SENDER: &str = "Unknown";

/// Build the canonical payload from a stored row and resolved entities
///
/// # Arguments
/// * `message` - The stored row
/// * `sender` - Sender record, if it still exists
/// * `task` - Attached task, if it resolved to a non-deleted task
pub fn payload_from_parts(
    message: &StoredMessage,
    sender: Option<&User>,
    task: Option<Task>,
) -> ChatMessagePayload {
    let message_type = message
        .message_type
        .parse::<MessageKind>()
        .map(|kind| kind.wire_name().to_string())
        .unwrap_or_else(|_| message.message_type.to_uppercase());

    ChatMessagePayload {
        id: message.id.clone(),
        room_id: message.room_id.clone(),
        sender_id: message.sender_id.clone(),
        sender_name: sender
            .map(|u| u.username.clone())
            .unwrap_or_else(|| UNKNOWN_SENDER.to_string()),
        sender_avatar: sender.and_then(|u| u.avatar_url.clone()),
        content: message.content.clone(),
        message_type,
        file_url: message.file_url.clone(),
        task_id: message.task_id.clone(),
        task: task.filter(|t| !t.is_deleted),
        reply_to_id: message.reply_to_id.clone(),
        created_at: message.created_at.clone(),
        updated_time: format_unix_seconds(message.updated_time),
    }
}

/// Resolve sender and task for a stored row, then build its payload
pub async fn resolve_payload(stores: &Stores, message: &StoredMessage) -> ChatResult<ChatMessagePayload> {
    let sender = stores.users.find_user_by_id(&message.sender_id).await?;
    let task = match &message.task_id {
        Some(task_id) => stores.attachments.find_task(task_id).await?,
        None => None,
    };
    Ok(payload_from_parts(message, sender.as_ref(), task))
}
