/**
 * Message Ingestion
 *
 * The single validate → persist → serialize → broadcast routine behind both
 * message entry points (`POST /chat/rooms/{room_id}/messages` and the socket
 * `send_message` frame).
 *
 * # Validation Order
 *
 * Checks stop at the first failure:
 *
 * 1. The room exists and the sender leads it or belongs to it
 * 2. `message_type` is a recognised kind
 * 3. `text` messages carry non-empty content; no content exceeds
 *    `MAX_CONTENT_LENGTH` characters
 * 4. A file reference is present when the kind needs one, and any file
 *    reference resolves to a non-deleted file owned by the sender or shared
 *    into the room
 * 5. A task reference is present for `task` messages, and any task
 *    reference resolves to a non-deleted task owned by the sender or
 *    belonging to the room's project
 * 6. A reply target is a non-deleted message in the same room
 *
 * # Persistence and Broadcast
 *
 * Nothing is broadcast unless the insert succeeds. The payload is built from
 * entities resolved here, before the broadcast, and the same payload value
 * is both broadcast and returned.
 */

use crate::backend::chat::serialize::payload_from_parts;
use crate::backend::chat::service::ChatService;
use crate::backend::error::{ChatError, ChatResult};
use crate::backend::store::{NewMessage, User};
use crate::shared::event::{SendMessageBody, ServerEvent};
use crate::shared::message::{ChatMessagePayload, MessageKind, MAX_CONTENT_LENGTH};
use crate::shared::task::Task;

/// Extract a file id from a bare id or a URL ending in the id
///
/// `"f1"`, `"/files/f1"` and `"https://host/files/f1?x=1"` all yield `"f1"`.
pub fn file_id_from_reference(reference: &str) -> Option<&str> {
    let without_query = reference.split(['?', '#']).next().unwrap_or_default();
    without_query
        .trim()
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|id| !id.is_empty())
}

/// Canonical stored form of a file reference
pub fn canonical_file_url(file_id: &str) -> String {
    format!("/files/{file_id}")
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl ChatService {
    /// Validate, persist and broadcast a new message
    ///
    /// # Arguments
    /// * `sender` - The authenticated sender
    /// * `room_id` - Target room
    /// * `body` - Client-supplied fields
    ///
    /// # Returns
    /// The canonical payload that was broadcast as `new_message`
    pub async fn send_message(
        &self,
        sender: &User,
        room_id: &str,
        body: SendMessageBody,
    ) -> ChatResult<ChatMessagePayload> {
        let (message, task) = self.validate_message(sender, room_id, body).await?;

        let stored = self
            .stores
            .messages
            .insert_message(message)
            .await
            .map_err(|e| {
                tracing::error!(
                    user_id = %sender.id,
                    room_id = %room_id,
                    "[Chat] Failed to persist message: {}",
                    e
                );
                ChatError::from(e)
            })?;

        // The message is committed; a failed re-read must not block its broadcast.
        let current_sender = match self.stores.users.find_user_by_id(&sender.id).await {
            Ok(Some(user)) => user,
            Ok(None) => sender.clone(),
            Err(e) => {
                tracing::warn!(
                    user_id = %sender.id,
                    message_id = %stored.id,
                    "[Chat] Sender lookup failed after insert, using the caller record: {}",
                    e
                );
                sender.clone()
            }
        };
        let payload = payload_from_parts(&stored, Some(&current_sender), task);

        let delivered = self.broadcaster.broadcast(
            room_id,
            &ServerEvent::NewMessage {
                payload: payload.clone(),
            },
        );

        tracing::info!(
            user_id = %sender.id,
            room_id = %room_id,
            message_id = %payload.id,
            delivered,
            "[Chat] Message created"
        );

        Ok(payload)
    }

    async fn validate_message(
        &self,
        sender: &User,
        room_id: &str,
        body: SendMessageBody,
    ) -> ChatResult<(NewMessage, Option<Task>)> {
        self.authorize_room(&sender.id, room_id).await?;

        let kind: MessageKind = body.message_type.parse()?;

        if kind == MessageKind::Text && body.content.trim().is_empty() {
            return Err(ChatError::validation("content", "Message content cannot be empty"));
        }
        if body.content.chars().count() > MAX_CONTENT_LENGTH {
            return Err(ChatError::validation(
                "content",
                format!("Message content exceeds {MAX_CONTENT_LENGTH} characters"),
            ));
        }

        let file_url = match non_empty(body.file_url) {
            Some(reference) => Some(self.check_file(sender, room_id, &reference).await?),
            None if kind.requires_file() => {
                return Err(ChatError::validation(
                    "file_url",
                    format!("A file is required for {kind} messages"),
                ));
            }
            None => None,
        };

        let task = match non_empty(body.task_id) {
            Some(task_id) => Some(self.check_task(sender, room_id, &task_id).await?),
            None if kind.requires_task() => {
                return Err(ChatError::validation(
                    "task_id",
                    "A task is required for task messages",
                ));
            }
            None => None,
        };

        let reply_to_id = match non_empty(body.reply_to_id) {
            Some(reply_to_id) => {
                let target = self.stores.messages.find_message(&reply_to_id).await?;
                match target {
                    Some(target) if target.room_id == room_id && !target.is_deleted => {
                        Some(reply_to_id)
                    }
                    _ => {
                        return Err(ChatError::validation(
                            "reply_to_id",
                            "Reply target not found in this room",
                        ));
                    }
                }
            }
            None => None,
        };

        let message = NewMessage {
            room_id: room_id.to_string(),
            sender_id: sender.id.clone(),
            kind,
            content: body.content,
            file_url,
            task_id: task.as_ref().map(|t| t.id.clone()),
            reply_to_id,
        };
        Ok((message, task))
    }

    /// Resolve a file reference and return its canonical URL
    async fn check_file(&self, sender: &User, room_id: &str, reference: &str) -> ChatResult<String> {
        let file_id = file_id_from_reference(reference)
            .ok_or_else(|| ChatError::validation("file_url", "Invalid file reference"))?;

        let file = self
            .stores
            .attachments
            .find_file(file_id)
            .await?
            .filter(|f| !f.is_deleted)
            .ok_or_else(|| ChatError::validation("file_url", "File not found"))?;

        if file.user_id != sender.id && file.group_id.as_deref() != Some(room_id) {
            return Err(ChatError::access_denied("File is not available in this room"));
        }

        Ok(canonical_file_url(&file.id))
    }

    /// Resolve a task reference the sender may expose to the room
    async fn check_task(&self, sender: &User, room_id: &str, task_id: &str) -> ChatResult<Task> {
        let task = self
            .stores
            .attachments
            .find_task(task_id)
            .await?
            .filter(|t| !t.is_deleted)
            .ok_or_else(|| ChatError::validation("task_id", "Task not found"))?;

        if task.user_id != sender.id && task.project_id.as_deref() != Some(room_id) {
            return Err(ChatError::access_denied("Task is not available in this room"));
        }

        Ok(task)
    }
}
