/**
 * Persistence Models
 *
 * Row types read from and written to the collaborator stores. Field names
 * follow the table columns so the SQLite store can decode them with
 * `sqlx::FromRow` directly.
 */
use serde::{Deserialize, Serialize};

use crate::shared::message::MessageKind;

/// User record as seen by the chat core
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, sqlx::FromRow)]
pub struct User {
    /// 16-character user id
    pub id: String,
    /// Unique username, also used as the display name in payloads
    pub username: String,
    /// Optional unique email
    pub email: Option<String>,
    /// Inactive users cannot authenticate
    pub is_active: bool,
    pub avatar_url: Option<String>,
}

/// Project group backing a chat room
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, sqlx::FromRow)]
pub struct ProjectGroup {
    pub id: String,
    pub name: String,
    pub project_title: String,
    /// The leader may always access the room, membership row or not
    pub leader_id: String,
    pub is_active: bool,
}

/// Shared file that a message may attach
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, sqlx::FromRow)]
pub struct SharedFile {
    pub id: String,
    /// Uploader
    pub user_id: String,
    /// Group the file was shared into, if any
    pub group_id: Option<String>,
    pub filename: String,
    pub is_deleted: bool,
}

/// Persisted chat message row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, sqlx::FromRow)]
pub struct StoredMessage {
    pub id: String,
    pub room_id: String,
    pub sender_id: String,
    /// Lowercase kind name
    pub message_type: String,
    pub content: String,
    pub file_url: Option<String>,
    pub task_id: Option<String>,
    pub reply_to_id: Option<String>,
    /// `%Y-%m-%d %H:%M:%S` UTC
    pub created_at: String,
    /// Unix seconds
    pub updated_time: i64,
    pub is_deleted: bool,
    /// Insertion sequence, breaks ties between equal `created_at` values
    pub seq: i64,
}

/// A validated message ready to be persisted
///
/// The store assigns `id`, `created_at`, `updated_time` and `seq`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub room_id: String,
    pub sender_id: String,
    pub kind: MessageKind,
    pub content: String,
    /// Canonical `/files/{id}` form
    pub file_url: Option<String>,
    pub task_id: Option<String>,
    pub reply_to_id: Option<String>,
}

/// One page of room history, oldest message first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryPage {
    pub messages: Vec<StoredMessage>,
    pub page: u32,
    pub per_page: u32,
    /// Non-deleted messages in the room
    pub total: u64,
}

impl HistoryPage {
    /// Number of pages needed to cover `total` at `per_page`
    pub fn pages(&self) -> u64 {
        if self.per_page == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(self.per_page))
    }
}

/// Generate a 16 lowercase hex character identifier
pub fn new_record_id() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(16);
    id
}
