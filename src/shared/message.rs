/**
 * Chat Message Wire Types
 *
 * This module defines the message kinds a room accepts and the canonical
 * serialized form of a chat message. The canonical form is what both the
 * HTTP surface and the socket protocol hand to clients, so every producer
 * builds it through `ChatMessagePayload` and nothing else.
 *
 * # Timestamps
 *
 * Stored timestamps use the `%Y-%m-%d %H:%M:%S` UTC text format. The numeric
 * `updated_time` marker is rendered in the same format on the wire.
 */
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::SharedError;
use crate::shared::task::Task;

/// Text format used for every timestamp that crosses the wire
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Maximum number of content characters for a message of any kind
pub const MAX_CONTENT_LENGTH: usize = 10_000;

/// Kind of a chat message
///
/// Parsing is case-insensitive, so `"IMAGE"` and `"image"` are the same kind.
/// The stored form is lowercase; the wire form (`wire_name`) is uppercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    Image,
    Video,
    Audio,
    File,
    Task,
}

impl MessageKind {
    /// All recognised kinds, in declaration order
    pub const ALL: [MessageKind; 6] = [
        MessageKind::Text,
        MessageKind::Image,
        MessageKind::Video,
        MessageKind::Audio,
        MessageKind::File,
        MessageKind::Task,
    ];

    /// Lowercase name, used for storage
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::File => "file",
            Self::Task => "task",
        }
    }

    /// Uppercase name, used in serialized payloads
    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Image => "IMAGE",
            Self::Video => "VIDEO",
            Self::Audio => "AUDIO",
            Self::File => "FILE",
            Self::Task => "TASK",
        }
    }

    /// Whether a message of this kind must reference a shared file
    pub fn requires_file(&self) -> bool {
        matches!(self, Self::Image | Self::Video | Self::Audio | Self::File)
    }

    /// Whether a message of this kind must reference a task
    pub fn requires_task(&self) -> bool {
        matches!(self, Self::Task)
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageKind {
    type Err = SharedError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| SharedError::unknown_kind(value))
    }
}

/// Canonical serialized chat message
///
/// Every field is always present in the JSON form; absent values serialize
/// as `null`. Two messages with the same logical fields therefore produce
/// the same key set regardless of which path created them.
///
/// # Fields
/// * `message_type` - uppercase kind name (`TEXT`, `IMAGE`, ...)
/// * `task` - full task object when `task_id` resolved at creation time
/// * `created_at` / `updated_time` - `%Y-%m-%d %H:%M:%S` UTC
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessagePayload {
    pub id: String,
    pub room_id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub sender_avatar: Option<String>,
    pub content: String,
    pub message_type: String,
    pub file_url: Option<String>,
    pub task_id: Option<String>,
    pub task: Option<Task>,
    pub reply_to_id: Option<String>,
    pub created_at: String,
    pub updated_time: Option<String>,
}

/// Format a UTC instant in the wire timestamp format
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Render a unix-seconds marker in the wire timestamp format
///
/// Returns `None` for values chrono cannot represent.
pub fn format_unix_seconds(seconds: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp(seconds, 0).map(format_timestamp)
}
