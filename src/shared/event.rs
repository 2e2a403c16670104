/**
 * Chat Session Frames
 *
 * This module defines the JSON frames exchanged over a chat socket. Frames
 * are tagged by a `type` field in both directions:
 *
 * - Inbound (`ClientFrame`): `subscribe`, `unsubscribe`, `ping`, `send_message`
 * - Outbound (`ServerEvent`): `connected`, `subscribed`, `error`, `pong`,
 *   `message_sent`, `new_message`
 *
 * `SendMessageBody` is the request body of the HTTP create-message route and
 * the content of a `send_message` frame, so both entry points feed the same
 * ingestion routine with the same shape.
 */
use serde::{Deserialize, Serialize};

use crate::shared::error::SharedError;
use crate::shared::message::ChatMessagePayload;

fn default_message_type() -> String {
    "text".to_string()
}

/// Fields a client supplies when creating a message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SendMessageBody {
    /// Message text; may be empty for attachment kinds
    #[serde(default)]
    pub content: String,
    /// Kind name, case-insensitive; defaults to `text`
    #[serde(default = "default_message_type")]
    pub message_type: String,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub reply_to_id: Option<String>,
}

impl SendMessageBody {
    /// Plain text body with no attachments
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            message_type: default_message_type(),
            file_url: None,
            task_id: None,
            reply_to_id: None,
        }
    }
}

/// Frames a client sends over the socket
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    Subscribe {
        #[serde(alias = "roomId")]
        room_id: String,
    },
    Unsubscribe {
        #[serde(alias = "roomId")]
        room_id: String,
    },
    /// Liveness probe; the timestamp is echoed back untouched
    Ping {
        #[serde(default)]
        timestamp: serde_json::Value,
    },
    SendMessage {
        #[serde(alias = "roomId")]
        room_id: String,
        #[serde(default)]
        content: String,
        #[serde(default = "default_message_type")]
        message_type: String,
        #[serde(default)]
        file_url: Option<String>,
        #[serde(default)]
        task_id: Option<String>,
        #[serde(default)]
        reply_to_id: Option<String>,
    },
}

impl ClientFrame {
    /// Decode a text frame
    ///
    /// # Returns
    /// The decoded frame, or `SharedError::MalformedFrame` for anything that
    /// is not a JSON object with a recognised `type`.
    pub fn parse(text: &str) -> Result<Self, SharedError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Split a `send_message` frame into its room and body
    pub fn into_send_message(self) -> Option<(String, SendMessageBody)> {
        match self {
            Self::SendMessage {
                room_id,
                content,
                message_type,
                file_url,
                task_id,
                reply_to_id,
            } => Some((
                room_id,
                SendMessageBody {
                    content,
                    message_type,
                    file_url,
                    task_id,
                    reply_to_id,
                },
            )),
            _ => None,
        }
    }
}

/// Events the server pushes to a client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Sent once after a successful handshake
    Connected { server_time: String },
    /// Acknowledges a subscribe request
    Subscribed { room_id: String },
    /// Recoverable or fatal protocol error; `code` mirrors the HTTP status
    Error { message: String, code: u16 },
    Pong { timestamp: serde_json::Value },
    /// Acknowledges a `send_message` frame to its sender only
    MessageSent {
        message_id: Option<String>,
        success: bool,
        error: Option<String>,
    },
    /// Room fan-out of a newly created message
    NewMessage { payload: ChatMessagePayload },
}

impl ServerEvent {
    pub fn error(code: u16, message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
            code,
        }
    }

    pub fn message_sent(message_id: impl Into<String>) -> Self {
        Self::MessageSent {
            message_id: Some(message_id.into()),
            success: true,
            error: None,
        }
    }

    pub fn message_failed(error: impl Into<String>) -> Self {
        Self::MessageSent {
            message_id: None,
            success: false,
            error: Some(error.into()),
        }
    }

    /// Serialize to the JSON text sent on the wire
    pub fn to_json(&self) -> Result<String, SharedError> {
        Ok(serde_json::to_string(self)?)
    }
}
