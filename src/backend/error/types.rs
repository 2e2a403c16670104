/**
 * Chat Error Types
 *
 * This module defines the error taxonomy of the chat core. The same value
 * is reported over HTTP (status code + JSON body) and over the socket (an
 * `error` event or a failed `message_sent` acknowledgment), so both
 * transports agree on codes.
 *
 * # Error Categories
 *
 * ## Authentication
 *
 * Missing or unresolvable credential, or an inactive account. Fatal to a
 * socket session.
 *
 * ## Authorization
 *
 * `RoomNotFound` and `AccessDenied`. Recoverable; the session continues.
 *
 * ## Validation
 *
 * Bad kind, missing or inaccessible attachment, broken reply chain, bad
 * content. Reported to the caller, no state change.
 *
 * ## Persistence
 *
 * The store rejected a call. Logged with its cause; clients see a generic
 * message, and no broadcast happens for the failed attempt.
 */

use axum::http::StatusCode;
use thiserror::Error;

use crate::backend::store::StoreError;
use crate::shared::SharedError;

/// Chat core error
///
/// # Usage
///
/// ```rust
/// use taskchat::backend::error::ChatError;
///
/// let err = ChatError::validation("reply_to_id", "Reply target not found");
/// assert_eq!(err.status_code().as_u16(), 400);
/// ```
#[derive(Debug, Error)]
pub enum ChatError {
    /// Credential missing, unknown, or the account is inactive
    #[error("Authentication failed: {message}")]
    Authentication {
        /// Human-readable error message
        message: String,
    },

    /// Room does not exist
    #[error("Chat room {room_id} not found")]
    RoomNotFound {
        /// The requested room
        room_id: String,
    },

    /// Message does not exist in the room, or is already deleted
    #[error("Message {message_id} not found")]
    MessageNotFound {
        /// The requested message
        message_id: String,
    },

    /// Caller is not a member or leader of the room, or may not act on a message
    #[error("Access denied: {message}")]
    AccessDenied {
        /// Human-readable error message
        message: String,
    },

    /// A field failed validation
    #[error("Invalid {field}: {message}")]
    Validation {
        /// Offending field
        field: String,
        /// Human-readable error message
        message: String,
    },

    /// Request body or frame could not be decoded
    #[error("Malformed request: {message}")]
    MalformedRequest {
        /// Human-readable error message
        message: String,
    },

    /// Store failure
    #[error(transparent)]
    Persistence(#[from] StoreError),

    /// Wire-level error from the shared module
    #[error(transparent)]
    Shared(#[from] SharedError),
}

impl ChatError {
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    pub fn room_not_found(room_id: impl Into<String>) -> Self {
        Self::RoomNotFound {
            room_id: room_id.into(),
        }
    }

    pub fn message_not_found(message_id: impl Into<String>) -> Self {
        Self::MessageNotFound {
            message_id: message_id.into(),
        }
    }

    pub fn access_denied(message: impl Into<String>) -> Self {
        Self::AccessDenied {
            message: message.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedRequest {
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    ///
    /// # Status Code Mapping
    ///
    /// - `Authentication` - 401
    /// - `RoomNotFound`, `MessageNotFound` - 404
    /// - `AccessDenied` - 403
    /// - `Validation`, `MalformedRequest`, `Shared` - 400
    /// - `Persistence` - 500
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Authentication { .. } => StatusCode::UNAUTHORIZED,
            Self::RoomNotFound { .. } | Self::MessageNotFound { .. } => StatusCode::NOT_FOUND,
            Self::AccessDenied { .. } => StatusCode::FORBIDDEN,
            Self::Validation { .. } | Self::MalformedRequest { .. } | Self::Shared(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the message shown to clients
    ///
    /// Persistence details stay in the logs.
    pub fn message(&self) -> String {
        match self {
            Self::Persistence(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }

    /// Log persistence failures with their cause
    ///
    /// Other variants are the caller's problem and are not logged here.
    pub fn log_if_internal(&self) {
        if let Self::Persistence(e) = self {
            tracing::error!("[Chat] Persistence failure: {}", e);
        }
    }
}
