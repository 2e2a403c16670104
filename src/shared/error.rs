//! Shared Error Types
//!
//! This module defines errors that describe problems with data on the wire:
//! frames that do not parse, message kinds nobody recognises, and field
//! values that fail validation. Both the HTTP handlers and the socket session
//! produce them, so they live next to the wire types.
//!
//! # Error Categories
//!
//! - `MalformedFrame` - a socket frame or request body that is not valid JSON
//!   for the expected shape
//! - `UnknownMessageKind` - a `message_type` outside the recognised set
//! - `ValidationError` - a field value that breaks a message invariant
//!
//! # Usage
//!
//! ```rust
//! use taskchat::shared::error::SharedError;
//!
//! let error = SharedError::validation("content", "Message content cannot be empty");
//! assert!(error.to_string().contains("content"));
//! ```
use thiserror::Error;

/// Wire-level errors shared by both transports
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SharedError {
    /// Frame or body could not be decoded
    #[error("Malformed frame: {message}")]
    MalformedFrame {
        /// Human-readable decoder message
        message: String,
    },

    /// `message_type` is not one of the recognised kinds
    #[error("Unknown message type '{kind}'")]
    UnknownMessageKind {
        /// The rejected value, as sent by the client
        kind: String,
    },

    /// Data validation error
    #[error("Validation error in field '{field}': {message}")]
    ValidationError {
        /// The field that failed validation
        field: String,
        /// Human-readable error message
        message: String,
    },
}

impl SharedError {
    /// Create a new malformed-frame error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedFrame {
            message: message.into(),
        }
    }

    /// Create a new unknown-kind error
    pub fn unknown_kind(kind: impl Into<String>) -> Self {
        Self::UnknownMessageKind { kind: kind.into() }
    }

    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for SharedError {
    fn from(err: serde_json::Error) -> Self {
        Self::malformed(err.to_string())
    }
}
