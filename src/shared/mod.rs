//! Shared Module
//!
//! This module contains the wire types used by both transports of the chat
//! core: the socket frames, the canonical message payload, message kinds and
//! the errors raised while decoding or validating them.
//!
//! # Overview
//!
//! Nothing in here touches the network or the database. The backend builds
//! these values and serializes them; tests decode them to inspect what a
//! client would see.

/// Message kinds and the canonical payload
pub mod message;

/// Task object embedded in task messages
pub mod task;

/// Socket frames in both directions
pub mod event;

/// Shared error types
pub mod error;

/// Re-export commonly used types for convenience
pub use error::SharedError;
pub use event::{ClientFrame, SendMessageBody, ServerEvent};
pub use message::{ChatMessagePayload, MessageKind};
pub use task::Task;
