//! Store Module
//!
//! This module defines the persistence capabilities the chat core consumes
//! and the two implementations that provide them.
//!
//! # Architecture
//!
//! The chat core never talks to a database directly. It depends on four
//! async traits:
//!
//! - **`UserDirectory`** - user lookup by id, username or email
//! - **`GroupDirectory`** - project groups and their membership
//! - **`AttachmentDirectory`** - shared files and tasks a message may reference
//! - **`MessageStore`** - append-only chat messages with soft delete and
//!   read tracking
//!
//! `Stores` bundles one `Arc<dyn ...>` per capability and is what the rest of
//! the backend carries around.
//!
//! # Module Structure
//!
//! ```text
//! store/
//! ├── mod.rs     - Capability traits, StoreError, Stores bundle
//! ├── models.rs  - Row types
//! ├── sqlite.rs  - sqlx SQLite implementation
//! └── memory.rs  - In-memory implementation for tests and tooling
//! ```
//!
//! # Consistency
//!
//! Each call is treated as atomic. A failed `insert_message` leaves nothing
//! behind, which is what lets the ingestion path skip the broadcast on error.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::shared::task::Task;

/// Row types
pub mod models;

/// SQLite implementation
pub mod sqlite;

/// In-memory implementation
pub mod memory;

pub use memory::MemoryStore;
pub use models::{HistoryPage, NewMessage, ProjectGroup, SharedFile, StoredMessage, User};
pub use sqlite::SqliteStore;

/// Persistence failure
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The store refused the write
    #[error("Write rejected: {message}")]
    Rejected {
        /// Why the write was refused
        message: String,
    },
}

impl StoreError {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }
}

/// Result alias for store calls
pub type StoreResult<T> = Result<T, StoreError>;

/// User lookup capability
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_user_by_id(&self, id: &str) -> StoreResult<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
}

/// Group membership capability
#[async_trait]
pub trait GroupDirectory: Send + Sync {
    async fn find_group(&self, group_id: &str) -> StoreResult<Option<ProjectGroup>>;

    /// Whether the user holds a membership row for the group
    ///
    /// Leadership is not implied; callers check `leader_id` themselves.
    async fn is_member(&self, group_id: &str, user_id: &str) -> StoreResult<bool>;

    /// Groups the user is a member of or leads, ordered by name
    async fn groups_for_user(&self, user_id: &str) -> StoreResult<Vec<ProjectGroup>>;
}

/// Shared file and task lookup capability
#[async_trait]
pub trait AttachmentDirectory: Send + Sync {
    async fn find_file(&self, file_id: &str) -> StoreResult<Option<SharedFile>>;
    async fn find_task(&self, task_id: &str) -> StoreResult<Option<Task>>;
}

/// Chat message persistence capability
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Persist a message, assigning its id, timestamps and sequence
    async fn insert_message(&self, message: NewMessage) -> StoreResult<StoredMessage>;

    /// Find a message by id, deleted or not
    async fn find_message(&self, message_id: &str) -> StoreResult<Option<StoredMessage>>;

    /// Page through non-deleted messages of a room
    ///
    /// Page 1 holds the newest `per_page` messages. Messages inside a page
    /// are ordered by `created_at`, then `seq`.
    async fn room_history(&self, room_id: &str, page: u32, per_page: u32)
        -> StoreResult<HistoryPage>;

    /// Newest non-deleted message of a room
    async fn latest_message(&self, room_id: &str) -> StoreResult<Option<StoredMessage>>;

    /// Flag a message as deleted
    ///
    /// # Returns
    /// `true` if the message existed and was not already deleted
    async fn soft_delete_message(&self, message_id: &str) -> StoreResult<bool>;

    /// Record a read status for every unread message in the room
    ///
    /// # Returns
    /// Number of messages newly marked
    async fn mark_room_read(&self, room_id: &str, user_id: &str) -> StoreResult<u64>;

    /// Non-deleted messages from other senders the user has not read
    async fn unread_count(&self, room_id: &str, user_id: &str) -> StoreResult<u64>;
}

/// Bundle of the four capabilities
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserDirectory>,
    pub groups: Arc<dyn GroupDirectory>,
    pub attachments: Arc<dyn AttachmentDirectory>,
    pub messages: Arc<dyn MessageStore>,
}

impl Stores {
    /// Use one backing store for every capability
    pub fn from_shared<S>(store: Arc<S>) -> Self
    where
        S: UserDirectory + GroupDirectory + AttachmentDirectory + MessageStore + 'static,
    {
        Self {
            users: store.clone(),
            groups: store.clone(),
            attachments: store.clone(),
            messages: store,
        }
    }
}
