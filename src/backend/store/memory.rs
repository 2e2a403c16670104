/**
 * In-Memory Store
 *
 * Every store capability over plain collections behind a tokio `RwLock`.
 * Used by the test suites and by tooling that needs a throwaway backend.
 *
 * # Failure Injection
 *
 * `set_fail_writes(true)` makes every mutating call return
 * `StoreError::Rejected`, which is how tests reach the persistence-failure
 * path without a broken database.
 */
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::backend::store::models::new_record_id;
use crate::backend::store::{
    AttachmentDirectory, GroupDirectory, HistoryPage, MessageStore, NewMessage, ProjectGroup,
    SharedFile, StoreError, StoreResult, StoredMessage, User, UserDirectory,
};
use crate::shared::message::format_timestamp;
use crate::shared::task::Task;

#[derive(Default)]
struct Tables {
    users: HashMap<String, User>,
    groups: HashMap<String, ProjectGroup>,
    /// (group_id, user_id)
    members: HashSet<(String, String)>,
    files: HashMap<String, SharedFile>,
    tasks: HashMap<String, Task>,
    /// Kept in insertion order
    messages: Vec<StoredMessage>,
    /// (message_id, user_id)
    reads: HashSet<(String, String)>,
    next_seq: i64,
}

impl Tables {
    /// Live messages of a room ordered by creation, oldest first
    fn live_messages<'a>(&'a self, room_id: &'a str) -> Vec<&'a StoredMessage> {
        let mut messages: Vec<_> = self
            .messages
            .iter()
            .filter(|m| m.room_id == room_id && !m.is_deleted)
            .collect();
        messages.sort_by(|a, b| (&a.created_at, a.seq).cmp(&(&b.created_at, b.seq)));
        messages
    }

    fn unread_ids(&self, room_id: &str, user_id: &str) -> Vec<String> {
        self.live_messages(room_id)
            .into_iter()
            .filter(|m| m.sender_id != user_id)
            .filter(|m| !self.reads.contains(&(m.id.clone(), user_id.to_string())))
            .map(|m| m.id.clone())
            .collect()
    }
}

/// Store kept entirely in process memory
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail (or succeed again)
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::rejected("store is refusing writes"));
        }
        Ok(())
    }

    pub async fn insert_user(&self, user: User) {
        self.tables.write().await.users.insert(user.id.clone(), user);
    }

    pub async fn insert_group(&self, group: ProjectGroup) {
        self.tables.write().await.groups.insert(group.id.clone(), group);
    }

    pub async fn add_member(&self, group_id: &str, user_id: &str) {
        self.tables
            .write()
            .await
            .members
            .insert((group_id.to_string(), user_id.to_string()));
    }

    pub async fn insert_file(&self, file: SharedFile) {
        self.tables.write().await.files.insert(file.id.clone(), file);
    }

    pub async fn insert_task(&self, task: Task) {
        self.tables.write().await.tasks.insert(task.id.clone(), task);
    }

    /// Flip a user's active flag
    pub async fn set_user_active(&self, user_id: &str, active: bool) {
        if let Some(user) = self.tables.write().await.users.get_mut(user_id) {
            user.is_active = active;
        }
    }

    /// Every stored message, deleted ones included, in insertion order
    pub async fn all_messages(&self) -> Vec<StoredMessage> {
        self.tables.read().await.messages.clone()
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn find_user_by_id(&self, id: &str) -> StoreResult<Option<User>> {
        Ok(self.tables.read().await.users.get(id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.username == username).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.email.as_deref() == Some(email))
            .cloned())
    }
}

#[async_trait]
impl GroupDirectory for MemoryStore {
    async fn find_group(&self, group_id: &str) -> StoreResult<Option<ProjectGroup>> {
        Ok(self.tables.read().await.groups.get(group_id).cloned())
    }

    async fn is_member(&self, group_id: &str, user_id: &str) -> StoreResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables
            .members
            .contains(&(group_id.to_string(), user_id.to_string())))
    }

    async fn groups_for_user(&self, user_id: &str) -> StoreResult<Vec<ProjectGroup>> {
        let tables = self.tables.read().await;
        let mut groups: Vec<ProjectGroup> = tables
            .groups
            .values()
            .filter(|g| {
                g.leader_id == user_id
                    || tables.members.contains(&(g.id.clone(), user_id.to_string()))
            })
            .cloned()
            .collect();
        groups.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(groups)
    }
}

#[async_trait]
impl AttachmentDirectory for MemoryStore {
    async fn find_file(&self, file_id: &str) -> StoreResult<Option<SharedFile>> {
        Ok(self.tables.read().await.files.get(file_id).cloned())
    }

    async fn find_task(&self, task_id: &str) -> StoreResult<Option<Task>> {
        Ok(self.tables.read().await.tasks.get(task_id).cloned())
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn insert_message(&self, message: NewMessage) -> StoreResult<StoredMessage> {
        self.check_writable()?;

        let now = Utc::now();
        let mut tables = self.tables.write().await;
        tables.next_seq += 1;
        let stored = StoredMessage {
            id: new_record_id(),
            room_id: message.room_id,
            sender_id: message.sender_id,
            message_type: message.kind.as_str().to_string(),
            content: message.content,
            file_url: message.file_url,
            task_id: message.task_id,
            reply_to_id: message.reply_to_id,
            created_at: format_timestamp(now),
            updated_time: now.timestamp(),
            is_deleted: false,
            seq: tables.next_seq,
        };
        tables.messages.push(stored.clone());
        Ok(stored)
    }

    async fn find_message(&self, message_id: &str) -> StoreResult<Option<StoredMessage>> {
        let tables = self.tables.read().await;
        Ok(tables.messages.iter().find(|m| m.id == message_id).cloned())
    }

    async fn room_history(
        &self,
        room_id: &str,
        page: u32,
        per_page: u32,
    ) -> StoreResult<HistoryPage> {
        let page = page.max(1);
        let per_page = per_page.max(1);

        let tables = self.tables.read().await;
        let live = tables.live_messages(room_id);
        let total = live.len();

        // Page 1 is the newest slice; count back from the end.
        let skip = (page as usize - 1).saturating_mul(per_page as usize);
        let end = total.saturating_sub(skip);
        let start = end.saturating_sub(per_page as usize);
        let messages = live[start..end].iter().map(|m| (*m).clone()).collect();

        Ok(HistoryPage {
            messages,
            page,
            per_page,
            total: total as u64,
        })
    }

    async fn latest_message(&self, room_id: &str) -> StoreResult<Option<StoredMessage>> {
        let tables = self.tables.read().await;
        Ok(tables.live_messages(room_id).last().map(|m| (*m).clone()))
    }

    async fn soft_delete_message(&self, message_id: &str) -> StoreResult<bool> {
        self.check_writable()?;

        let mut tables = self.tables.write().await;
        match tables
            .messages
            .iter_mut()
            .find(|m| m.id == message_id && !m.is_deleted)
        {
            Some(message) => {
                message.is_deleted = true;
                message.updated_time = Utc::now().timestamp();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_room_read(&self, room_id: &str, user_id: &str) -> StoreResult<u64> {
        self.check_writable()?;

        let mut tables = self.tables.write().await;
        let unread = tables.unread_ids(room_id, user_id);
        let marked = unread.len() as u64;
        for message_id in unread {
            tables.reads.insert((message_id, user_id.to_string()));
        }
        Ok(marked)
    }

    async fn unread_count(&self, room_id: &str, user_id: &str) -> StoreResult<u64> {
        let tables = self.tables.read().await;
        Ok(tables.unread_ids(room_id, user_id).len() as u64)
    }
}
