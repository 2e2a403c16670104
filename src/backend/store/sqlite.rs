/**
 * SQLite Store
 *
 * `sqlx` implementation of every store capability over a `SqlitePool`.
 * The schema lives in `migrations/` and is applied with `sqlx::migrate!`.
 *
 * # Column Mapping
 *
 * `group_messages` keeps the historical column names `group_id` and
 * `sent_at`; queries alias them to `room_id` and `created_at` so rows decode
 * straight into `StoredMessage`.
 */
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};

use crate::backend::store::models::new_record_id;
use crate::backend::store::{
    AttachmentDirectory, GroupDirectory, HistoryPage, MessageStore, NewMessage, ProjectGroup,
    SharedFile, StoreResult, StoredMessage, User, UserDirectory,
};
use crate::shared::message::format_timestamp;
use crate::shared::task::Task;

const MESSAGE_COLUMNS: &str = "id, group_id AS room_id, sender_id, message_type, content, \
     file_url, task_id, reply_to_id, sent_at AS created_at, updated_time, is_deleted, seq";

const USER_COLUMNS: &str = "id, username, email, is_active, avatar_url";

const TASK_COLUMNS: &str = "id, user_id, project_id, parent_task_id, title, description, \
     status, priority, due_date, created_at, updated_at, completed_at, is_deleted, position";

/// Store backed by a SQLite database
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Wrap an existing pool; the schema is assumed to be in place
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to `database_url` and apply pending migrations
    ///
    /// # Arguments
    /// * `database_url` - sqlx SQLite URL, e.g. `sqlite://todolist.db?mode=rwc`
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        tracing::info!("[Store] Connecting to database...");
        let pool = SqlitePool::connect(database_url).await?;
        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    /// Private in-memory database with the schema applied
    ///
    /// The pool is capped at one connection; every SQLite `:memory:`
    /// connection is its own database.
    pub async fn in_memory() -> StoreResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    /// Run the embedded migrations
    pub async fn migrate(&self) -> StoreResult<()> {
        tracing::info!("[Store] Running database migrations...");
        sqlx::migrate!()
            .run(&self.pool)
            .await
            .map_err(sqlx::Error::from)?;
        tracing::info!("[Store] Database migrations completed successfully");
        Ok(())
    }

    pub async fn insert_user(&self, user: &User) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO users (id, username, email, is_active, avatar_url) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(user.is_active)
        .bind(&user.avatar_url)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn insert_group(&self, group: &ProjectGroup) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO project_groups (id, name, project_title, leader_id, is_active) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&group.id)
        .bind(&group.name)
        .bind(&group.project_title)
        .bind(&group.leader_id)
        .bind(group.is_active)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn add_member(&self, group_id: &str, user_id: &str) -> StoreResult<()> {
        sqlx::query("INSERT OR IGNORE INTO user_groups (user_id, group_id) VALUES (?, ?)")
            .bind(user_id)
            .bind(group_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn insert_file(&self, file: &SharedFile) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO shared_files (id, user_id, group_id, filename, is_deleted) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&file.id)
        .bind(&file.user_id)
        .bind(&file.group_id)
        .bind(&file.filename)
        .bind(file.is_deleted)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn insert_task(&self, task: &Task) -> StoreResult<()> {
        sqlx::query(&format!(
            "INSERT INTO tasks ({TASK_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(&task.id)
        .bind(&task.user_id)
        .bind(&task.project_id)
        .bind(&task.parent_task_id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(&task.status)
        .bind(&task.priority)
        .bind(&task.due_date)
        .bind(&task.created_at)
        .bind(&task.updated_at)
        .bind(&task.completed_at)
        .bind(task.is_deleted)
        .bind(task.position)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_user_where(&self, column: &str, value: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE {column} = ?"
        ))
        .bind(value)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }
}

#[async_trait]
impl UserDirectory for SqliteStore {
    async fn find_user_by_id(&self, id: &str) -> StoreResult<Option<User>> {
        self.find_user_where("id", id).await
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        self.find_user_where("username", username).await
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.find_user_where("email", email).await
    }
}

#[async_trait]
impl GroupDirectory for SqliteStore {
    async fn find_group(&self, group_id: &str) -> StoreResult<Option<ProjectGroup>> {
        let group = sqlx::query_as::<_, ProjectGroup>(
            "SELECT id, name, project_title, leader_id, is_active FROM project_groups WHERE id = ?",
        )
        .bind(group_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(group)
    }

    async fn is_member(&self, group_id: &str, user_id: &str) -> StoreResult<bool> {
        let row = sqlx::query("SELECT 1 FROM user_groups WHERE group_id = ? AND user_id = ?")
            .bind(group_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn groups_for_user(&self, user_id: &str) -> StoreResult<Vec<ProjectGroup>> {
        let groups = sqlx::query_as::<_, ProjectGroup>(
            r#"
            SELECT DISTINCT g.id, g.name, g.project_title, g.leader_id, g.is_active
            FROM project_groups g
            LEFT JOIN user_groups ug ON ug.group_id = g.id AND ug.user_id = ?
            WHERE g.leader_id = ? OR ug.user_id IS NOT NULL
            ORDER BY g.name
            "#,
        )
        .bind(user_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(groups)
    }
}

#[async_trait]
impl AttachmentDirectory for SqliteStore {
    async fn find_file(&self, file_id: &str) -> StoreResult<Option<SharedFile>> {
        let file = sqlx::query_as::<_, SharedFile>(
            "SELECT id, user_id, group_id, filename, is_deleted FROM shared_files WHERE id = ?",
        )
        .bind(file_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(file)
    }

    async fn find_task(&self, task_id: &str) -> StoreResult<Option<Task>> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?"
        ))
        .bind(task_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(task)
    }
}

#[async_trait]
impl MessageStore for SqliteStore {
    async fn insert_message(&self, message: NewMessage) -> StoreResult<StoredMessage> {
        let id = new_record_id();
        let now = Utc::now();
        let created_at = format_timestamp(now);
        let updated_time = now.timestamp();

        let result = sqlx::query(
            r#"
            INSERT INTO group_messages
                (id, group_id, sender_id, message_type, content, file_url, task_id, reply_to_id, sent_at, updated_time, is_deleted)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0)
            "#,
        )
        .bind(&id)
        .bind(&message.room_id)
        .bind(&message.sender_id)
        .bind(message.kind.as_str())
        .bind(&message.content)
        .bind(&message.file_url)
        .bind(&message.task_id)
        .bind(&message.reply_to_id)
        .bind(&created_at)
        .bind(updated_time)
        .execute(&self.pool)
        .await?;

        tracing::debug!(message_id = %id, room_id = %message.room_id, "[Store] Message inserted");

        Ok(StoredMessage {
            id,
            room_id: message.room_id,
            sender_id: message.sender_id,
            message_type: message.kind.as_str().to_string(),
            content: message.content,
            file_url: message.file_url,
            task_id: message.task_id,
            reply_to_id: message.reply_to_id,
            created_at,
            updated_time,
            is_deleted: false,
            seq: result.last_insert_rowid(),
        })
    }

    async fn find_message(&self, message_id: &str) -> StoreResult<Option<StoredMessage>> {
        let message = sqlx::query_as::<_, StoredMessage>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM group_messages WHERE id = ?"
        ))
        .bind(message_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(message)
    }

    async fn room_history(
        &self,
        room_id: &str,
        page: u32,
        per_page: u32,
    ) -> StoreResult<HistoryPage> {
        let page = page.max(1);
        let per_page = per_page.max(1);

        let total: i64 = sqlx::query(
            "SELECT COUNT(*) AS total FROM group_messages WHERE group_id = ? AND is_deleted = 0",
        )
        .bind(room_id)
        .fetch_one(&self.pool)
        .await?
        .get("total");

        let offset = i64::from(page - 1) * i64::from(per_page);
        let mut messages = sqlx::query_as::<_, StoredMessage>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM group_messages \
             WHERE group_id = ? AND is_deleted = 0 \
             ORDER BY sent_at DESC, seq DESC LIMIT ? OFFSET ?"
        ))
        .bind(room_id)
        .bind(i64::from(per_page))
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        messages.reverse();

        Ok(HistoryPage {
            messages,
            page,
            per_page,
            total: u64::try_from(total).unwrap_or_default(),
        })
    }

    async fn latest_message(&self, room_id: &str) -> StoreResult<Option<StoredMessage>> {
        let message = sqlx::query_as::<_, StoredMessage>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM group_messages \
             WHERE group_id = ? AND is_deleted = 0 \
             ORDER BY sent_at DESC, seq DESC LIMIT 1"
        ))
        .bind(room_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(message)
    }

    async fn soft_delete_message(&self, message_id: &str) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE group_messages SET is_deleted = 1, updated_time = ? WHERE id = ? AND is_deleted = 0",
        )
        .bind(Utc::now().timestamp())
        .bind(message_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_room_read(&self, room_id: &str, user_id: &str) -> StoreResult<u64> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO message_read_status (id, message_id, user_id, read_at, updated_time)
            SELECT lower(hex(randomblob(8))), m.id, ?, ?, ?
            FROM group_messages m
            WHERE m.group_id = ? AND m.is_deleted = 0 AND m.sender_id != ?
              AND NOT EXISTS (
                  SELECT 1 FROM message_read_status r
                  WHERE r.message_id = m.id AND r.user_id = ?
              )
            "#,
        )
        .bind(user_id)
        .bind(format_timestamp(now))
        .bind(now.timestamp())
        .bind(room_id)
        .bind(user_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn unread_count(&self, room_id: &str, user_id: &str) -> StoreResult<u64> {
        let count: i64 = sqlx::query(
            r#"
            SELECT COUNT(*) AS unread
            FROM group_messages m
            WHERE m.group_id = ? AND m.is_deleted = 0 AND m.sender_id != ?
              AND NOT EXISTS (
                  SELECT 1 FROM message_read_status r
                  WHERE r.message_id = m.id AND r.user_id = ?
              )
            "#,
        )
        .bind(room_id)
        .bind(user_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?
        .get("unread");
        Ok(u64::try_from(count).unwrap_or_default())
    }
}
