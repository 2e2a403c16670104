//! Task representation embedded in task messages.
use serde::{Deserialize, Serialize};

/// Full task object as exposed to room members
///
/// Dates are kept in their stored text form (`YYYY-MM-DD` for `due_date`,
/// `%Y-%m-%d %H:%M:%S` for the timestamps).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, sqlx::FromRow)]
pub struct Task {
    pub id: String,
    pub user_id: String,
    pub project_id: Option<String>,
    pub parent_task_id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub priority: String,
    pub due_date: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub completed_at: Option<String>,
    pub is_deleted: bool,
    pub position: i64,
}
