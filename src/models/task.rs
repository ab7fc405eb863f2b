//! # Task Model
//!
//! The task resource shared by regular users and admins. Tasks are created
//! by a user, optionally assigned to another, and soft-deleted: a delete
//! stamps `deleted_at` and default queries exclude stamped rows.
//!
//! Maps to the `tasks` table:
//! - `id`: primary key (BIGINT)
//! - `priority`: LOW / MEDIUM / HIGH (text column)
//! - `status`: TODO / IN_PROGRESS / COMPLETED, defaults to TODO
//! - `creator_id` / `assignee_id`: references into `users`
//! - `image`: uploaded filename, if any
//! - `deleted_at`: soft-delete timestamp

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::constants::{TaskPriority, TaskStatus};
use crate::dao::{Entity, Relation};
use crate::models::user::USER_PUBLIC_COLUMNS;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<TaskPriority>,
    pub status: TaskStatus,
    pub due_date: Option<DateTime<Utc>>,
    pub image: Option<String>,
    pub creator_id: i64,
    pub assignee_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

const TASK_COLUMNS: &[&str] = &[
    "id",
    "title",
    "description",
    "priority",
    "status",
    "due_date",
    "image",
    "creator_id",
    "assignee_id",
    "created_at",
    "updated_at",
    "deleted_at",
];

/// Both task relations point at `users`; joined projections default to the
/// password-free column set.
const TASK_RELATIONS: &[Relation] = &[
    Relation {
        name: "creator",
        table: "users",
        foreign_key: "creator_id",
        referenced_key: "id",
        default_columns: USER_PUBLIC_COLUMNS,
        paranoid: false,
        nested: &[],
    },
    Relation {
        name: "assignee",
        table: "users",
        foreign_key: "assignee_id",
        referenced_key: "id",
        default_columns: USER_PUBLIC_COLUMNS,
        paranoid: false,
        nested: &[],
    },
];

impl Entity for Task {
    const TABLE: &'static str = "tasks";
    const PRIMARY_KEY: &'static str = "id";
    const SOFT_DELETE: bool = true;

    fn default_columns() -> &'static [&'static str] {
        TASK_COLUMNS
    }

    fn scope_columns(_name: &str) -> Option<&'static [&'static str]> {
        None
    }

    fn relations() -> &'static [Relation] {
        TASK_RELATIONS
    }
}
