//! # User Model
//!
//! Account records for both regular users and admins. The password column is
//! excluded from the default read projection; the `with_password` scope
//! exposes it for credential checks at login.
//!
//! Maps to the `users` table:
//! - `id`: primary key (BIGINT)
//! - `email`: unique login identifier
//! - `password`: argon2 hash, written at registration
//! - `is_regular` / `is_admin`: role flags decided at registration; a user
//!   may carry neither flag, the pair is not an exclusive toggle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::dao::{Entity, Relation};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Present only when fetched through the `with_password` scope.
    #[sqlx(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub is_regular: bool,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Read projection without the password column.
pub const USER_PUBLIC_COLUMNS: &[&str] = &[
    "id",
    "first_name",
    "last_name",
    "email",
    "is_regular",
    "is_admin",
    "created_at",
    "updated_at",
];

const USER_ALL_COLUMNS: &[&str] = &[
    "id",
    "first_name",
    "last_name",
    "email",
    "password",
    "is_regular",
    "is_admin",
    "created_at",
    "updated_at",
];

impl Entity for User {
    const TABLE: &'static str = "users";
    const PRIMARY_KEY: &'static str = "id";
    const SOFT_DELETE: bool = false;

    fn default_columns() -> &'static [&'static str] {
        USER_PUBLIC_COLUMNS
    }

    fn scope_columns(name: &str) -> Option<&'static [&'static str]> {
        match name {
            "with_password" => Some(USER_ALL_COLUMNS),
            _ => None,
        }
    }

    fn relations() -> &'static [Relation] {
        &[]
    }
}
