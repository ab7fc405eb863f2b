//! Shared application state.
//!
//! The accessor registry is assembled once at process start and injected
//! into handlers; accessors share the one connection pool and never own
//! connections themselves.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::dao::{TaskDao, UserDao};
use crate::error::Result;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub tasks: TaskDao,
    pub users: UserDao,
}

impl AppState {
    pub async fn initialize(config: AppConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await?;
        tracing::info!(
            max_connections = config.max_connections,
            "database pool ready"
        );
        Ok(Self::from_pool(pool, config))
    }

    pub fn from_pool(pool: PgPool, config: AppConfig) -> Self {
        Self {
            config: Arc::new(config),
            tasks: TaskDao::new(pool.clone()),
            users: UserDao::new(pool),
        }
    }
}
