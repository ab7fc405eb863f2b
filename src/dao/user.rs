use sqlx::PgPool;
use std::ops::Deref;

use crate::dao::Dao;
use crate::models::User;

/// User accessor; the generic contract is the whole surface.
#[derive(Debug, Clone)]
pub struct UserDao {
    dao: Dao<User>,
}

impl UserDao {
    pub fn new(pool: PgPool) -> Self {
        Self { dao: Dao::new(pool) }
    }
}

impl Deref for UserDao {
    type Target = Dao<User>;

    fn deref(&self) -> &Self::Target {
        &self.dao
    }
}
