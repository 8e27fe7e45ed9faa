use deadpool_redis::Pool as RedisPool;
use sea_orm::DatabaseConnection;

use crate::infra::cache::RedisFailureStore;
use crate::infra::db::{DbCodeStore, DbUserDirectory};
use crate::limiter::AttemptLimiter;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub redis: RedisPool,
    pub code_salt: String,
    pub default_ttl_secs: u64,
}

impl AppState {
    pub fn code_store(&self) -> DbCodeStore {
        DbCodeStore {
            db: self.db.clone(),
        }
    }

    pub fn user_directory(&self) -> DbUserDirectory {
        DbUserDirectory {
            db: self.db.clone(),
        }
    }

    pub fn failure_store(&self) -> RedisFailureStore {
        RedisFailureStore {
            pool: self.redis.clone(),
        }
    }

    pub fn attempt_limiter(&self) -> AttemptLimiter<RedisFailureStore> {
        AttemptLimiter {
            failures: self.failure_store(),
        }
    }
}
