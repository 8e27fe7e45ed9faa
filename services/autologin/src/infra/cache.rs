use chrono::Utc;
use deadpool_redis::Pool;
use deadpool_redis::redis::{self, AsyncCommands};

use crate::domain::repository::FailureStore;
use crate::domain::types::{FAILURE_WINDOW_SECS, FailureKey, FailureRecord, MAX_FAILURE_METADATA};
use crate::error::AutologinError;

/// Failure counters in Redis: one JSON value per key, expiry handled by the
/// server. The TTL is set once at creation, so the lockout window is anchored
/// at the first failure rather than sliding with every attempt.
#[derive(Clone)]
pub struct RedisFailureStore {
    pub pool: Pool,
}

fn redis_key(key: &FailureKey) -> String {
    match key {
        FailureKey::User(user_id) => format!("autologin:fail:user:{user_id}"),
        FailureKey::Ip(ip) => format!("autologin:fail:ip:{ip}"),
    }
}

fn store_err<E>(e: E, what: &'static str) -> AutologinError
where
    E: std::error::Error + Send + Sync + 'static,
{
    AutologinError::StoreUnavailable(anyhow::Error::new(e).context(what))
}

impl FailureStore for RedisFailureStore {
    async fn get(&self, key: &FailureKey) -> Result<Option<FailureRecord>, AutologinError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| store_err(e, "redis connection"))?;
        let value: Option<String> = conn
            .get(redis_key(key))
            .await
            .map_err(|e| store_err(e, "read failure record"))?;
        match value {
            Some(json) => Ok(Some(
                serde_json::from_str(&json).map_err(|e| store_err(e, "decode failure record"))?,
            )),
            None => Ok(None),
        }
    }

    async fn record(&self, key: &FailureKey, detail: &str) -> Result<(), AutologinError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| store_err(e, "redis connection"))?;
        let redis_key = redis_key(key);

        let existing: Option<String> = conn
            .get(&redis_key)
            .await
            .map_err(|e| store_err(e, "read failure record"))?;

        match existing {
            None => {
                let record = FailureRecord {
                    count: 1,
                    first_failure_at: Utc::now(),
                    metadata: vec![detail.to_owned()],
                };
                let json = serde_json::to_string(&record)
                    .map_err(|e| store_err(e, "encode failure record"))?;
                let (): () = conn
                    .set_ex(&redis_key, json, FAILURE_WINDOW_SECS)
                    .await
                    .map_err(|e: redis::RedisError| store_err(e, "create failure record"))?;
            }
            Some(json) => {
                let mut record: FailureRecord = serde_json::from_str(&json)
                    .map_err(|e| store_err(e, "decode failure record"))?;
                record.count = record.count.saturating_add(1);
                if record.metadata.len() < MAX_FAILURE_METADATA {
                    record.metadata.push(detail.to_owned());
                }
                let json = serde_json::to_string(&record)
                    .map_err(|e| store_err(e, "encode failure record"))?;
                // KEEPTTL: the window keeps counting down from the first
                // failure, increments do not extend it.
                let (): () = redis::cmd("SET")
                    .arg(&redis_key)
                    .arg(json)
                    .arg("KEEPTTL")
                    .query_async(&mut conn)
                    .await
                    .map_err(|e: redis::RedisError| store_err(e, "update failure record"))?;
            }
        }
        Ok(())
    }
}
