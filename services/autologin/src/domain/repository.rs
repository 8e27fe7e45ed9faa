#![allow(async_fn_in_trait)]

use chrono::{DateTime, Utc};

use crate::domain::types::{CodeRecord, FailureKey, FailureRecord};
use crate::error::AutologinError;

/// Durable store for issued autologin codes, keyed by code digest.
pub trait CodeStore: Send + Sync {
    /// Insert a freshly issued record. A duplicate `code_hash` is an error,
    /// never a silent overwrite.
    async fn insert(&self, record: &CodeRecord) -> Result<(), AutologinError>;

    /// Look up a live record by code digest. Expired rows are treated as
    /// absent and deleted on sight. With `consume`, removal of the matched
    /// row is atomic: at most one concurrent caller gets `Some`.
    async fn take_valid(
        &self,
        code_hash: &str,
        consume: bool,
    ) -> Result<Option<CodeRecord>, AutologinError>;

    /// Delete every record that expired before `before`. Returns the number
    /// of rows removed. Idempotent, safe alongside inserts and reads.
    async fn delete_expired(&self, before: DateTime<Utc>) -> Result<u64, AutologinError>;
}

/// Ephemeral TTL-keyed store for failure counters. Any backend with per-key
/// expiry satisfies this.
pub trait FailureStore: Send + Sync {
    /// Fetch the counter for a key, if one is still live.
    async fn get(&self, key: &FailureKey) -> Result<Option<FailureRecord>, AutologinError>;

    /// Create the counter with the full window TTL, or increment an existing
    /// one without touching the TTL set at creation. `detail` lands in the
    /// audit metadata.
    async fn record(&self, key: &FailureKey, detail: &str) -> Result<(), AutologinError>;
}

/// Read-only view of accounts: just enough to confirm that the account a
/// token claims to authenticate actually exists.
pub trait UserDirectory: Send + Sync {
    async fn exists(&self, user_id: u64) -> Result<bool, AutologinError>;
}
