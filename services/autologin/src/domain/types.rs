use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored autologin code. Only digests are kept; the raw secret exists
/// nowhere but inside the URL handed back to the caller at issuance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeRecord {
    /// Hex SHA-256 of `user_id ∥ secret`, primary lookup key.
    pub code_hash: String,
    /// Hex SHA-256 of `server_salt ∥ user_id`, binds the record to the
    /// account independent of the secret.
    pub user_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl CodeRecord {
    pub fn is_live(&self) -> bool {
        self.expires_at > Utc::now()
    }
}

/// Key under which failed verification attempts are counted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FailureKey {
    User(u64),
    /// Normalized textual form of the source address.
    Ip(String),
}

/// Failure counter kept in the ephemeral TTL store.
/// The record expires a fixed window after its creation; increments do not
/// move the deadline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub count: u32,
    pub first_failure_at: DateTime<Utc>,
    /// Audit trail only, never consulted for the lockout decision: offending
    /// IPs on user-keyed records, targeted user ids or truncated malformed
    /// payloads on ip-keyed records.
    #[serde(default)]
    pub metadata: Vec<String>,
}

/// Outcome of running a token through the verifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Granted { user_id: u64 },
    Denied { reason: DenyReason },
}

/// Why a verification attempt was denied. Internal audit detail; the wire
/// response is identical for every attacker-distinguishable reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    Malformed,
    IpBlocked,
    UserBlocked,
    AlreadyAuthenticated,
    InvalidOrExpired,
    StoreUnavailable,
}

impl DenyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Malformed => "malformed",
            Self::IpBlocked => "ip_blocked",
            Self::UserBlocked => "user_blocked",
            Self::AlreadyAuthenticated => "already_authenticated",
            Self::InvalidOrExpired => "invalid_or_expired",
            Self::StoreUnavailable => "store_unavailable",
        }
    }
}

/// Generated secret length in characters (62-char alphabet, ~190 bits).
pub const SECRET_LEN: usize = 32;

/// Validity of an issued code when the caller does not ask for one.
pub const DEFAULT_CODE_TTL_SECS: u64 = 900;

/// Hard ceiling on requested validity.
pub const MAX_CODE_TTL_SECS: u64 = 86_400;

/// Consecutive failures that lock a user id or source ip out.
pub const MAX_FAILED_ATTEMPTS: u32 = 5;

/// Failure counters live this long from the first failure, success or not.
pub const FAILURE_WINDOW_SECS: u64 = 86_400;

/// Audit metadata entries kept per failure record.
pub const MAX_FAILURE_METADATA: usize = 50;
