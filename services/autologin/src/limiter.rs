use std::net::IpAddr;

use crate::domain::repository::FailureStore;
use crate::domain::types::{FailureKey, MAX_FAILED_ATTEMPTS};
use crate::error::AutologinError;

/// Longest raw-token sample kept in a failure record's audit metadata.
const DETAIL_MAX_LEN: usize = 64;

/// Brute-force throttle over per-user and per-ip failure counters.
/// A key with `MAX_FAILED_ATTEMPTS` failures inside its window is blocked and
/// never reaches the code store.
pub struct AttemptLimiter<F> {
    pub failures: F,
}

impl<F: FailureStore> AttemptLimiter<F> {
    pub async fn is_blocked(&self, key: &FailureKey) -> Result<bool, AutologinError> {
        Ok(self
            .failures
            .get(key)
            .await?
            .is_some_and(|record| record.count >= MAX_FAILED_ATTEMPTS))
    }

    /// Count a failed attempt against every key the request can be attributed
    /// to. A token whose user id never parsed counts only against the source
    /// ip, with the truncated payload as the audit detail.
    pub async fn record_failure(
        &self,
        user_id: Option<u64>,
        ip: Option<IpAddr>,
        raw_token: &str,
    ) -> Result<(), AutologinError> {
        if let Some(user_id) = user_id {
            let detail = match ip {
                Some(ip) => ip.to_string(),
                None => "unknown".to_owned(),
            };
            self.failures
                .record(&FailureKey::User(user_id), &detail)
                .await?;
        }
        if let Some(ip) = ip {
            let detail = match user_id {
                Some(user_id) => user_id.to_string(),
                None => format!("malformed:{}", truncate(raw_token)),
            };
            self.failures
                .record(&FailureKey::Ip(ip.to_string()), &detail)
                .await?;
        }
        Ok(())
    }
}

fn truncate(raw: &str) -> &str {
    match raw.char_indices().nth(DETAIL_MAX_LEN) {
        Some((idx, _)) => &raw[..idx],
        None => raw,
    }
}
