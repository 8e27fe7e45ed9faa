use std::net::IpAddr;

use crate::domain::repository::{CodeStore, FailureStore, UserDirectory};
use crate::domain::types::{DenyReason, FailureKey, Verdict};
use crate::error::AutologinError;
use crate::hash::{code_hash, digests_match, user_hash};
use crate::limiter::AttemptLimiter;
use crate::token::decode_token;

/// Everything a verification run depends on, threaded in explicitly.
pub struct VerifyTokenInput {
    /// Token exactly as it arrived in the URL.
    pub raw_token: String,
    /// Client address, if the transport knows one.
    pub source_ip: Option<IpAddr>,
    /// Account already authenticated on this request, if any.
    pub current_user_id: Option<u64>,
}

pub struct VerifyTokenUseCase<C, F, U>
where
    C: CodeStore,
    F: FailureStore,
    U: UserDirectory,
{
    pub codes: C,
    pub limiter: AttemptLimiter<F>,
    pub users: U,
    pub code_salt: String,
}

impl<C, F, U> VerifyTokenUseCase<C, F, U>
where
    C: CodeStore,
    F: FailureStore,
    U: UserDirectory,
{
    /// Run the verification state machine. Infrastructure failures deny
    /// closed; the concrete reason reaches the logs, never the wire.
    pub async fn execute(&self, input: VerifyTokenInput) -> Verdict {
        match self.run(&input).await {
            Ok(verdict) => verdict,
            Err(e) => {
                tracing::error!(error = %e, "store failure during verification, denying closed");
                Verdict::Denied {
                    reason: DenyReason::StoreUnavailable,
                }
            }
        }
    }

    async fn run(&self, input: &VerifyTokenInput) -> Result<Verdict, AutologinError> {
        // 1. Decode. A payload that never parsed cannot be trusted to name a
        //    real account, so it only counts against the source ip.
        let Ok((user_id, secret)) = decode_token(&input.raw_token) else {
            self.count_failure(None, input).await;
            return Ok(Verdict::Denied {
                reason: DenyReason::Malformed,
            });
        };

        // 2. Source-ip lockout, before any code-store work.
        if let Some(ip) = input.source_ip {
            if self.limiter.is_blocked(&FailureKey::Ip(ip.to_string())).await? {
                tracing::warn!(%ip, "autologin attempt from blocked ip");
                self.count_failure(Some(user_id), input).await;
                return Ok(Verdict::Denied {
                    reason: DenyReason::IpBlocked,
                });
            }
        }

        // 3. Target-account lockout.
        if self.limiter.is_blocked(&FailureKey::User(user_id)).await? {
            tracing::warn!(user_id, "autologin attempt against blocked account");
            self.count_failure(Some(user_id), input).await;
            return Ok(Verdict::Denied {
                reason: DenyReason::UserBlocked,
            });
        }

        // 4. Already signed in as the token's target: nothing to do, and not
        //    an attack signal. The code stays unconsumed and no counter moves.
        if input.current_user_id == Some(user_id) {
            return Ok(Verdict::Denied {
                reason: DenyReason::AlreadyAuthenticated,
            });
        }

        // 5. Consume-on-match. Wrong, expired, and replayed secrets all look
        //    the same from here: no live row.
        let hash = code_hash(user_id, &secret);
        let Some(record) = self.codes.take_valid(&hash, true).await? else {
            self.count_failure(Some(user_id), input).await;
            return Ok(Verdict::Denied {
                reason: DenyReason::InvalidOrExpired,
            });
        };

        // The record must still bind to the claimed account and the account
        // must still exist.
        let expected = user_hash(&self.code_salt, user_id);
        if !digests_match(&record.user_hash, &expected) || !self.users.exists(user_id).await? {
            self.count_failure(Some(user_id), input).await;
            return Ok(Verdict::Denied {
                reason: DenyReason::InvalidOrExpired,
            });
        }

        Ok(Verdict::Granted { user_id })
    }

    /// Best-effort failure accounting; a throttle outage must not change the
    /// outcome of a denial already decided.
    async fn count_failure(&self, user_id: Option<u64>, input: &VerifyTokenInput) {
        if let Err(e) = self
            .limiter
            .record_failure(user_id, input.source_ip, &input.raw_token)
            .await
        {
            tracing::warn!(error = %e, "failed to record autologin failure");
        }
    }
}
