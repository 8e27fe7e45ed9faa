use chrono::{Duration, Utc};

use crate::domain::repository::{CodeStore, UserDirectory};
use crate::domain::types::{CodeRecord, MAX_CODE_TTL_SECS};
use crate::error::AutologinError;
use crate::hash::{code_hash, user_hash};
use crate::token::{encode_token, generate_secret};

/// Decides whether an account may receive autologin tokens at all.
/// Injected by the caller — an explicit seam where the original design used a
/// broadcast hook.
pub trait IssuancePolicy: Send + Sync {
    fn allow(&self, user_id: u64) -> bool;
}

/// Default policy: any existing account may receive tokens.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl IssuancePolicy for AllowAll {
    fn allow(&self, _user_id: u64) -> bool {
        true
    }
}

pub struct IssueTokenInput {
    pub user_id: u64,
    /// Requested validity in seconds. `None` or `0` uses the configured
    /// default; anything above the cap is clamped.
    pub ttl_seconds: Option<u64>,
}

#[derive(Debug)]
pub struct IssueTokenOutput {
    pub token: String,
    /// Effective validity in seconds, for caller-facing messaging.
    pub expires_in: u64,
}

pub struct IssueTokenUseCase<C, U, P = AllowAll>
where
    C: CodeStore,
    U: UserDirectory,
    P: IssuancePolicy,
{
    pub codes: C,
    pub users: U,
    pub policy: P,
    pub code_salt: String,
    pub default_ttl_secs: u64,
}

impl<C, U, P> IssueTokenUseCase<C, U, P>
where
    C: CodeStore,
    U: UserDirectory,
    P: IssuancePolicy,
{
    pub async fn execute(
        &self,
        input: IssueTokenInput,
    ) -> Result<IssueTokenOutput, AutologinError> {
        // 1. Policy gate → 403 if the caller's policy says no
        if !self.policy.allow(input.user_id) {
            return Err(AutologinError::IssuanceRefused);
        }

        // 2. Account must exist → 404 otherwise
        if !self.users.exists(input.user_id).await? {
            return Err(AutologinError::UserNotFound);
        }

        // 3. Effective TTL
        let ttl = match input.ttl_seconds {
            None | Some(0) => self.default_ttl_secs,
            Some(requested) => requested,
        }
        .min(MAX_CODE_TTL_SECS);

        // 4. Generate and persist. The write happens before the token is
        //    returned; a token that is not durably stored is never handed out.
        let secret = generate_secret();
        let now = Utc::now();
        let record = CodeRecord {
            code_hash: code_hash(input.user_id, &secret),
            user_hash: user_hash(&self.code_salt, input.user_id),
            expires_at: now + Duration::seconds(ttl as i64),
            created_at: now,
        };
        self.codes.insert(&record).await?;

        Ok(IssueTokenOutput {
            token: encode_token(input.user_id, &secret),
            expires_in: ttl,
        })
    }
}
