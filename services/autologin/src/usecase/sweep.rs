use chrono::Utc;

use crate::domain::repository::CodeStore;
use crate::error::AutologinError;

/// Removes codes past their deadline. Lookups already treat expired rows as
/// absent; the sweep keeps the table from growing without bound.
pub struct SweepExpiredUseCase<C: CodeStore> {
    pub codes: C,
}

impl<C: CodeStore> SweepExpiredUseCase<C> {
    /// Idempotent; safe to run while issuance and verification proceed.
    pub async fn execute(&self) -> Result<u64, AutologinError> {
        let deleted = self.codes.delete_expired(Utc::now()).await?;
        if deleted > 0 {
            tracing::info!(deleted, "swept expired autologin codes");
        }
        Ok(deleted)
    }
}
