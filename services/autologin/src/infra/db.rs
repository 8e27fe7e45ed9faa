use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    SqlErr,
};

use passlink_autologin_schema::{autologin_codes, users};

use crate::domain::repository::{CodeStore, UserDirectory};
use crate::domain::types::CodeRecord;
use crate::error::AutologinError;

fn store_err(e: sea_orm::DbErr, what: &'static str) -> AutologinError {
    AutologinError::StoreUnavailable(anyhow::Error::new(e).context(what))
}

// ── Code store ────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbCodeStore {
    pub db: DatabaseConnection,
}

impl CodeStore for DbCodeStore {
    async fn insert(&self, record: &CodeRecord) -> Result<(), AutologinError> {
        let result = autologin_codes::ActiveModel {
            code_hash: Set(record.code_hash.clone()),
            user_hash: Set(record.user_hash.clone()),
            expires_at: Set(record.expires_at),
            created_at: Set(record.created_at),
        }
        .insert(&self.db)
        .await;

        match result {
            Ok(_) => Ok(()),
            // The primary key doubles as the uniqueness constraint: two live
            // codes can never share a hash, and the clash is loud.
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(AutologinError::CodeCollision)
            }
            Err(e) => Err(store_err(e, "insert autologin code")),
        }
    }

    async fn take_valid(
        &self,
        code_hash: &str,
        consume: bool,
    ) -> Result<Option<CodeRecord>, AutologinError> {
        let now = Utc::now();
        let model = autologin_codes::Entity::find_by_id(code_hash.to_owned())
            .one(&self.db)
            .await
            .map_err(|e| store_err(e, "find autologin code"))?;
        let Some(model) = model else {
            return Ok(None);
        };

        if model.expires_at <= now {
            // Dead row; clear it out while we are here. Losing the delete is
            // harmless, the sweep will catch it.
            let _ = autologin_codes::Entity::delete_by_id(code_hash.to_owned())
                .exec(&self.db)
                .await;
            return Ok(None);
        }

        if consume {
            // The conditional delete is the consumption point: whichever
            // concurrent caller's delete lands first owns the login, everyone
            // else sees zero rows affected.
            let result = autologin_codes::Entity::delete_many()
                .filter(autologin_codes::Column::CodeHash.eq(code_hash))
                .filter(autologin_codes::Column::ExpiresAt.gt(now))
                .exec(&self.db)
                .await
                .map_err(|e| store_err(e, "consume autologin code"))?;
            if result.rows_affected == 0 {
                return Ok(None);
            }
        }

        Ok(Some(record_from_model(model)))
    }

    async fn delete_expired(&self, before: DateTime<Utc>) -> Result<u64, AutologinError> {
        let result = autologin_codes::Entity::delete_many()
            .filter(autologin_codes::Column::ExpiresAt.lt(before))
            .exec(&self.db)
            .await
            .map_err(|e| store_err(e, "delete expired autologin codes"))?;
        Ok(result.rows_affected)
    }
}

fn record_from_model(model: autologin_codes::Model) -> CodeRecord {
    CodeRecord {
        code_hash: model.code_hash,
        user_hash: model.user_hash,
        expires_at: model.expires_at,
        created_at: model.created_at,
    }
}

// ── User directory ────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbUserDirectory {
    pub db: DatabaseConnection,
}

impl UserDirectory for DbUserDirectory {
    async fn exists(&self, user_id: u64) -> Result<bool, AutologinError> {
        // Ids beyond the column range cannot name a stored account.
        let Ok(id) = i64::try_from(user_id) else {
            return Ok(false);
        };
        let model = users::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| store_err(e, "find user"))?;
        Ok(model.is_some())
    }
}
