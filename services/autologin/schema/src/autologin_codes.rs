use sea_orm::entity::prelude::*;

/// Single-use autologin code, stored as digests only.
/// The raw secret never touches the database; `code_hash` is the lookup key
/// and doubles as the primary key, so a duplicate insert is a constraint
/// violation rather than a silent overwrite.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "autologin_codes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub code_hash: String,
    pub user_hash: String,
    pub expires_at: chrono::DateTime<chrono::Utc>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
