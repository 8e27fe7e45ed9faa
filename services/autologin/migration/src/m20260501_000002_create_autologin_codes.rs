use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AutologinCodes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AutologinCodes::CodeHash)
                            .string_len(64)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AutologinCodes::UserHash)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AutologinCodes::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AutologinCodes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // The periodic sweep deletes by expiry; keep that scan off the PK.
        manager
            .create_index(
                Index::create()
                    .table(AutologinCodes::Table)
                    .col(AutologinCodes::ExpiresAt)
                    .name("idx_autologin_codes_expires_at")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AutologinCodes::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum AutologinCodes {
    Table,
    CodeHash,
    UserHash,
    ExpiresAt,
    CreatedAt,
}
