use sea_orm_migration::prelude::*;

use crate::m20240101_000001_create_users_table::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Statements::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Statements::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Statements::UserId).string().not_null())
                    .col(ColumnDef::new(Statements::Text).string().not_null())
                    .col(ColumnDef::new(Statements::IsLie).boolean().not_null())
                    // Sets are numbered per user; the highest is the one offered to guessers
                    .col(ColumnDef::new(Statements::SetNumber).integer().not_null())
                    .col(
                        ColumnDef::new(Statements::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_statements_user_id")
                            .from(Statements::Table, Statements::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_statements_user_set")
                    .table(Statements::Table)
                    .col(Statements::UserId)
                    .col(Statements::SetNumber)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Statements::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Statements {
    Table,
    Id,
    UserId,
    Text,
    IsLie,
    SetNumber,
    CreatedAt,
}
