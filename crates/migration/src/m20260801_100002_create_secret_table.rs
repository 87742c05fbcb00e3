//! Migration to add the secret table.
//!
//! Secrets always belong to a user; cascading deletes keep the table free of
//! orphans when an account goes away.

use sea_orm_migration::prelude::*;

use crate::m20260801_100000_create_user_table::User;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Secret::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Secret::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Secret::OwnerId).string().not_null())
                    .col(ColumnDef::new(Secret::Body).text().not_null())
                    .col(
                        ColumnDef::new(Secret::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::current_timestamp())
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_secret_owner")
                            .from(Secret::Table, Secret::OwnerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Secret::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Secret {
    Table,
    Id,
    OwnerId,
    Body,
    CreatedAt,
}
