//! Migration to add the provider_identity table.
//!
//! Links users to federated identity providers. The composite unique index
//! on `(provider, subject)` is what makes the store's find-or-create safe
//! against concurrent callbacks for the same provider identity.

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
                    .table(ProviderIdentity::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProviderIdentity::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ProviderIdentity::UserId).string().not_null())
                    .col(
                        ColumnDef::new(ProviderIdentity::Provider)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProviderIdentity::Subject)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProviderIdentity::DisplayName)
                            .string()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ProviderIdentity::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_provider_identity_user")
                            .from(ProviderIdentity::Table, ProviderIdentity::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_provider_identity_provider_subject")
                    .table(ProviderIdentity::Table)
                    .col(ProviderIdentity::Provider)
                    .col(ProviderIdentity::Subject)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ProviderIdentity::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum ProviderIdentity {
    Table,
    Id,
    UserId,
    Provider,
    Subject,
    DisplayName,
    CreatedAt,
}
