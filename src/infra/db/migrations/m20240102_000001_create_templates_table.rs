//! Migration: Create the templates table.
//!
//! Template names are unique per owning user; the unique index below is
//! what enforces that cross-entity invariant.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Table and column identifiers for templates
#[derive(Iden)]
enum Templates {
    Table,
    Id,
    UserId,
    Name,
    Channel,
    Subject,
    Body,
    Variables,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Templates::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Templates::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Templates::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Templates::Name).string_len(100).not_null())
                    .col(ColumnDef::new(Templates::Channel).string_len(16).not_null())
                    .col(ColumnDef::new(Templates::Subject).text().null())
                    .col(ColumnDef::new(Templates::Body).text().not_null())
                    .col(ColumnDef::new(Templates::Variables).json_binary().not_null())
                    .col(
                        ColumnDef::new(Templates::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Templates::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Templates::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_templates_user_id")
                            .from(Templates::Table, Templates::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Template names are unique per owning user
        manager
            .create_index(
                Index::create()
                    .name("idx_templates_user_id_name")
                    .table(Templates::Table)
                    .col(Templates::UserId)
                    .col(Templates::Name)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Templates::Table).to_owned())
            .await
    }
}
