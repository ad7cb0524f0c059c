//! Budget schema: categories, their shared members and the recorded entries.
//!
//! - `categories`: named buckets owned by exactly one user
//! - `category_members`: users the owner shared a category with
//! - `budgets`: income/expense entries, amounts in minor units (cents)

use sea_orm_migration::prelude::*;

use crate::m20240601_090000_accounts::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Categories {
    Table,
    Id,
    Name,
    OwnerId,
}

#[derive(Iden)]
enum CategoryMembers {
    Table,
    CategoryId,
    UserId,
}

#[derive(Iden)]
enum Budgets {
    Table,
    Id,
    Kind,
    AmountMinor,
    CategoryId,
    UserId,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Categories::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Categories::Name).string_len(128).not_null())
                    .col(ColumnDef::new(Categories::OwnerId).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-categories-owner_id")
                            .from(Categories::Table, Categories::OwnerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-categories-owner_id")
                    .table(Categories::Table)
                    .col(Categories::OwnerId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CategoryMembers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CategoryMembers::CategoryId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CategoryMembers::UserId).integer().not_null())
                    .primary_key(
                        Index::create()
                            .col(CategoryMembers::CategoryId)
                            .col(CategoryMembers::UserId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-category_members-category_id")
                            .from(CategoryMembers::Table, CategoryMembers::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-category_members-user_id")
                            .from(CategoryMembers::Table, CategoryMembers::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-category_members-user_id")
                    .table(CategoryMembers::Table)
                    .col(CategoryMembers::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Budgets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Budgets::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Budgets::Kind).string_len(2).not_null())
                    .col(
                        ColumnDef::new(Budgets::AmountMinor)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(Budgets::AmountMinor).gte(0)),
                    )
                    .col(ColumnDef::new(Budgets::CategoryId).integer().not_null())
                    .col(ColumnDef::new(Budgets::UserId).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-budgets-category_id")
                            .from(Budgets::Table, Budgets::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-budgets-user_id")
                            .from(Budgets::Table, Budgets::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-budgets-category_id")
                    .table(Budgets::Table)
                    .col(Budgets::CategoryId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Budgets::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CategoryMembers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await?;
        Ok(())
    }
}
