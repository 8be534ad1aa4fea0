//! Migration: create the users table.

use sea_orm_migration::prelude::*;

use domain::{
    MAX_COUNTRY_LENGTH, MAX_EMAIL_LENGTH, MAX_NAME_LENGTH, MAX_PHONE_NUMBER_LENGTH,
    USER_ID_LENGTH,
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(users_table()).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}

/// Rows are stamped in UTC so database defaults agree with the naive UTC
/// timestamps written by the application.
fn utc_now() -> SimpleExpr {
    Expr::cust("timezone('utc', now())")
}

fn users_table() -> TableCreateStatement {
    Table::create()
        .table(Users::Table)
        .if_not_exists()
        .col(
            ColumnDef::new(Users::Id)
                .string_len(USER_ID_LENGTH as u32)
                .not_null(),
        )
        .col(
            ColumnDef::new(Users::Name)
                .string_len(MAX_NAME_LENGTH as u32)
                .not_null(),
        )
        .col(
            ColumnDef::new(Users::Surname)
                .string_len(MAX_NAME_LENGTH as u32)
                .not_null(),
        )
        .col(
            ColumnDef::new(Users::Patronymic)
                .string_len(MAX_NAME_LENGTH as u32)
                .null(),
        )
        .col(
            ColumnDef::new(Users::PhoneNumber)
                .string_len(MAX_PHONE_NUMBER_LENGTH as u32)
                .not_null(),
        )
        .col(
            ColumnDef::new(Users::Email)
                .string_len(MAX_EMAIL_LENGTH as u32)
                .null(),
        )
        .col(
            ColumnDef::new(Users::Country)
                .string_len(MAX_COUNTRY_LENGTH as u32)
                .not_null(),
        )
        .col(
            ColumnDef::new(Users::DataCreated)
                .timestamp()
                .null()
                .default(utc_now()),
        )
        .col(
            ColumnDef::new(Users::DateModified)
                .timestamp()
                .null()
                .default(utc_now()),
        )
        .primary_key(Index::create().name("pk_users").col(Users::Id))
        .index(
            Index::create()
                .name("uq_users_phone_number")
                .col(Users::PhoneNumber)
                .unique(),
        )
        .index(
            Index::create()
                .name("uq_users_email")
                .col(Users::Email)
                .unique(),
        )
        .to_owned()
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
    Name,
    Surname,
    Patronymic,
    PhoneNumber,
    Email,
    Country,
    DataCreated,
    DateModified,
}
