use sea_orm_migration::prelude::*;

use crate::m20260801_000011_create_customers_table::Customers;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Sales::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Sales::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Sales::CustomerId).uuid().not_null())
                    .col(ColumnDef::new(Sales::InvoiceNo).string_len(100).not_null())
                    .col(ColumnDef::new(Sales::ChallanNo).string_len(100).null())
                    .col(ColumnDef::new(Sales::SaleDate).date().not_null())
                    .col(ColumnDef::new(Sales::DocumentPath).string_len(1024).null())
                    .col(ColumnDef::new(Sales::Notes).text().null())
                    .col(
                        ColumnDef::new(Sales::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Sales::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Sales::CreatedBy).uuid().null())
                    .col(ColumnDef::new(Sales::UpdatedBy).uuid().null())
                    .col(
                        ColumnDef::new(Sales::DeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Sales::DeletedBy).uuid().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sales_customer")
                            .from(Sales::Table, Sales::CustomerId)
                            .to(Customers::Table, Customers::Id),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Sales::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Sales {
    Table,
    Id,
    CustomerId,
    InvoiceNo,
    ChallanNo,
    SaleDate,
    DocumentPath,
    Notes,
    CreatedAt,
    UpdatedAt,
    CreatedBy,
    UpdatedBy,
    DeletedAt,
    DeletedBy,
}
