use sea_orm_migration::prelude::*;

use crate::m20260801_000001_create_products_table::Products;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ProductTypes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProductTypes::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ProductTypes::ProductId).uuid().not_null())
                    .col(
                        ColumnDef::new(ProductTypes::Name)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ProductTypes::Description).text().null())
                    .col(
                        ColumnDef::new(ProductTypes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProductTypes::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(ProductTypes::CreatedBy).uuid().null())
                    .col(ColumnDef::new(ProductTypes::UpdatedBy).uuid().null())
                    .col(
                        ColumnDef::new(ProductTypes::DeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(ProductTypes::DeletedBy).uuid().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_product_types_product")
                            .from(ProductTypes::Table, ProductTypes::ProductId)
                            .to(Products::Table, Products::Id),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ProductTypes::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum ProductTypes {
    Table,
    Id,
    ProductId,
    Name,
    Description,
    CreatedAt,
    UpdatedAt,
    CreatedBy,
    UpdatedBy,
    DeletedAt,
    DeletedBy,
}
