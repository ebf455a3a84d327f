use sea_orm_migration::prelude::*;

use crate::m20260801_000001_create_products_table::Products;
use crate::m20260801_000002_create_product_types_table::ProductTypes;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(InventoryUnits::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(InventoryUnits::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(InventoryUnits::ProductId).uuid().not_null())
                    .col(
                        ColumnDef::new(InventoryUnits::ProductTypeId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InventoryUnits::SerialNo)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InventoryUnits::TestedStatus)
                            .text()
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(InventoryUnits::AssembledOn).date().null())
                    .col(ColumnDef::new(InventoryUnits::Remarks).text().null())
                    .col(
                        ColumnDef::new(InventoryUnits::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InventoryUnits::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(InventoryUnits::CreatedBy).uuid().null())
                    .col(ColumnDef::new(InventoryUnits::UpdatedBy).uuid().null())
                    .col(
                        ColumnDef::new(InventoryUnits::DeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(InventoryUnits::DeletedBy).uuid().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_inventory_units_product")
                            .from(InventoryUnits::Table, InventoryUnits::ProductId)
                            .to(Products::Table, Products::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_inventory_units_product_type")
                            .from(InventoryUnits::Table, InventoryUnits::ProductTypeId)
                            .to(ProductTypes::Table, ProductTypes::Id),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(InventoryUnits::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum InventoryUnits {
    Table,
    Id,
    ProductId,
    ProductTypeId,
    SerialNo,
    TestedStatus,
    AssembledOn,
    Remarks,
    CreatedAt,
    UpdatedAt,
    CreatedBy,
    UpdatedBy,
    DeletedAt,
    DeletedBy,
}
