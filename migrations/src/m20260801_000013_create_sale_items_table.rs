use sea_orm_migration::prelude::*;

use crate::m20260801_000008_create_inventory_units_table::InventoryUnits;
use crate::m20260801_000012_create_sales_table::Sales;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SaleItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SaleItems::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SaleItems::SaleId).uuid().not_null())
                    .col(
                        ColumnDef::new(SaleItems::InventoryUnitId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SaleItems::SerialNo)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SaleItems::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SaleItems::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(SaleItems::CreatedBy).uuid().null())
                    .col(ColumnDef::new(SaleItems::UpdatedBy).uuid().null())
                    .col(
                        ColumnDef::new(SaleItems::DeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(SaleItems::DeletedBy).uuid().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sale_items_sale")
                            .from(SaleItems::Table, SaleItems::SaleId)
                            .to(Sales::Table, Sales::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sale_items_inventory_unit")
                            .from(SaleItems::Table, SaleItems::InventoryUnitId)
                            .to(InventoryUnits::Table, InventoryUnits::Id),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SaleItems::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum SaleItems {
    Table,
    Id,
    SaleId,
    InventoryUnitId,
    SerialNo,
    CreatedAt,
    UpdatedAt,
    CreatedBy,
    UpdatedBy,
    DeletedAt,
    DeletedBy,
}
