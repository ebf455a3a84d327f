use sea_orm_migration::prelude::*;

use crate::m20260801_000003_create_spareparts_table::Spareparts;
use crate::m20260801_000006_create_sparepart_purchases_table::SparepartPurchases;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SparepartPurchaseItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SparepartPurchaseItems::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SparepartPurchaseItems::PurchaseId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SparepartPurchaseItems::SparepartId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SparepartPurchaseItems::Quantity)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SparepartPurchaseItems::UnitPrice)
                            .decimal_len(19, 4)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(SparepartPurchaseItems::SerialNo)
                            .string_len(100)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(SparepartPurchaseItems::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SparepartPurchaseItems::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(SparepartPurchaseItems::CreatedBy)
                            .uuid()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(SparepartPurchaseItems::UpdatedBy)
                            .uuid()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(SparepartPurchaseItems::DeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(SparepartPurchaseItems::DeletedBy)
                            .uuid()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_purchase_items_purchase")
                            .from(
                                SparepartPurchaseItems::Table,
                                SparepartPurchaseItems::PurchaseId,
                            )
                            .to(SparepartPurchases::Table, SparepartPurchases::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_purchase_items_sparepart")
                            .from(
                                SparepartPurchaseItems::Table,
                                SparepartPurchaseItems::SparepartId,
                            )
                            .to(Spareparts::Table, Spareparts::Id),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SparepartPurchaseItems::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum SparepartPurchaseItems {
    Table,
    Id,
    PurchaseId,
    SparepartId,
    Quantity,
    UnitPrice,
    SerialNo,
    CreatedAt,
    UpdatedAt,
    CreatedBy,
    UpdatedBy,
    DeletedAt,
    DeletedBy,
}
