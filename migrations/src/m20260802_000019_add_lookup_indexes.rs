use sea_orm_migration::prelude::*;

use crate::m20260801_000007_create_sparepart_purchase_items_table::SparepartPurchaseItems;
use crate::m20260801_000008_create_inventory_units_table::InventoryUnits;
use crate::m20260801_000013_create_sale_items_table::SaleItems;
use crate::m20260801_000015_create_service_order_items_table::ServiceOrderItems;

#[derive(DeriveMigrationName)]
pub struct Migration;

// Lookup indexes only. Business uniqueness (serials, challans, emails)
// is enforced by the service layer scoped to non-deleted rows; plain
// unique indexes would refuse re-use of values held by soft-deleted
// rows.
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name("idx_purchase_items_sparepart")
                    .table(SparepartPurchaseItems::Table)
                    .col(SparepartPurchaseItems::SparepartId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_purchase_items_serial")
                    .table(SparepartPurchaseItems::Table)
                    .col(SparepartPurchaseItems::SerialNo)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_inventory_units_product")
                    .table(InventoryUnits::Table)
                    .col(InventoryUnits::ProductId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_inventory_units_serial")
                    .table(InventoryUnits::Table)
                    .col(InventoryUnits::SerialNo)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_sale_items_serial")
                    .table(SaleItems::Table)
                    .col(SaleItems::SerialNo)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_service_order_items_serial")
                    .table(ServiceOrderItems::Table)
                    .col(ServiceOrderItems::SerialNo)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_purchase_items_sparepart").to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_purchase_items_serial").to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_inventory_units_product").to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_inventory_units_serial").to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_sale_items_serial").to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_service_order_items_serial").to_owned())
            .await?;
        Ok(())
    }
}
