use sea_orm_migration::prelude::*;

use crate::m20260801_000003_create_spareparts_table::Spareparts;
use crate::m20260801_000015_create_service_order_items_table::ServiceOrderItems;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ServicePartUsages::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ServicePartUsages::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ServicePartUsages::ServiceOrderItemId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ServicePartUsages::SparepartId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ServicePartUsages::Quantity)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ServicePartUsages::SerialNo)
                            .string_len(100)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ServicePartUsages::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ServicePartUsages::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(ServicePartUsages::CreatedBy).uuid().null())
                    .col(ColumnDef::new(ServicePartUsages::UpdatedBy).uuid().null())
                    .col(
                        ColumnDef::new(ServicePartUsages::DeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(ServicePartUsages::DeletedBy).uuid().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_service_part_usages_item")
                            .from(
                                ServicePartUsages::Table,
                                ServicePartUsages::ServiceOrderItemId,
                            )
                            .to(ServiceOrderItems::Table, ServiceOrderItems::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_service_part_usages_sparepart")
                            .from(ServicePartUsages::Table, ServicePartUsages::SparepartId)
                            .to(Spareparts::Table, Spareparts::Id),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ServicePartUsages::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum ServicePartUsages {
    Table,
    Id,
    ServiceOrderItemId,
    SparepartId,
    Quantity,
    SerialNo,
    CreatedAt,
    UpdatedAt,
    CreatedBy,
    UpdatedBy,
    DeletedAt,
    DeletedBy,
}
