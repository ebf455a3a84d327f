use sea_orm_migration::prelude::*;

use crate::m20260801_000015_create_service_order_items_table::ServiceOrderItems;
use crate::m20260801_000017_create_service_deliveries_table::ServiceDeliveries;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ServiceDeliveryItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ServiceDeliveryItems::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ServiceDeliveryItems::ServiceDeliveryId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ServiceDeliveryItems::ServiceOrderItemId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ServiceDeliveryItems::SerialNo)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ServiceDeliveryItems::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ServiceDeliveryItems::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ServiceDeliveryItems::CreatedBy)
                            .uuid()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ServiceDeliveryItems::UpdatedBy)
                            .uuid()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ServiceDeliveryItems::DeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ServiceDeliveryItems::DeletedBy)
                            .uuid()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_service_delivery_items_delivery")
                            .from(
                                ServiceDeliveryItems::Table,
                                ServiceDeliveryItems::ServiceDeliveryId,
                            )
                            .to(ServiceDeliveries::Table, ServiceDeliveries::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_service_delivery_items_item")
                            .from(
                                ServiceDeliveryItems::Table,
                                ServiceDeliveryItems::ServiceOrderItemId,
                            )
                            .to(ServiceOrderItems::Table, ServiceOrderItems::Id),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ServiceDeliveryItems::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum ServiceDeliveryItems {
    Table,
    Id,
    ServiceDeliveryId,
    ServiceOrderItemId,
    SerialNo,
    CreatedAt,
    UpdatedAt,
    CreatedBy,
    UpdatedBy,
    DeletedAt,
    DeletedBy,
}
