use sea_orm_migration::prelude::*;

use crate::m20260801_000014_create_service_orders_table::ServiceOrders;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ServiceDeliveries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ServiceDeliveries::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ServiceDeliveries::ServiceOrderId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ServiceDeliveries::ChallanNo)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ServiceDeliveries::DeliveryDate)
                            .date()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ServiceDeliveries::DocumentPath)
                            .string_len(1024)
                            .null(),
                    )
                    .col(ColumnDef::new(ServiceDeliveries::Notes).text().null())
                    .col(
                        ColumnDef::new(ServiceDeliveries::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ServiceDeliveries::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(ServiceDeliveries::CreatedBy).uuid().null())
                    .col(ColumnDef::new(ServiceDeliveries::UpdatedBy).uuid().null())
                    .col(
                        ColumnDef::new(ServiceDeliveries::DeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(ServiceDeliveries::DeletedBy).uuid().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_service_deliveries_order")
                            .from(ServiceDeliveries::Table, ServiceDeliveries::ServiceOrderId)
                            .to(ServiceOrders::Table, ServiceOrders::Id),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ServiceDeliveries::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum ServiceDeliveries {
    Table,
    Id,
    ServiceOrderId,
    ChallanNo,
    DeliveryDate,
    DocumentPath,
    Notes,
    CreatedAt,
    UpdatedAt,
    CreatedBy,
    UpdatedBy,
    DeletedAt,
    DeletedBy,
}
