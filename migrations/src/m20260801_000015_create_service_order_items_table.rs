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
                    .table(ServiceOrderItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ServiceOrderItems::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ServiceOrderItems::ServiceOrderId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ServiceOrderItems::SerialNo)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ServiceOrderItems::Complaint).text().null())
                    .col(ColumnDef::new(ServiceOrderItems::Diagnosis).text().null())
                    .col(
                        ColumnDef::new(ServiceOrderItems::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ServiceOrderItems::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(ServiceOrderItems::CreatedBy).uuid().null())
                    .col(ColumnDef::new(ServiceOrderItems::UpdatedBy).uuid().null())
                    .col(
                        ColumnDef::new(ServiceOrderItems::DeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(ServiceOrderItems::DeletedBy).uuid().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_service_order_items_order")
                            .from(ServiceOrderItems::Table, ServiceOrderItems::ServiceOrderId)
                            .to(ServiceOrders::Table, ServiceOrders::Id),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ServiceOrderItems::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum ServiceOrderItems {
    Table,
    Id,
    ServiceOrderId,
    SerialNo,
    Complaint,
    Diagnosis,
    CreatedAt,
    UpdatedAt,
    CreatedBy,
    UpdatedBy,
    DeletedAt,
    DeletedBy,
}
