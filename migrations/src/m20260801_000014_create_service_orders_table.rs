use sea_orm_migration::prelude::*;

use crate::m20260801_000004_create_vendors_table::Vendors;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ServiceOrders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ServiceOrders::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ServiceOrders::VendorId).uuid().not_null())
                    .col(
                        ColumnDef::new(ServiceOrders::ChallanNo)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ServiceOrders::ReceivedDate)
                            .date()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ServiceOrders::Status)
                            .text()
                            .not_null()
                            .default("received"),
                    )
                    .col(
                        ColumnDef::new(ServiceOrders::DocumentPath)
                            .string_len(1024)
                            .null(),
                    )
                    .col(ColumnDef::new(ServiceOrders::Notes).text().null())
                    .col(
                        ColumnDef::new(ServiceOrders::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ServiceOrders::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(ServiceOrders::CreatedBy).uuid().null())
                    .col(ColumnDef::new(ServiceOrders::UpdatedBy).uuid().null())
                    .col(
                        ColumnDef::new(ServiceOrders::DeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(ServiceOrders::DeletedBy).uuid().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_service_orders_vendor")
                            .from(ServiceOrders::Table, ServiceOrders::VendorId)
                            .to(Vendors::Table, Vendors::Id),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ServiceOrders::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum ServiceOrders {
    Table,
    Id,
    VendorId,
    ChallanNo,
    ReceivedDate,
    Status,
    DocumentPath,
    Notes,
    CreatedAt,
    UpdatedAt,
    CreatedBy,
    UpdatedBy,
    DeletedAt,
    DeletedBy,
}
