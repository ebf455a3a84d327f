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
                    .table(SparepartPurchases::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SparepartPurchases::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SparepartPurchases::VendorId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SparepartPurchases::ChallanNo)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SparepartPurchases::PurchaseDate)
                            .date()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SparepartPurchases::ReceivedDate)
                            .date()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(SparepartPurchases::DocumentPath)
                            .string_len(1024)
                            .null(),
                    )
                    .col(ColumnDef::new(SparepartPurchases::Notes).text().null())
                    .col(
                        ColumnDef::new(SparepartPurchases::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SparepartPurchases::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(SparepartPurchases::CreatedBy).uuid().null())
                    .col(ColumnDef::new(SparepartPurchases::UpdatedBy).uuid().null())
                    .col(
                        ColumnDef::new(SparepartPurchases::DeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(SparepartPurchases::DeletedBy).uuid().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sparepart_purchases_vendor")
                            .from(SparepartPurchases::Table, SparepartPurchases::VendorId)
                            .to(Vendors::Table, Vendors::Id),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SparepartPurchases::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum SparepartPurchases {
    Table,
    Id,
    VendorId,
    ChallanNo,
    PurchaseDate,
    ReceivedDate,
    DocumentPath,
    Notes,
    CreatedAt,
    UpdatedAt,
    CreatedBy,
    UpdatedBy,
    DeletedAt,
    DeletedBy,
}
