use sea_orm_migration::prelude::*;

use crate::m20260801_000008_create_inventory_units_table::InventoryUnits;
use crate::m20260801_000009_create_technicians_table::Technicians;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Testings::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Testings::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Testings::InventoryUnitId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Testings::TechnicianId).uuid().not_null())
                    .col(ColumnDef::new(Testings::Status).text().not_null())
                    .col(
                        ColumnDef::new(Testings::TestedOn)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Testings::Remarks).text().null())
                    .col(
                        ColumnDef::new(Testings::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Testings::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Testings::CreatedBy).uuid().null())
                    .col(ColumnDef::new(Testings::UpdatedBy).uuid().null())
                    .col(
                        ColumnDef::new(Testings::DeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Testings::DeletedBy).uuid().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_testings_inventory_unit")
                            .from(Testings::Table, Testings::InventoryUnitId)
                            .to(InventoryUnits::Table, InventoryUnits::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_testings_technician")
                            .from(Testings::Table, Testings::TechnicianId)
                            .to(Technicians::Table, Technicians::Id),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Testings::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Testings {
    Table,
    Id,
    InventoryUnitId,
    TechnicianId,
    Status,
    TestedOn,
    Remarks,
    CreatedAt,
    UpdatedAt,
    CreatedBy,
    UpdatedBy,
    DeletedAt,
    DeletedBy,
}
