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
                    .table(ContactPersons::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ContactPersons::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ContactPersons::VendorId).uuid().not_null())
                    .col(
                        ColumnDef::new(ContactPersons::Name)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ContactPersons::Designation)
                            .string_len(100)
                            .null(),
                    )
                    .col(ColumnDef::new(ContactPersons::Email).string_len(255).null())
                    .col(ColumnDef::new(ContactPersons::Phone).string_len(50).null())
                    .col(
                        ColumnDef::new(ContactPersons::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ContactPersons::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(ContactPersons::CreatedBy).uuid().null())
                    .col(ColumnDef::new(ContactPersons::UpdatedBy).uuid().null())
                    .col(
                        ColumnDef::new(ContactPersons::DeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(ContactPersons::DeletedBy).uuid().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_contact_persons_vendor")
                            .from(ContactPersons::Table, ContactPersons::VendorId)
                            .to(Vendors::Table, Vendors::Id),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ContactPersons::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum ContactPersons {
    Table,
    Id,
    VendorId,
    Name,
    Designation,
    Email,
    Phone,
    CreatedAt,
    UpdatedAt,
    CreatedBy,
    UpdatedBy,
    DeletedAt,
    DeletedBy,
}
