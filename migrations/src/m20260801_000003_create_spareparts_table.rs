use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Spareparts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Spareparts::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Spareparts::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Spareparts::PartNo).string_len(100).null())
                    .col(ColumnDef::new(Spareparts::Unit).string_len(50).null())
                    .col(ColumnDef::new(Spareparts::Description).text().null())
                    .col(ColumnDef::new(Spareparts::MinimumStock).integer().null())
                    .col(
                        ColumnDef::new(Spareparts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Spareparts::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Spareparts::CreatedBy).uuid().null())
                    .col(ColumnDef::new(Spareparts::UpdatedBy).uuid().null())
                    .col(
                        ColumnDef::new(Spareparts::DeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Spareparts::DeletedBy).uuid().null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Spareparts::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Spareparts {
    Table,
    Id,
    Name,
    PartNo,
    Unit,
    Description,
    MinimumStock,
    CreatedAt,
    UpdatedAt,
    CreatedBy,
    UpdatedBy,
    DeletedAt,
    DeletedBy,
}
