use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Technicians::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Technicians::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Technicians::Name)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Technicians::Email).string_len(255).null())
                    .col(ColumnDef::new(Technicians::Phone).string_len(50).null())
                    .col(
                        ColumnDef::new(Technicians::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Technicians::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Technicians::CreatedBy).uuid().null())
                    .col(ColumnDef::new(Technicians::UpdatedBy).uuid().null())
                    .col(
                        ColumnDef::new(Technicians::DeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Technicians::DeletedBy).uuid().null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Technicians::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Technicians {
    Table,
    Id,
    Name,
    Email,
    Phone,
    CreatedAt,
    UpdatedAt,
    CreatedBy,
    UpdatedBy,
    DeletedAt,
    DeletedBy,
}
