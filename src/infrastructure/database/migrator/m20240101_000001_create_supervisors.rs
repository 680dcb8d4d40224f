//! Create supervisors table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Supervisors::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Supervisors::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Supervisors::Name).string().not_null())
                    .col(
                        ColumnDef::new(Supervisors::HourlyRateMilli)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Supervisors::Currency)
                            .string_len(3)
                            .not_null()
                            .default("EGP"),
                    )
                    .col(
                        ColumnDef::new(Supervisors::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Supervisors::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Supervisors::DeletedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Supervisors::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Supervisors {
    Table,
    Id,
    Name,
    HourlyRateMilli,
    Currency,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}
