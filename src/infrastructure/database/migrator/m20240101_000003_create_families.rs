//! Create families table

use sea_orm_migration::prelude::*;

use super::m20240101_000001_create_supervisors::Supervisors;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Families::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Families::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Families::Name).string().not_null())
                    .col(
                        ColumnDef::new(Families::HourlyRateMilli)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Families::Currency)
                            .string_len(3)
                            .not_null()
                            .default("EGP"),
                    )
                    .col(ColumnDef::new(Families::SupervisorId).integer())
                    .col(
                        ColumnDef::new(Families::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Families::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Families::DeletedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_families_supervisor")
                            .from(Families::Table, Families::SupervisorId)
                            .to(Supervisors::Table, Supervisors::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_families_supervisor")
                    .table(Families::Table)
                    .col(Families::SupervisorId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Families::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Families {
    Table,
    Id,
    Name,
    HourlyRateMilli,
    Currency,
    SupervisorId,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}
