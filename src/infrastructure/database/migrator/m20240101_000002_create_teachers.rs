//! Create teachers table

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
                    .table(Teachers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Teachers::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Teachers::Name).string().not_null())
                    .col(
                        ColumnDef::new(Teachers::HourlyRateMilli)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Teachers::Currency)
                            .string_len(3)
                            .not_null()
                            .default("EGP"),
                    )
                    .col(ColumnDef::new(Teachers::SupervisorId).integer())
                    .col(
                        ColumnDef::new(Teachers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Teachers::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Teachers::DeletedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_teachers_supervisor")
                            .from(Teachers::Table, Teachers::SupervisorId)
                            .to(Supervisors::Table, Supervisors::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_teachers_supervisor")
                    .table(Teachers::Table)
                    .col(Teachers::SupervisorId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Teachers::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Teachers {
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
