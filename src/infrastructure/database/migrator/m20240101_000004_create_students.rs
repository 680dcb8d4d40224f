//! Create students table

use sea_orm_migration::prelude::*;

use super::m20240101_000002_create_teachers::Teachers;
use super::m20240101_000003_create_families::Families;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Students::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Students::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Students::Name).string().not_null())
                    .col(ColumnDef::new(Students::FamilyId).integer().not_null())
                    .col(ColumnDef::new(Students::TeacherId).integer().not_null())
                    .col(
                        ColumnDef::new(Students::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Students::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Students::DeletedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_students_family")
                            .from(Students::Table, Students::FamilyId)
                            .to(Families::Table, Families::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_students_teacher")
                            .from(Students::Table, Students::TeacherId)
                            .to(Teachers::Table, Teachers::Id),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Students::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Students {
    Table,
    Id,
    Name,
    FamilyId,
    TeacherId,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}
