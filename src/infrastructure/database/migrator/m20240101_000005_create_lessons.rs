//! Create lessons table

use sea_orm_migration::prelude::*;

use super::m20240101_000004_create_students::Students;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Lessons::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Lessons::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Lessons::StudentId).integer().not_null())
                    .col(ColumnDef::new(Lessons::TeacherId).integer().not_null())
                    .col(ColumnDef::new(Lessons::FamilyId).integer().not_null())
                    .col(ColumnDef::new(Lessons::SupervisorId).integer())
                    .col(
                        ColumnDef::new(Lessons::Date)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Lessons::DurationMinutes).integer().not_null())
                    .col(
                        ColumnDef::new(Lessons::StudentRateMilli)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Lessons::TeacherRateMilli)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Lessons::Currency).string_len(3).not_null())
                    .col(ColumnDef::new(Lessons::Evaluation).string_len(20))
                    .col(ColumnDef::new(Lessons::Notes).text())
                    .col(
                        ColumnDef::new(Lessons::IsAbsent)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Lessons::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Lessons::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Lessons::DeletedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_lessons_student")
                            .from(Lessons::Table, Lessons::StudentId)
                            .to(Students::Table, Students::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Invoice queries filter by owner and date window
        for (name, col) in [
            ("idx_lessons_family_date", Lessons::FamilyId),
            ("idx_lessons_teacher_date", Lessons::TeacherId),
        ] {
            manager
                .create_index(
                    Index::create()
                        .name(name)
                        .table(Lessons::Table)
                        .col(col)
                        .col(Lessons::Date)
                        .to_owned(),
                )
                .await?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Lessons::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Lessons {
    Table,
    Id,
    StudentId,
    TeacherId,
    FamilyId,
    SupervisorId,
    Date,
    DurationMinutes,
    StudentRateMilli,
    TeacherRateMilli,
    Currency,
    Evaluation,
    Notes,
    IsAbsent,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}
