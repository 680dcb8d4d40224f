//! Database migrations module

pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_supervisors;
mod m20240101_000002_create_teachers;
mod m20240101_000003_create_families;
mod m20240101_000004_create_students;
mod m20240101_000005_create_lessons;
mod m20240101_000006_create_users;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_supervisors::Migration),
            Box::new(m20240101_000002_create_teachers::Migration),
            Box::new(m20240101_000003_create_families::Migration),
            Box::new(m20240101_000004_create_students::Migration),
            Box::new(m20240101_000005_create_lessons::Migration),
            Box::new(m20240101_000006_create_users::Migration),
        ]
    }
}
