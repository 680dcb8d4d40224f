//! Database repository implementations
//!
//! Per-aggregate SeaORM repositories + unified RepositoryProvider.

pub mod family_repository;
pub mod lesson_repository;
pub mod repository_provider;
pub mod student_repository;
pub mod supervisor_repository;
pub mod teacher_repository;
pub mod user_repository;

pub use repository_provider::SeaOrmRepositoryProvider;

use rust_decimal::Decimal;

use crate::domain::money::to_milli;
use crate::domain::{DomainError, DomainResult};
use crate::shared::InfraError;

// ── Conversion helpers ──────────────────────────────────────────

pub(crate) fn db_err(e: sea_orm::DbErr) -> DomainError {
    InfraError::Database(e).into()
}

/// Unique-constraint violations surface as `Conflict`.
pub(crate) fn insert_err(e: sea_orm::DbErr, what: &str) -> DomainError {
    let msg = e.to_string();
    if msg.contains("UNIQUE") || msg.contains("duplicate") {
        DomainError::Conflict(format!("{} already exists", what))
    } else {
        db_err(e)
    }
}

pub(crate) fn milli(value: Decimal) -> DomainResult<i64> {
    to_milli(value)
        .ok_or_else(|| DomainError::Validation(format!("Amount out of range: {}", value)))
}
