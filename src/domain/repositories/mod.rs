//! Repository traits for the domain layer
//!
//! `RepositoryProvider` gives typed access to every per-aggregate
//! repository so services depend on one handle instead of six.

use super::family::FamilyRepository;
use super::lesson::LessonRepository;
use super::student::StudentRepository;
use super::supervisor::SupervisorRepository;
use super::teacher::TeacherRepository;
use super::user::UserRepository;
use crate::shared::errors::DomainError;

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Provides access to all domain repositories.
///
/// ```ignore
/// async fn handle(repos: &dyn RepositoryProvider) {
///     let family = repos.families().find_by_id(7).await?;
///     let lessons = repos.lessons().find(&query).await?;
/// }
/// ```
pub trait RepositoryProvider: Send + Sync {
    fn lessons(&self) -> &dyn LessonRepository;
    fn students(&self) -> &dyn StudentRepository;
    fn teachers(&self) -> &dyn TeacherRepository;
    fn families(&self) -> &dyn FamilyRepository;
    fn supervisors(&self) -> &dyn SupervisorRepository;
    fn users(&self) -> &dyn UserRepository;
}
