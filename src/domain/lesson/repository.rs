//! Lesson repository interface

use async_trait::async_trait;

use super::model::{LessonQuery, LessonRecord, NewLesson};
use crate::domain::DomainResult;

#[async_trait]
pub trait LessonRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<LessonRecord>>;
    /// Non-deleted lessons matching `query`, ordered by date then id.
    async fn find(&self, query: &LessonQuery) -> DomainResult<Vec<LessonRecord>>;
    async fn save(&self, lesson: NewLesson) -> DomainResult<LessonRecord>;
    /// Persist date, duration, notes and evaluation. Rates are never rewritten.
    async fn update(&self, lesson: &LessonRecord) -> DomainResult<()>;
    async fn soft_delete(&self, id: i32) -> DomainResult<()>;
}
