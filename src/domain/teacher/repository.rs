//! Teacher repository interface

use async_trait::async_trait;

use super::model::{NewTeacher, Teacher};
use crate::domain::DomainResult;

#[async_trait]
pub trait TeacherRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Teacher>>;
    async fn find_by_ids(&self, ids: &[i32]) -> DomainResult<Vec<Teacher>>;
    async fn find_all(&self) -> DomainResult<Vec<Teacher>>;
    async fn find_by_supervisor(&self, supervisor_id: i32) -> DomainResult<Vec<Teacher>>;
    async fn save(&self, teacher: NewTeacher) -> DomainResult<Teacher>;
    async fn update(&self, teacher: &Teacher) -> DomainResult<()>;
    async fn soft_delete(&self, id: i32) -> DomainResult<()>;
}
