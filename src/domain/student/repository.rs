//! Student repository interface

use async_trait::async_trait;

use super::model::{NewStudent, Student};
use crate::domain::DomainResult;

#[async_trait]
pub trait StudentRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Student>>;
    async fn find_by_ids(&self, ids: &[i32]) -> DomainResult<Vec<Student>>;
    async fn find_by_family(&self, family_id: i32) -> DomainResult<Vec<Student>>;
    async fn find_by_teacher(&self, teacher_id: i32) -> DomainResult<Vec<Student>>;
    async fn save(&self, student: NewStudent) -> DomainResult<Student>;
    async fn update(&self, student: &Student) -> DomainResult<()>;
    async fn soft_delete(&self, id: i32) -> DomainResult<()>;
}
