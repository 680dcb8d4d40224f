//! Family repository interface

use async_trait::async_trait;

use super::model::{Family, NewFamily};
use crate::domain::DomainResult;

#[async_trait]
pub trait FamilyRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Family>>;
    async fn find_by_ids(&self, ids: &[i32]) -> DomainResult<Vec<Family>>;
    async fn find_all(&self) -> DomainResult<Vec<Family>>;
    async fn find_by_supervisor(&self, supervisor_id: i32) -> DomainResult<Vec<Family>>;
    async fn save(&self, family: NewFamily) -> DomainResult<Family>;
    async fn update(&self, family: &Family) -> DomainResult<()>;
    async fn soft_delete(&self, id: i32) -> DomainResult<()>;
}
