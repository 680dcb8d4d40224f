//! Supervisor repository interface

use async_trait::async_trait;

use super::model::{NewSupervisor, Supervisor};
use crate::domain::DomainResult;

#[async_trait]
pub trait SupervisorRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Supervisor>>;
    async fn find_all(&self) -> DomainResult<Vec<Supervisor>>;
    async fn save(&self, supervisor: NewSupervisor) -> DomainResult<Supervisor>;
    async fn update(&self, supervisor: &Supervisor) -> DomainResult<()>;
    async fn soft_delete(&self, id: i32) -> DomainResult<()>;
}
