//! SeaORM implementation of SupervisorRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use tracing::info;

use super::{db_err, milli};
use crate::domain::money::{from_milli, normalize_currency};
use crate::domain::{DomainError, DomainResult, NewSupervisor, Supervisor, SupervisorRepository};
use crate::infrastructure::database::entities::supervisor;

pub(crate) fn entity_to_domain(s: supervisor::Model) -> Supervisor {
    Supervisor {
        id: s.id,
        name: s.name,
        hourly_rate: from_milli(s.hourly_rate_milli),
        currency: s.currency,
    }
}

pub(crate) async fn insert<C: ConnectionTrait>(
    db: &C,
    s: NewSupervisor,
) -> DomainResult<Supervisor> {
    let now = Utc::now();
    let model = supervisor::ActiveModel {
        name: Set(s.name),
        hourly_rate_milli: Set(milli(s.hourly_rate)?),
        currency: Set(normalize_currency(&s.currency)),
        created_at: Set(now),
        updated_at: Set(now),
        deleted_at: Set(None),
        ..Default::default()
    };
    let result = model.insert(db).await.map_err(db_err)?;
    Ok(entity_to_domain(result))
}

/// Live supervisor row on any connection.
pub(crate) async fn find_live<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> DomainResult<Option<supervisor::Model>> {
    supervisor::Entity::find_by_id(id)
        .filter(supervisor::Column::DeletedAt.is_null())
        .one(db)
        .await
        .map_err(db_err)
}

pub struct SeaOrmSupervisorRepository {
    db: DatabaseConnection,
}

impl SeaOrmSupervisorRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SupervisorRepository for SeaOrmSupervisorRepository {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Supervisor>> {
        Ok(find_live(&self.db, id).await?.map(entity_to_domain))
    }

    async fn find_all(&self) -> DomainResult<Vec<Supervisor>> {
        let models = supervisor::Entity::find()
            .filter(supervisor::Column::DeletedAt.is_null())
            .order_by_asc(supervisor::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(entity_to_domain).collect())
    }

    async fn save(&self, s: NewSupervisor) -> DomainResult<Supervisor> {
        let saved = insert(&self.db, s).await?;
        info!(supervisor_id = saved.id, name = %saved.name, "Supervisor saved");
        Ok(saved)
    }

    async fn update(&self, s: &Supervisor) -> DomainResult<()> {
        let Some(existing) = find_live(&self.db, s.id).await? else {
            return Err(DomainError::not_found("Supervisor", s.id));
        };

        let mut active: supervisor::ActiveModel = existing.into();
        active.name = Set(s.name.clone());
        active.hourly_rate_milli = Set(milli(s.hourly_rate)?);
        active.currency = Set(normalize_currency(&s.currency));
        active.updated_at = Set(Utc::now());
        active.update(&self.db).await.map_err(db_err)?;
        Ok(())
    }

    async fn soft_delete(&self, id: i32) -> DomainResult<()> {
        let Some(existing) = find_live(&self.db, id).await? else {
            return Err(DomainError::not_found("Supervisor", id));
        };

        let mut active: supervisor::ActiveModel = existing.into();
        active.deleted_at = Set(Some(Utc::now()));
        active.update(&self.db).await.map_err(db_err)?;
        info!(supervisor_id = id, "Supervisor soft-deleted");
        Ok(())
    }
}
