//! SeaORM implementation of TeacherRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use tracing::info;

use super::{db_err, milli};
use crate::domain::money::{from_milli, normalize_currency};
use crate::domain::{DomainError, DomainResult, NewTeacher, Teacher, TeacherRepository};
use crate::infrastructure::database::entities::teacher;

pub(crate) fn entity_to_domain(t: teacher::Model) -> Teacher {
    Teacher {
        id: t.id,
        name: t.name,
        hourly_rate: from_milli(t.hourly_rate_milli),
        currency: t.currency,
        supervisor_id: t.supervisor_id,
    }
}

/// Insert on any connection, so account creation can reuse it inside a
/// transaction.
pub(crate) async fn insert<C: ConnectionTrait>(db: &C, t: NewTeacher) -> DomainResult<Teacher> {
    let now = Utc::now();
    let model = teacher::ActiveModel {
        name: Set(t.name),
        hourly_rate_milli: Set(milli(t.hourly_rate)?),
        currency: Set(normalize_currency(&t.currency)),
        supervisor_id: Set(t.supervisor_id),
        created_at: Set(now),
        updated_at: Set(now),
        deleted_at: Set(None),
        ..Default::default()
    };
    let result = model.insert(db).await.map_err(db_err)?;
    Ok(entity_to_domain(result))
}

pub struct SeaOrmTeacherRepository {
    db: DatabaseConnection,
}

impl SeaOrmTeacherRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn live(&self, id: i32) -> DomainResult<Option<teacher::Model>> {
        teacher::Entity::find_by_id(id)
            .filter(teacher::Column::DeletedAt.is_null())
            .one(&self.db)
            .await
            .map_err(db_err)
    }
}

#[async_trait]
impl TeacherRepository for SeaOrmTeacherRepository {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Teacher>> {
        Ok(self.live(id).await?.map(entity_to_domain))
    }

    async fn find_by_ids(&self, ids: &[i32]) -> DomainResult<Vec<Teacher>> {
        let models = teacher::Entity::find()
            .filter(teacher::Column::Id.is_in(ids.to_vec()))
            .filter(teacher::Column::DeletedAt.is_null())
            .order_by_asc(teacher::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(entity_to_domain).collect())
    }

    async fn find_all(&self) -> DomainResult<Vec<Teacher>> {
        let models = teacher::Entity::find()
            .filter(teacher::Column::DeletedAt.is_null())
            .order_by_asc(teacher::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(entity_to_domain).collect())
    }

    async fn find_by_supervisor(&self, supervisor_id: i32) -> DomainResult<Vec<Teacher>> {
        let models = teacher::Entity::find()
            .filter(teacher::Column::SupervisorId.eq(supervisor_id))
            .filter(teacher::Column::DeletedAt.is_null())
            .order_by_asc(teacher::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(entity_to_domain).collect())
    }

    async fn save(&self, t: NewTeacher) -> DomainResult<Teacher> {
        let saved = insert(&self.db, t).await?;
        info!(teacher_id = saved.id, name = %saved.name, "Teacher saved");
        Ok(saved)
    }

    async fn update(&self, t: &Teacher) -> DomainResult<()> {
        let Some(existing) = self.live(t.id).await? else {
            return Err(DomainError::not_found("Teacher", t.id));
        };

        let mut active: teacher::ActiveModel = existing.into();
        active.name = Set(t.name.clone());
        active.hourly_rate_milli = Set(milli(t.hourly_rate)?);
        active.currency = Set(normalize_currency(&t.currency));
        active.supervisor_id = Set(t.supervisor_id);
        active.updated_at = Set(Utc::now());
        active.update(&self.db).await.map_err(db_err)?;
        Ok(())
    }

    async fn soft_delete(&self, id: i32) -> DomainResult<()> {
        let Some(existing) = self.live(id).await? else {
            return Err(DomainError::not_found("Teacher", id));
        };

        let mut active: teacher::ActiveModel = existing.into();
        active.deleted_at = Set(Some(Utc::now()));
        active.update(&self.db).await.map_err(db_err)?;
        info!(teacher_id = id, "Teacher soft-deleted");
        Ok(())
    }
}
