//! SeaORM implementation of StudentRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::info;

use super::db_err;
use crate::domain::{DomainError, DomainResult, NewStudent, Student, StudentRepository};
use crate::infrastructure::database::entities::student;

fn entity_to_domain(s: student::Model) -> Student {
    Student {
        id: s.id,
        name: s.name,
        family_id: s.family_id,
        teacher_id: s.teacher_id,
    }
}

pub struct SeaOrmStudentRepository {
    db: DatabaseConnection,
}

impl SeaOrmStudentRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn live(&self, id: i32) -> DomainResult<Option<student::Model>> {
        student::Entity::find_by_id(id)
            .filter(student::Column::DeletedAt.is_null())
            .one(&self.db)
            .await
            .map_err(db_err)
    }

    async fn find_where(&self, column: student::Column, value: i32) -> DomainResult<Vec<Student>> {
        let models = student::Entity::find()
            .filter(column.eq(value))
            .filter(student::Column::DeletedAt.is_null())
            .order_by_asc(student::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(entity_to_domain).collect())
    }
}

#[async_trait]
impl StudentRepository for SeaOrmStudentRepository {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Student>> {
        Ok(self.live(id).await?.map(entity_to_domain))
    }

    async fn find_by_ids(&self, ids: &[i32]) -> DomainResult<Vec<Student>> {
        let models = student::Entity::find()
            .filter(student::Column::Id.is_in(ids.to_vec()))
            .filter(student::Column::DeletedAt.is_null())
            .order_by_asc(student::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(entity_to_domain).collect())
    }

    async fn find_by_family(&self, family_id: i32) -> DomainResult<Vec<Student>> {
        self.find_where(student::Column::FamilyId, family_id).await
    }

    async fn find_by_teacher(&self, teacher_id: i32) -> DomainResult<Vec<Student>> {
        self.find_where(student::Column::TeacherId, teacher_id).await
    }

    async fn save(&self, s: NewStudent) -> DomainResult<Student> {
        let now = Utc::now();
        let model = student::ActiveModel {
            name: Set(s.name),
            family_id: Set(s.family_id),
            teacher_id: Set(s.teacher_id),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
            ..Default::default()
        };
        let result = model.insert(&self.db).await.map_err(db_err)?;
        info!(student_id = result.id, family_id = result.family_id, "Student saved");
        Ok(entity_to_domain(result))
    }

    async fn update(&self, s: &Student) -> DomainResult<()> {
        let Some(existing) = self.live(s.id).await? else {
            return Err(DomainError::not_found("Student", s.id));
        };

        let mut active: student::ActiveModel = existing.into();
        active.name = Set(s.name.clone());
        active.family_id = Set(s.family_id);
        active.teacher_id = Set(s.teacher_id);
        active.updated_at = Set(Utc::now());
        active.update(&self.db).await.map_err(db_err)?;
        Ok(())
    }

    async fn soft_delete(&self, id: i32) -> DomainResult<()> {
        let Some(existing) = self.live(id).await? else {
            return Err(DomainError::not_found("Student", id));
        };

        let mut active: student::ActiveModel = existing.into();
        active.deleted_at = Set(Some(Utc::now()));
        active.update(&self.db).await.map_err(db_err)?;
        Ok(())
    }
}
