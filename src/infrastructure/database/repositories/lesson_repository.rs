//! SeaORM implementation of LessonRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use tracing::info;

use super::{db_err, milli};
use crate::domain::money::{from_milli, normalize_currency};
use crate::domain::{
    DomainError, DomainResult, Evaluation, LessonQuery, LessonRecord, LessonRepository, NewLesson,
    OwnerMatch,
};
use crate::infrastructure::database::entities::lesson;

// ── Conversion helpers ──────────────────────────────────────────

fn evaluation_to_domain(e: lesson::Evaluation) -> Evaluation {
    match e {
        lesson::Evaluation::Acceptable => Evaluation::Acceptable,
        lesson::Evaluation::Good => Evaluation::Good,
        lesson::Evaluation::VeryGood => Evaluation::VeryGood,
        lesson::Evaluation::Excellent => Evaluation::Excellent,
    }
}

fn evaluation_to_entity(e: Evaluation) -> lesson::Evaluation {
    match e {
        Evaluation::Acceptable => lesson::Evaluation::Acceptable,
        Evaluation::Good => lesson::Evaluation::Good,
        Evaluation::VeryGood => lesson::Evaluation::VeryGood,
        Evaluation::Excellent => lesson::Evaluation::Excellent,
    }
}

fn entity_to_domain(m: lesson::Model) -> LessonRecord {
    LessonRecord {
        id: m.id,
        student_id: m.student_id,
        teacher_id: m.teacher_id,
        family_id: m.family_id,
        supervisor_id: m.supervisor_id,
        date: m.date,
        duration_minutes: m.duration_minutes,
        student_hourly_rate: from_milli(m.student_rate_milli),
        teacher_hourly_rate: from_milli(m.teacher_rate_milli),
        currency: m.currency,
        evaluation: m.evaluation.map(evaluation_to_domain),
        notes: m.notes,
        is_absent: m.is_absent,
        created_at: m.created_at,
        updated_at: m.updated_at,
    }
}

/// Translate a [`LessonQuery`] into a WHERE clause. The date window is
/// half-open on the UTC day after `to`.
fn condition_for(query: &LessonQuery) -> Condition {
    let mut cond = Condition::all()
        .add(lesson::Column::DeletedAt.is_null())
        .add(lesson::Column::Date.gte(query.range.start_utc()))
        .add(lesson::Column::Date.lt(query.range.end_exclusive_utc()));

    if let Some(ids) = &query.student_ids {
        cond = cond.add(lesson::Column::StudentId.is_in(ids.clone()));
    }

    let teacher = query
        .teacher_ids
        .as_ref()
        .map(|ids| lesson::Column::TeacherId.is_in(ids.clone()));
    let family = query
        .family_ids
        .as_ref()
        .map(|ids| lesson::Column::FamilyId.is_in(ids.clone()));

    match query.owner_match {
        OwnerMatch::All => cond.add_option(teacher).add_option(family),
        OwnerMatch::Any if teacher.is_some() || family.is_some() => {
            cond.add(Condition::any().add_option(teacher).add_option(family))
        }
        OwnerMatch::Any => cond,
    }
}

// ── SeaOrmLessonRepository ──────────────────────────────────────

pub struct SeaOrmLessonRepository {
    db: DatabaseConnection,
}

impl SeaOrmLessonRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn live(&self, id: i32) -> DomainResult<Option<lesson::Model>> {
        lesson::Entity::find_by_id(id)
            .filter(lesson::Column::DeletedAt.is_null())
            .one(&self.db)
            .await
            .map_err(db_err)
    }
}

#[async_trait]
impl LessonRepository for SeaOrmLessonRepository {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<LessonRecord>> {
        Ok(self.live(id).await?.map(entity_to_domain))
    }

    async fn find(&self, query: &LessonQuery) -> DomainResult<Vec<LessonRecord>> {
        let models = lesson::Entity::find()
            .filter(condition_for(query))
            .order_by_asc(lesson::Column::Date)
            .order_by_asc(lesson::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(entity_to_domain).collect())
    }

    async fn save(&self, l: NewLesson) -> DomainResult<LessonRecord> {
        l.validate()?;
        let now = Utc::now();
        let model = lesson::ActiveModel {
            student_id: Set(l.student_id),
            teacher_id: Set(l.teacher_id),
            family_id: Set(l.family_id),
            supervisor_id: Set(l.supervisor_id),
            date: Set(l.date),
            duration_minutes: Set(l.duration_minutes),
            student_rate_milli: Set(milli(l.student_hourly_rate)?),
            teacher_rate_milli: Set(milli(l.teacher_hourly_rate)?),
            currency: Set(normalize_currency(&l.currency)),
            evaluation: Set(l.evaluation.map(evaluation_to_entity)),
            notes: Set(l.notes),
            is_absent: Set(l.is_absent),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
            ..Default::default()
        };
        let result = model.insert(&self.db).await.map_err(db_err)?;
        info!(
            lesson_id = result.id,
            student_id = result.student_id,
            minutes = result.duration_minutes,
            "Lesson recorded"
        );
        Ok(entity_to_domain(result))
    }

    async fn update(&self, l: &LessonRecord) -> DomainResult<()> {
        let Some(existing) = self.live(l.id).await? else {
            return Err(DomainError::not_found("Lesson", l.id));
        };

        let mut active: lesson::ActiveModel = existing.into();
        active.date = Set(l.date);
        active.duration_minutes = Set(l.duration_minutes);
        active.notes = Set(l.notes.clone());
        active.evaluation = Set(l.evaluation.map(evaluation_to_entity));
        active.updated_at = Set(l.updated_at);
        active.update(&self.db).await.map_err(db_err)?;
        Ok(())
    }

    async fn soft_delete(&self, id: i32) -> DomainResult<()> {
        let Some(existing) = self.live(id).await? else {
            return Err(DomainError::not_found("Lesson", id));
        };

        let mut active: lesson::ActiveModel = existing.into();
        active.deleted_at = Set(Some(Utc::now()));
        active.update(&self.db).await.map_err(db_err)?;
        info!(lesson_id = id, "Lesson soft-deleted");
        Ok(())
    }
}
