//! Lesson recording with rate snapshots

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::application::billing::{Caller, CurrencyConverter, LessonOwners, RoleScopedQuery};
use crate::domain::{
    DomainError, DomainResult, Evaluation, Family, LessonPatch, LessonRecord, NewLesson,
    RepositoryProvider, Teacher,
};

/// Input for recording a session
#[derive(Debug, Clone)]
pub struct RecordLesson {
    pub student_id: i32,
    pub date: DateTime<Utc>,
    pub duration_minutes: i32,
    pub notes: Option<String>,
    pub evaluation: Option<Evaluation>,
    pub is_absent: bool,
}

pub struct LessonService {
    repos: Arc<dyn RepositoryProvider>,
    converter: Arc<CurrencyConverter>,
}

impl LessonService {
    pub fn new(repos: Arc<dyn RepositoryProvider>, converter: Arc<CurrencyConverter>) -> Self {
        Self { repos, converter }
    }

    /// Record a lesson for `student_id`. The family's current rate and the
    /// teacher's current rate (converted into the family currency) are
    /// copied onto the lesson and never change afterwards.
    pub async fn record_lesson(&self, caller: &Caller, input: RecordLesson) -> DomainResult<LessonRecord> {
        let student = self
            .repos
            .students()
            .find_by_id(input.student_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Student", input.student_id))?;
        let family = self.family(student.family_id).await?;
        let teacher = self.teacher(student.teacher_id).await?;

        RoleScopedQuery::new(self.repos.as_ref())
            .authorize_lesson_write(caller, &owners(&teacher, &family))?;

        let rates = self.converter.rates().await;
        let teacher_rate = rates.convert(teacher.hourly_rate, &teacher.currency, &family.currency);

        let lesson = NewLesson {
            student_id: student.id,
            teacher_id: teacher.id,
            family_id: family.id,
            supervisor_id: family.supervisor_id.or(teacher.supervisor_id),
            date: input.date,
            duration_minutes: input.duration_minutes,
            student_hourly_rate: family.hourly_rate,
            teacher_hourly_rate: teacher_rate,
            currency: family.currency.clone(),
            evaluation: input.evaluation,
            notes: input.notes,
            is_absent: input.is_absent,
        };
        lesson.validate()?;

        let saved = self.repos.lessons().save(lesson).await?;
        info!(
            lesson_id = saved.id,
            student_id = saved.student_id,
            teacher_id = saved.teacher_id,
            minutes = saved.duration_minutes,
            absent = saved.is_absent,
            "Lesson created"
        );
        Ok(saved)
    }

    /// Change date, duration, notes or evaluation. Rates stay as recorded.
    pub async fn update_lesson(
        &self,
        caller: &Caller,
        id: i32,
        patch: LessonPatch,
    ) -> DomainResult<LessonRecord> {
        if patch.is_empty() {
            return Err(DomainError::Validation("Nothing to update".into()));
        }
        let mut lesson = self.lesson(id).await?;
        self.authorize(caller, &lesson).await?;

        patch.apply(&mut lesson)?;
        self.repos.lessons().update(&lesson).await?;
        info!(lesson_id = id, "Lesson updated");
        Ok(lesson)
    }

    pub async fn delete_lesson(&self, caller: &Caller, id: i32) -> DomainResult<()> {
        let lesson = self.lesson(id).await?;
        self.authorize(caller, &lesson).await?;
        self.repos.lessons().soft_delete(id).await
    }

    async fn authorize(&self, caller: &Caller, lesson: &LessonRecord) -> DomainResult<()> {
        // Owners may have been soft-deleted since; fall back to the
        // supervisor captured on the lesson.
        let teacher = self.repos.teachers().find_by_id(lesson.teacher_id).await?;
        let family = self.repos.families().find_by_id(lesson.family_id).await?;
        let owners = LessonOwners {
            teacher_id: lesson.teacher_id,
            teacher_supervisor: teacher
                .and_then(|t| t.supervisor_id)
                .or(lesson.supervisor_id),
            family_supervisor: family
                .and_then(|f| f.supervisor_id)
                .or(lesson.supervisor_id),
        };
        RoleScopedQuery::new(self.repos.as_ref()).authorize_lesson_write(caller, &owners)
    }

    async fn lesson(&self, id: i32) -> DomainResult<LessonRecord> {
        self.repos
            .lessons()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Lesson", id))
    }

    async fn family(&self, id: i32) -> DomainResult<Family> {
        self.repos
            .families()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Family", id))
    }

    async fn teacher(&self, id: i32) -> DomainResult<Teacher> {
        self.repos
            .teachers()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Teacher", id))
    }
}

fn owners(teacher: &Teacher, family: &Family) -> LessonOwners {
    LessonOwners {
        teacher_id: teacher.id,
        teacher_supervisor: teacher.supervisor_id,
        family_supervisor: family.supervisor_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::billing::currency::tests::ScriptedProvider;
    use crate::application::billing::ConverterSettings;
    use crate::domain::{NewFamily, NewStudent, NewTeacher, Student};
    use crate::infrastructure::storage::InMemoryRepositoryProvider;
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    struct Fixture {
        repos: Arc<InMemoryRepositoryProvider>,
        service: LessonService,
        teacher: Teacher,
        family: Family,
        student: Student,
    }

    async fn fixture() -> Fixture {
        let repos = Arc::new(InMemoryRepositoryProvider::new());
        let teacher = repos
            .teachers()
            .save(NewTeacher {
                name: "Salma".into(),
                hourly_rate: Decimal::from(10),
                currency: "USD".into(),
                supervisor_id: None,
            })
            .await
            .unwrap();
        let family = repos
            .families()
            .save(NewFamily {
                name: "Haddad".into(),
                hourly_rate: Decimal::from(800),
                currency: "EGP".into(),
                supervisor_id: None,
            })
            .await
            .unwrap();
        let student = repos
            .students()
            .save(NewStudent {
                name: "Layla".into(),
                family_id: family.id,
                teacher_id: teacher.id,
            })
            .await
            .unwrap();
        // provider offline: fallback table, EGP = 0.0205 USD
        let converter = Arc::new(CurrencyConverter::new(
            Arc::new(ScriptedProvider::failing()),
            ConverterSettings::default(),
        ));
        let service = LessonService::new(repos.clone(), converter);
        Fixture {
            repos,
            service,
            teacher,
            family,
            student,
        }
    }

    fn input(student_id: i32, minutes: i32) -> RecordLesson {
        RecordLesson {
            student_id,
            date: Utc.with_ymd_and_hms(2024, 3, 5, 16, 0, 0).unwrap(),
            duration_minutes: minutes,
            notes: None,
            evaluation: Some(Evaluation::Good),
            is_absent: false,
        }
    }

    #[tokio::test]
    async fn recording_snapshots_rates_in_family_currency() {
        let fx = fixture().await;
        let lesson = fx
            .service
            .record_lesson(&Caller::Teacher { teacher_id: fx.teacher.id }, input(fx.student.id, 60))
            .await
            .unwrap();

        assert_eq!(lesson.currency, "EGP");
        assert_eq!(lesson.student_hourly_rate, Decimal::from(800));
        // 10 USD / 0.0205 = 487.805 EGP
        assert_eq!(lesson.teacher_hourly_rate, Decimal::new(487805, 3));
    }

    #[tokio::test]
    async fn later_rate_changes_do_not_touch_recorded_lessons() {
        let fx = fixture().await;
        let lesson = fx
            .service
            .record_lesson(&Caller::SuperAdmin, input(fx.student.id, 60))
            .await
            .unwrap();

        let mut family = fx.family.clone();
        family.hourly_rate = Decimal::from(1200);
        fx.repos.families().update(&family).await.unwrap();

        let stored = fx.repos.lessons().find_by_id(lesson.id).await.unwrap().unwrap();
        assert_eq!(stored.student_hourly_rate, Decimal::from(800));
    }

    #[tokio::test]
    async fn zero_minutes_requires_absence() {
        let fx = fixture().await;
        let err = fx
            .service
            .record_lesson(&Caller::SuperAdmin, input(fx.student.id, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let mut absent = input(fx.student.id, 0);
        absent.is_absent = true;
        assert!(fx.service.record_lesson(&Caller::SuperAdmin, absent).await.is_ok());
    }

    #[tokio::test]
    async fn other_teachers_cannot_touch_the_lesson() {
        let fx = fixture().await;
        let lesson = fx
            .service
            .record_lesson(&Caller::SuperAdmin, input(fx.student.id, 60))
            .await
            .unwrap();

        let stranger = Caller::Teacher { teacher_id: fx.teacher.id + 100 };
        let err = fx.service.delete_lesson(&stranger, lesson.id).await.unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));

        let err = fx
            .service
            .record_lesson(&Caller::Family { family_id: fx.family.id }, input(fx.student.id, 60))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn family_supervisor_admin_may_record() {
        let fx = fixture().await;
        let mut family = fx.family.clone();
        family.supervisor_id = Some(7);
        fx.repos.families().update(&family).await.unwrap();

        let lesson = fx
            .service
            .record_lesson(&Caller::Admin { supervisor_id: Some(7) }, input(fx.student.id, 45))
            .await
            .unwrap();
        assert_eq!(lesson.supervisor_id, Some(7));

        let err = fx
            .service
            .record_lesson(&Caller::Admin { supervisor_id: Some(8) }, input(fx.student.id, 45))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn update_then_delete() {
        let fx = fixture().await;
        let caller = Caller::Teacher { teacher_id: fx.teacher.id };
        let lesson = fx
            .service
            .record_lesson(&caller, input(fx.student.id, 60))
            .await
            .unwrap();

        let updated = fx
            .service
            .update_lesson(
                &caller,
                lesson.id,
                LessonPatch {
                    duration_minutes: Some(75),
                    notes: Some("fractions".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.duration_minutes, 75);
        assert_eq!(updated.student_hourly_rate, lesson.student_hourly_rate);

        fx.service.delete_lesson(&caller, lesson.id).await.unwrap();
        let err = fx.service.delete_lesson(&caller, lesson.id).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity: "Lesson", .. }));
    }

    #[tokio::test]
    async fn unknown_student_is_not_found() {
        let fx = fixture().await;
        let err = fx
            .service
            .record_lesson(&Caller::SuperAdmin, input(404, 60))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity: "Student", .. }));
    }
}
