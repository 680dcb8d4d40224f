//! Directory maintenance: students, current rates, soft deletes
//!
//! Rate changes only affect lessons recorded afterwards; existing lessons
//! keep the rates they were recorded with.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::info;

use crate::application::billing::{Caller, RoleScopedQuery};
use crate::domain::money::{normalize_currency, round_money};
use crate::domain::{
    DomainError, DomainResult, Family, NewStudent, RepositoryProvider, Student, Supervisor, Teacher,
};

/// New current rate for a teacher, family or supervisor.
#[derive(Debug, Clone)]
pub struct RateChange {
    pub hourly_rate: Decimal,
    pub currency: String,
}

impl RateChange {
    fn normalized(self) -> DomainResult<(Decimal, String)> {
        if self.hourly_rate.is_sign_negative() {
            return Err(DomainError::Validation("Hourly rate must not be negative".into()));
        }
        let currency = normalize_currency(&self.currency);
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(DomainError::Validation(format!(
                "Invalid currency code: {}",
                self.currency
            )));
        }
        Ok((round_money(self.hourly_rate), currency))
    }
}

pub struct DirectoryService {
    repos: Arc<dyn RepositoryProvider>,
}

impl DirectoryService {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    // ── Students ────────────────────────────────────────────────

    pub async fn create_student(&self, caller: &Caller, student: NewStudent) -> DomainResult<Student> {
        require_admin(caller)?;
        if student.name.trim().is_empty() {
            return Err(DomainError::Validation("Student name is required".into()));
        }
        let family = self.family(student.family_id).await?;
        let teacher = self.teacher(student.teacher_id).await?;

        let scope = RoleScopedQuery::new(self.repos.as_ref());
        scope
            .authorize_family(caller, &family)
            .or_else(|_| scope.authorize_teacher(caller, &teacher))?;

        let saved = self.repos.students().save(student).await?;
        info!(
            student_id = saved.id,
            family_id = saved.family_id,
            teacher_id = saved.teacher_id,
            "Student created"
        );
        Ok(saved)
    }

    pub async fn delete_student(&self, caller: &Caller, id: i32) -> DomainResult<()> {
        require_admin(caller)?;
        let student = self
            .repos
            .students()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Student", id))?;
        let family = self.family(student.family_id).await?;
        RoleScopedQuery::new(self.repos.as_ref()).authorize_family(caller, &family)?;
        self.repos.students().soft_delete(id).await
    }

    // ── Rates ───────────────────────────────────────────────────

    pub async fn set_teacher_rate(
        &self,
        caller: &Caller,
        id: i32,
        change: RateChange,
    ) -> DomainResult<Teacher> {
        require_admin(caller)?;
        let mut teacher = self.teacher(id).await?;
        RoleScopedQuery::new(self.repos.as_ref()).authorize_teacher(caller, &teacher)?;

        (teacher.hourly_rate, teacher.currency) = change.normalized()?;
        self.repos.teachers().update(&teacher).await?;
        info!(teacher_id = id, rate = %teacher.hourly_rate, currency = %teacher.currency, "Teacher rate changed");
        Ok(teacher)
    }

    pub async fn set_family_rate(
        &self,
        caller: &Caller,
        id: i32,
        change: RateChange,
    ) -> DomainResult<Family> {
        require_admin(caller)?;
        let mut family = self.family(id).await?;
        RoleScopedQuery::new(self.repos.as_ref()).authorize_family(caller, &family)?;

        (family.hourly_rate, family.currency) = change.normalized()?;
        self.repos.families().update(&family).await?;
        info!(family_id = id, rate = %family.hourly_rate, currency = %family.currency, "Family rate changed");
        Ok(family)
    }

    pub async fn set_supervisor_rate(
        &self,
        caller: &Caller,
        id: i32,
        change: RateChange,
    ) -> DomainResult<Supervisor> {
        require_unscoped_admin(caller)?;
        let mut supervisor = self
            .repos
            .supervisors()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Supervisor", id))?;

        (supervisor.hourly_rate, supervisor.currency) = change.normalized()?;
        self.repos.supervisors().update(&supervisor).await?;
        info!(supervisor_id = id, "Supervisor rate changed");
        Ok(supervisor)
    }

    // ── Soft deletes ────────────────────────────────────────────

    pub async fn delete_teacher(&self, caller: &Caller, id: i32) -> DomainResult<()> {
        require_admin(caller)?;
        let teacher = self.teacher(id).await?;
        RoleScopedQuery::new(self.repos.as_ref()).authorize_teacher(caller, &teacher)?;
        self.repos.teachers().soft_delete(id).await
    }

    pub async fn delete_family(&self, caller: &Caller, id: i32) -> DomainResult<()> {
        require_admin(caller)?;
        let family = self.family(id).await?;
        RoleScopedQuery::new(self.repos.as_ref()).authorize_family(caller, &family)?;
        self.repos.families().soft_delete(id).await
    }

    pub async fn delete_supervisor(&self, caller: &Caller, id: i32) -> DomainResult<()> {
        require_unscoped_admin(caller)?;
        self.repos.supervisors().soft_delete(id).await
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

fn require_admin(caller: &Caller) -> DomainResult<()> {
    if caller.role().is_administrative() {
        Ok(())
    } else {
        Err(DomainError::Forbidden(format!(
            "{} callers cannot maintain the directory",
            caller.role()
        )))
    }
}

fn require_unscoped_admin(caller: &Caller) -> DomainResult<()> {
    match caller {
        Caller::SuperAdmin | Caller::Admin { supervisor_id: None } => Ok(()),
        _ => Err(DomainError::Forbidden("Supervisors are managed organization-wide".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewFamily, NewSupervisor, NewTeacher};
    use crate::infrastructure::storage::InMemoryRepositoryProvider;

    async fn seeded() -> (Arc<InMemoryRepositoryProvider>, DirectoryService, Supervisor, Teacher, Family) {
        let repos = Arc::new(InMemoryRepositoryProvider::new());
        let supervisor = repos
            .supervisors()
            .save(NewSupervisor {
                name: "Mona".into(),
                hourly_rate: Decimal::from(5),
                currency: "USD".into(),
            })
            .await
            .unwrap();
        let teacher = repos
            .teachers()
            .save(NewTeacher {
                name: "Omar".into(),
                hourly_rate: Decimal::from(200),
                currency: "EGP".into(),
                supervisor_id: Some(supervisor.id),
            })
            .await
            .unwrap();
        let family = repos
            .families()
            .save(NewFamily {
                name: "Nasser".into(),
                hourly_rate: Decimal::from(20),
                currency: "usd".into(),
                supervisor_id: None,
            })
            .await
            .unwrap();
        let service = DirectoryService::new(repos.clone());
        (repos, service, supervisor, teacher, family)
    }

    fn rate(amount: i64, currency: &str) -> RateChange {
        RateChange {
            hourly_rate: Decimal::from(amount),
            currency: currency.into(),
        }
    }

    #[tokio::test]
    async fn student_needs_existing_family_and_teacher() {
        let (_, service, _, teacher, family) = seeded().await;
        let err = service
            .create_student(
                &Caller::SuperAdmin,
                NewStudent { name: "Yara".into(), family_id: 999, teacher_id: teacher.id },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity: "Family", .. }));

        let student = service
            .create_student(
                &Caller::SuperAdmin,
                NewStudent { name: "Yara".into(), family_id: family.id, teacher_id: teacher.id },
            )
            .await
            .unwrap();
        assert_eq!(student.family_id, family.id);
    }

    #[tokio::test]
    async fn rate_change_normalizes_currency() {
        let (repos, service, _, _, family) = seeded().await;
        let updated = service
            .set_family_rate(&Caller::SuperAdmin, family.id, rate(25, " eur "))
            .await
            .unwrap();
        assert_eq!(updated.currency, "EUR");

        let stored = repos.families().find_by_id(family.id).await.unwrap().unwrap();
        assert_eq!(stored.hourly_rate, Decimal::from(25));

        let err = service
            .set_family_rate(&Caller::SuperAdmin, family.id, rate(25, "EURO"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn scoped_admin_stays_inside_its_supervisor() {
        let (_, service, supervisor, teacher, family) = seeded().await;
        let scoped = Caller::Admin { supervisor_id: Some(supervisor.id) };

        assert!(service.set_teacher_rate(&scoped, teacher.id, rate(250, "EGP")).await.is_ok());

        let err = service
            .set_family_rate(&scoped, family.id, rate(30, "USD"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));

        let err = service
            .set_supervisor_rate(&scoped, supervisor.id, rate(6, "USD"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn teachers_cannot_change_their_own_rate() {
        let (_, service, _, teacher, _) = seeded().await;
        let err = service
            .set_teacher_rate(&Caller::Teacher { teacher_id: teacher.id }, teacher.id, rate(900, "EGP"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn soft_deleted_teacher_disappears() {
        let (repos, service, _, teacher, _) = seeded().await;
        service.delete_teacher(&Caller::SuperAdmin, teacher.id).await.unwrap();
        assert!(repos.teachers().find_by_id(teacher.id).await.unwrap().is_none());

        let err = service.delete_teacher(&Caller::SuperAdmin, teacher.id).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }
}
