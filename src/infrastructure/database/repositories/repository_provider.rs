//! SeaORM implementation of RepositoryProvider

use sea_orm::DatabaseConnection;

use crate::domain::family::FamilyRepository;
use crate::domain::lesson::LessonRepository;
use crate::domain::repositories::RepositoryProvider;
use crate::domain::student::StudentRepository;
use crate::domain::supervisor::SupervisorRepository;
use crate::domain::teacher::TeacherRepository;
use crate::domain::user::UserRepository;

use super::family_repository::SeaOrmFamilyRepository;
use super::lesson_repository::SeaOrmLessonRepository;
use super::student_repository::SeaOrmStudentRepository;
use super::supervisor_repository::SeaOrmSupervisorRepository;
use super::teacher_repository::SeaOrmTeacherRepository;
use super::user_repository::SeaOrmUserRepository;

/// Unified repository provider backed by SeaORM.
///
/// Holds one connection pool and exposes per-aggregate repository accessors.
///
/// ```ignore
/// let repos = SeaOrmRepositoryProvider::new(db.clone());
/// let family = repos.families().find_by_id(7).await?;
/// let lessons = repos.lessons().find(&LessonQuery::new(range)).await?;
/// ```
pub struct SeaOrmRepositoryProvider {
    lessons: SeaOrmLessonRepository,
    students: SeaOrmStudentRepository,
    teachers: SeaOrmTeacherRepository,
    families: SeaOrmFamilyRepository,
    supervisors: SeaOrmSupervisorRepository,
    users: SeaOrmUserRepository,
}

impl SeaOrmRepositoryProvider {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            lessons: SeaOrmLessonRepository::new(db.clone()),
            students: SeaOrmStudentRepository::new(db.clone()),
            teachers: SeaOrmTeacherRepository::new(db.clone()),
            families: SeaOrmFamilyRepository::new(db.clone()),
            supervisors: SeaOrmSupervisorRepository::new(db.clone()),
            users: SeaOrmUserRepository::new(db),
        }
    }
}

impl RepositoryProvider for SeaOrmRepositoryProvider {
    fn lessons(&self) -> &dyn LessonRepository {
        &self.lessons
    }

    fn students(&self) -> &dyn StudentRepository {
        &self.students
    }

    fn teachers(&self) -> &dyn TeacherRepository {
        &self.teachers
    }

    fn families(&self) -> &dyn FamilyRepository {
        &self.families
    }

    fn supervisors(&self) -> &dyn SupervisorRepository {
        &self.supervisors
    }

    fn users(&self) -> &dyn UserRepository {
        &self.users
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        AccountProfile, DomainError, LessonQuery, NewAccount, NewFamily, NewLesson, NewStudent,
        NewTeacher, UserRole,
    };
    use crate::infrastructure::database::{init_database, run_migrations, DatabaseConfig};
    use crate::shared::DateRange;
    use chrono::{NaiveDate, TimeZone, Utc};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    async fn provider() -> SeaOrmRepositoryProvider {
        let db = init_database(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&db).await.unwrap();
        SeaOrmRepositoryProvider::new(db)
    }

    fn teacher_account(username: &str) -> NewAccount {
        NewAccount {
            username: username.into(),
            email: format!("{}@example.com", username),
            password_hash: "hash".into(),
            role: UserRole::Teacher,
            supervisor_id: None,
        }
    }

    fn teacher_profile() -> AccountProfile {
        AccountProfile::Teacher(NewTeacher {
            name: "Salma".into(),
            hourly_rate: Decimal::from(20),
            currency: "egp".into(),
            supervisor_id: None,
        })
    }

    #[tokio::test]
    async fn rates_survive_the_milli_unit_column() {
        let repos = provider().await;
        let teacher = repos
            .teachers()
            .save(NewTeacher {
                name: "Salma".into(),
                hourly_rate: Decimal::from_str("12.345").unwrap(),
                currency: "egp".into(),
                supervisor_id: None,
            })
            .await
            .unwrap();
        let stored = repos.teachers().find_by_id(teacher.id).await.unwrap().unwrap();
        assert_eq!(stored.hourly_rate, Decimal::from_str("12.345").unwrap());
        assert_eq!(stored.currency, "EGP");
    }

    #[tokio::test]
    async fn lesson_query_uses_inclusive_day_window() {
        let repos = provider().await;
        let teacher = repos
            .teachers()
            .save(NewTeacher {
                name: "Salma".into(),
                hourly_rate: Decimal::from(20),
                currency: "EGP".into(),
                supervisor_id: None,
            })
            .await
            .unwrap();
        let family = repos
            .families()
            .save(NewFamily {
                name: "Haddad".into(),
                hourly_rate: Decimal::from(50),
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

        for (day, hour) in [(31, 23), (1, 0)] {
            let month = if day == 31 { 3 } else { 4 };
            repos
                .lessons()
                .save(NewLesson {
                    student_id: student.id,
                    teacher_id: teacher.id,
                    family_id: family.id,
                    supervisor_id: None,
                    date: Utc.with_ymd_and_hms(2024, month, day, hour, 30, 0).unwrap(),
                    duration_minutes: 60,
                    student_hourly_rate: Decimal::from(50),
                    teacher_hourly_rate: Decimal::from(20),
                    currency: "EGP".into(),
                    evaluation: None,
                    notes: None,
                    is_absent: false,
                })
                .await
                .unwrap();
        }

        let march = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
        )
        .unwrap();
        let found = repos
            .lessons()
            .find(&LessonQuery::new(march).families(vec![family.id]))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].date.date_naive(), NaiveDate::from_ymd_opt(2024, 3, 31).unwrap());
    }

    #[tokio::test]
    async fn duplicate_account_rolls_back_profile() {
        let repos = provider().await;
        repos
            .users()
            .create_account(teacher_account("salma"), teacher_profile())
            .await
            .unwrap();

        let err = repos
            .users()
            .create_account(teacher_account("salma"), teacher_profile())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(repos.teachers().find_all().await.unwrap().len(), 1);
    }
}
