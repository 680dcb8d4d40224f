//! In-memory repositories for development and testing

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::{
    AccountProfile, CreatedAccount, DomainError, DomainResult, Family, FamilyRepository,
    LessonQuery, LessonRecord, LessonRepository, NewAccount, NewFamily, NewLesson, NewStudent,
    NewSupervisor, NewTeacher, Profile, RepositoryProvider, Student, StudentRepository,
    Supervisor, SupervisorRepository, Teacher, TeacherRepository, User, UserRepository, UserRole,
};

struct Row<T> {
    value: T,
    deleted: bool,
}

/// Id-keyed rows with soft delete and a monotonically increasing id.
struct Table<T> {
    rows: DashMap<i32, Row<T>>,
    next_id: AtomicI32,
}

impl<T: Clone> Table<T> {
    fn new() -> Self {
        Self {
            rows: DashMap::new(),
            next_id: AtomicI32::new(1),
        }
    }

    fn allocate(&self) -> i32 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    fn insert(&self, id: i32, value: T) {
        self.rows.insert(id, Row { value, deleted: false });
    }

    fn get(&self, id: i32) -> Option<T> {
        self.rows
            .get(&id)
            .filter(|row| !row.deleted)
            .map(|row| row.value.clone())
    }

    /// Live rows matching `keep`, ordered by id.
    fn select(&self, keep: impl Fn(&T) -> bool) -> Vec<(i32, T)> {
        let mut out: Vec<(i32, T)> = self
            .rows
            .iter()
            .filter(|entry| !entry.deleted && keep(&entry.value))
            .map(|entry| (*entry.key(), entry.value.clone()))
            .collect();
        out.sort_by_key(|(id, _)| *id);
        out
    }

    fn replace(&self, id: i32, value: T) -> bool {
        match self.rows.get_mut(&id) {
            Some(mut row) if !row.deleted => {
                row.value = value;
                true
            }
            _ => false,
        }
    }

    fn soft_delete(&self, id: i32) -> bool {
        match self.rows.get_mut(&id) {
            Some(mut row) if !row.deleted => {
                row.deleted = true;
                true
            }
            _ => false,
        }
    }

    fn live_count(&self) -> usize {
        self.rows.iter().filter(|row| !row.deleted).count()
    }
}

fn values<T>(rows: Vec<(i32, T)>) -> Vec<T> {
    rows.into_iter().map(|(_, v)| v).collect()
}

fn missing(entity: &'static str, id: i32) -> DomainError {
    DomainError::not_found(entity, id)
}

// ── Lessons ─────────────────────────────────────────────────────

pub struct MemoryLessonRepository {
    table: Table<LessonRecord>,
}

#[async_trait]
impl LessonRepository for MemoryLessonRepository {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<LessonRecord>> {
        Ok(self.table.get(id))
    }

    async fn find(&self, query: &LessonQuery) -> DomainResult<Vec<LessonRecord>> {
        let mut lessons = values(self.table.select(|l| query.matches(l)));
        lessons.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
        Ok(lessons)
    }

    async fn save(&self, lesson: NewLesson) -> DomainResult<LessonRecord> {
        lesson.validate()?;
        let id = self.table.allocate();
        let now = Utc::now();
        let record = LessonRecord {
            id,
            student_id: lesson.student_id,
            teacher_id: lesson.teacher_id,
            family_id: lesson.family_id,
            supervisor_id: lesson.supervisor_id,
            date: lesson.date,
            duration_minutes: lesson.duration_minutes,
            student_hourly_rate: lesson.student_hourly_rate,
            teacher_hourly_rate: lesson.teacher_hourly_rate,
            currency: lesson.currency,
            evaluation: lesson.evaluation,
            notes: lesson.notes,
            is_absent: lesson.is_absent,
            created_at: now,
            updated_at: now,
        };
        self.table.insert(id, record.clone());
        Ok(record)
    }

    async fn update(&self, lesson: &LessonRecord) -> DomainResult<()> {
        let mut stored = self.table.get(lesson.id).ok_or_else(|| missing("Lesson", lesson.id))?;
        stored.date = lesson.date;
        stored.duration_minutes = lesson.duration_minutes;
        stored.notes = lesson.notes.clone();
        stored.evaluation = lesson.evaluation;
        stored.updated_at = lesson.updated_at;
        self.table.replace(lesson.id, stored);
        Ok(())
    }

    async fn soft_delete(&self, id: i32) -> DomainResult<()> {
        self.table
            .soft_delete(id)
            .then_some(())
            .ok_or_else(|| missing("Lesson", id))
    }
}

// ── Students ────────────────────────────────────────────────────

pub struct MemoryStudentRepository {
    table: Table<Student>,
}

#[async_trait]
impl StudentRepository for MemoryStudentRepository {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Student>> {
        Ok(self.table.get(id))
    }

    async fn find_by_ids(&self, ids: &[i32]) -> DomainResult<Vec<Student>> {
        Ok(values(self.table.select(|s| ids.contains(&s.id))))
    }

    async fn find_by_family(&self, family_id: i32) -> DomainResult<Vec<Student>> {
        Ok(values(self.table.select(|s| s.family_id == family_id)))
    }

    async fn find_by_teacher(&self, teacher_id: i32) -> DomainResult<Vec<Student>> {
        Ok(values(self.table.select(|s| s.teacher_id == teacher_id)))
    }

    async fn save(&self, student: NewStudent) -> DomainResult<Student> {
        let id = self.table.allocate();
        let student = Student {
            id,
            name: student.name,
            family_id: student.family_id,
            teacher_id: student.teacher_id,
        };
        self.table.insert(id, student.clone());
        Ok(student)
    }

    async fn update(&self, student: &Student) -> DomainResult<()> {
        self.table
            .replace(student.id, student.clone())
            .then_some(())
            .ok_or_else(|| missing("Student", student.id))
    }

    async fn soft_delete(&self, id: i32) -> DomainResult<()> {
        self.table
            .soft_delete(id)
            .then_some(())
            .ok_or_else(|| missing("Student", id))
    }
}

// ── Teachers / families / supervisors ───────────────────────────

pub struct MemoryTeacherRepository {
    table: Arc<Table<Teacher>>,
}

fn new_teacher(id: i32, teacher: NewTeacher) -> Teacher {
    Teacher {
        id,
        name: teacher.name,
        hourly_rate: teacher.hourly_rate,
        currency: teacher.currency,
        supervisor_id: teacher.supervisor_id,
    }
}

#[async_trait]
impl TeacherRepository for MemoryTeacherRepository {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Teacher>> {
        Ok(self.table.get(id))
    }

    async fn find_by_ids(&self, ids: &[i32]) -> DomainResult<Vec<Teacher>> {
        Ok(values(self.table.select(|t| ids.contains(&t.id))))
    }

    async fn find_all(&self) -> DomainResult<Vec<Teacher>> {
        Ok(values(self.table.select(|_| true)))
    }

    async fn find_by_supervisor(&self, supervisor_id: i32) -> DomainResult<Vec<Teacher>> {
        Ok(values(self.table.select(|t| t.supervisor_id == Some(supervisor_id))))
    }

    async fn save(&self, teacher: NewTeacher) -> DomainResult<Teacher> {
        let id = self.table.allocate();
        let teacher = new_teacher(id, teacher);
        self.table.insert(id, teacher.clone());
        Ok(teacher)
    }

    async fn update(&self, teacher: &Teacher) -> DomainResult<()> {
        self.table
            .replace(teacher.id, teacher.clone())
            .then_some(())
            .ok_or_else(|| missing("Teacher", teacher.id))
    }

    async fn soft_delete(&self, id: i32) -> DomainResult<()> {
        self.table
            .soft_delete(id)
            .then_some(())
            .ok_or_else(|| missing("Teacher", id))
    }
}

pub struct MemoryFamilyRepository {
    table: Arc<Table<Family>>,
}

fn new_family(id: i32, family: NewFamily) -> Family {
    Family {
        id,
        name: family.name,
        hourly_rate: family.hourly_rate,
        currency: family.currency,
        supervisor_id: family.supervisor_id,
    }
}

#[async_trait]
impl FamilyRepository for MemoryFamilyRepository {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Family>> {
        Ok(self.table.get(id))
    }

    async fn find_by_ids(&self, ids: &[i32]) -> DomainResult<Vec<Family>> {
        Ok(values(self.table.select(|f| ids.contains(&f.id))))
    }

    async fn find_all(&self) -> DomainResult<Vec<Family>> {
        Ok(values(self.table.select(|_| true)))
    }

    async fn find_by_supervisor(&self, supervisor_id: i32) -> DomainResult<Vec<Family>> {
        Ok(values(self.table.select(|f| f.supervisor_id == Some(supervisor_id))))
    }

    async fn save(&self, family: NewFamily) -> DomainResult<Family> {
        let id = self.table.allocate();
        let family = new_family(id, family);
        self.table.insert(id, family.clone());
        Ok(family)
    }

    async fn update(&self, family: &Family) -> DomainResult<()> {
        self.table
            .replace(family.id, family.clone())
            .then_some(())
            .ok_or_else(|| missing("Family", family.id))
    }

    async fn soft_delete(&self, id: i32) -> DomainResult<()> {
        self.table
            .soft_delete(id)
            .then_some(())
            .ok_or_else(|| missing("Family", id))
    }
}

pub struct MemorySupervisorRepository {
    table: Arc<Table<Supervisor>>,
}

fn new_supervisor(id: i32, supervisor: NewSupervisor) -> Supervisor {
    Supervisor {
        id,
        name: supervisor.name,
        hourly_rate: supervisor.hourly_rate,
        currency: supervisor.currency,
    }
}

#[async_trait]
impl SupervisorRepository for MemorySupervisorRepository {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Supervisor>> {
        Ok(self.table.get(id))
    }

    async fn find_all(&self) -> DomainResult<Vec<Supervisor>> {
        Ok(values(self.table.select(|_| true)))
    }

    async fn save(&self, supervisor: NewSupervisor) -> DomainResult<Supervisor> {
        let id = self.table.allocate();
        let supervisor = new_supervisor(id, supervisor);
        self.table.insert(id, supervisor.clone());
        Ok(supervisor)
    }

    async fn update(&self, supervisor: &Supervisor) -> DomainResult<()> {
        self.table
            .replace(supervisor.id, supervisor.clone())
            .then_some(())
            .ok_or_else(|| missing("Supervisor", supervisor.id))
    }

    async fn soft_delete(&self, id: i32) -> DomainResult<()> {
        self.table
            .soft_delete(id)
            .then_some(())
            .ok_or_else(|| missing("Supervisor", id))
    }
}

// ── Users ───────────────────────────────────────────────────────

pub struct MemoryUserRepository {
    users: DashMap<String, User>,
    teachers: Arc<Table<Teacher>>,
    families: Arc<Table<Family>>,
    supervisors: Arc<Table<Supervisor>>,
    /// Serializes account creation so the uniqueness check and both
    /// inserts happen as one step.
    create_lock: Mutex<()>,
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<User>> {
        Ok(self.users.get(id).map(|u| u.value().clone()))
    }

    async fn find_by_username(&self, username: &str) -> DomainResult<Option<User>> {
        Ok(self
            .users
            .iter()
            .find(|u| u.username == username || u.email == username)
            .map(|u| u.value().clone()))
    }

    async fn count(&self) -> DomainResult<u64> {
        Ok(self.users.len() as u64)
    }

    async fn create_account(
        &self,
        account: NewAccount,
        profile: AccountProfile,
    ) -> DomainResult<CreatedAccount> {
        let _guard = self.create_lock.lock().await;

        let taken = self
            .users
            .iter()
            .any(|u| u.username == account.username || u.email == account.email);
        if taken {
            return Err(DomainError::Conflict(format!(
                "Username or email already in use: {}",
                account.username
            )));
        }
        if let Some(id) = account.supervisor_id {
            if self.supervisors.get(id).is_none() {
                return Err(missing("Supervisor", id));
            }
        }

        let now = Utc::now();
        let mut user = User {
            id: Uuid::new_v4().to_string(),
            username: account.username,
            email: account.email,
            password_hash: account.password_hash,
            role: account.role,
            supervisor_id: account.supervisor_id,
            teacher_id: None,
            family_id: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let profile = match profile {
            AccountProfile::None => None,
            AccountProfile::Teacher(t) => {
                let teacher = new_teacher(self.teachers.allocate(), t);
                user.teacher_id = Some(teacher.id);
                Some(Profile::Teacher(teacher))
            }
            AccountProfile::Family(f) => {
                let family = new_family(self.families.allocate(), f);
                user.family_id = Some(family.id);
                Some(Profile::Family(family))
            }
            AccountProfile::Supervisor(s) => {
                let supervisor = new_supervisor(self.supervisors.allocate(), s);
                if user.role == UserRole::Admin {
                    user.supervisor_id = Some(supervisor.id);
                }
                Some(Profile::Supervisor(supervisor))
            }
        };

        // Every check has passed; publish profile and user together.
        match &profile {
            Some(Profile::Teacher(t)) => self.teachers.insert(t.id, t.clone()),
            Some(Profile::Family(f)) => self.families.insert(f.id, f.clone()),
            Some(Profile::Supervisor(s)) => self.supervisors.insert(s.id, s.clone()),
            None => {}
        }
        self.users.insert(user.id.clone(), user.clone());

        Ok(CreatedAccount { user, profile })
    }
}

// ── Provider ────────────────────────────────────────────────────

/// All repositories backed by process memory.
pub struct InMemoryRepositoryProvider {
    lessons: MemoryLessonRepository,
    students: MemoryStudentRepository,
    teachers: MemoryTeacherRepository,
    families: MemoryFamilyRepository,
    supervisors: MemorySupervisorRepository,
    users: MemoryUserRepository,
}

impl InMemoryRepositoryProvider {
    pub fn new() -> Self {
        let teachers = Arc::new(Table::new());
        let families = Arc::new(Table::new());
        let supervisors = Arc::new(Table::new());
        Self {
            lessons: MemoryLessonRepository { table: Table::new() },
            students: MemoryStudentRepository { table: Table::new() },
            teachers: MemoryTeacherRepository { table: teachers.clone() },
            families: MemoryFamilyRepository { table: families.clone() },
            supervisors: MemorySupervisorRepository { table: supervisors.clone() },
            users: MemoryUserRepository {
                users: DashMap::new(),
                teachers,
                families,
                supervisors,
                create_lock: Mutex::new(()),
            },
        }
    }

    /// Live lesson rows, for diagnostics.
    pub fn lesson_count(&self) -> usize {
        self.lessons.table.live_count()
    }

    pub fn teacher_count(&self) -> usize {
        self.teachers.table.live_count()
    }
}

impl Default for InMemoryRepositoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl RepositoryProvider for InMemoryRepositoryProvider {
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
    use crate::domain::lesson::model::tests::sample_lesson;
    use crate::shared::DateRange;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn new_lesson(from: &LessonRecord) -> NewLesson {
        NewLesson {
            student_id: from.student_id,
            teacher_id: from.teacher_id,
            family_id: from.family_id,
            supervisor_id: from.supervisor_id,
            date: from.date,
            duration_minutes: from.duration_minutes,
            student_hourly_rate: from.student_hourly_rate,
            teacher_hourly_rate: from.teacher_hourly_rate,
            currency: from.currency.clone(),
            evaluation: from.evaluation,
            notes: from.notes.clone(),
            is_absent: from.is_absent,
        }
    }

    fn march() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn soft_deleted_lessons_disappear_from_queries() {
        let repos = InMemoryRepositoryProvider::new();
        let kept = repos.lessons().save(new_lesson(&sample_lesson(0, 60, 50))).await.unwrap();
        let gone = repos.lessons().save(new_lesson(&sample_lesson(0, 30, 50))).await.unwrap();

        repos.lessons().soft_delete(gone.id).await.unwrap();

        let found = repos.lessons().find(&LessonQuery::new(march())).await.unwrap();
        assert_eq!(found.iter().map(|l| l.id).collect::<Vec<_>>(), vec![kept.id]);
        assert!(repos.lessons().find_by_id(gone.id).await.unwrap().is_none());
        assert!(repos.lessons().soft_delete(gone.id).await.is_err());
    }

    #[tokio::test]
    async fn lesson_update_never_touches_rates() {
        let repos = InMemoryRepositoryProvider::new();
        let saved = repos.lessons().save(new_lesson(&sample_lesson(0, 60, 50))).await.unwrap();

        let mut edited = saved.clone();
        edited.duration_minutes = 90;
        edited.student_hourly_rate = Decimal::from(999);
        repos.lessons().update(&edited).await.unwrap();

        let stored = repos.lessons().find_by_id(saved.id).await.unwrap().unwrap();
        assert_eq!(stored.duration_minutes, 90);
        assert_eq!(stored.student_hourly_rate, Decimal::from(50));
    }

    #[tokio::test]
    async fn account_with_profile_links_both_rows() {
        let repos = InMemoryRepositoryProvider::new();
        let created = repos
            .users()
            .create_account(
                NewAccount {
                    username: "salma".into(),
                    email: "salma@example.com".into(),
                    password_hash: "x".into(),
                    role: UserRole::Teacher,
                    supervisor_id: None,
                },
                AccountProfile::Teacher(NewTeacher {
                    name: "Salma".into(),
                    hourly_rate: Decimal::from(20),
                    currency: "EGP".into(),
                    supervisor_id: None,
                }),
            )
            .await
            .unwrap();

        let teacher_id = created.user.teacher_id.unwrap();
        assert!(repos.teachers().find_by_id(teacher_id).await.unwrap().is_some());
        assert_eq!(repos.users().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn failed_account_leaves_no_profile_behind() {
        let repos = InMemoryRepositoryProvider::new();
        let account = || NewAccount {
            username: "salma".into(),
            email: "salma@example.com".into(),
            password_hash: "x".into(),
            role: UserRole::Teacher,
            supervisor_id: None,
        };
        let profile = || {
            AccountProfile::Teacher(NewTeacher {
                name: "Salma".into(),
                hourly_rate: Decimal::from(20),
                currency: "EGP".into(),
                supervisor_id: None,
            })
        };

        repos.users().create_account(account(), profile()).await.unwrap();
        let err = repos.users().create_account(account(), profile()).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(repos.teacher_count(), 1);
        assert_eq!(repos.users().count().await.unwrap(), 1);
    }
}
