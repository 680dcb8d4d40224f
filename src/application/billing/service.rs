//! Invoice use cases
//!
//! Each call loads one lesson snapshot and one rate-table snapshot, then
//! hands both to the builder. Nothing here writes.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info};

use super::aggregator::{partition, GroupBy};
use super::builder::{InvoiceBuilder, StudentNames, SummaryView};
use super::currency::CurrencyConverter;
use super::scope::{Caller, RoleScopedQuery, SummaryFilters};
use crate::domain::{
    DomainError, DomainResult, Family, FamilyInvoice, LessonQuery, LessonRecord, LessonsSummary,
    RepositoryProvider, Supervisor, SupervisorInvoice, Teacher, TeacherInvoice,
};
use crate::shared::DateRange;

/// Parameters of a lesson summary request.
#[derive(Debug, Clone, Copy, Default)]
pub struct SummaryRequest {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub filters: SummaryFilters,
}

pub struct InvoiceService {
    repos: Arc<dyn RepositoryProvider>,
    converter: Arc<CurrencyConverter>,
}

impl InvoiceService {
    pub fn new(repos: Arc<dyn RepositoryProvider>, converter: Arc<CurrencyConverter>) -> Self {
        Self { repos, converter }
    }

    pub async fn family_invoice(
        &self,
        caller: &Caller,
        family_id: i32,
        period: DateRange,
    ) -> DomainResult<FamilyInvoice> {
        let family = self.family(family_id).await?;
        self.scope().authorize_family(caller, &family)?;

        let lessons = self
            .repos
            .lessons()
            .find(&LessonQuery::new(period).families(vec![family_id]))
            .await?;
        let names = self.student_names(&lessons).await?;
        let rates = self.converter.rates().await;

        let invoice = InvoiceBuilder::new(&rates).family_invoice(&family, &lessons, &names, period);
        record_generated("family");
        debug!(family_id, lessons = invoice.total_lessons, total = %invoice.total_amount, "family invoice built");
        Ok(invoice)
    }

    pub async fn teacher_invoice(
        &self,
        caller: &Caller,
        teacher_id: i32,
        period: DateRange,
    ) -> DomainResult<TeacherInvoice> {
        let teacher = self.teacher(teacher_id).await?;
        self.scope().authorize_teacher(caller, &teacher)?;

        let lessons = self
            .repos
            .lessons()
            .find(&LessonQuery::new(period).teachers(vec![teacher_id]))
            .await?;
        let names = self.student_names(&lessons).await?;
        let rates = self.converter.rates().await;

        let invoice = InvoiceBuilder::new(&rates).teacher_invoice(&teacher, &lessons, &names, period);
        record_generated("teacher");
        debug!(teacher_id, lessons = invoice.total_lessons, total = %invoice.total_earnings, "teacher invoice built");
        Ok(invoice)
    }

    pub async fn supervisor_invoice(
        &self,
        caller: &Caller,
        supervisor_id: i32,
        period: DateRange,
    ) -> DomainResult<SupervisorInvoice> {
        let supervisor = self.supervisor(supervisor_id).await?;
        self.scope().authorize_supervisor(caller, supervisor_id)?;

        let families: BTreeMap<i32, Family> = self
            .repos
            .families()
            .find_by_supervisor(supervisor_id)
            .await?
            .into_iter()
            .map(|f| (f.id, f))
            .collect();
        let teachers: BTreeMap<i32, Teacher> = self
            .repos
            .teachers()
            .find_by_supervisor(supervisor_id)
            .await?
            .into_iter()
            .map(|t| (t.id, t))
            .collect();

        let lessons = if families.is_empty() && teachers.is_empty() {
            Vec::new()
        } else {
            let query = LessonQuery::new(period)
                .families(families.keys().copied().collect())
                .teachers(teachers.keys().copied().collect())
                .match_any_owner();
            self.repos.lessons().find(&query).await?
        };
        let rates = self.converter.rates().await;

        let invoice = InvoiceBuilder::new(&rates).supervisor_invoice(
            &supervisor,
            &families,
            &teachers,
            &lessons,
            period,
        );
        record_generated("supervisor");
        debug!(supervisor_id, lessons = invoice.total_lessons, "supervisor invoice built");
        Ok(invoice)
    }

    /// One invoice per family with activity in `period`, ordered by family id.
    pub async fn all_family_invoices(
        &self,
        caller: &Caller,
        period: DateRange,
        supervisor_id: Option<i32>,
    ) -> DomainResult<Vec<FamilyInvoice>> {
        let supervisor_id = self.scope().listing_scope(caller, supervisor_id)?;
        let families = match supervisor_id {
            Some(id) => self.repos.families().find_by_supervisor(id).await?,
            None => self.repos.families().find_all().await?,
        };
        if families.is_empty() {
            return Ok(Vec::new());
        }

        let query = LessonQuery::new(period).families(families.iter().map(|f| f.id).collect());
        let lessons = self.repos.lessons().find(&query).await?;
        let names = self.student_names(&lessons).await?;
        let rates = self.converter.rates().await;
        let builder = InvoiceBuilder::new(&rates);

        let mut by_family = partition(lessons, GroupBy::Family);
        let invoices: Vec<FamilyInvoice> = families
            .iter()
            .filter_map(|family| {
                let lessons = by_family.remove(&family.id)?;
                Some(builder.family_invoice(family, &lessons, &names, period))
            })
            .collect();

        record_generated_n("family", invoices.len());
        info!(count = invoices.len(), supervisor_id = ?supervisor_id, "family invoices generated");
        Ok(invoices)
    }

    /// One invoice per teacher with activity in `period`, ordered by teacher id.
    pub async fn all_teacher_invoices(
        &self,
        caller: &Caller,
        period: DateRange,
        supervisor_id: Option<i32>,
    ) -> DomainResult<Vec<TeacherInvoice>> {
        let supervisor_id = self.scope().listing_scope(caller, supervisor_id)?;
        let teachers = match supervisor_id {
            Some(id) => self.repos.teachers().find_by_supervisor(id).await?,
            None => self.repos.teachers().find_all().await?,
        };
        if teachers.is_empty() {
            return Ok(Vec::new());
        }

        let query = LessonQuery::new(period).teachers(teachers.iter().map(|t| t.id).collect());
        let lessons = self.repos.lessons().find(&query).await?;
        let names = self.student_names(&lessons).await?;
        let rates = self.converter.rates().await;
        let builder = InvoiceBuilder::new(&rates);

        let mut by_teacher = partition(lessons, GroupBy::Teacher);
        let invoices: Vec<TeacherInvoice> = teachers
            .iter()
            .filter_map(|teacher| {
                let lessons = by_teacher.remove(&teacher.id)?;
                Some(builder.teacher_invoice(teacher, &lessons, &names, period))
            })
            .collect();

        record_generated_n("teacher", invoices.len());
        info!(count = invoices.len(), supervisor_id = ?supervisor_id, "teacher invoices generated");
        Ok(invoices)
    }

    /// Lessons visible to `caller`, with the role's summary block.
    pub async fn lessons_summary(
        &self,
        caller: &Caller,
        request: SummaryRequest,
    ) -> DomainResult<LessonsSummary> {
        let period = DateRange::resolve_now(request.from, request.to)?;
        let query = self
            .scope()
            .lesson_query(caller, period, request.filters)
            .await?;
        let lessons = self.repos.lessons().find(&query).await?;
        let names = self.student_names(&lessons).await?;
        let rates = self.converter.rates().await;
        let builder = InvoiceBuilder::new(&rates);

        let summary = match *caller {
            Caller::Teacher { teacher_id } => {
                let teacher = self.teacher(teacher_id).await?;
                builder.lessons_summary(period, caller.role(), &lessons, &names, SummaryView::Teacher(&teacher))
            }
            Caller::Family { family_id } => {
                let family = self.family(family_id).await?;
                builder.lessons_summary(period, caller.role(), &lessons, &names, SummaryView::Family(&family))
            }
            Caller::SuperAdmin | Caller::Admin { .. } => builder.lessons_summary(
                period,
                caller.role(),
                &lessons,
                &names,
                SummaryView::Organization,
            ),
        };
        record_generated("summary");
        Ok(summary)
    }

    fn scope(&self) -> RoleScopedQuery<'_> {
        RoleScopedQuery::new(self.repos.as_ref())
    }

    async fn student_names(&self, lessons: &[LessonRecord]) -> DomainResult<StudentNames> {
        let mut ids: Vec<i32> = lessons.iter().map(|l| l.student_id).collect();
        ids.sort_unstable();
        ids.dedup();
        if ids.is_empty() {
            return Ok(StudentNames::default());
        }
        let students = self.repos.students().find_by_ids(&ids).await?;
        Ok(StudentNames::new(
            students
                .into_iter()
                .map(|s| (s.id, s.name))
                .collect::<HashMap<_, _>>(),
        ))
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

    async fn supervisor(&self, id: i32) -> DomainResult<Supervisor> {
        self.repos
            .supervisors()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Supervisor", id))
    }
}

fn record_generated(kind: &'static str) {
    metrics::counter!("invoices_generated_total", "kind" => kind).increment(1);
}

fn record_generated_n(kind: &'static str, n: usize) {
    metrics::counter!("invoices_generated_total", "kind" => kind).increment(n as u64);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::billing::currency::tests::ScriptedProvider;
    use crate::application::billing::currency::ConverterSettings;
    use crate::domain::{
        NewFamily, NewLesson, NewStudent, NewSupervisor, NewTeacher, Student,
    };
    use crate::infrastructure::storage::memory::InMemoryRepositoryProvider;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    struct Fixture {
        repos: Arc<InMemoryRepositoryProvider>,
        service: InvoiceService,
        supervisor: Supervisor,
        teacher: Teacher,
        other_teacher: Teacher,
        family: Family,
        usd_family: Family,
        student: Student,
        usd_student: Student,
    }

    fn march() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
        )
        .unwrap()
    }

    async fn fixture() -> Fixture {
        let repos = Arc::new(InMemoryRepositoryProvider::new());
        let supervisor = repos
            .supervisors()
            .save(NewSupervisor {
                name: "Nour".into(),
                hourly_rate: Decimal::from(40),
                currency: "EGP".into(),
            })
            .await
            .unwrap();
        let teacher = repos
            .teachers()
            .save(NewTeacher {
                name: "Salma".into(),
                hourly_rate: Decimal::from(25),
                currency: "EGP".into(),
                supervisor_id: Some(supervisor.id),
            })
            .await
            .unwrap();
        let other_teacher = repos
            .teachers()
            .save(NewTeacher {
                name: "Omar".into(),
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
                hourly_rate: Decimal::from(50),
                currency: "EGP".into(),
                supervisor_id: Some(supervisor.id),
            })
            .await
            .unwrap();
        let usd_family = repos
            .families()
            .save(NewFamily {
                name: "Miller".into(),
                hourly_rate: Decimal::from(20),
                currency: "USD".into(),
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
        let usd_student = repos
            .students()
            .save(NewStudent {
                name: "Ben".into(),
                family_id: usd_family.id,
                teacher_id: other_teacher.id,
            })
            .await
            .unwrap();

        let provider = Arc::new(ScriptedProvider::failing());
        let converter = Arc::new(CurrencyConverter::new(provider, ConverterSettings::default()));
        let service = InvoiceService::new(repos.clone(), converter);

        Fixture {
            repos,
            service,
            supervisor,
            teacher,
            other_teacher,
            family,
            usd_family,
            student,
            usd_student,
        }
    }

    async fn lesson(
        fx: &Fixture,
        student: &Student,
        family: &Family,
        day: u32,
        minutes: i32,
        student_rate: i64,
        teacher_rate: i64,
    ) -> LessonRecord {
        fx.repos
            .lessons()
            .save(NewLesson {
                student_id: student.id,
                teacher_id: student.teacher_id,
                family_id: family.id,
                supervisor_id: family.supervisor_id,
                date: Utc.with_ymd_and_hms(2024, 3, day, 15, 0, 0).unwrap(),
                duration_minutes: minutes,
                student_hourly_rate: Decimal::from(student_rate),
                teacher_hourly_rate: Decimal::from(teacher_rate),
                currency: family.currency.clone(),
                evaluation: None,
                notes: None,
                is_absent: false,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn family_invoice_for_two_march_lessons() {
        let fx = fixture().await;
        lesson(&fx, &fx.student, &fx.family, 4, 60, 50, 25).await;
        lesson(&fx, &fx.student, &fx.family, 11, 90, 50, 25).await;

        let invoice = fx
            .service
            .family_invoice(&Caller::SuperAdmin, fx.family.id, march())
            .await
            .unwrap();
        assert_eq!(invoice.currency, "EGP");
        assert_eq!(invoice.students[0].total_hours, Decimal::new(25, 1));
        assert_eq!(invoice.students[0].total_amount, Decimal::from(125));
        assert_eq!(invoice.total_amount, Decimal::from(125));
    }

    #[tokio::test]
    async fn repeated_requests_are_identical() {
        let fx = fixture().await;
        lesson(&fx, &fx.student, &fx.family, 4, 45, 50, 25).await;
        lesson(&fx, &fx.student, &fx.family, 5, 30, 50, 25).await;

        let first = fx
            .service
            .family_invoice(&Caller::SuperAdmin, fx.family.id, march())
            .await
            .unwrap();
        let second = fx
            .service
            .family_invoice(&Caller::SuperAdmin, fx.family.id, march())
            .await
            .unwrap();
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[tokio::test]
    async fn quiet_period_is_not_an_error() {
        let fx = fixture().await;
        let invoice = fx
            .service
            .family_invoice(&Caller::SuperAdmin, fx.family.id, march())
            .await
            .unwrap();
        assert_eq!(invoice.total_lessons, 0);
        assert_eq!(invoice.total_amount, Decimal::ZERO);
        assert!(invoice.students.is_empty());
    }

    #[tokio::test]
    async fn missing_entities_are_not_found() {
        let fx = fixture().await;
        let err = fx
            .service
            .family_invoice(&Caller::SuperAdmin, 999, march())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity: "Family", .. }));

        let err = fx
            .service
            .supervisor_invoice(&Caller::SuperAdmin, 999, march())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity: "Supervisor", .. }));
    }

    #[tokio::test]
    async fn teacher_summary_excludes_other_teachers() {
        let fx = fixture().await;
        lesson(&fx, &fx.student, &fx.family, 4, 60, 50, 25).await;
        lesson(&fx, &fx.usd_student, &fx.usd_family, 4, 120, 20, 10).await;

        let caller = Caller::Teacher { teacher_id: fx.teacher.id };
        let summary = fx
            .service
            .lessons_summary(
                &caller,
                SummaryRequest {
                    from: Some(march().from),
                    to: Some(march().to),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(summary.total_lessons, 1);
        assert!(summary.lessons.iter().all(|l| l.teacher_id == fx.teacher.id));
        let block = summary.teacher_summary.unwrap();
        assert_eq!(block.total_hours, Decimal::ONE);
        assert_eq!(block.total_earnings, Decimal::from(25));
    }

    #[tokio::test]
    async fn super_admin_summary_reports_usd_and_egp() {
        let fx = fixture().await;
        // 1000 EGP and 10 USD
        lesson(&fx, &fx.student, &fx.family, 4, 60, 1000, 500).await;
        lesson(&fx, &fx.usd_student, &fx.usd_family, 5, 60, 10, 5).await;

        let summary = fx
            .service
            .lessons_summary(
                &Caller::SuperAdmin,
                SummaryRequest {
                    from: Some(march().from),
                    to: Some(march().to),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let totals = summary.organization_totals.unwrap();
        assert_eq!(totals.total_amount_usd, Decimal::new(305, 1));
        assert_eq!(totals.total_amount_egp, Decimal::new(1487805, 3));
    }

    #[tokio::test]
    async fn organization_usd_total_sums_rounded_lessons() {
        let fx = fixture().await;
        // 1 EGP each: 0.0205 USD rounds to 0.021 per lesson. Converting
        // the 3 EGP sum instead would give 0.062.
        for day in [4, 5, 6] {
            lesson(&fx, &fx.student, &fx.family, day, 60, 1, 1).await;
        }

        let summary = fx
            .service
            .lessons_summary(
                &Caller::SuperAdmin,
                SummaryRequest {
                    from: Some(march().from),
                    to: Some(march().to),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let totals = summary.organization_totals.unwrap();
        assert_eq!(totals.total_amount_usd, Decimal::new(63, 3));
        assert_eq!(totals.total_amount_egp, Decimal::from(3));
    }

    #[tokio::test]
    async fn inverted_range_is_rejected() {
        let fx = fixture().await;
        let err = fx
            .service
            .lessons_summary(
                &Caller::SuperAdmin,
                SummaryRequest {
                    from: Some(march().to),
                    to: Some(march().from),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn listings_skip_families_without_lessons() {
        let fx = fixture().await;
        lesson(&fx, &fx.usd_student, &fx.usd_family, 4, 60, 20, 10).await;

        let invoices = fx
            .service
            .all_family_invoices(&Caller::SuperAdmin, march(), None)
            .await
            .unwrap();
        assert_eq!(invoices.len(), 1);
        assert_eq!(invoices[0].family_id, fx.usd_family.id);

        let scoped = fx
            .service
            .all_teacher_invoices(&Caller::SuperAdmin, march(), Some(fx.supervisor.id))
            .await
            .unwrap();
        assert!(scoped.is_empty());

        let err = fx
            .service
            .all_teacher_invoices(&Caller::Teacher { teacher_id: fx.other_teacher.id }, march(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn supervisor_invoice_combines_both_ledgers() {
        let fx = fixture().await;
        lesson(&fx, &fx.student, &fx.family, 4, 60, 50, 25).await;
        lesson(&fx, &fx.usd_student, &fx.usd_family, 4, 60, 20, 10).await;

        let invoice = fx
            .service
            .supervisor_invoice(&Caller::Admin { supervisor_id: Some(fx.supervisor.id) }, fx.supervisor.id, march())
            .await
            .unwrap();
        assert_eq!(invoice.total_lessons, 1);
        assert_eq!(invoice.total_family_amount, Decimal::from(50));
        assert_eq!(invoice.total_teacher_earnings, Decimal::from(25));
        assert_eq!(invoice.student_count, 1);
    }

    #[tokio::test]
    async fn teacher_cannot_read_family_invoice() {
        let fx = fixture().await;
        let err = fx
            .service
            .family_invoice(&Caller::Teacher { teacher_id: fx.teacher.id }, fx.family.id, march())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }
}
