//! Assembles aggregated lesson groups into invoice shapes

use std::collections::{BTreeMap, BTreeSet, HashMap};

use rust_decimal::Decimal;

use super::aggregator::{GroupBy, GroupTotals, LessonAggregator};
use super::currency::RateTable;
use crate::domain::money::{hours_from_minutes, round_money};
use crate::domain::{
    CurrencyTotals, Family, FamilyBreakdown, FamilyInvoice, FamilySummary, LessonRecord,
    LessonSummaryEntry, LessonsSummary, RateSide, StudentInvoiceDetail, Supervisor,
    SupervisorInvoice, Teacher, TeacherBreakdown, TeacherInvoice, TeacherSummary, UserRole,
};
use crate::shared::DateRange;

/// Student display names keyed by id.
#[derive(Debug, Clone, Default)]
pub struct StudentNames(HashMap<i32, String>);

impl StudentNames {
    pub fn new(names: HashMap<i32, String>) -> Self {
        Self(names)
    }

    /// Name of a student, or a placeholder when the row is gone.
    pub fn get(&self, id: i32) -> String {
        self.0
            .get(&id)
            .cloned()
            .unwrap_or_else(|| format!("Student #{}", id))
    }
}

/// Role-specific block attached to a lesson summary.
pub enum SummaryView<'a> {
    Teacher(&'a Teacher),
    Family(&'a Family),
    Organization,
}

pub struct InvoiceBuilder<'a> {
    aggregator: LessonAggregator<'a>,
}

impl<'a> InvoiceBuilder<'a> {
    pub fn new(rates: &'a RateTable) -> Self {
        Self {
            aggregator: LessonAggregator::new(rates),
        }
    }

    pub fn family_invoice(
        &self,
        family: &Family,
        lessons: &[LessonRecord],
        names: &StudentNames,
        period: DateRange,
    ) -> FamilyInvoice {
        let students = self.student_details(lessons, RateSide::Student, &family.currency, names);
        let (total_lessons, total_minutes, total_amount) = sum_details(&students);
        FamilyInvoice {
            family_id: family.id,
            family_name: family.name.clone(),
            currency: family.currency.clone(),
            period,
            total_lessons,
            total_hours: hours_from_minutes(total_minutes),
            total_amount,
            students,
        }
    }

    pub fn teacher_invoice(
        &self,
        teacher: &Teacher,
        lessons: &[LessonRecord],
        names: &StudentNames,
        period: DateRange,
    ) -> TeacherInvoice {
        let students = self.student_details(lessons, RateSide::Teacher, &teacher.currency, names);
        let (total_lessons, total_minutes, total_earnings) = sum_details(&students);
        TeacherInvoice {
            teacher_id: teacher.id,
            teacher_name: teacher.name.clone(),
            currency: teacher.currency.clone(),
            period,
            total_lessons,
            total_hours: hours_from_minutes(total_minutes),
            total_earnings,
            students,
        }
    }

    /// Family ledger over lessons of the supervisor's families, teacher
    /// ledger over lessons of the supervisor's teachers. A lesson whose
    /// family and teacher both belong to the supervisor lands in both
    /// ledgers, once each.
    pub fn supervisor_invoice(
        &self,
        supervisor: &Supervisor,
        families: &BTreeMap<i32, Family>,
        teachers: &BTreeMap<i32, Teacher>,
        lessons: &[LessonRecord],
        period: DateRange,
    ) -> SupervisorInvoice {
        let currency = supervisor.currency.as_str();

        let family_side: Vec<LessonRecord> = lessons
            .iter()
            .filter(|l| families.contains_key(&l.family_id))
            .cloned()
            .collect();
        let teacher_side: Vec<LessonRecord> = lessons
            .iter()
            .filter(|l| teachers.contains_key(&l.teacher_id))
            .cloned()
            .collect();

        let family_breakdown: Vec<FamilyBreakdown> = self
            .aggregator
            .aggregate(&family_side, GroupBy::Family, RateSide::Student, currency)
            .into_iter()
            .map(|(family_id, totals)| FamilyBreakdown {
                family_id,
                family_name: families
                    .get(&family_id)
                    .map(|f| f.name.clone())
                    .unwrap_or_default(),
                student_count: totals.student_ids.len() as u32,
                total_lessons: totals.lesson_count,
                total_hours: totals.total_hours(),
                total_amount: totals.total_amount,
            })
            .collect();

        let teacher_breakdown: Vec<TeacherBreakdown> = self
            .aggregator
            .aggregate(&teacher_side, GroupBy::Teacher, RateSide::Teacher, currency)
            .into_iter()
            .map(|(teacher_id, totals)| TeacherBreakdown {
                teacher_id,
                teacher_name: teachers
                    .get(&teacher_id)
                    .map(|t| t.name.clone())
                    .unwrap_or_default(),
                student_count: totals.student_ids.len() as u32,
                total_lessons: totals.lesson_count,
                total_hours: totals.total_hours(),
                total_earnings: totals.total_amount,
            })
            .collect();

        let lesson_ids: BTreeSet<i32> = family_side
            .iter()
            .chain(teacher_side.iter())
            .map(|l| l.id)
            .collect();
        let student_ids: BTreeSet<i32> = family_side
            .iter()
            .chain(teacher_side.iter())
            .map(|l| l.student_id)
            .collect();

        SupervisorInvoice {
            supervisor_id: supervisor.id,
            supervisor_name: supervisor.name.clone(),
            currency: supervisor.currency.clone(),
            period,
            family_count: family_breakdown.len() as u32,
            teacher_count: teacher_breakdown.len() as u32,
            student_count: student_ids.len() as u32,
            total_lessons: lesson_ids.len() as u32,
            total_family_amount: family_breakdown.iter().map(|f| f.total_amount).sum(),
            total_teacher_earnings: teacher_breakdown.iter().map(|t| t.total_earnings).sum(),
            families: family_breakdown,
            teachers: teacher_breakdown,
        }
    }

    pub fn lessons_summary(
        &self,
        period: DateRange,
        role: UserRole,
        lessons: &[LessonRecord],
        names: &StudentNames,
        view: SummaryView<'_>,
    ) -> LessonsSummary {
        let mut entries: Vec<LessonSummaryEntry> = lessons
            .iter()
            .map(|lesson| LessonSummaryEntry {
                lesson_id: lesson.id,
                date: lesson.date,
                student_id: lesson.student_id,
                student_name: names.get(lesson.student_id),
                teacher_id: lesson.teacher_id,
                family_id: lesson.family_id,
                duration_minutes: lesson.duration_minutes,
                hours: lesson.hours(),
                evaluation: lesson.evaluation,
                notes: lesson.notes.clone(),
                is_absent: lesson.is_absent,
            })
            .collect();
        entries.sort_by(|a, b| a.date.cmp(&b.date).then(a.lesson_id.cmp(&b.lesson_id)));

        let total_minutes: i64 = lessons.iter().map(|l| i64::from(l.duration_minutes)).sum();
        let total_hours = hours_from_minutes(total_minutes);

        let mut summary = LessonsSummary {
            period,
            role,
            total_lessons: lessons.len() as u32,
            total_hours,
            lessons: entries,
            teacher_summary: None,
            family_summary: None,
            organization_totals: None,
        };

        match view {
            SummaryView::Teacher(teacher) => {
                summary.teacher_summary = Some(TeacherSummary {
                    teacher_id: teacher.id,
                    teacher_name: teacher.name.clone(),
                    hourly_rate: teacher.hourly_rate,
                    currency: teacher.currency.clone(),
                    total_hours,
                    total_earnings: round_money(teacher.hourly_rate * total_hours),
                });
            }
            SummaryView::Family(family) => {
                summary.family_summary = Some(FamilySummary {
                    family_id: family.id,
                    family_name: family.name.clone(),
                    currency: family.currency.clone(),
                    total_hours,
                    total_cost: self.aggregator.total_in(lessons, RateSide::Student, &family.currency),
                });
            }
            SummaryView::Organization => {
                summary.organization_totals = Some(CurrencyTotals {
                    total_amount_usd: self.aggregator.total_in(lessons, RateSide::Student, "USD"),
                    total_amount_egp: self.aggregator.total_in(lessons, RateSide::Student, "EGP"),
                });
            }
        }
        summary
    }

    fn student_details(
        &self,
        lessons: &[LessonRecord],
        side: RateSide,
        currency: &str,
        names: &StudentNames,
    ) -> Vec<StudentInvoiceDetail> {
        self.aggregator
            .aggregate(lessons, GroupBy::Student, side, currency)
            .into_iter()
            .map(|(student_id, totals)| student_detail(student_id, totals, names))
            .collect()
    }
}

fn student_detail(student_id: i32, totals: GroupTotals, names: &StudentNames) -> StudentInvoiceDetail {
    StudentInvoiceDetail {
        student_id,
        student_name: names.get(student_id),
        total_lessons: totals.lesson_count,
        total_hours: totals.total_hours(),
        total_amount: totals.total_amount,
        lessons: totals.lines,
    }
}

/// (lessons, minutes, amount) over the per-student blocks.
fn sum_details(students: &[StudentInvoiceDetail]) -> (u32, i64, Decimal) {
    students.iter().fold((0, 0, Decimal::ZERO), |(n, m, a), s| {
        let minutes: i64 = s.lessons.iter().map(|l| i64::from(l.duration_minutes)).sum();
        (n + s.total_lessons, m + minutes, a + s.total_amount)
    })
}
