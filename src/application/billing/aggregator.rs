//! Grouping and summing of lesson records

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;

use super::currency::RateTable;
use crate::domain::money::hours_from_minutes;
use crate::domain::{InvoiceLine, LessonRecord, RateSide};

/// Owner id a lesson is grouped under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    Student,
    Teacher,
    Family,
}

impl GroupBy {
    pub fn key(&self, lesson: &LessonRecord) -> i32 {
        match self {
            Self::Student => lesson.student_id,
            Self::Teacher => lesson.teacher_id,
            Self::Family => lesson.family_id,
        }
    }
}

/// Totals for one group, with its lines in date order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GroupTotals {
    pub lesson_count: u32,
    pub total_minutes: i64,
    /// Sum of the line amounts, already in the target currency.
    pub total_amount: Decimal,
    pub student_ids: BTreeSet<i32>,
    pub lines: Vec<InvoiceLine>,
}

impl GroupTotals {
    /// `sum(minutes) / 60`, exact.
    pub fn total_hours(&self) -> Decimal {
        hours_from_minutes(self.total_minutes)
    }

    fn push(&mut self, lesson: &LessonRecord, line: InvoiceLine) {
        self.lesson_count += 1;
        self.total_minutes += i64::from(lesson.duration_minutes);
        self.total_amount += line.amount;
        self.student_ids.insert(lesson.student_id);
        self.lines.push(line);
    }
}

/// Sums lessons per group against one rate-table snapshot.
pub struct LessonAggregator<'a> {
    rates: &'a RateTable,
}

impl<'a> LessonAggregator<'a> {
    pub fn new(rates: &'a RateTable) -> Self {
        Self { rates }
    }

    /// Invoice line for `lesson`, priced from the rate stored on the lesson
    /// and converted into `currency`.
    pub fn line(&self, lesson: &LessonRecord, side: RateSide, currency: &str) -> InvoiceLine {
        InvoiceLine {
            lesson_id: lesson.id,
            date: lesson.date,
            duration_minutes: lesson.duration_minutes,
            hours: lesson.hours(),
            hourly_rate: lesson.rate(side),
            lesson_currency: lesson.currency.clone(),
            amount: self
                .rates
                .convert(lesson.amount(side), &lesson.currency, currency),
            notes: lesson.notes.clone(),
            evaluation: lesson.evaluation,
            is_absent: lesson.is_absent,
        }
    }

    /// Group `lessons` by `group_by`. Only groups with at least one lesson
    /// appear; keys iterate in ascending order.
    pub fn aggregate(
        &self,
        lessons: &[LessonRecord],
        group_by: GroupBy,
        side: RateSide,
        currency: &str,
    ) -> BTreeMap<i32, GroupTotals> {
        let mut groups: BTreeMap<i32, GroupTotals> = BTreeMap::new();
        for lesson in lessons {
            let line = self.line(lesson, side, currency);
            groups.entry(group_by.key(lesson)).or_default().push(lesson, line);
        }
        for totals in groups.values_mut() {
            totals
                .lines
                .sort_by(|a, b| a.date.cmp(&b.date).then(a.lesson_id.cmp(&b.lesson_id)));
        }
        groups
    }

    /// Sum of every lesson's amount, each converted into `currency` on its
    /// own before adding.
    pub fn total_in(&self, lessons: &[LessonRecord], side: RateSide, currency: &str) -> Decimal {
        lessons
            .iter()
            .map(|lesson| self.rates.convert(lesson.amount(side), &lesson.currency, currency))
            .sum()
    }
}

/// Split lessons by owner without pricing them.
pub fn partition(lessons: Vec<LessonRecord>, group_by: GroupBy) -> BTreeMap<i32, Vec<LessonRecord>> {
    let mut out: BTreeMap<i32, Vec<LessonRecord>> = BTreeMap::new();
    for lesson in lessons {
        out.entry(group_by.key(&lesson)).or_default().push(lesson);
    }
    out
}
