//! Lesson domain entity

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::money::{amount_for_minutes, hours_from_minutes};
use crate::shared::{DateRange, DomainError};

/// Teacher's assessment of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Evaluation {
    Acceptable,
    Good,
    VeryGood,
    Excellent,
}

impl std::fmt::Display for Evaluation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Acceptable => write!(f, "Acceptable"),
            Self::Good => write!(f, "Good"),
            Self::VeryGood => write!(f, "VeryGood"),
            Self::Excellent => write!(f, "Excellent"),
        }
    }
}

impl std::str::FromStr for Evaluation {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Acceptable" => Ok(Self::Acceptable),
            "Good" => Ok(Self::Good),
            "VeryGood" => Ok(Self::VeryGood),
            "Excellent" => Ok(Self::Excellent),
            other => Err(DomainError::Validation(format!("Unknown evaluation: {}", other))),
        }
    }
}

/// Which snapshot rate an invoice reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateSide {
    /// What the family is billed.
    Student,
    /// What the teacher earns.
    Teacher,
}

/// A recorded session with the rates captured at creation time.
#[derive(Debug, Clone, PartialEq)]
pub struct LessonRecord {
    pub id: i32,
    pub student_id: i32,
    pub teacher_id: i32,
    pub family_id: i32,
    pub supervisor_id: Option<i32>,
    pub date: DateTime<Utc>,
    pub duration_minutes: i32,
    pub student_hourly_rate: Decimal,
    pub teacher_hourly_rate: Decimal,
    /// Currency both snapshot rates are expressed in.
    pub currency: String,
    pub evaluation: Option<Evaluation>,
    pub notes: Option<String>,
    pub is_absent: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LessonRecord {
    pub fn hours(&self) -> Decimal {
        hours_from_minutes(self.duration_minutes as i64)
    }

    pub fn rate(&self, side: RateSide) -> Decimal {
        match side {
            RateSide::Student => self.student_hourly_rate,
            RateSide::Teacher => self.teacher_hourly_rate,
        }
    }

    /// Amount in the lesson's own currency, rounded to 3 places.
    pub fn amount(&self, side: RateSide) -> Decimal {
        amount_for_minutes(self.duration_minutes as i64, self.rate(side))
    }
}

/// Fields required to record a lesson; rates are filled in by the service.
#[derive(Debug, Clone)]
pub struct NewLesson {
    pub student_id: i32,
    pub teacher_id: i32,
    pub family_id: i32,
    pub supervisor_id: Option<i32>,
    pub date: DateTime<Utc>,
    pub duration_minutes: i32,
    pub student_hourly_rate: Decimal,
    pub teacher_hourly_rate: Decimal,
    pub currency: String,
    pub evaluation: Option<Evaluation>,
    pub notes: Option<String>,
    pub is_absent: bool,
}

impl NewLesson {
    pub fn validate(&self) -> Result<(), DomainError> {
        validate_duration(self.duration_minutes, self.is_absent)?;
        if self.student_hourly_rate.is_sign_negative() || self.teacher_hourly_rate.is_sign_negative() {
            return Err(DomainError::Validation(
                "Hourly rates must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// The only lesson fields that may change after creation.
#[derive(Debug, Clone, Default)]
pub struct LessonPatch {
    pub date: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i32>,
    pub notes: Option<String>,
    pub evaluation: Option<Evaluation>,
}

impl LessonPatch {
    pub fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.duration_minutes.is_none()
            && self.notes.is_none()
            && self.evaluation.is_none()
    }

    /// Apply onto `lesson`, re-checking the duration invariant.
    pub fn apply(self, lesson: &mut LessonRecord) -> Result<(), DomainError> {
        let duration = self.duration_minutes.unwrap_or(lesson.duration_minutes);
        validate_duration(duration, lesson.is_absent)?;

        if let Some(date) = self.date {
            lesson.date = date;
        }
        lesson.duration_minutes = duration;
        if let Some(notes) = self.notes {
            lesson.notes = Some(notes);
        }
        if let Some(evaluation) = self.evaluation {
            lesson.evaluation = Some(evaluation);
        }
        lesson.updated_at = Utc::now();
        Ok(())
    }
}

fn validate_duration(minutes: i32, is_absent: bool) -> Result<(), DomainError> {
    if minutes < 0 || (minutes == 0 && !is_absent) {
        return Err(DomainError::Validation(
            "Duration must be greater than 0 minutes unless the student was absent".to_string(),
        ));
    }
    Ok(())
}

/// How the teacher and family id sets combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OwnerMatch {
    /// Every present set must contain the lesson's owner.
    #[default]
    All,
    /// At least one present set must contain the lesson's owner.
    Any,
}

/// Repository-level lesson filter. `None` sets do not constrain.
#[derive(Debug, Clone)]
pub struct LessonQuery {
    pub range: DateRange,
    pub student_ids: Option<Vec<i32>>,
    pub teacher_ids: Option<Vec<i32>>,
    pub family_ids: Option<Vec<i32>>,
    pub owner_match: OwnerMatch,
}

impl LessonQuery {
    pub fn new(range: DateRange) -> Self {
        Self {
            range,
            student_ids: None,
            teacher_ids: None,
            family_ids: None,
            owner_match: OwnerMatch::All,
        }
    }

    pub fn students(mut self, ids: Vec<i32>) -> Self {
        self.student_ids = Some(ids);
        self
    }

    pub fn teachers(mut self, ids: Vec<i32>) -> Self {
        self.teacher_ids = Some(ids);
        self
    }

    pub fn families(mut self, ids: Vec<i32>) -> Self {
        self.family_ids = Some(ids);
        self
    }

    pub fn match_any_owner(mut self) -> Self {
        self.owner_match = OwnerMatch::Any;
        self
    }

    pub fn matches(&self, lesson: &LessonRecord) -> bool {
        if !self.range.contains(&lesson.date) {
            return false;
        }
        if let Some(ids) = &self.student_ids {
            if !ids.contains(&lesson.student_id) {
                return false;
            }
        }

        let teacher = self.teacher_ids.as_ref().map(|ids| ids.contains(&lesson.teacher_id));
        let family = self.family_ids.as_ref().map(|ids| ids.contains(&lesson.family_id));

        match self.owner_match {
            OwnerMatch::All => teacher.unwrap_or(true) && family.unwrap_or(true),
            OwnerMatch::Any => match (teacher, family) {
                (None, None) => true,
                (t, f) => t.unwrap_or(false) || f.unwrap_or(false),
            },
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    pub(crate) fn sample_lesson(id: i32, minutes: i32, rate: i64) -> LessonRecord {
        LessonRecord {
            id,
            student_id: 1,
            teacher_id: 10,
            family_id: 100,
            supervisor_id: None,
            date: Utc.with_ymd_and_hms(2024, 3, 5, 16, 0, 0).unwrap(),
            duration_minutes: minutes,
            student_hourly_rate: Decimal::from(rate),
            teacher_hourly_rate: Decimal::from(rate / 2),
            currency: "EGP".into(),
            evaluation: None,
            notes: None,
            is_absent: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn march() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn amount_uses_the_requested_side() {
        let lesson = sample_lesson(1, 90, 50);
        assert_eq!(lesson.amount(RateSide::Student), Decimal::from(75));
        assert_eq!(lesson.amount(RateSide::Teacher), Decimal::new(37500, 3));
    }

    #[test]
    fn zero_duration_only_allowed_when_absent() {
        let mut lesson = sample_lesson(1, 60, 50);
        let err = LessonPatch {
            duration_minutes: Some(0),
            ..Default::default()
        }
        .apply(&mut lesson)
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        lesson.is_absent = true;
        LessonPatch {
            duration_minutes: Some(0),
            ..Default::default()
        }
        .apply(&mut lesson)
        .unwrap();
        assert_eq!(lesson.duration_minutes, 0);
    }

    #[test]
    fn patch_keeps_rates_untouched() {
        let mut lesson = sample_lesson(1, 60, 50);
        LessonPatch {
            duration_minutes: Some(45),
            notes: Some("reviewed chapter 3".into()),
            evaluation: Some(Evaluation::VeryGood),
            ..Default::default()
        }
        .apply(&mut lesson)
        .unwrap();
        assert_eq!(lesson.duration_minutes, 45);
        assert_eq!(lesson.student_hourly_rate, Decimal::from(50));
        assert_eq!(lesson.evaluation, Some(Evaluation::VeryGood));
    }

    #[test]
    fn any_owner_matches_teacher_or_family() {
        let lesson = sample_lesson(1, 60, 50);
        let by_teacher = LessonQuery::new(march()).teachers(vec![10]).families(vec![7]).match_any_owner();
        assert!(by_teacher.matches(&lesson));

        let by_neither = LessonQuery::new(march()).teachers(vec![11]).families(vec![7]).match_any_owner();
        assert!(!by_neither.matches(&lesson));

        let all_owners = LessonQuery::new(march()).teachers(vec![10]).families(vec![7]);
        assert!(!all_owners.matches(&lesson));
    }

    #[test]
    fn query_respects_date_window() {
        let mut lesson = sample_lesson(1, 60, 50);
        lesson.date = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();
        assert!(!LessonQuery::new(march()).matches(&lesson));
    }

    #[test]
    fn evaluation_parses_from_display() {
        for e in [Evaluation::Acceptable, Evaluation::Good, Evaluation::VeryGood, Evaluation::Excellent] {
            assert_eq!(e.to_string().parse::<Evaluation>().unwrap(), e);
        }
        assert!("Great".parse::<Evaluation>().is_err());
    }
}
