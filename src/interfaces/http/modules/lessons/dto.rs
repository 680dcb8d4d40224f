use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::application::{RecordLesson, SummaryFilters, SummaryRequest};
use crate::domain::{Evaluation, LessonPatch, LessonRecord};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordLessonRequest {
    pub student_id: i32,
    pub date: DateTime<Utc>,
    #[validate(range(min = 0, max = 1440, message = "duration must be 0-1440 minutes"))]
    pub duration_minutes: i32,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    pub evaluation: Option<Evaluation>,
    #[serde(default)]
    pub is_absent: bool,
}

impl From<RecordLessonRequest> for RecordLesson {
    fn from(r: RecordLessonRequest) -> Self {
        RecordLesson {
            student_id: r.student_id,
            date: r.date,
            duration_minutes: r.duration_minutes,
            notes: r.notes,
            evaluation: r.evaluation,
            is_absent: r.is_absent,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLessonRequest {
    pub date: Option<DateTime<Utc>>,
    #[validate(range(min = 0, max = 1440, message = "duration must be 0-1440 minutes"))]
    pub duration_minutes: Option<i32>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    pub evaluation: Option<Evaluation>,
}

impl From<UpdateLessonRequest> for LessonPatch {
    fn from(r: UpdateLessonRequest) -> Self {
        LessonPatch {
            date: r.date,
            duration_minutes: r.duration_minutes,
            notes: r.notes,
            evaluation: r.evaluation,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LessonDto {
    pub id: i32,
    pub student_id: i32,
    pub teacher_id: i32,
    pub family_id: i32,
    pub supervisor_id: Option<i32>,
    pub date: DateTime<Utc>,
    pub duration_minutes: i32,
    #[schema(value_type = String)]
    pub student_hourly_rate: Decimal,
    #[schema(value_type = String)]
    pub teacher_hourly_rate: Decimal,
    pub currency: String,
    pub evaluation: Option<Evaluation>,
    pub notes: Option<String>,
    pub is_absent: bool,
}

impl From<LessonRecord> for LessonDto {
    fn from(l: LessonRecord) -> Self {
        Self {
            id: l.id,
            student_id: l.student_id,
            teacher_id: l.teacher_id,
            family_id: l.family_id,
            supervisor_id: l.supervisor_id,
            date: l.date,
            duration_minutes: l.duration_minutes,
            student_hourly_rate: l.student_hourly_rate,
            teacher_hourly_rate: l.teacher_hourly_rate,
            currency: l.currency,
            evaluation: l.evaluation,
            notes: l.notes,
            is_absent: l.is_absent,
        }
    }
}

/// `?from=2024-03-01&to=2024-03-31&teacherId=3&familyId=7`
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct SummaryParams {
    /// First day, inclusive. Defaults to the first of the current month.
    pub from: Option<NaiveDate>,
    /// Last day, inclusive. Defaults to today (UTC).
    pub to: Option<NaiveDate>,
    pub teacher_id: Option<i32>,
    pub family_id: Option<i32>,
}

impl From<SummaryParams> for SummaryRequest {
    fn from(p: SummaryParams) -> Self {
        SummaryRequest {
            from: p.from,
            to: p.to,
            filters: SummaryFilters {
                teacher_id: p.teacher_id,
                family_id: p.family_id,
            },
        }
    }
}
