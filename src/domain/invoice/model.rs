//! Derived invoice shapes. Computed on demand, never persisted.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::lesson::Evaluation;
use crate::domain::user::UserRole;
use crate::shared::DateRange;

/// One lesson as it appears on an invoice.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLine {
    pub lesson_id: i32,
    pub date: DateTime<Utc>,
    pub duration_minutes: i32,
    /// `duration_minutes / 60`, exact.
    pub hours: Decimal,
    /// Snapshot rate in the lesson currency.
    pub hourly_rate: Decimal,
    pub lesson_currency: String,
    /// `hours × hourly_rate`, converted to the invoice currency.
    pub amount: Decimal,
    pub notes: Option<String>,
    pub evaluation: Option<Evaluation>,
    pub is_absent: bool,
}

/// Per-student block nested in family and teacher invoices.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentInvoiceDetail {
    pub student_id: i32,
    pub student_name: String,
    pub total_lessons: u32,
    pub total_hours: Decimal,
    pub total_amount: Decimal,
    pub lessons: Vec<InvoiceLine>,
}

/// Amounts owed by a family.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FamilyInvoice {
    pub family_id: i32,
    pub family_name: String,
    pub currency: String,
    pub period: DateRange,
    pub total_lessons: u32,
    pub total_hours: Decimal,
    pub total_amount: Decimal,
    pub students: Vec<StudentInvoiceDetail>,
}

/// Earnings owed to a teacher.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeacherInvoice {
    pub teacher_id: i32,
    pub teacher_name: String,
    pub currency: String,
    pub period: DateRange,
    pub total_lessons: u32,
    pub total_hours: Decimal,
    pub total_earnings: Decimal,
    pub students: Vec<StudentInvoiceDetail>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FamilyBreakdown {
    pub family_id: i32,
    pub family_name: String,
    pub student_count: u32,
    pub total_lessons: u32,
    pub total_hours: Decimal,
    pub total_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeacherBreakdown {
    pub teacher_id: i32,
    pub teacher_name: String,
    pub student_count: u32,
    pub total_lessons: u32,
    pub total_hours: Decimal,
    pub total_earnings: Decimal,
}

/// Two separate ledgers over a supervisor's lessons: what their families
/// owe and what their teachers earned.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SupervisorInvoice {
    pub supervisor_id: i32,
    pub supervisor_name: String,
    pub currency: String,
    pub period: DateRange,
    pub family_count: u32,
    pub teacher_count: u32,
    pub student_count: u32,
    pub total_lessons: u32,
    pub families: Vec<FamilyBreakdown>,
    pub teachers: Vec<TeacherBreakdown>,
    pub total_family_amount: Decimal,
    pub total_teacher_earnings: Decimal,
}

/// Lesson row in a role-filtered summary.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LessonSummaryEntry {
    pub lesson_id: i32,
    pub date: DateTime<Utc>,
    pub student_id: i32,
    pub student_name: String,
    pub teacher_id: i32,
    pub family_id: i32,
    pub duration_minutes: i32,
    pub hours: Decimal,
    pub evaluation: Option<Evaluation>,
    pub notes: Option<String>,
    pub is_absent: bool,
}

/// Shown to a teacher: current hourly rate × hours taught.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeacherSummary {
    pub teacher_id: i32,
    pub teacher_name: String,
    pub hourly_rate: Decimal,
    pub currency: String,
    pub total_hours: Decimal,
    pub total_earnings: Decimal,
}

/// Shown to a family: what the period costs.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FamilySummary {
    pub family_id: i32,
    pub family_name: String,
    pub currency: String,
    pub total_hours: Decimal,
    pub total_cost: Decimal,
}

/// Organization-wide billed amount, converted lesson by lesson into each
/// reporting currency.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyTotals {
    pub total_amount_usd: Decimal,
    pub total_amount_egp: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LessonsSummary {
    pub period: DateRange,
    pub role: UserRole,
    pub total_lessons: u32,
    pub total_hours: Decimal,
    pub lessons: Vec<LessonSummaryEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teacher_summary: Option<TeacherSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_summary: Option<FamilySummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_totals: Option<CurrencyTotals>,
}
