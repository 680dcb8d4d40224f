//! Invoice read models

pub mod model;

pub use model::{
    CurrencyTotals, FamilyBreakdown, FamilyInvoice, FamilySummary, InvoiceLine, LessonSummaryEntry,
    LessonsSummary, StudentInvoiceDetail, SupervisorInvoice, TeacherBreakdown, TeacherInvoice,
    TeacherSummary,
};
