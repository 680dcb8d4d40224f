//! Lesson aggregate
//!
//! A lesson is an immutable rate snapshot: the hourly rates and currency in
//! force when the session was recorded. Invoices read these, never the
//! current teacher/family rates.

pub mod model;
pub mod repository;

pub use model::{Evaluation, LessonPatch, LessonQuery, LessonRecord, NewLesson, OwnerMatch, RateSide};
pub use repository::LessonRepository;
