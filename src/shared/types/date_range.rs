//! Inclusive UTC date window used by every invoice query

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::errors::DomainError;

/// Calendar-day window, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    /// Build a range, rejecting `to < from`. Bounds are never swapped.
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, DomainError> {
        if to < from {
            return Err(DomainError::Validation(format!(
                "toDate ({}) must not be before fromDate ({})",
                to, from
            )));
        }
        Ok(Self { from, to })
    }

    /// Fill missing bounds with the default window: first day of the
    /// current month through `today`.
    pub fn resolve(
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Result<Self, DomainError> {
        let from = from.unwrap_or_else(|| first_day_of_month(today));
        let to = to.unwrap_or(today);
        Self::new(from, to)
    }

    /// Same as [`DateRange::resolve`] anchored at the current UTC date.
    pub fn resolve_now(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<Self, DomainError> {
        Self::resolve(from, to, Utc::now().date_naive())
    }

    pub fn contains(&self, at: &DateTime<Utc>) -> bool {
        let day = at.date_naive();
        day >= self.from && day <= self.to
    }

    /// Midnight UTC at the start of `from`.
    pub fn start_utc(&self) -> DateTime<Utc> {
        self.from.and_time(NaiveTime::MIN).and_utc()
    }

    /// Midnight UTC of the day after `to`; use as an exclusive upper bound.
    pub fn end_exclusive_utc(&self) -> DateTime<Utc> {
        (self.to + Duration::days(1)).and_time(NaiveTime::MIN).and_utc()
    }
}

fn first_day_of_month(day: NaiveDate) -> NaiveDate {
    day.with_day(1).unwrap_or(day)
}
