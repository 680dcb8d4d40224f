use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::domain::DomainResult;
use crate::shared::DateRange;

/// Invoice period; both bounds inclusive.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PeriodParams {
    /// Defaults to the first of the current month.
    pub from: Option<NaiveDate>,
    /// Defaults to today (UTC).
    pub to: Option<NaiveDate>,
}

impl PeriodParams {
    pub fn range(&self) -> DomainResult<DateRange> {
        DateRange::resolve_now(self.from, self.to)
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListingParams {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// Restrict to one supervisor's tree.
    pub supervisor_id: Option<i32>,
}

impl ListingParams {
    pub fn range(&self) -> DomainResult<DateRange> {
        DateRange::resolve_now(self.from, self.to)
    }
}
