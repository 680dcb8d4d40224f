use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Family {
    pub id: i32,
    pub name: String,
    /// Current rate charged per student hour.
    pub hourly_rate: Decimal,
    /// Invoice currency.
    pub currency: String,
    pub supervisor_id: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct NewFamily {
    pub name: String,
    pub hourly_rate: Decimal,
    pub currency: String,
    pub supervisor_id: Option<i32>,
}
