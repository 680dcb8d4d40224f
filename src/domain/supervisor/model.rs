use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

/// Mid-level manager owning a set of teachers and families.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Supervisor {
    pub id: i32,
    pub name: String,
    pub hourly_rate: Decimal,
    pub currency: String,
}

#[derive(Debug, Clone)]
pub struct NewSupervisor {
    pub name: String,
    pub hourly_rate: Decimal,
    pub currency: String,
}
