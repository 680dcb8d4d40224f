use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use super::super::non_negative;
use crate::application::RateChange;
use crate::domain::NewStudent;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateStudentRequest {
    #[validate(length(min = 1, max = 120, message = "name is required"))]
    pub name: String,
    pub family_id: i32,
    pub teacher_id: i32,
}

impl From<CreateStudentRequest> for NewStudent {
    fn from(r: CreateStudentRequest) -> Self {
        NewStudent {
            name: r.name.trim().to_string(),
            family_id: r.family_id,
            teacher_id: r.teacher_id,
        }
    }
}

/// New current rate; recorded lessons keep their own.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RateRequest {
    #[validate(custom(function = "non_negative"))]
    #[schema(value_type = String, example = "12.500")]
    pub hourly_rate: Decimal,
    #[validate(length(equal = 3, message = "currency must be a 3-letter code"))]
    pub currency: String,
}

impl From<RateRequest> for RateChange {
    fn from(r: RateRequest) -> Self {
        RateChange {
            hourly_rate: r.hourly_rate,
            currency: r.currency,
        }
    }
}
