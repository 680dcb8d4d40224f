use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::super::auth::UserInfo;
use super::super::non_negative;
use crate::domain::{
    AccountProfile, CreatedAccount, Family, NewFamily, NewSupervisor, NewTeacher, Profile,
    Supervisor, Teacher, UserRole,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    #[validate(length(min = 3, max = 50, message = "username must be 3-50 characters"))]
    pub username: String,
    #[validate(email(message = "invalid email format"))]
    pub email: String,
    #[validate(length(min = 8, max = 128, message = "password must be 8-128 characters"))]
    pub password: String,
    pub role: UserRole,
    /// Existing supervisor an admin account is confined to.
    pub supervisor_id: Option<i32>,
    /// Teacher, family or supervisor row created with the account.
    #[validate(nested)]
    pub profile: Option<ProfileRequest>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRequest {
    #[validate(length(min = 1, max = 120, message = "name is required"))]
    pub name: String,
    #[validate(custom(function = "non_negative"))]
    #[schema(value_type = String, example = "300.000")]
    pub hourly_rate: Decimal,
    #[validate(length(equal = 3, message = "currency must be a 3-letter code"))]
    pub currency: String,
    pub supervisor_id: Option<i32>,
}

impl CreateAccountRequest {
    /// Profile kind follows the role; admins with a profile become
    /// supervisors.
    pub fn account_profile(&self) -> AccountProfile {
        let Some(p) = &self.profile else {
            return AccountProfile::None;
        };
        match self.role {
            UserRole::Teacher => AccountProfile::Teacher(NewTeacher {
                name: p.name.clone(),
                hourly_rate: p.hourly_rate,
                currency: p.currency.clone(),
                supervisor_id: p.supervisor_id,
            }),
            UserRole::Family => AccountProfile::Family(NewFamily {
                name: p.name.clone(),
                hourly_rate: p.hourly_rate,
                currency: p.currency.clone(),
                supervisor_id: p.supervisor_id,
            }),
            UserRole::Admin => AccountProfile::Supervisor(NewSupervisor {
                name: p.name.clone(),
                hourly_rate: p.hourly_rate,
                currency: p.currency.clone(),
            }),
            UserRole::SuperAdmin => AccountProfile::None,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProfileDto {
    Supervisor(Supervisor),
    Teacher(Teacher),
    Family(Family),
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AccountResponse {
    pub user: UserInfo,
    pub profile: Option<ProfileDto>,
}

impl From<CreatedAccount> for AccountResponse {
    fn from(created: CreatedAccount) -> Self {
        Self {
            user: UserInfo::from(created.user),
            profile: created.profile.map(|p| match p {
                Profile::Supervisor(s) => ProfileDto::Supervisor(s),
                Profile::Teacher(t) => ProfileDto::Teacher(t),
                Profile::Family(f) => ProfileDto::Family(f),
            }),
        }
    }
}
