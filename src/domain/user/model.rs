use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::shared::DomainError;

/// User role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Organization-wide, unscoped.
    SuperAdmin,
    /// Unscoped, or scoped to one supervisor when `supervisor_id` is set.
    Admin,
    Teacher,
    Family,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SuperAdmin => "super_admin",
            Self::Admin => "admin",
            Self::Teacher => "teacher",
            Self::Family => "family",
        }
    }

    pub fn is_administrative(&self) -> bool {
        matches!(self, Self::SuperAdmin | Self::Admin)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UserRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "super_admin" | "superadmin" => Ok(Self::SuperAdmin),
            "admin" => Ok(Self::Admin),
            "teacher" => Ok(Self::Teacher),
            "family" => Ok(Self::Family),
            other => Err(DomainError::Validation(format!("Unknown role: {}", other))),
        }
    }
}

/// User model
#[derive(Clone, Debug)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub supervisor_id: Option<i32>,
    pub teacher_id: Option<i32>,
    pub family_id: Option<i32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_strings_round_trip() {
        for role in [UserRole::SuperAdmin, UserRole::Admin, UserRole::Teacher, UserRole::Family] {
            assert_eq!(role.as_str().parse::<UserRole>().unwrap(), role);
        }
        assert_eq!("SuperAdmin".parse::<UserRole>().unwrap(), UserRole::SuperAdmin);
        assert!("viewer".parse::<UserRole>().is_err());
    }
}
