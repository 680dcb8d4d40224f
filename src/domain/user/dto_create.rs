use super::{User, UserRole};
use crate::domain::family::{Family, NewFamily};
use crate::domain::supervisor::{NewSupervisor, Supervisor};
use crate::domain::teacher::{NewTeacher, Teacher};

/// Login half of an account. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    /// Scope for an `Admin` linked to an existing supervisor.
    pub supervisor_id: Option<i32>,
}

/// Profile row created together with the account.
#[derive(Debug, Clone)]
pub enum AccountProfile {
    None,
    Supervisor(NewSupervisor),
    Teacher(NewTeacher),
    Family(NewFamily),
}

#[derive(Debug, Clone)]
pub enum Profile {
    Supervisor(Supervisor),
    Teacher(Teacher),
    Family(Family),
}

#[derive(Debug, Clone)]
pub struct CreatedAccount {
    pub user: User,
    pub profile: Option<Profile>,
}
