//! Account service: login, account creation, super-admin bootstrap
//!
//! HTTP handlers stay thin and delegate here.

use std::sync::Arc;

use tracing::{info, warn};

use crate::application::billing::Caller;
use crate::domain::{
    AccountProfile, CreatedAccount, DomainError, DomainResult, NewAccount, RepositoryProvider, User,
    UserRole,
};
use crate::infrastructure::crypto::jwt::{create_token, JwtConfig};
use crate::infrastructure::crypto::password::{hash_password, verify_password};
use crate::shared::InfraError;

/// Authentication result returned after a successful login
#[derive(Debug, Clone)]
pub struct AuthResult {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: User,
}

/// Account plus the profile row it is linked to.
#[derive(Debug, Clone)]
pub struct CreateAccount {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: UserRole,
    /// Existing supervisor a new admin is confined to.
    pub supervisor_id: Option<i32>,
    pub profile: AccountProfile,
}

/// Credentials for the account created on first start.
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub username: String,
    pub email: String,
    pub password: String,
}

pub struct AccountService {
    repos: Arc<dyn RepositoryProvider>,
    jwt_config: JwtConfig,
    bcrypt_cost: u32,
}

impl AccountService {
    pub fn new(repos: Arc<dyn RepositoryProvider>, jwt_config: JwtConfig, bcrypt_cost: u32) -> Self {
        Self {
            repos,
            jwt_config,
            bcrypt_cost,
        }
    }

    // ── Authentication ──────────────────────────────────────────

    /// Authenticate by username or email and return a JWT.
    pub async fn login(&self, username_or_email: &str, password: &str) -> DomainResult<AuthResult> {
        let Some(user) = self.repos.users().find_by_username(username_or_email).await? else {
            return Err(DomainError::Unauthorized("Invalid credentials".into()));
        };

        if !user.is_active {
            return Err(DomainError::Unauthorized("Account is disabled".into()));
        }

        let valid = verify_password(password, &user.password_hash).unwrap_or(false);
        if !valid {
            warn!(username = %user.username, "Rejected login");
            return Err(DomainError::Unauthorized("Invalid credentials".into()));
        }

        let token = create_token(&user.id, &user.username, user.role, &self.jwt_config)
            .map_err(|e| InfraError::Crypto(format!("token signing failed: {}", e)))?;

        info!(user_id = %user.id, role = %user.role, "User logged in");
        Ok(AuthResult {
            token,
            token_type: "Bearer".into(),
            expires_in: self.jwt_config.expiration_hours * 3600,
            user,
        })
    }

    /// Resolve the caller behind an authenticated user id.
    pub async fn caller(&self, user_id: &str) -> DomainResult<Caller> {
        let user = self
            .repos
            .users()
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| DomainError::Unauthorized("Unknown user".into()))?;
        Caller::from_user(&user)
    }

    // ── Accounts ────────────────────────────────────────────────

    /// Create a login together with its profile row in one unit.
    pub async fn create_account(
        &self,
        caller: &Caller,
        input: CreateAccount,
    ) -> DomainResult<CreatedAccount> {
        validate_credentials(&input.username, &input.email, &input.password)?;
        let mut input = input;
        authorize_creation(caller, &mut input)?;
        check_profile(&input)?;

        let password_hash = hash_password(&input.password, self.bcrypt_cost)
            .map_err(|e| InfraError::Crypto(format!("password hashing failed: {}", e)))?;

        let account = NewAccount {
            username: input.username.trim().to_string(),
            email: input.email.trim().to_string(),
            password_hash,
            role: input.role,
            supervisor_id: input.supervisor_id,
        };
        self.repos.users().create_account(account, input.profile).await
    }

    /// Create the first super-admin when no account exists yet. Returns
    /// `None` when users are already present.
    pub async fn bootstrap_super_admin(&self, admin: &BootstrapAdmin) -> DomainResult<Option<User>> {
        if self.repos.users().count().await? > 0 {
            return Ok(None);
        }
        let created = self
            .create_account(
                &Caller::SuperAdmin,
                CreateAccount {
                    username: admin.username.clone(),
                    email: admin.email.clone(),
                    password: admin.password.clone(),
                    role: UserRole::SuperAdmin,
                    supervisor_id: None,
                    profile: AccountProfile::None,
                },
            )
            .await?;
        warn!(username = %created.user.username, "Bootstrap super-admin created; change its password");
        Ok(Some(created.user))
    }
}

// ── Helpers ─────────────────────────────────────────────────────

fn validate_credentials(username: &str, email: &str, password: &str) -> DomainResult<()> {
    let username = username.trim();
    if username.len() < 3 || username.len() > 50 {
        return Err(DomainError::Validation(
            "Username must be 3-50 characters".into(),
        ));
    }
    if password.len() < 8 {
        return Err(DomainError::Validation(
            "Password must be at least 8 characters".into(),
        ));
    }
    if !email.contains('@') {
        return Err(DomainError::Validation("Invalid email address".into()));
    }
    Ok(())
}

/// Super-admins create anything. Unscoped admins create everything except
/// super-admins. Scoped admins create teacher and family accounts inside
/// their own supervisor.
fn authorize_creation(caller: &Caller, input: &mut CreateAccount) -> DomainResult<()> {
    match *caller {
        Caller::SuperAdmin => Ok(()),
        Caller::Admin { supervisor_id: None } if input.role != UserRole::SuperAdmin => Ok(()),
        Caller::Admin { supervisor_id: Some(scope) } => {
            match &mut input.profile {
                AccountProfile::Teacher(t) if input.role == UserRole::Teacher => {
                    t.supervisor_id = Some(scope);
                }
                AccountProfile::Family(f) if input.role == UserRole::Family => {
                    f.supervisor_id = Some(scope);
                }
                _ => {
                    return Err(DomainError::Forbidden(
                        "Scoped admins may only create teacher and family accounts".into(),
                    ))
                }
            }
            Ok(())
        }
        _ => Err(DomainError::Forbidden(format!(
            "{} callers cannot create {} accounts",
            caller.role(),
            input.role
        ))),
    }
}

/// Teacher and family logins need their profile; admins may carry a new
/// supervisor profile or an existing supervisor id, not both.
fn check_profile(input: &CreateAccount) -> DomainResult<()> {
    let ok = match (input.role, &input.profile) {
        (UserRole::Teacher, AccountProfile::Teacher(_)) => true,
        (UserRole::Family, AccountProfile::Family(_)) => true,
        (UserRole::Admin, AccountProfile::Supervisor(_)) => input.supervisor_id.is_none(),
        (UserRole::Admin, AccountProfile::None) => true,
        (UserRole::SuperAdmin, AccountProfile::None) => input.supervisor_id.is_none(),
        _ => false,
    };
    if ok {
        Ok(())
    } else {
        Err(DomainError::Validation(format!(
            "Profile does not match role {}",
            input.role
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewFamily, NewSupervisor, NewTeacher, Profile};
    use crate::infrastructure::storage::InMemoryRepositoryProvider;
    use rust_decimal::Decimal;

    // bcrypt's minimum cost keeps the tests fast
    const TEST_COST: u32 = 4;

    fn service() -> (Arc<InMemoryRepositoryProvider>, AccountService) {
        let repos = Arc::new(InMemoryRepositoryProvider::new());
        let service = AccountService::new(repos.clone(), JwtConfig::new("test-secret", 1), TEST_COST);
        (repos, service)
    }

    fn teacher_account(username: &str) -> CreateAccount {
        CreateAccount {
            username: username.into(),
            email: format!("{}@example.com", username),
            password: "correct horse".into(),
            role: UserRole::Teacher,
            supervisor_id: None,
            profile: AccountProfile::Teacher(NewTeacher {
                name: "Omar".into(),
                hourly_rate: Decimal::from(200),
                currency: "EGP".into(),
                supervisor_id: None,
            }),
        }
    }

    fn admin() -> BootstrapAdmin {
        BootstrapAdmin {
            username: "root".into(),
            email: "root@example.com".into(),
            password: "change-me-now".into(),
        }
    }

    #[tokio::test]
    async fn bootstrap_runs_once() {
        let (repos, service) = service();
        let first = service.bootstrap_super_admin(&admin()).await.unwrap();
        assert_eq!(first.map(|u| u.role), Some(UserRole::SuperAdmin));
        assert!(service.bootstrap_super_admin(&admin()).await.unwrap().is_none());
        assert_eq!(repos.users().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn login_issues_token_for_valid_credentials() {
        let (_, service) = service();
        service.bootstrap_super_admin(&admin()).await.unwrap();

        let auth = service.login("root@example.com", "change-me-now").await.unwrap();
        assert_eq!(auth.token_type, "Bearer");
        assert_eq!(auth.expires_in, 3600);

        let err = service.login("root", "wrong-password").await.unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized(_)));
        let err = service.login("nobody", "change-me-now").await.unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn teacher_account_is_linked_to_its_profile() {
        let (_, service) = service();
        let created = service
            .create_account(&Caller::SuperAdmin, teacher_account("omar"))
            .await
            .unwrap();

        let Some(Profile::Teacher(teacher)) = created.profile else {
            panic!("expected a teacher profile");
        };
        assert_eq!(created.user.teacher_id, Some(teacher.id));

        let caller = service.caller(&created.user.id).await.unwrap();
        assert_eq!(caller, Caller::Teacher { teacher_id: teacher.id });
    }

    #[tokio::test]
    async fn duplicate_username_leaves_no_orphan_profile() {
        let (repos, service) = service();
        service
            .create_account(&Caller::SuperAdmin, teacher_account("omar"))
            .await
            .unwrap();
        let err = service
            .create_account(&Caller::SuperAdmin, teacher_account("omar"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(repos.teacher_count(), 1);
    }

    #[tokio::test]
    async fn profile_must_match_role() {
        let (_, service) = service();
        let mut input = teacher_account("omar");
        input.role = UserRole::Family;
        let err = service.create_account(&Caller::SuperAdmin, input).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn scoped_admin_pins_new_profiles_to_its_supervisor() {
        let (repos, service) = service();
        let supervisor = repos
            .supervisors()
            .save(NewSupervisor {
                name: "Mona".into(),
                hourly_rate: Decimal::from(5),
                currency: "USD".into(),
            })
            .await
            .unwrap();
        let scoped = Caller::Admin { supervisor_id: Some(supervisor.id) };

        let created = service
            .create_account(
                &scoped,
                CreateAccount {
                    username: "haddad".into(),
                    email: "haddad@example.com".into(),
                    password: "correct horse".into(),
                    role: UserRole::Family,
                    supervisor_id: None,
                    profile: AccountProfile::Family(NewFamily {
                        name: "Haddad".into(),
                        hourly_rate: Decimal::from(800),
                        currency: "EGP".into(),
                        supervisor_id: None,
                    }),
                },
            )
            .await
            .unwrap();
        let Some(Profile::Family(family)) = created.profile else {
            panic!("expected a family profile");
        };
        assert_eq!(family.supervisor_id, Some(supervisor.id));

        let mut admin_input = teacher_account("boss");
        admin_input.role = UserRole::Admin;
        admin_input.profile = AccountProfile::None;
        let err = service.create_account(&scoped, admin_input).await.unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn short_password_is_rejected() {
        let (_, service) = service();
        let mut input = teacher_account("omar");
        input.password = "short".into();
        let err = service.create_account(&Caller::SuperAdmin, input).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
