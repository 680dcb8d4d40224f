//! SeaORM implementation of UserRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, Set, TransactionTrait,
};
use tracing::info;

use super::{db_err, family_repository, insert_err, supervisor_repository, teacher_repository};
use crate::domain::{
    AccountProfile, CreatedAccount, DomainError, DomainResult, NewAccount, Profile, User,
    UserRepository, UserRole,
};
use crate::infrastructure::database::entities::user;

// ── Conversion helpers ──────────────────────────────────────────

fn entity_role_to_domain(role: user::UserRole) -> UserRole {
    match role {
        user::UserRole::SuperAdmin => UserRole::SuperAdmin,
        user::UserRole::Admin => UserRole::Admin,
        user::UserRole::Teacher => UserRole::Teacher,
        user::UserRole::Family => UserRole::Family,
    }
}

fn domain_role_to_entity(role: UserRole) -> user::UserRole {
    match role {
        UserRole::SuperAdmin => user::UserRole::SuperAdmin,
        UserRole::Admin => user::UserRole::Admin,
        UserRole::Teacher => user::UserRole::Teacher,
        UserRole::Family => user::UserRole::Family,
    }
}

fn user_model_to_domain(model: user::Model) -> User {
    User {
        id: model.id,
        username: model.username,
        email: model.email,
        password_hash: model.password_hash,
        role: entity_role_to_domain(model.role),
        supervisor_id: model.supervisor_id,
        teacher_id: model.teacher_id,
        family_id: model.family_id,
        is_active: model.is_active,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

// ── Repository implementation ───────────────────────────────────

pub struct SeaOrmUserRepository {
    db: DatabaseConnection,
}

impl SeaOrmUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for SeaOrmUserRepository {
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<User>> {
        let model = user::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;

        Ok(model.map(user_model_to_domain))
    }

    /// Matches either the username or the email address.
    async fn find_by_username(&self, username: &str) -> DomainResult<Option<User>> {
        let model = user::Entity::find()
            .filter(
                Condition::any()
                    .add(user::Column::Username.eq(username))
                    .add(user::Column::Email.eq(username)),
            )
            .one(&self.db)
            .await
            .map_err(db_err)?;

        Ok(model.map(user_model_to_domain))
    }

    async fn count(&self) -> DomainResult<u64> {
        user::Entity::find().count(&self.db).await.map_err(db_err)
    }

    async fn create_account(
        &self,
        account: NewAccount,
        profile: AccountProfile,
    ) -> DomainResult<CreatedAccount> {
        // Dropping `txn` before commit rolls back every insert below.
        let txn = self.db.begin().await.map_err(db_err)?;

        if let Some(id) = account.supervisor_id {
            if supervisor_repository::find_live(&txn, id).await?.is_none() {
                return Err(DomainError::not_found("Supervisor", id));
            }
        }

        let mut supervisor_id = account.supervisor_id;
        let mut teacher_id = None;
        let mut family_id = None;

        let profile = match profile {
            AccountProfile::None => None,
            AccountProfile::Supervisor(s) => {
                let supervisor = supervisor_repository::insert(&txn, s).await?;
                if account.role == UserRole::Admin {
                    supervisor_id = Some(supervisor.id);
                }
                Some(Profile::Supervisor(supervisor))
            }
            AccountProfile::Teacher(t) => {
                let teacher = teacher_repository::insert(&txn, t).await?;
                teacher_id = Some(teacher.id);
                Some(Profile::Teacher(teacher))
            }
            AccountProfile::Family(f) => {
                let family = family_repository::insert(&txn, f).await?;
                family_id = Some(family.id);
                Some(Profile::Family(family))
            }
        };

        let now = Utc::now();
        let new_user = user::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            username: Set(account.username),
            email: Set(account.email),
            password_hash: Set(account.password_hash),
            role: Set(domain_role_to_entity(account.role)),
            supervisor_id: Set(supervisor_id),
            teacher_id: Set(teacher_id),
            family_id: Set(family_id),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let saved = new_user
            .insert(&txn)
            .await
            .map_err(|e| insert_err(e, "Username or email"))?;

        txn.commit().await.map_err(db_err)?;

        let user = user_model_to_domain(saved);
        info!(user_id = %user.id, username = %user.username, role = %user.role, "Account created");
        Ok(CreatedAccount { user, profile })
    }
}
