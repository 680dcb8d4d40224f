use async_trait::async_trait;

use super::{AccountProfile, CreatedAccount, NewAccount, User};
use crate::domain::DomainResult;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<User>>;
    async fn find_by_username(&self, username: &str) -> DomainResult<Option<User>>;
    async fn count(&self) -> DomainResult<u64>;

    /// Insert the profile row and the user row as one unit. Either both
    /// exist afterwards or neither does.
    async fn create_account(
        &self,
        account: NewAccount,
        profile: AccountProfile,
    ) -> DomainResult<CreatedAccount>;
}
