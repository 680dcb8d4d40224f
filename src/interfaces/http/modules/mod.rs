pub mod accounts;
pub mod auth;
pub mod directory;
pub mod health;
pub mod invoices;
pub mod lessons;
pub mod metrics;
pub mod request_id;

use rust_decimal::Decimal;
use validator::ValidationError;

use super::common::{api_error, ApiError};
use super::middleware::AuthenticatedUser;
use super::router::ApiState;
use crate::application::Caller;

/// Re-read the account behind the token so deactivation and relinking
/// take effect without waiting for token expiry.
pub(crate) async fn resolve_caller(
    state: &ApiState,
    user: &AuthenticatedUser,
) -> Result<Caller, ApiError> {
    state.accounts.caller(&user.user_id).await.map_err(api_error)
}

pub(crate) fn non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.message = Some("must not be negative".into());
        return Err(err);
    }
    Ok(())
}
