use axum::{extract::State, http::StatusCode, Extension, Json};

use super::dto::{AccountResponse, CreateAccountRequest};
use crate::application::CreateAccount;
use crate::interfaces::http::common::{api_error, ApiError, ApiResponse, ValidatedJson};
use crate::interfaces::http::middleware::AuthenticatedUser;
use crate::interfaces::http::modules::resolve_caller;
use crate::interfaces::http::router::ApiState;

#[utoipa::path(
    post,
    path = "/api/v1/accounts",
    tag = "Accounts",
    security(("bearer_auth" = [])),
    request_body = CreateAccountRequest,
    responses(
        (status = 201, description = "Account and profile created", body = ApiResponse<AccountResponse>),
        (status = 403, description = "Caller may not create this account"),
        (status = 409, description = "Username or email taken"),
        (status = 422, description = "Invalid body")
    )
)]
pub async fn create_account(
    State(state): State<ApiState>,
    Extension(user): Extension<AuthenticatedUser>,
    ValidatedJson(request): ValidatedJson<CreateAccountRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AccountResponse>>), ApiError> {
    let caller = resolve_caller(&state, &user).await?;
    let profile = request.account_profile();
    let created = state
        .accounts
        .create_account(
            &caller,
            CreateAccount {
                username: request.username,
                email: request.email,
                password: request.password,
                role: request.role,
                supervisor_id: request.supervisor_id,
                profile,
            },
        )
        .await
        .map_err(api_error)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(AccountResponse::from(created))),
    ))
}
