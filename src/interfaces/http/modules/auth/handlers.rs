//! Authentication handlers

use axum::{extract::State, Extension, Json};

use super::dto::{LoginRequest, LoginResponse, UserInfo};
use crate::domain::DomainError;
use crate::interfaces::http::common::{api_error, ok, ApiResponse, ApiResult, ValidatedJson};
use crate::interfaces::http::middleware::AuthenticatedUser;
use crate::interfaces::http::router::ApiState;

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Successful login", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<ApiState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let auth = state
        .accounts
        .login(&request.username, &request.password)
        .await
        .map_err(api_error)?;

    ok(LoginResponse {
        token: auth.token,
        token_type: auth.token_type,
        expires_in: auth.expires_in,
        user: UserInfo::from(auth.user),
    })
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "Authentication",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current account", body = ApiResponse<UserInfo>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn current_user(
    State(state): State<ApiState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> ApiResult<UserInfo> {
    let account = state
        .repos
        .users()
        .find_by_id(&user.user_id)
        .await
        .map_err(api_error)?
        .ok_or_else(|| api_error(DomainError::Unauthorized("Unknown user".into())))?;
    ok(UserInfo::from(account))
}
