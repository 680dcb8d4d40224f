//! Directory maintenance handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};

use super::dto::{CreateStudentRequest, RateRequest};
use crate::domain::{Family, Student, Supervisor, Teacher};
use crate::interfaces::http::common::{api_error, ok, ApiError, ApiResponse, ApiResult, ValidatedJson};
use crate::interfaces::http::middleware::AuthenticatedUser;
use crate::interfaces::http::modules::resolve_caller;
use crate::interfaces::http::router::ApiState;

#[utoipa::path(
    post,
    path = "/api/v1/students",
    tag = "Directory",
    security(("bearer_auth" = [])),
    request_body = CreateStudentRequest,
    responses(
        (status = 201, description = "Student created", body = ApiResponse<Student>),
        (status = 404, description = "Family or teacher not found")
    )
)]
pub async fn create_student(
    State(state): State<ApiState>,
    Extension(user): Extension<AuthenticatedUser>,
    ValidatedJson(request): ValidatedJson<CreateStudentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Student>>), ApiError> {
    let caller = resolve_caller(&state, &user).await?;
    let student = state
        .directory
        .create_student(&caller, request.into())
        .await
        .map_err(api_error)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(student))))
}

#[utoipa::path(
    put,
    path = "/api/v1/teachers/{id}/rate",
    tag = "Directory",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Teacher id")),
    request_body = RateRequest,
    responses(
        (status = 200, description = "Rate changed", body = ApiResponse<Teacher>),
        (status = 404, description = "Teacher not found")
    )
)]
pub async fn set_teacher_rate(
    State(state): State<ApiState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i32>,
    ValidatedJson(request): ValidatedJson<RateRequest>,
) -> ApiResult<Teacher> {
    let caller = resolve_caller(&state, &user).await?;
    let updated = state
        .directory
        .set_teacher_rate(&caller, id, request.into())
        .await
        .map_err(api_error)?;
    ok(updated)
}

#[utoipa::path(
    put,
    path = "/api/v1/families/{id}/rate",
    tag = "Directory",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Family id")),
    request_body = RateRequest,
    responses(
        (status = 200, description = "Rate changed", body = ApiResponse<Family>),
        (status = 404, description = "Family not found")
    )
)]
pub async fn set_family_rate(
    State(state): State<ApiState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i32>,
    ValidatedJson(request): ValidatedJson<RateRequest>,
) -> ApiResult<Family> {
    let caller = resolve_caller(&state, &user).await?;
    let updated = state
        .directory
        .set_family_rate(&caller, id, request.into())
        .await
        .map_err(api_error)?;
    ok(updated)
}

#[utoipa::path(
    put,
    path = "/api/v1/supervisors/{id}/rate",
    tag = "Directory",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Supervisor id")),
    request_body = RateRequest,
    responses(
        (status = 200, description = "Rate changed", body = ApiResponse<Supervisor>),
        (status = 404, description = "Supervisor not found")
    )
)]
pub async fn set_supervisor_rate(
    State(state): State<ApiState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i32>,
    ValidatedJson(request): ValidatedJson<RateRequest>,
) -> ApiResult<Supervisor> {
    let caller = resolve_caller(&state, &user).await?;
    let updated = state
        .directory
        .set_supervisor_rate(&caller, id, request.into())
        .await
        .map_err(api_error)?;
    ok(updated)
}

#[utoipa::path(
    delete,
    path = "/api/v1/students/{id}",
    tag = "Directory",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Student id")),
    responses(
        (status = 200, description = "Student soft-deleted"),
        (status = 404, description = "Student not found")
    )
)]
pub async fn delete_student(
    State(state): State<ApiState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i32>,
) -> ApiResult<()> {
    let caller = resolve_caller(&state, &user).await?;
    state
        .directory
        .delete_student(&caller, id)
        .await
        .map_err(api_error)?;
    ok(())
}

#[utoipa::path(
    delete,
    path = "/api/v1/teachers/{id}",
    tag = "Directory",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Teacher id")),
    responses(
        (status = 200, description = "Teacher soft-deleted"),
        (status = 404, description = "Teacher not found")
    )
)]
pub async fn delete_teacher(
    State(state): State<ApiState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i32>,
) -> ApiResult<()> {
    let caller = resolve_caller(&state, &user).await?;
    state
        .directory
        .delete_teacher(&caller, id)
        .await
        .map_err(api_error)?;
    ok(())
}

#[utoipa::path(
    delete,
    path = "/api/v1/families/{id}",
    tag = "Directory",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Family id")),
    responses(
        (status = 200, description = "Family soft-deleted"),
        (status = 404, description = "Family not found")
    )
)]
pub async fn delete_family(
    State(state): State<ApiState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i32>,
) -> ApiResult<()> {
    let caller = resolve_caller(&state, &user).await?;
    state
        .directory
        .delete_family(&caller, id)
        .await
        .map_err(api_error)?;
    ok(())
}

#[utoipa::path(
    delete,
    path = "/api/v1/supervisors/{id}",
    tag = "Directory",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Supervisor id")),
    responses(
        (status = 200, description = "Supervisor soft-deleted"),
        (status = 404, description = "Supervisor not found")
    )
)]
pub async fn delete_supervisor(
    State(state): State<ApiState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i32>,
) -> ApiResult<()> {
    let caller = resolve_caller(&state, &user).await?;
    state
        .directory
        .delete_supervisor(&caller, id)
        .await
        .map_err(api_error)?;
    ok(())
}
