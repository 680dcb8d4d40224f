//! Lesson handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};

use super::dto::{LessonDto, RecordLessonRequest, SummaryParams, UpdateLessonRequest};
use crate::domain::LessonsSummary;
use crate::interfaces::http::common::{api_error, ok, ApiError, ApiResponse, ApiResult, ValidatedJson};
use crate::interfaces::http::middleware::AuthenticatedUser;
use crate::interfaces::http::modules::resolve_caller;
use crate::interfaces::http::router::ApiState;

#[utoipa::path(
    post,
    path = "/api/v1/lessons",
    tag = "Lessons",
    security(("bearer_auth" = [])),
    request_body = RecordLessonRequest,
    responses(
        (status = 201, description = "Lesson recorded with current rates", body = ApiResponse<LessonDto>),
        (status = 400, description = "Zero duration on a non-absent lesson"),
        (status = 403, description = "Not the student's teacher"),
        (status = 404, description = "Student not found")
    )
)]
pub async fn record_lesson(
    State(state): State<ApiState>,
    Extension(user): Extension<AuthenticatedUser>,
    ValidatedJson(request): ValidatedJson<RecordLessonRequest>,
) -> Result<(StatusCode, Json<ApiResponse<LessonDto>>), ApiError> {
    let caller = resolve_caller(&state, &user).await?;
    let lesson = state
        .lessons
        .record_lesson(&caller, request.into())
        .await
        .map_err(api_error)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(lesson.into()))))
}

#[utoipa::path(
    put,
    path = "/api/v1/lessons/{id}",
    tag = "Lessons",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Lesson id")),
    request_body = UpdateLessonRequest,
    responses(
        (status = 200, description = "Lesson updated; rates unchanged", body = ApiResponse<LessonDto>),
        (status = 404, description = "Lesson not found")
    )
)]
pub async fn update_lesson(
    State(state): State<ApiState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i32>,
    ValidatedJson(request): ValidatedJson<UpdateLessonRequest>,
) -> ApiResult<LessonDto> {
    let caller = resolve_caller(&state, &user).await?;
    let lesson = state
        .lessons
        .update_lesson(&caller, id, request.into())
        .await
        .map_err(api_error)?;
    ok(lesson.into())
}

#[utoipa::path(
    delete,
    path = "/api/v1/lessons/{id}",
    tag = "Lessons",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Lesson id")),
    responses(
        (status = 200, description = "Lesson soft-deleted"),
        (status = 404, description = "Lesson not found")
    )
)]
pub async fn delete_lesson(
    State(state): State<ApiState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i32>,
) -> ApiResult<()> {
    let caller = resolve_caller(&state, &user).await?;
    state.lessons.delete_lesson(&caller, id).await.map_err(api_error)?;
    ok(())
}

#[utoipa::path(
    get,
    path = "/api/v1/lessons/summary",
    tag = "Lessons",
    security(("bearer_auth" = [])),
    params(SummaryParams),
    responses(
        (status = 200, description = "Lessons visible to the caller", body = ApiResponse<LessonsSummary>),
        (status = 403, description = "Filter not allowed for the caller's role")
    )
)]
pub async fn lessons_summary(
    State(state): State<ApiState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(params): Query<SummaryParams>,
) -> ApiResult<LessonsSummary> {
    let caller = resolve_caller(&state, &user).await?;
    let summary = state
        .invoices
        .lessons_summary(&caller, params.into())
        .await
        .map_err(api_error)?;
    ok(summary)
}
