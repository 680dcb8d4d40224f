//! Invoice handlers. Everything is computed per request.

use axum::{
    extract::{Path, Query, State},
    Extension,
};

use super::dto::{ListingParams, PeriodParams};
use crate::domain::{FamilyInvoice, SupervisorInvoice, TeacherInvoice};
use crate::interfaces::http::common::{api_error, ok, ApiResponse, ApiResult};
use crate::interfaces::http::middleware::AuthenticatedUser;
use crate::interfaces::http::modules::resolve_caller;
use crate::interfaces::http::router::ApiState;

#[utoipa::path(
    get,
    path = "/api/v1/invoices/families/{id}",
    tag = "Invoices",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Family id"), PeriodParams),
    responses(
        (status = 200, description = "Family invoice in the family currency", body = ApiResponse<FamilyInvoice>),
        (status = 403, description = "Family outside the caller's scope"),
        (status = 404, description = "Family not found")
    )
)]
pub async fn family_invoice(
    State(state): State<ApiState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i32>,
    Query(params): Query<PeriodParams>,
) -> ApiResult<FamilyInvoice> {
    let caller = resolve_caller(&state, &user).await?;
    let period = params.range().map_err(api_error)?;
    let invoice = state
        .invoices
        .family_invoice(&caller, id, period)
        .await
        .map_err(api_error)?;
    ok(invoice)
}

#[utoipa::path(
    get,
    path = "/api/v1/invoices/teachers/{id}",
    tag = "Invoices",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Teacher id"), PeriodParams),
    responses(
        (status = 200, description = "Teacher earnings in the teacher currency", body = ApiResponse<TeacherInvoice>),
        (status = 403, description = "Teacher outside the caller's scope"),
        (status = 404, description = "Teacher not found")
    )
)]
pub async fn teacher_invoice(
    State(state): State<ApiState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i32>,
    Query(params): Query<PeriodParams>,
) -> ApiResult<TeacherInvoice> {
    let caller = resolve_caller(&state, &user).await?;
    let period = params.range().map_err(api_error)?;
    let invoice = state
        .invoices
        .teacher_invoice(&caller, id, period)
        .await
        .map_err(api_error)?;
    ok(invoice)
}

#[utoipa::path(
    get,
    path = "/api/v1/invoices/supervisors/{id}",
    tag = "Invoices",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Supervisor id"), PeriodParams),
    responses(
        (status = 200, description = "Supervisor rollup in the supervisor currency", body = ApiResponse<SupervisorInvoice>),
        (status = 403, description = "Not an administrator for this supervisor"),
        (status = 404, description = "Supervisor not found")
    )
)]
pub async fn supervisor_invoice(
    State(state): State<ApiState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i32>,
    Query(params): Query<PeriodParams>,
) -> ApiResult<SupervisorInvoice> {
    let caller = resolve_caller(&state, &user).await?;
    let period = params.range().map_err(api_error)?;
    let invoice = state
        .invoices
        .supervisor_invoice(&caller, id, period)
        .await
        .map_err(api_error)?;
    ok(invoice)
}

#[utoipa::path(
    get,
    path = "/api/v1/invoices/families",
    tag = "Invoices",
    security(("bearer_auth" = [])),
    params(ListingParams),
    responses(
        (status = 200, description = "Every family with lessons in the period", body = ApiResponse<Vec<FamilyInvoice>>),
        (status = 403, description = "Administrators only")
    )
)]
pub async fn all_family_invoices(
    State(state): State<ApiState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(params): Query<ListingParams>,
) -> ApiResult<Vec<FamilyInvoice>> {
    let caller = resolve_caller(&state, &user).await?;
    let period = params.range().map_err(api_error)?;
    let invoices = state
        .invoices
        .all_family_invoices(&caller, period, params.supervisor_id)
        .await
        .map_err(api_error)?;
    ok(invoices)
}

#[utoipa::path(
    get,
    path = "/api/v1/invoices/teachers",
    tag = "Invoices",
    security(("bearer_auth" = [])),
    params(ListingParams),
    responses(
        (status = 200, description = "Every teacher with lessons in the period", body = ApiResponse<Vec<TeacherInvoice>>),
        (status = 403, description = "Administrators only")
    )
)]
pub async fn all_teacher_invoices(
    State(state): State<ApiState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(params): Query<ListingParams>,
) -> ApiResult<Vec<TeacherInvoice>> {
    let caller = resolve_caller(&state, &user).await?;
    let period = params.range().map_err(api_error)?;
    let invoices = state
        .invoices
        .all_teacher_invoices(&caller, period, params.supervisor_id)
        .await
        .map_err(api_error)?;
    ok(invoices)
}
