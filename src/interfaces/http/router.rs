//! API router with Swagger UI

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::FromRef,
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use super::common::ApiResponse;
use super::middleware::{auth_middleware, AuthState};
use super::modules::health::HealthState;
use super::modules::metrics::{http_metrics_middleware, MetricsState};
use super::modules::request_id::request_id_middleware;
use super::modules::{accounts, auth, directory, health, invoices, lessons, metrics};
use crate::application::{
    AccountService, CurrencyConverter, DirectoryService, InvoiceService, LessonService,
};
use crate::domain::{
    CurrencyTotals, Evaluation, Family, FamilyBreakdown, FamilyInvoice, FamilySummary,
    InvoiceLine, LessonSummaryEntry, LessonsSummary, StudentInvoiceDetail, Student, Supervisor,
    SupervisorInvoice, Teacher, TeacherBreakdown, TeacherInvoice, TeacherSummary, UserRole,
    RepositoryProvider,
};
use crate::shared::DateRange;

/// Everything the handlers need. Per-module states are carved out via
/// `FromRef`.
#[derive(Clone)]
pub struct ApiState {
    pub accounts: Arc<AccountService>,
    pub invoices: Arc<InvoiceService>,
    pub lessons: Arc<LessonService>,
    pub directory: Arc<DirectoryService>,
    pub converter: Arc<CurrencyConverter>,
    pub repos: Arc<dyn RepositoryProvider>,
    pub auth: AuthState,
    pub metrics: PrometheusHandle,
    pub started_at: Arc<Instant>,
}

impl FromRef<ApiState> for AuthState {
    fn from_ref(s: &ApiState) -> Self {
        s.auth.clone()
    }
}

impl FromRef<ApiState> for HealthState {
    fn from_ref(s: &ApiState) -> Self {
        HealthState {
            repos: Arc::clone(&s.repos),
            converter: Arc::clone(&s.converter),
            started_at: Arc::clone(&s.started_at),
        }
    }
}

impl FromRef<ApiState> for MetricsState {
    fn from_ref(s: &ApiState) -> Self {
        MetricsState {
            handle: s.metrics.clone(),
        }
    }
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Token from POST /api/v1/auth/login"))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login,
        auth::current_user,
        accounts::create_account,
        directory::create_student,
        directory::delete_student,
        directory::set_teacher_rate,
        directory::delete_teacher,
        directory::set_family_rate,
        directory::delete_family,
        directory::set_supervisor_rate,
        directory::delete_supervisor,
        lessons::record_lesson,
        lessons::update_lesson,
        lessons::delete_lesson,
        lessons::lessons_summary,
        invoices::family_invoice,
        invoices::teacher_invoice,
        invoices::supervisor_invoice,
        invoices::all_family_invoices,
        invoices::all_teacher_invoices,
    ),
    components(
        schemas(
            ApiResponse<String>,
            DateRange,
            UserRole,
            Evaluation,
            // Auth and accounts
            auth::LoginRequest,
            auth::LoginResponse,
            auth::UserInfo,
            accounts::CreateAccountRequest,
            accounts::ProfileRequest,
            accounts::AccountResponse,
            accounts::ProfileDto,
            // Directory
            directory::CreateStudentRequest,
            directory::RateRequest,
            Student,
            Teacher,
            Family,
            Supervisor,
            // Lessons
            lessons::RecordLessonRequest,
            lessons::UpdateLessonRequest,
            lessons::LessonDto,
            LessonsSummary,
            LessonSummaryEntry,
            TeacherSummary,
            FamilySummary,
            CurrencyTotals,
            // Invoices
            InvoiceLine,
            StudentInvoiceDetail,
            FamilyInvoice,
            TeacherInvoice,
            SupervisorInvoice,
            FamilyBreakdown,
            TeacherBreakdown,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and storage reachability"),
        (name = "Authentication", description = "Login (JWT) and the current account"),
        (name = "Accounts", description = "Account creation with a linked teacher, family or supervisor"),
        (name = "Directory", description = "Students, current hourly rates, soft deletes"),
        (name = "Lessons", description = "Lesson recording and the role-filtered summary"),
        (name = "Invoices", description = "Family, teacher and supervisor invoices computed on demand"),
    ),
    info(
        title = "Tutoring Billing API",
        version = "1.0.0",
        description = "Lessons, rates and multi-currency invoices for a tutoring business",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

/// Create the API router with all routes
pub fn create_api_router(state: ApiState) -> Router {
    let protected = Router::new()
        .route("/auth/me", get(auth::current_user))
        .route("/accounts", post(accounts::create_account))
        // Directory
        .route("/students", post(directory::create_student))
        .route("/students/{id}", delete(directory::delete_student))
        .route("/teachers/{id}", delete(directory::delete_teacher))
        .route("/teachers/{id}/rate", put(directory::set_teacher_rate))
        .route("/families/{id}", delete(directory::delete_family))
        .route("/families/{id}/rate", put(directory::set_family_rate))
        .route("/supervisors/{id}", delete(directory::delete_supervisor))
        .route("/supervisors/{id}/rate", put(directory::set_supervisor_rate))
        // Lessons
        .route("/lessons", post(lessons::record_lesson))
        .route("/lessons/summary", get(lessons::lessons_summary))
        .route(
            "/lessons/{id}",
            put(lessons::update_lesson).delete(lessons::delete_lesson),
        )
        // Invoices
        .route("/invoices/families", get(invoices::all_family_invoices))
        .route("/invoices/families/{id}", get(invoices::family_invoice))
        .route("/invoices/teachers", get(invoices::all_teacher_invoices))
        .route("/invoices/teachers/{id}", get(invoices::teacher_invoice))
        .route("/invoices/supervisors/{id}", get(invoices::supervisor_invoice))
        .route_layer(middleware::from_fn_with_state(
            state.auth.clone(),
            auth_middleware,
        ));

    let api = Router::new()
        .route("/auth/login", post(auth::login))
        .merge(protected);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health_check))
        .route("/metrics", get(metrics::prometheus_metrics))
        .nest("/api/v1", api)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn(http_metrics_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::application::billing::currency::tests::ScriptedProvider;
    use crate::application::{BootstrapAdmin, ConverterSettings};
    use crate::infrastructure::crypto::jwt::JwtConfig;
    use crate::infrastructure::storage::InMemoryRepositoryProvider;

    async fn app() -> Router {
        let repos: Arc<dyn RepositoryProvider> = Arc::new(InMemoryRepositoryProvider::new());
        let converter = Arc::new(CurrencyConverter::new(
            Arc::new(ScriptedProvider::serving(&[("EGP", "50")])),
            ConverterSettings::default(),
        ));
        let jwt_config = JwtConfig::new("router-test-secret", 1);
        let accounts = Arc::new(AccountService::new(repos.clone(), jwt_config.clone(), 4));
        accounts
            .bootstrap_super_admin(&BootstrapAdmin {
                username: "root".into(),
                email: "root@example.com".into(),
                password: "root-password".into(),
            })
            .await
            .unwrap();

        create_api_router(ApiState {
            accounts,
            invoices: Arc::new(InvoiceService::new(repos.clone(), converter.clone())),
            lessons: Arc::new(LessonService::new(repos.clone(), converter.clone())),
            directory: Arc::new(DirectoryService::new(repos.clone())),
            converter,
            repos,
            auth: AuthState { jwt_config },
            metrics: PrometheusBuilder::new().build_recorder().handle(),
            started_at: Arc::new(Instant::now()),
        })
    }

    async fn call(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let req = match body {
            Some(body) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn login(app: &Router, username: &str, password: &str) -> String {
        let (status, body) = call(
            app,
            "POST",
            "/api/v1/auth/login",
            None,
            Some(json!({ "username": username, "password": password })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["data"]["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn health_is_public() {
        let app = app().await;
        let (status, body) = call(&app, "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["exchange_rates"]["status"], "cold");
    }

    #[tokio::test]
    async fn invoices_require_a_token() {
        let app = app().await;
        let (status, body) = call(&app, "GET", "/api/v1/invoices/families", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn lesson_to_invoice_flow() {
        let app = app().await;
        let root = login(&app, "root", "root-password").await;

        let (status, teacher) = call(
            &app,
            "POST",
            "/api/v1/accounts",
            Some(&root),
            Some(json!({
                "username": "salma",
                "email": "salma@example.com",
                "password": "teacher-password",
                "role": "teacher",
                "profile": { "name": "Salma", "hourlyRate": "10", "currency": "USD" }
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{teacher}");
        let teacher_id = teacher["data"]["profile"]["id"].as_i64().unwrap();

        let (status, family) = call(
            &app,
            "POST",
            "/api/v1/accounts",
            Some(&root),
            Some(json!({
                "username": "haddad",
                "email": "haddad@example.com",
                "password": "family-password",
                "role": "family",
                "profile": { "name": "Haddad", "hourlyRate": "1000", "currency": "EGP" }
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{family}");
        let family_id = family["data"]["profile"]["id"].as_i64().unwrap();

        let (status, student) = call(
            &app,
            "POST",
            "/api/v1/students",
            Some(&root),
            Some(json!({ "name": "Layla", "familyId": family_id, "teacherId": teacher_id })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{student}");
        let student_id = student["data"]["id"].as_i64().unwrap();

        let salma = login(&app, "salma", "teacher-password").await;
        let (status, lesson) = call(
            &app,
            "POST",
            "/api/v1/lessons",
            Some(&salma),
            Some(json!({
                "studentId": student_id,
                "date": "2024-03-05T16:00:00Z",
                "durationMinutes": 90,
                "evaluation": "Excellent"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{lesson}");
        // 10 USD at 50 EGP per USD
        assert_eq!(lesson["data"]["teacherHourlyRate"], "500.000");

        let family_token = login(&app, "haddad", "family-password").await;
        let uri = format!("/api/v1/invoices/families/{family_id}?from=2024-03-01&to=2024-03-31");
        let (status, invoice) = call(&app, "GET", &uri, Some(&family_token), None).await;
        assert_eq!(status, StatusCode::OK, "{invoice}");
        assert_eq!(invoice["data"]["currency"], "EGP");
        assert_eq!(invoice["data"]["totalLessons"], 1);
        assert_eq!(invoice["data"]["totalAmount"], "1500.000");

        // A family may not read another family's invoice nor list all.
        let (status, _) = call(&app, "GET", "/api/v1/invoices/families?from=2024-03-01&to=2024-03-31", Some(&family_token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let uri = format!("/api/v1/invoices/teachers/{teacher_id}?from=2024-03-01&to=2024-03-31");
        let (status, earnings) = call(&app, "GET", &uri, Some(&salma), None).await;
        assert_eq!(status, StatusCode::OK, "{earnings}");
        assert_eq!(earnings["data"]["currency"], "USD");
        assert_eq!(earnings["data"]["totalEarnings"], "15.000");
    }

    #[tokio::test]
    async fn reversed_period_is_bad_request() {
        let app = app().await;
        let root = login(&app, "root", "root-password").await;
        let (status, _) = call(
            &app,
            "GET",
            "/api/v1/lessons/summary?from=2024-03-31&to=2024-03-01",
            Some(&root),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn invalid_body_is_unprocessable() {
        let app = app().await;
        let root = login(&app, "root", "root-password").await;
        let (status, _) = call(
            &app,
            "POST",
            "/api/v1/students",
            Some(&root),
            Some(json!({ "name": "", "familyId": 1, "teacherId": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}
