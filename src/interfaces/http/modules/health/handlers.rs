//! Health check handler

use std::sync::Arc;
use std::time::Instant;

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::application::CurrencyConverter;
use crate::domain::RepositoryProvider;

#[derive(Clone)]
pub struct HealthState {
    pub repos: Arc<dyn RepositoryProvider>,
    pub converter: Arc<CurrencyConverter>,
    pub started_at: Arc<Instant>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub storage: ComponentHealth,
    pub exchange_rates: RatesHealth,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ComponentHealth {
    pub status: String,
    pub latency_ms: Option<u64>,
}

/// Rate cache state. `cold` is normal before the first conversion and
/// is never reported as unhealthy.
#[derive(Debug, Serialize, ToSchema)]
pub struct RatesHealth {
    pub status: String,
    pub currencies: usize,
    pub expires_in_seconds: Option<u64>,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Storage is unreachable", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let started = Instant::now();
    let storage = match state.repos.users().count().await {
        Ok(_) => ComponentHealth {
            status: "ok".to_string(),
            latency_ms: Some(started.elapsed().as_millis() as u64),
        },
        Err(_) => ComponentHealth {
            status: "error".to_string(),
            latency_ms: None,
        },
    };

    let exchange_rates = match state.converter.cache_status().await {
        Some((currencies, remaining)) => RatesHealth {
            status: "cached".to_string(),
            currencies,
            expires_in_seconds: Some(remaining.as_secs()),
        },
        None => RatesHealth {
            status: "cold".to_string(),
            currencies: 0,
            expires_in_seconds: None,
        },
    };

    let healthy = storage.status == "ok";
    let status = if healthy { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };

    (
        status,
        Json(HealthResponse {
            status: if healthy { "ok" } else { "degraded" }.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: state.started_at.elapsed().as_secs(),
            storage,
            exchange_rates,
        }),
    )
}
