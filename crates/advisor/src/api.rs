//! HTTP API for health checks, Prometheus metrics and the latest scan

use advisor_lib::{
    health::{ComponentStatus, HealthRegistry},
    observability::AdvisorMetrics,
    RecommendationType, ScanReport,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Shared application state
pub struct AppState {
    pub health_registry: HealthRegistry,
    pub metrics: AdvisorMetrics,
    latest: RwLock<Option<ScanReport>>,
}

impl AppState {
    pub fn new(health_registry: HealthRegistry, metrics: AdvisorMetrics) -> Self {
        Self {
            health_registry,
            metrics,
            latest: RwLock::new(None),
        }
    }

    /// Replace the served report
    pub async fn publish(&self, report: ScanReport) {
        *self.latest.write().await = Some(report);
    }

    pub async fn latest(&self) -> Option<ScanReport> {
        self.latest.read().await.clone()
    }
}

/// Error body for API failures
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

fn no_scan_yet() -> Response {
    error_response(StatusCode::SERVICE_UNAVAILABLE, "no scan has completed yet")
}

#[derive(Debug, Default, Deserialize)]
pub struct RecommendationQuery {
    pub namespace: Option<String>,
    #[serde(rename = "type")]
    pub recommendation_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CostQuery {
    pub namespace: Option<String>,
}

/// Returns 200 if healthy or degraded, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy | ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Returns 200 once a scan has completed, 503 before
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        warn!(error = %e, "Failed to encode metrics");
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

async fn list_recommendations(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RecommendationQuery>,
) -> Response {
    let recommendation_type = match query.recommendation_type.as_deref() {
        Some(t) => match RecommendationType::from_str(t) {
            Ok(t) => Some(t),
            Err(e) => return error_response(StatusCode::BAD_REQUEST, e),
        },
        None => None,
    };

    let Some(report) = state.latest().await else {
        return no_scan_yet();
    };

    Json(report.recommendation_list(query.namespace.as_deref(), recommendation_type))
        .into_response()
}

async fn get_recommendation(
    State(state): State<Arc<AppState>>,
    Path((namespace, name)): Path<(String, String)>,
) -> Response {
    let Some(report) = state.latest().await else {
        return no_scan_yet();
    };

    match report.find(&namespace, &name) {
        Some(rec) => Json(rec.clone()).into_response(),
        None => error_response(
            StatusCode::NOT_FOUND,
            format!("no recommendation for {}/{}", namespace, name),
        ),
    }
}

async fn costs(State(state): State<Arc<AppState>>, Query(query): Query<CostQuery>) -> Response {
    let Some(report) = state.latest().await else {
        return no_scan_yet();
    };

    Json(report.cost_analysis(query.namespace.as_deref())).into_response()
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/api/v1/recommendations", get(list_recommendations))
        .route(
            "/api/v1/recommendations/:namespace/:name",
            get(get_recommendation),
        )
        .route("/api/v1/costs", get(costs))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
