//! Health check handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::collections::BTreeMap;
use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct ApiInfoResponse {
    pub name: String,
    pub version: &'static str,
    pub status: String,
    pub endpoints: BTreeMap<&'static str, &'static str>,
}

#[derive(Serialize)]
pub struct ReadyResponse {
    pub status: String,
    pub checks: HealthChecks,
}

#[derive(Serialize)]
pub struct HealthChecks {
    pub database: CheckResult,
    pub cache: CheckResult,
}

#[derive(Serialize)]
pub struct CheckResult {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Liveness probe - always returns healthy if server is running
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: paperscope_common::VERSION,
    })
}

/// Service name, version and a map of the public routes
pub async fn api_info(State(state): State<AppState>) -> Json<ApiInfoResponse> {
    let endpoints = BTreeMap::from([
        ("register", "/api/auth/register"),
        ("login", "/api/auth/login"),
        ("me", "/api/auth/me"),
        ("api_keys", "/api/keys"),
        ("wishlist", "/api/wishlist"),
        ("search", "/api/search"),
        ("quick_search", "/api/quick-search"),
        ("highly_cited", "/api/highly-cited"),
        ("stats", "/api/stats"),
        ("export", "/api/export/{format}"),
        ("author_search", "/api/author/{name}"),
        ("affiliation_search", "/api/affiliation/{institution}"),
        ("pdf_link", "/api/pdf-link/{doi}"),
        ("download_info", "/api/download-info/{eid}"),
        ("health", "/health"),
        ("ready", "/ready"),
        ("metrics", "/metrics"),
    ]);

    Json(ApiInfoResponse {
        name: state.config.observability.service_name.clone(),
        version: paperscope_common::VERSION,
        status: "running".to_string(),
        endpoints,
    })
}

/// Readiness probe. The cache never blocks readiness since it falls back to memory.
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let start = std::time::Instant::now();

    let db_check = match state.db.ping().await {
        Ok(_) => CheckResult {
            status: "up".to_string(),
            latency_ms: Some(start.elapsed().as_millis() as u64),
            backend: None,
            error: None,
        },
        Err(e) => CheckResult {
            status: "down".to_string(),
            latency_ms: None,
            backend: None,
            error: Some(e.to_string()),
        },
    };

    let cache_check = CheckResult {
        status: "up".to_string(),
        latency_ms: None,
        backend: Some(state.cache.backend().to_string()),
        error: None,
    };

    let all_healthy = db_check.status == "up";
    let status = if all_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ReadyResponse {
            status: if all_healthy { "ready" } else { "not_ready" }.to_string(),
            checks: HealthChecks {
                database: db_check,
                cache: cache_check,
            },
        }),
    )
}

/// Prometheus text exposition
pub async fn metrics(State(state): State<AppState>) -> String {
    state
        .metrics
        .as_ref()
        .map(|handle| handle.render())
        .unwrap_or_default()
}
