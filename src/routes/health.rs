use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::app::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub services: ServiceHealth,
}

#[derive(Serialize)]
pub struct ServiceHealth {
    pub database: String,
    pub scoring_service: String,
}

/// Health check endpoint - public
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<HealthResponse>) {
    let (db_ok, scoring_result) = tokio::join!(
        crate::db::health_check(&state.db),
        state.scoring_client.health_check(),
    );

    let db_status = if db_ok { "ok" } else { "error" };
    let scoring_status = if scoring_result.is_ok() { "ok" } else { "error" };

    // The database is critical; the scoring service only degrades us
    // because the local fallback scorer keeps assignments working
    let status = if db_ok && scoring_result.is_ok() {
        "healthy"
    } else if db_ok {
        "degraded"
    } else {
        "unhealthy"
    };

    let status_code = if status == "unhealthy" {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    (
        status_code,
        Json(HealthResponse {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            services: ServiceHealth {
                database: db_status.to_string(),
                scoring_service: scoring_status.to_string(),
            },
        }),
    )
}
