use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::AppState;

/// Health check response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    status: String,
    version: String,
    timestamp: chrono::DateTime<chrono::Utc>,
    checks: HealthChecks,
}

#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthChecks {
    database: String,
    environment: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    missing_env_vars: Vec<String>,
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses(
        (status = 200, description = "Server is healthy", body = HealthResponse),
        (status = 503, description = "Server is degraded or unhealthy", body = HealthResponse)
    )
)]
pub async fn check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let version = env!("CARGO_PKG_VERSION").to_string();
    let timestamp = chrono::Utc::now();

    if let Err(e) = state.store.health_check().await {
        tracing::error!("Health check failed: {:#}", e);
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "unhealthy".to_string(),
                version,
                timestamp,
                checks: HealthChecks {
                    database: "disconnected".to_string(),
                    environment: "unknown".to_string(),
                    missing_env_vars: Vec::new(),
                },
            }),
        );
    }

    let missing: Vec<String> = state
        .config
        .missing_integrations()
        .into_iter()
        .map(str::to_string)
        .collect();
    let (status, code, environment) = if missing.is_empty() {
        ("healthy", StatusCode::OK, "configured")
    } else {
        ("degraded", StatusCode::SERVICE_UNAVAILABLE, "missing_variables")
    };

    (
        code,
        Json(HealthResponse {
            status: status.to_string(),
            version,
            timestamp,
            checks: HealthChecks {
                database: "connected".to_string(),
                environment: environment.to_string(),
                missing_env_vars: missing,
            },
        }),
    )
}
