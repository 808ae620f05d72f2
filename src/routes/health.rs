use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use crate::app_state::AppState;

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(utoipa_axum::routes!(health))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthRes {
    pub status: String,
    pub database: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Reports whether the store answers.
#[utoipa::path(
    get,
    path = "/api/health",
    tags = ["Health"],
    responses(
        (status = 200, description = "Store reachable", body = HealthRes),
        (status = 503, description = "Store unreachable", body = HealthRes)
    )
)]
async fn health(State(state): State<AppState>) -> impl IntoResponse {
    match state.stores.health.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthRes {
                status: "healthy".into(),
                database: "connected".into(),
                error: None,
                timestamp: Utc::now(),
            }),
        ),
        Err(err) => {
            warn!("Health check failed: {err}");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthRes {
                    status: "unhealthy".into(),
                    database: "disconnected".into(),
                    error: Some(err.to_string()),
                    timestamp: Utc::now(),
                }),
            )
        }
    }
}
