use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthStatus {
    pub status: u16,
    pub message: String,
    pub failed: Vec<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

#[instrument(skip(state))]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthStatus>) {
    let report = state.health.check().await;
    let (status, message) = if report.is_healthy() {
        (StatusCode::OK, "Healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "Service Unavailable")
    };
    (
        status,
        Json(HealthStatus {
            status: status.as_u16(),
            message: message.into(),
            failed: report.failed(),
        }),
    )
}
