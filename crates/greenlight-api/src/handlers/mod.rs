//! API handlers.

pub mod analysis;
pub mod export;
pub mod screenplays;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

/// Liveness probe.
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({"status": "ok"}))
}

/// Readiness probe: ready once the canonical set has been loaded.
pub async fn ready(State(state): State<AppState>) -> Result<Json<serde_json::Value>, StatusCode> {
    let catalog = state.catalog.read().await;
    if catalog.loaded_at.is_some() {
        Ok(Json(json!({
            "status": "ready",
            "records": catalog.total_count(),
        })))
    } else {
        Err(StatusCode::SERVICE_UNAVAILABLE)
    }
}
