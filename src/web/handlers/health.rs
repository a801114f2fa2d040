//! Health check handler.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use crate::web::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub store: &'static str,
    pub uptime_seconds: i64,
}

/// Liveness plus a cheap store reachability probe.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let store = match state.records.fetch_after(0, 1).await {
        Ok(_) => "reachable",
        Err(_) => "unreachable",
    };

    Json(HealthResponse {
        status: "ok",
        store,
        uptime_seconds: (Utc::now() - state.started_at).num_seconds(),
    })
}
