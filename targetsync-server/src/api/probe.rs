use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Serialize;

use crate::state::AppState;
use targetsync_core::SyncerState;

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub state: SyncerState,
    pub leading: bool,
}

/// 200 once startup registration is done and the control loop is live.
pub async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    let current = state.syncer_state();
    tracing::debug!("[Probe] ready? {}", current);
    let status = if current.is_ready() { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status, Json(serde_json::json!({ "ready": current.is_ready(), "state": current })))
}

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({"status": "ok"})))
}

pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let current = state.syncer_state();
    Json(StatusResponse { state: current, leading: current == SyncerState::Leading })
}
