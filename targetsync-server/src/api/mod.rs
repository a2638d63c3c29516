//! Probe routes for orchestrators and operators.

mod probe;

#[cfg(test)]
mod probe_tests;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ready", get(probe::ready))
        .route("/health", get(probe::health))
        .route("/healthz", get(probe::health))
        .route("/status", get(probe::status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
