use axum::body::{to_bytes, Body};
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Json};
use tokio::sync::watch;
use tower::ServiceExt;

use super::probe::{health, ready, status};
use super::router;
use crate::state::AppState;
use targetsync_core::SyncerState;

fn app_state(initial: SyncerState) -> (AppState, watch::Sender<SyncerState>) {
    let (tx, rx) = watch::channel(initial);
    (AppState::new(rx), tx)
}

#[tokio::test]
async fn test_not_ready_while_registering() {
    let (state, _tx) = app_state(SyncerState::Registering);
    let resp = ready(State(state)).await.into_response();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_ready_follows_syncer_state() {
    let (state, tx) = app_state(SyncerState::Registering);

    tx.send_replace(SyncerState::Idle);
    assert_eq!(ready(State(state.clone())).await.into_response().status(), StatusCode::OK);

    tx.send_replace(SyncerState::Leading);
    assert_eq!(ready(State(state.clone())).await.into_response().status(), StatusCode::OK);

    tx.send_replace(SyncerState::Stopped);
    assert_eq!(
        ready(State(state)).await.into_response().status(),
        StatusCode::SERVICE_UNAVAILABLE
    );
}

#[tokio::test]
async fn test_status_reports_leadership() {
    let (state, tx) = app_state(SyncerState::Idle);
    let Json(resp) = status(State(state.clone())).await;
    assert!(!resp.leading);

    tx.send_replace(SyncerState::Leading);
    let Json(resp) = status(State(state)).await;
    assert!(resp.leading);
    assert_eq!(resp.state, SyncerState::Leading);
}

#[tokio::test]
async fn test_health_is_always_ok() {
    assert_eq!(health().await.into_response().status(), StatusCode::OK);
}

#[tokio::test]
async fn test_router_serves_status_json() {
    let (state, _tx) = app_state(SyncerState::Leading);
    let resp = router(state)
        .oneshot(Request::builder().uri("/status").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = to_bytes(resp.into_body(), 1024).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json, serde_json::json!({"state": "leading", "leading": true}));
}
