//! HTTP surface: the gateway webhook and a health probe.

pub mod response;

use crate::application::reconciler::{CallbackOutcome, CallbackReconciler};
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use response::ApiError;
use std::sync::Arc;

pub const CALLBACK_PATH: &str = "/webhooks/intouch";

#[derive(Clone)]
pub struct AppState {
    pub reconciler: Arc<CallbackReconciler>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(CALLBACK_PATH, post(intouch_callback))
        .with_state(state)
}

/// Takes the raw body so that JSON and shape errors are reported with the
/// gateway's error contract instead of axum's extractor rejection.
pub async fn intouch_callback(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<CallbackOutcome, ApiError> {
    Ok(state.reconciler.handle_callback(&body).await?)
}

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
