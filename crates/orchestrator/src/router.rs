//! HTTP router construction.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::{self, AppState};

/// Build the complete application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(api::health))
        // Public API
        .route("/api/v1/calculate", post(api::calculate))
        .route("/api/v1/expressions", get(api::list_expressions))
        .route("/api/v1/expressions/{id}", get(api::get_expression))
        // Worker API
        .route("/internal/task", get(api::next_task))
        .route("/internal/task/result", post(api::submit_result))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
