pub mod health;
pub mod metrics;
pub mod resolve;

use axum::routing::{get, post};
use axum::Router;

use crate::app_state::AppState;

/// API routes without the metrics endpoint or middleware layers.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/v1/resolve", post(resolve::resolve_recipe))
        .with_state(state)
}
