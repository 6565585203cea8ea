//! Router assembly.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::handlers::{classify_image, health};
use crate::state::AppState;

/// Build the daemon router. CORS is wide open: the endpoint serves
/// browser frontends on other origins and carries no credentials.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/classify_image", post(classify_image))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
