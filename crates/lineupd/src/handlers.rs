//! Request handlers.

use axum::extract::State;
use axum::{Form, Json};
use chrono::Utc;
use lineup_core::{Classification, ImageInput};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

/// Health response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub labels: usize,
    pub timestamp: String,
}

/// Health check endpoint (liveness probe).
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        labels: state.pipeline.labels().len(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Classification request: a base64 image payload, form-encoded under
/// `image_data`.
#[derive(Deserialize)]
pub struct ClassifyRequest {
    pub image_data: Option<String>,
}

/// Classify every valid face in the posted image.
///
/// The pipeline is CPU-bound and synchronous, so it runs on the blocking
/// pool rather than stalling the async workers.
pub async fn classify_image(
    State(state): State<AppState>,
    Form(request): Form<ClassifyRequest>,
) -> Result<Json<Vec<Classification>>, ApiError> {
    let input = ImageInput::from_parts(request.image_data, None)?;

    let pipeline = state.pipeline.clone();
    let results = tokio::task::spawn_blocking(move || pipeline.classify(&input))
        .await
        .map_err(|e| ApiError::Internal(format!("classification task panicked: {e}")))??;

    tracing::debug!(results = results.len(), "classification complete");
    Ok(Json(results))
}
