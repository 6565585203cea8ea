//! Daemon error type and HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use lineup_core::PipelineError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            // Bad input is the caller's fault; everything else is ours.
            ApiError::Pipeline(PipelineError::Decode(_))
            | ApiError::Pipeline(PipelineError::InvalidInput) => StatusCode::BAD_REQUEST,
            ApiError::Pipeline(PipelineError::ClassIndex(_)) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }
        let body = ErrorResponse {
            detail: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    fn decode_error() -> PipelineError {
        PipelineError::Decode(lineup_core::decode::from_base64("!!!").unwrap_err())
    }

    #[test]
    fn test_bad_input_maps_to_400() {
        assert_eq!(
            ApiError::from(decode_error()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(PipelineError::InvalidInput).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_internal_maps_to_500() {
        assert_eq!(
            ApiError::Internal("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::from(PipelineError::ClassIndex(7)).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
