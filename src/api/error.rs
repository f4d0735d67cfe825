//! API error types with structured JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::error::AnalysisError;

/// Error response body: a single human-readable detail string.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, detail),
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, detail)
            }
        };

        (status, Json(ErrorBody { detail })).into_response()
    }
}

impl From<AnalysisError> for ApiError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::InvalidArea(_)
            | AnalysisError::InvalidLatitude(_)
            | AnalysisError::InvalidLongitude(_)
            | AnalysisError::NoImagery { .. }
            | AnalysisError::DegenerateAoi => ApiError::BadRequest(err.to_string()),
            AnalysisError::Backend(e) => ApiError::Internal(format!("Imagery backend error: {e}")),
        }
    }
}
