//! API error types.
//!
//! Upstream LLM failures are split by HTTP status into auth, rate-limit,
//! and generic variants, each with its own user-facing message. The
//! normalizer is never invoked when any of these fire.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// LLM provider rejected our credentials.
    #[error("Scoring service credentials rejected")]
    UpstreamAuth,

    /// LLM provider throttled us; the upload queue should back off.
    #[error("Scoring service is rate limiting requests")]
    UpstreamRateLimited,

    /// LLM call failed for any other reason.
    #[error("Scoring service failed: {0}")]
    Upstream(String),

    #[error("Storage error: {0}")]
    Storage(#[from] greenlight_storage::StorageError),

    #[error("Firestore error: {0}")]
    Firestore(#[from] greenlight_firestore::FirestoreError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ApiError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Classify an upstream LLM response status.
    pub fn from_upstream_status(status: u16, detail: String) -> Self {
        match status {
            401 | 403 => Self::UpstreamAuth,
            429 => Self::UpstreamRateLimited,
            _ => Self::Upstream(detail),
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::UpstreamAuth | ApiError::UpstreamRateLimited | ApiError::Upstream(_) => {
                StatusCode::BAD_GATEWAY
            }
            ApiError::Internal(_)
            | ApiError::Storage(_)
            | ApiError::Firestore(_)
            | ApiError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show an end user.
    fn user_message(&self, production: bool) -> String {
        match self {
            ApiError::UpstreamAuth => {
                "Analysis is unavailable: the scoring service rejected our credentials. \
                 Contact your administrator."
                    .to_string()
            }
            ApiError::UpstreamRateLimited => {
                "The scoring service is busy. Your upload stays queued; try again shortly."
                    .to_string()
            }
            ApiError::Upstream(_) => {
                "The scoring service could not analyze this screenplay. Please retry."
                    .to_string()
            }
            ApiError::Internal(_)
            | ApiError::Storage(_)
            | ApiError::Firestore(_)
            | ApiError::Json(_)
                if production =>
            {
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
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
        let production =
            std::env::var("ENVIRONMENT").unwrap_or_default().to_lowercase() == "production";
        let body = ErrorResponse {
            detail: self.user_message(production),
        };

        (status, Json(body)).into_response()
    }
}
