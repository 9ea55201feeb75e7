use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use thiserror::Error;

use crate::repository::RepositoryError;

/// Errors surfaced to API clients. Each variant maps to a fixed status code
/// and a fixed message; underlying causes are kept for logging only.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid payment ID")]
    InvalidPaymentId,

    #[error("some payment fields are missing")]
    InvalidPaymentPayload { missing: Vec<String> },

    #[error("payment not found")]
    NotFound,

    #[error("invalid body")]
    InvalidBody(#[source] serde_json::Error),

    #[error("an internal server error occurred")]
    Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidPaymentId
            | ApiError::InvalidPaymentPayload { .. }
            | ApiError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Detail for logs: the wrapped cause or the missing fields.
    pub fn detail(&self) -> Option<String> {
        match self {
            ApiError::InvalidPaymentPayload { missing } => Some(missing.join(", ")),
            ApiError::InvalidBody(e) => Some(e.to_string()),
            ApiError::Internal(e) => Some(e.to_string()),
            _ => None,
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => ApiError::NotFound,
            RepositoryError::Database(e) => ApiError::Internal(Box::new(e)),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "message": self.to_string() });
        (self.status_code(), Json(body)).into_response()
    }
}
