//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps validation errors from circle-core and fetch errors from
//! circle-chain to HTTP status codes. Every error response body is
//! `{"error": "<message>"}`. Internal error details are never exposed.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use circle_chain::FetchError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// Human-readable error message.
    pub error: String,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// A required request field is absent (400). Checked before any chain read.
    #[error("missing required parameter: {0}")]
    MissingParameter(String),

    /// Request body could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// A field is present but malformed (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// The circle does not exist or rejected the month (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// A contract read failed (503 when transient, 502 when the node
    /// answered with unusable data).
    #[error("upstream error: {message}")]
    Upstream { message: String, transient: bool },

    /// The route needs a contract address the deployment was not given (503).
    #[error("not configured: {0}")]
    NotConfigured(String),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status code for this error.
    fn status(&self) -> StatusCode {
        match self {
            Self::MissingParameter(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Upstream { transient: true, .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Upstream { transient: false, .. } => StatusCode::BAD_GATEWAY,
            Self::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        match &self {
            Self::Internal(_) => tracing::error!(error = %self, "internal server error"),
            Self::Upstream { .. } => tracing::warn!(error = %self, "contract read failed"),
            _ => {}
        }

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

/// Convert circle-core validation errors to API errors.
impl From<circle_core::ValidationError> for AppError {
    fn from(err: circle_core::ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Convert circle-chain fetch errors to API errors.
impl From<FetchError> for AppError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::NotFound { .. } => Self::NotFound(err.to_string()),
            FetchError::TransientReadFailure { .. } => Self::Upstream {
                message: err.to_string(),
                transient: true,
            },
            FetchError::InvalidResponse { .. } => Self::Upstream {
                message: err.to_string(),
                transient: false,
            },
            FetchError::TaskFailed(_) => Self::Internal(err.to_string()),
            FetchError::NotConfigured(var) => Self::NotConfigured(format!("set {var} to enable this route")),
        }
    }
}

impl From<crate::chat::ChatError> for AppError {
    fn from(err: crate::chat::ChatError) -> Self {
        match err {
            crate::chat::ChatError::EmptyText => Self::Validation(err.to_string()),
            crate::chat::ChatError::Store(_) => Self::Internal(err.to_string()),
        }
    }
}
