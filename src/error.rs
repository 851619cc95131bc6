//! Uniform API error type.
//!
//! Every handler returns `Result<_, AppError>`. Validation problems map to
//! 400, missing or foreign resources to 404, auth failures to 401, and
//! anything unexpected to a generic 500 with details kept in the logs.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("database error")]
    Database(#[from] rusqlite::Error),

    #[error("internal server error")]
    Internal(String),
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Never leak internals to the client
        let message = match &self {
            AppError::Database(e) => {
                tracing::error!("database error: {}", e);
                "internal server error".to_string()
            }
            AppError::Internal(detail) => {
                tracing::error!("internal error: {}", detail);
                "internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<crate::db::DbLockError> for AppError {
    fn from(_: crate::db::DbLockError) -> Self {
        AppError::Internal("database mutex poisoned".to_string())
    }
}
