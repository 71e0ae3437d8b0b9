//! Errors returned by the resolution workflow and startup.

use actors::CoordinatorError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use combo_core::{ItemId, ValidationError};
use db::DbError;
use llm::GenerationError;
use serde_json::json;
use thiserror::Error;

/// Errors surfaced by [`Resolver`](crate::Resolver) and the generation worker.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(#[from] ValidationError),

    #[error("Item {0} not found")]
    NotFound(ItemId),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Job queue unavailable: {0}")]
    EnqueueFailed(#[from] CoordinatorError),

    #[error("Generation unavailable: {0}")]
    GenerationUnavailable(String),
}

impl From<DbError> for ResolveError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Validation(e) => ResolveError::InvalidArgument(e),
            DbError::ConstraintViolation(msg) => ResolveError::ConstraintViolation(msg),
            DbError::StorageUnavailable(msg) | DbError::Conflict(msg) | DbError::Query(msg) => {
                ResolveError::StorageUnavailable(msg)
            }
        }
    }
}

impl From<GenerationError> for ResolveError {
    fn from(err: GenerationError) -> Self {
        ResolveError::GenerationUnavailable(err.to_string())
    }
}

impl ResolveError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ResolveError::InvalidArgument(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ResolveError::NotFound(_) => StatusCode::NOT_FOUND,
            ResolveError::ConstraintViolation(_) => StatusCode::CONFLICT,
            ResolveError::StorageUnavailable(_)
            | ResolveError::EnqueueFailed(_)
            | ResolveError::GenerationUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Stable machine-readable code for the JSON error body.
    pub fn code(&self) -> &'static str {
        match self {
            ResolveError::InvalidArgument(_) => "invalid_argument",
            ResolveError::NotFound(_) => "not_found",
            ResolveError::ConstraintViolation(_) => "constraint_violation",
            ResolveError::StorageUnavailable(_) => "storage_unavailable",
            ResolveError::EnqueueFailed(_) => "enqueue_failed",
            ResolveError::GenerationUnavailable(_) => "generation_unavailable",
        }
    }
}

impl IntoResponse for ResolveError {
    fn into_response(self) -> Response {
        if self.status_code().is_server_error() {
            tracing::warn!("Request failed: {}", self);
        }
        json_error(self.status_code(), self.code(), self.to_string())
    }
}

/// JSON error body: `{"error": code, "message": message}`.
pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Errors while bringing the application up.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Generation client error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Coordinator error: {0}")]
    Coordinator(#[from] CoordinatorError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_to_http_statuses() {
        let cases = [
            (
                ResolveError::InvalidArgument(ValidationError::IdBelowOne(0)),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (ResolveError::NotFound(ItemId(999)), StatusCode::NOT_FOUND),
            (
                ResolveError::ConstraintViolation("dup".into()),
                StatusCode::CONFLICT,
            ),
            (
                ResolveError::StorageUnavailable("down".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                ResolveError::EnqueueFailed(CoordinatorError::Timeout),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                ResolveError::GenerationUnavailable("down".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.status_code(), status, "{err}");
        }
    }

    #[test]
    fn db_errors_keep_their_class() {
        let err: ResolveError = DbError::ConstraintViolation("pair taken".into()).into();
        assert!(matches!(err, ResolveError::ConstraintViolation(_)));

        let err: ResolveError = DbError::Query("bad".into()).into();
        assert!(matches!(err, ResolveError::StorageUnavailable(_)));

        let err: ResolveError = DbError::Conflict("retries exhausted".into()).into();
        assert_eq!(err.code(), "storage_unavailable");

        let err: ResolveError = DbError::Validation(ValidationError::EmptyText).into();
        assert_eq!(err.code(), "invalid_argument");
    }
}
