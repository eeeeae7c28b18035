//! Orchestrator errors and their HTTP mapping.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use paral_compiler::CompileError;
use paral_core::wire::ErrorResponse;
use paral_core::ReportError;
use paral_storage::StorageError;
use tracing::error;

/// Result alias for orchestrator operations.
pub type Result<T> = std::result::Result<T, OrchestratorError>;

/// Errors surfaced by the orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    /// Submitted text did not compile
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// Unknown expression or task
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed identifier in a request
    #[error("invalid id: {0}")]
    InvalidId(String),

    /// Report for a task that already reached a terminal state
    #[error("conflict: {0}")]
    Conflict(String),

    /// Worker report that cannot be applied
    #[error(transparent)]
    InvalidReport(#[from] ReportError),

    /// Request body was not valid JSON for the endpoint
    #[error(transparent)]
    Rejected(#[from] JsonRejection),

    /// Store failure
    #[error("storage error: {0}")]
    Storage(StorageError),
}

impl From<StorageError> for OrchestratorError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(what) => Self::NotFound(what),
            StorageError::Conflict(e) => Self::Conflict(e.to_string()),
            other => Self::Storage(other),
        }
    }
}

impl OrchestratorError {
    /// HTTP status this error maps to.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Compile(_) | Self::InvalidReport(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidId(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Rejected(rejection) => rejection.status(),
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for OrchestratorError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("request failed: {}", self);
        }
        (status, Json(ErrorResponse { error: self.to_string() })).into_response()
    }
}
