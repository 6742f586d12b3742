//! # Application Error
//!
//! Maps domain errors to structured HTTP responses. Each rejected
//! condition keeps its domain message; the status code tells clients
//! whether to fix the request (422), resolve a conflict (409), or
//! authenticate (401/403).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use wrc_core::CoreError;
use wrc_escrow::EscrowError;
use wrc_registry::RegistryError;

/// Application-level error type that maps to HTTP responses.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request conflicts with recorded state (duplicate id, spent
    /// proof, existing pledge).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Request validation or a state precondition failed.
    #[error("validation error: {0}")]
    Validation(String),

    /// The presented signature did not verify.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The caller is not permitted to perform the operation.
    #[error("forbidden: {0}")]
    Forbidden(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = serde_json::json!({
            "error": {
                "code": status.as_u16(),
                "message": self.to_string(),
            }
        });
        (status, axum::Json(body)).into_response()
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            RegistryError::DuplicateWrId { .. }
            | RegistryError::IssuerAlreadyListed { .. }
            | RegistryError::AlreadyPledged { .. }
            | RegistryError::AlreadyAttested { .. }
            | RegistryError::ProofReplayed { .. } => ApiError::Conflict(err.to_string()),
            RegistryError::InvalidSignature(_) => ApiError::Unauthorized(err.to_string()),
            RegistryError::UnauthorizedIssuer { .. } | RegistryError::Unauthorized { .. } => {
                ApiError::Forbidden(err.to_string())
            }
            RegistryError::ProofExpired { .. } | RegistryError::Core(_) => {
                ApiError::Validation(err.to_string())
            }
        }
    }
}

impl From<EscrowError> for ApiError {
    fn from(err: EscrowError) -> Self {
        match err {
            EscrowError::EscrowNotFound(_) => ApiError::NotFound(err.to_string()),
            EscrowError::InvalidState { .. } => ApiError::Conflict(err.to_string()),
            EscrowError::ZeroAmount
            | EscrowError::DeadlineInPast { .. }
            | EscrowError::LenderIsBorrower { .. }
            | EscrowError::NotFunded { .. }
            | EscrowError::MilestoneNotAttested { .. }
            | EscrowError::DeadlineNotPassed { .. }
            | EscrowError::TransferFailed(_) => ApiError::Validation(err.to_string()),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ApiError::Validation(err.to_string())
    }
}
