//! Response types for the payroll API.
//!
//! This module defines the error response structures and the mapping
//! from engine errors to HTTP statuses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::bulletin::GenerationError;
use crate::error::EngineError;

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// The calculation phase the failure occurred in, when applicable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            phase: None,
        }
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }
}

/// API error with HTTP status code.
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

fn status_for(error: &EngineError) -> StatusCode {
    match error {
        EngineError::ConfigNotFound { .. }
        | EngineError::ConfigParseError { .. }
        | EngineError::TaxTableIncoherent { .. }
        | EngineError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::NoActiveConstant { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        EngineError::DuplicateSlip { .. }
        | EngineError::ConflictingUpdate { .. }
        | EngineError::PeriodNotOpen { .. }
        | EngineError::PeriodClosed { .. }
        | EngineError::InvalidTransition { .. } => StatusCode::CONFLICT,
        EngineError::InsufficientBalance { .. }
        | EngineError::LoanAlreadySettled { .. }
        | EngineError::Validation { .. } => StatusCode::BAD_REQUEST,
        EngineError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        EngineError::NotFound { .. } => StatusCode::NOT_FOUND,
    }
}

impl From<EngineError> for ApiErrorResponse {
    fn from(error: EngineError) -> Self {
        ApiErrorResponse {
            status: status_for(&error),
            error: ApiError::new(error.code(), error.to_string()),
        }
    }
}

impl From<GenerationError> for ApiErrorResponse {
    fn from(failure: GenerationError) -> Self {
        let mut response: ApiErrorResponse = failure.error.into();
        response.error.phase = failure.phase.map(|p| p.to_string());
        response
    }
}
