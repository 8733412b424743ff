//! Error types for the voice PIN gateway.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Session registry errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Phone number already has a pending session: {0}")]
    DuplicatePhone(String),

    #[error("Session not found: {0}")]
    NotFound(String),
}

/// Gateway error types.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Phone number already has a pending session: {0}")]
    DuplicatePhone(String),

    #[error("Session not found: {0}")]
    NotFound(String),

    #[error("Missing {0} parameter")]
    MissingParameter(&'static str),

    #[error("unauthorized")]
    Unauthorized,

    #[error("Markup rendering error: {0}")]
    Markup(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            GatewayError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
            GatewayError::DuplicatePhone(_) => (StatusCode::CONFLICT, "DUPLICATE_PHONE"),
            GatewayError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            GatewayError::MissingParameter(_) => (StatusCode::BAD_REQUEST, "MISSING_PARAMETER"),
            GatewayError::Unauthorized => (StatusCode::FORBIDDEN, "UNAUTHORIZED"),
            GatewayError::Markup(_) => (StatusCode::INTERNAL_SERVER_ERROR, "MARKUP_ERROR"),
            GatewayError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<RegistryError> for GatewayError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::InvalidInput(msg) => GatewayError::InvalidInput(msg),
            RegistryError::DuplicatePhone(phone) => GatewayError::DuplicatePhone(phone),
            RegistryError::NotFound(id) => GatewayError::NotFound(id),
        }
    }
}
