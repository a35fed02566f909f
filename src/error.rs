use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

use crate::fees::CalculationError;

/// Application error types
#[derive(Debug)]
pub enum AppError {
    /// Request body could not be understood
    BadRequest(String),
    /// Requested resource does not exist
    NotFound(String),
    /// Vehicle type is not in the configured set
    InvalidVehicleType(String),
    /// Fee configuration could not be read
    FeeLookup(String),
    /// Internal server error
    InternalError(String),
}

/// Message returned to callers when infrastructure details must stay internal
const LOOKUP_FAILURE_MESSAGE: &str = "Fee configuration is currently unavailable";
const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            Self::NotFound(msg) => write!(f, "Not found: {}", msg),
            Self::InvalidVehicleType(msg) => write!(f, "{}", msg),
            Self::FeeLookup(msg) => write!(f, "Fee lookup failed: {}", msg),
            Self::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl AppError {
    /// Message safe to show to API callers
    pub fn public_message(&self) -> String {
        match self {
            Self::BadRequest(msg) | Self::NotFound(msg) | Self::InvalidVehicleType(msg) => {
                msg.clone()
            }
            Self::FeeLookup(_) => LOOKUP_FAILURE_MESSAGE.to_string(),
            Self::InternalError(_) => INTERNAL_ERROR_MESSAGE.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            // Unknown vehicle types are reported as 500, not 400
            Self::InvalidVehicleType(_) | Self::FeeLookup(_) | Self::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            Self::FeeLookup(detail) | Self::InternalError(detail) => {
                tracing::error!(error = %detail, "Request failed");
            }
            _ => {
                tracing::debug!(error = %self, "Request rejected");
            }
        }

        let body = Json(json!({ "error": self.public_message() }));
        (self.status(), body).into_response()
    }
}

impl From<CalculationError> for AppError {
    fn from(err: CalculationError) -> Self {
        let message = err.to_string();
        match err {
            CalculationError::InvalidVehicleType { .. } => Self::InvalidVehicleType(message),
            CalculationError::AmountOutOfRange { .. } => Self::BadRequest(message),
            CalculationError::LookupFailure(_) => Self::FeeLookup(message),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::InternalError(err.to_string())
    }
}
