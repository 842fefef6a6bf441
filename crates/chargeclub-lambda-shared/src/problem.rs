//! Error responses for Lambda endpoints.
//!
//! Every failed request is answered with a status code and a JSON body of the
//! form `{"error": "<message>"}`. Server-side causes are logged, never echoed.

use http::StatusCode;
use serde_json::{json, Value};
use tracing::{error, warn};

use chargeclub_lib::Error as LibError;

/// Message returned for every server-side failure.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error.";

/// Message returned for unsupported HTTP methods.
pub const METHOD_NOT_ALLOWED_MESSAGE: &str = "Method not allowed.";

/// A request failure ready to be rendered as an API Gateway response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn method_not_allowed() -> Self {
        Self::new(StatusCode::METHOD_NOT_ALLOWED, METHOD_NOT_ALLOWED_MESSAGE)
    }

    pub fn internal_error() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE)
    }

    /// Map a library error to its HTTP form, logging the cause.
    ///
    /// Client errors keep their display message. Server errors are logged
    /// with their cause and answered with [`INTERNAL_ERROR_MESSAGE`].
    pub fn from_lib_error(err: &LibError, request_id: &str) -> Self {
        match err {
            LibError::ChargingPointNotFound { .. } => {
                warn!(request_id = %request_id, error = %err, "charging point not found");
                Self::not_found(err.to_string())
            }
            _ if err.is_client_error() => {
                warn!(request_id = %request_id, error = %err, "rejected request");
                Self::bad_request(err.to_string())
            }
            LibError::RepositoryUnavailable { message } => {
                error!(request_id = %request_id, cause = %message, "charging point store failure");
                Self::internal_error()
            }
            _ => {
                error!(request_id = %request_id, error = %err, "request failed");
                Self::internal_error()
            }
        }
    }

    /// The `{"error": ...}` response body.
    pub fn body(&self) -> Value {
        json!({ "error": self.message })
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.status.as_u16(), self.message)
    }
}

impl std::error::Error for ApiError {}
