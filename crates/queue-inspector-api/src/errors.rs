//! Error types for the HTTP service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use queue_inspector_core::{InspectorError, RangeError};
use tracing::{error, warn};

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Request handler errors with HTTP status code mapping
///
/// - `400 Bad Request`: malformed query parameters
/// - `404 Not Found`: the requested sequence number does not exist
/// - `500 Internal Server Error`: no queue or dead-letter queue configured
/// - `502 Bad Gateway`: the messaging backend failed
///
/// The response body is the error text.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("missing seq parameter")]
    MissingSequence,

    #[error("invalid seq parameter")]
    InvalidSequence { value: String },

    #[error(transparent)]
    InvalidRange(#[from] RangeError),

    #[error(transparent)]
    Inspect(#[from] InspectorError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingSequence | Self::InvalidSequence { .. } | Self::InvalidRange(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Inspect(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            Self::Inspect(e) if e.is_configuration() => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Inspect(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, status = status.as_u16(), "Request failed");
        } else {
            warn!(error = %self, status = status.as_u16(), "Request rejected");
        }
        (status, self.to_string()).into_response()
    }
}

/// Service-level errors
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Failed to bind to address {address}: {message}")]
    BindFailed { address: String, message: String },

    #[error("Server failed: {message}")]
    ServerFailed { message: String },
}
