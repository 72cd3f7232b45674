//! Tracker error types with HTTP status code mapping.
//!
//! [`TrackerError`] is the central error type for the service. Each variant
//! maps to a specific HTTP status code and a single-field JSON error body.
//! Store failures are logged at the service boundary and only a generic
//! message reaches the client.

use axum::http::{HeaderValue, StatusCode};
use axum::http::header::RETRY_AFTER;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::persistence::StoreError;

/// Message returned to clients for every 5xx response.
pub const GENERIC_SERVER_ERROR: &str = "internal server error";

/// JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// { "error": "walletAddress is required" }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}

/// Server-side error enum with HTTP status code mapping.
///
/// | Variant            | HTTP Status               |
/// |--------------------|---------------------------|
/// | `InvalidInput`     | 400 Bad Request           |
/// | `RateLimited`      | 429 Too Many Requests     |
/// | `StoreUnavailable` | 500 Internal Server Error |
/// | `Internal`         | 500 Internal Server Error |
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// Missing or malformed request parameter.
    #[error("{0}")]
    InvalidInput(String),

    /// The backing store rejected or failed the call.
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    /// Client exceeded rate limit.
    #[error("rate limit exceeded; retry after {retry_after_ms} ms")]
    RateLimited {
        /// Milliseconds until the client may retry.
        retry_after_ms: u64,
    },

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl TrackerError {
    /// Shorthand for a missing required parameter.
    #[must_use]
    pub fn missing(field: &str) -> Self {
        Self::InvalidInput(format!("{field} is required"))
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::StoreUnavailable(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the message exposed to clients.
    ///
    /// Server-side failures never leak their cause.
    #[must_use]
    pub fn public_message(&self) -> String {
        if self.status_code().is_server_error() {
            GENERIC_SERVER_ERROR.to_string()
        } else {
            self.to_string()
        }
    }
}

impl IntoResponse for TrackerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.public_message(),
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        if let Self::RateLimited { retry_after_ms } = self {
            let secs = retry_after_ms.div_ceil(1000).max(1);
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}
