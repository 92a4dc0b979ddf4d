//! Error types for the gatekeeper crate.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use relay_core::ErrorBody;
use thiserror::Error;

/// Errors that can occur in the gatekeeper.
#[derive(Debug, Error)]
pub enum GatekeeperError {
    /// Failed to bind to the listen address.
    #[error("failed to bind to {address}: {source}")]
    BindFailed {
        address: String,
        source: std::io::Error,
    },

    /// The HTTP server stopped with an I/O error.
    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),

    /// The forwarding client could not be built.
    #[error("failed to build router client: {0}")]
    Client(#[source] reqwest::Error),

    /// `X-API-Key` missing or wrong.
    #[error("unauthorized")]
    Unauthorized,

    /// The statement matched the deny list.
    #[error("blocked by gatekeeper policy: {reason}")]
    PolicyViolation { reason: String },

    /// The body is not a valid query request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The router could not be reached or did not answer in time.
    #[error("router unavailable: {message}")]
    UpstreamUnavailable { request_id: String, message: String },
}

impl IntoResponse for GatekeeperError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            GatekeeperError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, ErrorBody::new("unauthorized"))
            }
            GatekeeperError::PolicyViolation { .. } => (
                StatusCode::BAD_REQUEST,
                ErrorBody::new("blocked by gatekeeper policy"),
            ),
            GatekeeperError::InvalidRequest(detail) => (
                StatusCode::BAD_REQUEST,
                ErrorBody::new("invalid request").detail(detail),
            ),
            GatekeeperError::UpstreamUnavailable {
                request_id,
                message,
            } => (
                StatusCode::BAD_GATEWAY,
                ErrorBody::new("upstream unavailable")
                    .detail(message)
                    .request_id(request_id)
                    .target("router"),
            ),
            other => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody::new("internal error").detail(other.to_string()),
            ),
        };

        (status, Json(body)).into_response()
    }
}
