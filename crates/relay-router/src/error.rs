//! Error types for the router crate.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use relay_core::ErrorBody;
use thiserror::Error;

/// Errors that can occur in the router.
///
/// Probe failures are not represented here: the prober converts them into a
/// sentinel latency and they never reach the caller.
#[derive(Debug, Error)]
pub enum RouterError {
    /// Failed to bind to the listen address.
    #[error("failed to bind to {address}: {source}")]
    BindFailed {
        address: String,
        source: std::io::Error,
    },

    /// The HTTP server stopped with an I/O error.
    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),

    /// The target node could not be reached.
    #[error("node {target} unavailable: {message}")]
    UpstreamUnavailable { target: String, message: String },

    /// The target node rejected or failed the statement.
    #[error("execution failed on {target}: {message}")]
    Execution { target: String, message: String },
}

impl RouterError {
    /// Node the failing request was dispatched to, if any.
    pub fn target(&self) -> Option<&str> {
        match self {
            RouterError::UpstreamUnavailable { target, .. }
            | RouterError::Execution { target, .. } => Some(target),
            _ => None,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            RouterError::UpstreamUnavailable { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Response body for a failed request, tagged with its correlation id.
    pub fn to_body(&self, request_id: &str) -> ErrorBody {
        let (error, detail) = match self {
            RouterError::UpstreamUnavailable { message, .. } => ("upstream unavailable", message),
            RouterError::Execution { message, .. } => ("execution failed", message),
            _ => return ErrorBody::new("internal error").request_id(request_id),
        };
        let body = ErrorBody::new(error).detail(detail.as_str()).request_id(request_id);
        match self.target() {
            Some(target) => body.target(target),
            None => body,
        }
    }
}

/// A failed `/query` call, tagged with the request it belongs to.
#[derive(Debug, Error)]
#[error("request {request_id}: {source}")]
pub struct RequestError {
    pub request_id: String,
    #[source]
    pub source: RouterError,
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        (self.source.status(), Json(self.source.to_body(&self.request_id))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_error_body() {
        let err = RouterError::Execution {
            target: "manager".to_string(),
            message: "Table 'sakila.nope' doesn't exist".to_string(),
        };
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = err.to_body("r1");
        assert_eq!(body.error, "execution failed");
        assert_eq!(body.target.as_deref(), Some("manager"));
        assert_eq!(body.request_id.as_deref(), Some("r1"));
        assert_eq!(body.detail.as_deref(), Some("Table 'sakila.nope' doesn't exist"));
    }

    #[test]
    fn test_unavailable_maps_to_bad_gateway() {
        let err = RouterError::UpstreamUnavailable {
            target: "worker@10.0.0.2".to_string(),
            message: "connection refused".to_string(),
        };
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.to_body("r2").target.as_deref(), Some("worker@10.0.0.2"));
    }
}
