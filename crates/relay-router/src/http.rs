//! HTTP surface of the router: `GET /health` and `POST /query`.

use crate::error::RouterError;
use crate::router::Router;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json,
};
use relay_core::{ErrorBody, QueryRequest};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Create the HTTP router for the routing tier.
pub fn create_router(router: Arc<Router>) -> axum::Router {
    axum::Router::new()
        .route("/health", get(handle_health))
        .route("/query", post(handle_query))
        .layer(TraceLayer::new_for_http())
        .with_state(router)
}

async fn handle_health() -> &'static str {
    "ok"
}

// The body is parsed whatever its Content-Type, so clients that omit the
// header are served like any other.
async fn handle_query(State(router): State<Arc<Router>>, body: Bytes) -> Response {
    let request = match QueryRequest::from_body(&body) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!(error = %e, "Rejected malformed query request");
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorBody::new("invalid request").detail(e.to_string())),
            )
                .into_response();
        }
    };

    router.handle(request).await.map(Json).into_response()
}

/// HTTP server for the routing tier.
pub struct RouterServer {
    address: String,
    router: Arc<Router>,
}

impl RouterServer {
    pub fn new(address: impl Into<String>, router: Arc<Router>) -> Self {
        Self {
            address: address.into(),
            router,
        }
    }

    /// Serve until `shutdown` resolves.
    pub async fn run<F>(self, shutdown: F) -> Result<(), RouterError>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let app = create_router(self.router);

        let listener = tokio::net::TcpListener::bind(&self.address)
            .await
            .map_err(|source| RouterError::BindFailed {
                address: self.address.clone(),
                source,
            })?;

        tracing::info!(address = %self.address, "Router listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(RouterError::Serve)
    }
}
