//! HTTP surface of the gatekeeper: `GET /health` and `POST /query`.

use crate::error::GatekeeperError;
use crate::gatekeeper::Gatekeeper;
use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use relay_core::QueryRequest;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Create the HTTP router for the edge tier.
pub fn create_router(gatekeeper: Arc<Gatekeeper>) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/query", post(handle_query))
        .layer(TraceLayer::new_for_http())
        .with_state(gatekeeper)
}

async fn handle_health() -> &'static str {
    "ok"
}

async fn handle_query(
    State(gatekeeper): State<Arc<Gatekeeper>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    // Content-Type is not checked; the body is always read as JSON.
    let payload = QueryRequest::from_body(&body).map_err(|e| e.to_string());

    match gatekeeper.handle(&headers, payload).await {
        Ok(relayed) => relayed.into_response(),
        Err(e) => e.into_response(),
    }
}

/// HTTP server for the edge tier.
pub struct GatekeeperServer {
    address: String,
    gatekeeper: Arc<Gatekeeper>,
}

impl GatekeeperServer {
    pub fn new(address: impl Into<String>, gatekeeper: Arc<Gatekeeper>) -> Self {
        Self {
            address: address.into(),
            gatekeeper,
        }
    }

    /// Serve until `shutdown` resolves.
    pub async fn run<F>(self, shutdown: F) -> Result<(), GatekeeperError>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let app = create_router(self.gatekeeper);

        let listener = tokio::net::TcpListener::bind(&self.address)
            .await
            .map_err(|source| GatekeeperError::BindFailed {
                address: self.address.clone(),
                source,
            })?;

        tracing::info!(address = %self.address, "Gatekeeper listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(GatekeeperError::Serve)
    }
}
