//! CLI command implementations for the relay binary.

pub mod bench;
pub mod check;
pub mod gatekeeper;
pub mod router;

/// Resolves on Ctrl-C so servers can drain in-flight requests.
pub(crate) async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
