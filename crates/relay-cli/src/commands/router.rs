//! `relay router` - start the routing tier.

use anyhow::{Context, Result};
use relay_core::RelayConfig;
use relay_router::{probe, Database, MySqlDatabase, Router, RouterServer};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub async fn run(config_path: &Path) -> Result<()> {
    let config = RelayConfig::load(config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    config.validate_router()?;

    let topology = Arc::new(config.cluster.topology()?);
    let connect_timeout = Duration::from_secs(config.cluster.connect_timeout_secs);

    let database: Arc<dyn Database> = match &config.cluster.pool {
        Some(pool) => Arc::new(MySqlDatabase::pooled(&topology, connect_timeout, pool)),
        None => Arc::new(MySqlDatabase::new(&topology, connect_timeout)),
    };
    let probe = probe::from_config(&config.router.probe);

    tracing::info!(
        primary = %topology.primary().address(),
        replicas = topology.replicas().len(),
        probe = ?config.router.probe.method,
        pooled = config.cluster.pool.is_some(),
        "Starting router"
    );

    let router = Router::new(topology, probe, database, config.router.probe.timeout());
    RouterServer::new(config.router.bind_address(), Arc::new(router))
        .run(super::shutdown_signal())
        .await?;

    Ok(())
}
