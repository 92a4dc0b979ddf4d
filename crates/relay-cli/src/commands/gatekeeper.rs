//! `relay gatekeeper` - start the edge tier.

use anyhow::{Context, Result};
use relay_core::RelayConfig;
use relay_gatekeeper::{ApiKey, Gatekeeper, GatekeeperServer, RouterClient};
use relay_policy::DenyList;
use std::path::Path;
use std::sync::Arc;

pub async fn run(config_path: &Path) -> Result<()> {
    let config = RelayConfig::load(config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    config.validate_gatekeeper()?;

    let settings = &config.gatekeeper;
    let api_key = ApiKey::new(settings.resolve_api_key()?);
    let client = RouterClient::new(settings.router_url.clone(), settings.forward_timeout())?;

    tracing::info!(router = %settings.router_url, "Starting gatekeeper");

    let gatekeeper = Gatekeeper::new(api_key, DenyList::default(), client);
    GatekeeperServer::new(settings.bind_address(), Arc::new(gatekeeper))
        .run(super::shutdown_signal())
        .await?;

    Ok(())
}
