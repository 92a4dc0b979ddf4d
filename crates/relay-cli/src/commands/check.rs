//! `relay check` - validate configuration.
//!
//! Loads the file, runs structural validation, resolves credentials for both
//! tiers and prints the resolved topology. Secrets are never printed.

use anyhow::{Context, Result};
use relay_core::{RelayConfig, Topology};
use std::path::Path;

pub fn run(config_path: &Path) -> Result<()> {
    println!("Checking {}", config_path.display());

    let config = RelayConfig::load(config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    let topology = check(&config)?;

    println!("{}", render(&config, &topology));
    println!("All checks passed.");
    Ok(())
}

/// Validate and resolve everything both tiers need at startup.
pub fn check(config: &RelayConfig) -> Result<Topology> {
    config.validate()?;
    let topology = config.cluster.topology().context("resolving cluster credentials")?;
    config
        .gatekeeper
        .resolve_api_key()
        .context("resolving gatekeeper API key")?;
    Ok(topology)
}

fn render(config: &RelayConfig, topology: &Topology) -> String {
    let mut lines = vec![
        format!("database:   {}", topology.database()),
        format!(
            "primary:    {} ({}@{})",
            topology.primary().label(),
            topology.primary().username,
            topology.primary().address()
        ),
    ];
    for replica in topology.replicas() {
        lines.push(format!(
            "replica:    {} ({}@{})",
            replica.label(),
            replica.username,
            replica.address()
        ));
    }
    lines.push(format!(
        "router:     {} (probe {:?}, {} ms)",
        config.router.bind_address(),
        config.router.probe.method,
        config.router.probe.timeout_ms
    ));
    lines.push(format!(
        "gatekeeper: {} -> {}",
        config.gatekeeper.bind_address(),
        config.gatekeeper.router_url
    ));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
cluster:
  primary:
    host: 172.31.26.162
    password: AppPass123!
  replicas:
    - host: 172.31.30.100
      password: AppPass123!
gatekeeper:
  router_url: http://172.31.30.140:5000/query
  api_key: MY_SECRET_KEY_123
"#;

    #[test]
    fn test_check_and_render_hide_secrets() {
        let config = RelayConfig::from_yaml(CONFIG).unwrap();
        let topology = check(&config).unwrap();
        let rendered = render(&config, &topology);

        assert!(rendered.contains("manager (app@172.31.26.162:3306)"));
        assert!(rendered.contains("worker@172.31.30.100"));
        assert!(!rendered.contains("AppPass123!"));
        assert!(!rendered.contains("MY_SECRET_KEY_123"));
    }

    #[test]
    fn test_check_requires_api_key() {
        let raw = CONFIG.replace("  api_key: MY_SECRET_KEY_123\n", "");
        let config = RelayConfig::from_yaml(&raw).unwrap();
        assert!(check(&config).is_err());
    }

    #[test]
    fn test_run_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relay.yaml");
        std::fs::write(&path, CONFIG).unwrap();
        run(&path).unwrap();
    }
}
