//! Configuration types for the relay services.
//!
//! Everything is loaded from a single YAML file (`relay.yaml` by default) into a
//! [`RelayConfig`]. The binary validates it once at startup and hands the resolved
//! values to the router and gatekeeper; neither service reads the environment
//! while handling requests.
//!
//! ```yaml
//! cluster:
//!   database: sakila
//!   primary:
//!     host: 172.31.26.162
//!     username: app
//!     password_env: RELAY_DB_PASSWORD
//!   replicas:
//!     - host: 172.31.30.100
//!       username: app
//!       password_env: RELAY_DB_PASSWORD
//! router:
//!   listen_port: 5000
//!   probe:
//!     method: icmp
//!     timeout_ms: 1000
//! gatekeeper:
//!   listen_port: 80
//!   router_url: http://172.31.30.140:5000/query
//!   api_key_env: RELAY_API_KEY
//! ```

pub mod cluster;
pub mod gatekeeper;
pub mod router;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use cluster::{ClusterConfig, ConnectionPoolConfig, NodeConfig};
pub use gatekeeper::GatekeeperConfig;
pub use router::{ProbeConfig, ProbeMethod, RouterConfig};

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The configuration file is not valid YAML for [`RelayConfig`].
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// The cluster has no replica to serve reads.
    #[error("cluster must define at least one replica")]
    NoReplicas,

    /// A node has an empty host.
    #[error("{0} has an empty host")]
    EmptyHost(String),

    /// A referenced environment variable is not set.
    #[error("environment variable {0} is not set")]
    MissingEnv(String),

    /// The gatekeeper has no API key configured.
    #[error("gatekeeper API key is not configured")]
    MissingApiKey,

    /// A value is out of range.
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Complete configuration for both tiers.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RelayConfig {
    /// Database nodes and credentials.
    #[serde(default)]
    pub cluster: ClusterConfig,

    /// Router service settings.
    #[serde(default)]
    pub router: RouterConfig,

    /// Gatekeeper service settings.
    #[serde(default)]
    pub gatekeeper: GatekeeperConfig,
}

impl RelayConfig {
    /// Load and parse a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&raw)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Structural checks that do not depend on the environment.
    ///
    /// Secret resolution happens separately in [`ClusterConfig::topology`] and
    /// [`GatekeeperConfig::resolve_api_key`], so each binary only needs the
    /// secrets of the tier it runs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_router()?;
        self.validate_gatekeeper()
    }

    /// Checks for the sections the router tier reads.
    pub fn validate_router(&self) -> Result<(), ConfigError> {
        self.cluster.validate()?;
        self.router.validate()
    }

    /// Checks for the section the gatekeeper tier reads.
    pub fn validate_gatekeeper(&self) -> Result<(), ConfigError> {
        self.gatekeeper.validate()
    }
}

/// Resolve a secret: the environment variable wins over the inline value.
pub(crate) fn resolve_secret(
    inline: Option<&String>,
    env_var: Option<&String>,
) -> Result<Option<String>, ConfigError> {
    if let Some(name) = env_var {
        return match std::env::var(name) {
            Ok(value) => Ok(Some(value)),
            Err(_) if inline.is_some() => Ok(inline.cloned()),
            Err(_) => Err(ConfigError::MissingEnv(name.clone())),
        };
    }
    Ok(inline.cloned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
cluster:
  database: sakila
  primary:
    host: 172.31.26.162
    username: app
    password: AppPass123!
  replicas:
    - host: 172.31.30.100
      username: app
      password: AppPass123!
    - host: 172.31.20.128
      username: app
      password: AppPass123!
gatekeeper:
  router_url: http://172.31.30.140:5000/query
  api_key: MY_SECRET_KEY_123
"#;

    #[test]
    fn test_parse_sample_with_defaults() {
        let config = RelayConfig::from_yaml(SAMPLE).unwrap();
        config.validate().unwrap();

        assert_eq!(config.cluster.database, "sakila");
        assert_eq!(config.cluster.primary.port, 3306);
        assert_eq!(config.cluster.replicas.len(), 2);
        assert_eq!(config.router.listen_port, 5000);
        assert_eq!(config.router.probe.method, ProbeMethod::Icmp);
        assert_eq!(config.router.probe.timeout_ms, 1000);
        assert_eq!(config.gatekeeper.listen_port, 80);
        assert_eq!(config.gatekeeper.forward_timeout_secs, 10);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = RelayConfig::load(file.path()).unwrap();
        assert_eq!(config.cluster.replicas[1].host, "172.31.20.128");
    }

    #[test]
    fn test_load_missing_file() {
        let err = RelayConfig::load("/nonexistent/relay.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_rejects_empty_replica_set() {
        let raw = r#"
cluster:
  primary:
    host: db1
    username: app
  replicas: []
"#;
        let config = RelayConfig::from_yaml(raw).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::NoReplicas)));
    }

    #[test]
    fn test_rejects_zero_probe_timeout() {
        let mut config = RelayConfig::from_yaml(SAMPLE).unwrap();
        config.router.probe.timeout_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "router.probe.timeout_ms",
                ..
            })
        ));
    }

    #[test]
    fn test_each_tier_validates_only_its_sections() {
        let mut config = RelayConfig::from_yaml(SAMPLE).unwrap();
        config.gatekeeper.router_url = "172.31.30.140:5000/query".to_string();
        config.validate_router().unwrap();
        assert!(config.validate_gatekeeper().is_err());
        assert!(config.validate().is_err());

        let mut config = RelayConfig::from_yaml(SAMPLE).unwrap();
        config.cluster.replicas.clear();
        config.validate_gatekeeper().unwrap();
        assert!(matches!(config.validate_router(), Err(ConfigError::NoReplicas)));
    }

    #[test]
    fn test_resolve_secret_prefers_env() {
        // SAFETY: test-only variable, not read by other tests
        unsafe {
            std::env::set_var("RELAY_TEST_SECRET_PREFERS_ENV", "from-env");
        }
        let inline = "inline".to_string();
        let env = "RELAY_TEST_SECRET_PREFERS_ENV".to_string();
        assert_eq!(
            resolve_secret(Some(&inline), Some(&env)).unwrap().as_deref(),
            Some("from-env")
        );
        // SAFETY: cleanup in test
        unsafe {
            std::env::remove_var("RELAY_TEST_SECRET_PREFERS_ENV");
        }
    }

    #[test]
    fn test_resolve_secret_missing_env() {
        let env = "RELAY_TEST_SECRET_NEVER_SET".to_string();
        assert!(matches!(
            resolve_secret(None, Some(&env)),
            Err(ConfigError::MissingEnv(_))
        ));
    }
}
