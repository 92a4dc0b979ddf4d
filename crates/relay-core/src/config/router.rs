//! Router service configuration.

use super::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for the routing tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// Latency probing used by `ping` mode.
    #[serde(default)]
    pub probe: ProbeConfig,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            listen_port: default_listen_port(),
            probe: ProbeConfig::default(),
        }
    }
}

impl RouterConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.listen_addr, self.listen_port)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.probe.timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "router.probe.timeout_ms",
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// How replica latency is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProbeMethod {
    /// One ICMP echo via the system `ping` binary.
    #[default]
    Icmp,
    /// Time a TCP connect to the node's database port.
    Tcp,
}

/// Latency probe settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    #[serde(default)]
    pub method: ProbeMethod,

    /// Per-probe timeout. Probes run concurrently, so this also bounds the
    /// whole fan-out.
    #[serde(default = "default_probe_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            method: ProbeMethod::default(),
            timeout_ms: default_probe_timeout_ms(),
        }
    }
}

impl ProbeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_listen_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_listen_port() -> u16 {
    5000
}

fn default_probe_timeout_ms() -> u64 {
    1000
}
