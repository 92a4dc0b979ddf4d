//! Gatekeeper service configuration.

use super::{resolve_secret, ConfigError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for the edge tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatekeeperConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// Full URL of the router's `/query` endpoint.
    #[serde(default = "default_router_url")]
    pub router_url: String,

    /// Shared secret expected in `X-API-Key`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Environment variable containing the shared secret. Takes precedence
    /// over `api_key`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    /// Timeout in seconds for the forwarded router call.
    #[serde(default = "default_forward_timeout")]
    pub forward_timeout_secs: u64,
}

impl Default for GatekeeperConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            listen_port: default_listen_port(),
            router_url: default_router_url(),
            api_key: None,
            api_key_env: None,
            forward_timeout_secs: default_forward_timeout(),
        }
    }
}

impl GatekeeperConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.listen_addr, self.listen_port)
    }

    pub fn forward_timeout(&self) -> Duration {
        Duration::from_secs(self.forward_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.router_url.starts_with("http://") || self.router_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                field: "gatekeeper.router_url",
                reason: format!("'{}' is not an http(s) URL", self.router_url),
            });
        }
        if self.forward_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "gatekeeper.forward_timeout_secs",
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Resolve the shared secret. An empty key is rejected so that a missing
    /// header can never match.
    pub fn resolve_api_key(&self) -> Result<String, ConfigError> {
        match resolve_secret(self.api_key.as_ref(), self.api_key_env.as_ref())? {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(ConfigError::MissingApiKey),
        }
    }
}

fn default_listen_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_listen_port() -> u16 {
    80
}

fn default_router_url() -> String {
    "http://127.0.0.1:5000/query".to_string()
}

fn default_forward_timeout() -> u64 {
    10
}
