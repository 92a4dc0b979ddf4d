//! Database cluster configuration.
//!
//! Credentials follow the same precedence everywhere: `password_env` (an
//! environment variable name) wins over an inline `password`.

use super::{resolve_secret, ConfigError};
use crate::topology::{Node, NodeRole, Topology};
use serde::{Deserialize, Serialize};

/// One primary and its read replicas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Schema selected on every connection.
    #[serde(default = "default_database")]
    pub database: String,

    /// The single writable node.
    pub primary: NodeConfig,

    /// Read-only nodes, in the order used for tie-breaking.
    #[serde(default)]
    pub replicas: Vec<NodeConfig>,

    /// When set, connections are leased from a per-node pool instead of being
    /// opened for each request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool: Option<ConnectionPoolConfig>,

    /// Timeout in seconds for establishing a connection to a node.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
            primary: NodeConfig::default(),
            replicas: Vec::new(),
            pool: None,
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

/// Address and credentials of a single node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_username")]
    pub username: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Environment variable containing the password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_env: Option<String>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: default_port(),
            username: default_username(),
            password: None,
            password_env: None,
        }
    }
}

impl NodeConfig {
    fn resolve(&self, role: NodeRole) -> Result<Node, ConfigError> {
        Ok(Node {
            host: self.host.clone(),
            port: self.port,
            role,
            username: self.username.clone(),
            password: resolve_secret(self.password.as_ref(), self.password_env.as_ref())?,
        })
    }
}

/// Per-node connection pool sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionPoolConfig {
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Timeout in seconds when acquiring a connection.
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_seconds: u64,

    /// How long a connection can remain idle before being closed.
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_seconds: u64,
}

impl Default for ConnectionPoolConfig {
    fn default() -> Self {
        Self {
            min_connections: default_min_connections(),
            max_connections: default_max_connections(),
            acquire_timeout_seconds: default_acquire_timeout(),
            idle_timeout_seconds: default_idle_timeout(),
        }
    }
}

impl ClusterConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.primary.host.trim().is_empty() {
            return Err(ConfigError::EmptyHost("primary".to_string()));
        }
        if self.replicas.is_empty() {
            return Err(ConfigError::NoReplicas);
        }
        for (i, replica) in self.replicas.iter().enumerate() {
            if replica.host.trim().is_empty() {
                return Err(ConfigError::EmptyHost(format!("replica #{}", i + 1)));
            }
        }
        if let Some(pool) = &self.pool
            && (pool.max_connections == 0 || pool.min_connections > pool.max_connections)
        {
            return Err(ConfigError::Invalid {
                field: "cluster.pool",
                reason: format!(
                    "min_connections ({}) must not exceed max_connections ({}) and max must be positive",
                    pool.min_connections, pool.max_connections
                ),
            });
        }
        Ok(())
    }

    /// Validate and resolve credentials into an immutable [`Topology`].
    pub fn topology(&self) -> Result<Topology, ConfigError> {
        self.validate()?;
        let primary = self.primary.resolve(NodeRole::Primary)?;
        let replicas = self
            .replicas
            .iter()
            .map(|r| r.resolve(NodeRole::Replica))
            .collect::<Result<Vec<_>, _>>()?;
        Topology::new(self.database.clone(), primary, replicas)
    }
}

fn default_database() -> String {
    "sakila".to_string()
}

fn default_port() -> u16 {
    3306
}

fn default_username() -> String {
    "app".to_string()
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_min_connections() -> u32 {
    0
}

fn default_max_connections() -> u32 {
    10
}

fn default_acquire_timeout() -> u64 {
    5
}

fn default_idle_timeout() -> u64 {
    600
}
