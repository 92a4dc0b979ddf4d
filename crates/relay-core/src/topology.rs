//! Resolved cluster topology.
//!
//! A [`Topology`] is built once from [`ClusterConfig`](crate::config::ClusterConfig)
//! with every credential already resolved. It is never mutated afterwards and is
//! shared across requests behind an `Arc`.

use crate::config::ConfigError;
use std::fmt;

/// Role of a database node in the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRole {
    Primary,
    Replica,
}

/// A database node reachable by host address.
#[derive(Clone, PartialEq, Eq)]
pub struct Node {
    pub host: String,
    pub port: u16,
    pub role: NodeRole,
    pub username: String,
    pub password: Option<String>,
}

impl Node {
    /// Identifier reported in responses and logs: `manager` for the primary,
    /// `worker@<host>` for a replica.
    pub fn label(&self) -> String {
        match self.role {
            NodeRole::Primary => "manager".to_string(),
            NodeRole::Replica => format!("worker@{}", self.host),
        }
    }

    /// `host:port`, used as the key for per-node connection pools.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// Passwords never reach logs.
impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("role", &self.role)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// One primary plus at least one replica, in configured order.
///
/// Only constructible through [`Topology::new`], so every instance has a
/// replica to serve reads.
#[derive(Debug, Clone)]
pub struct Topology {
    database: String,
    primary: Node,
    replicas: Vec<Node>,
}

impl Topology {
    pub fn new(
        database: impl Into<String>,
        primary: Node,
        replicas: Vec<Node>,
    ) -> Result<Self, ConfigError> {
        if replicas.is_empty() {
            return Err(ConfigError::NoReplicas);
        }
        Ok(Self {
            database: database.into(),
            primary,
            replicas,
        })
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn primary(&self) -> &Node {
        &self.primary
    }

    /// Never empty.
    pub fn replicas(&self) -> &[Node] {
        &self.replicas
    }
}
