//! # relay-core
//!
//! Types shared by the gatekeeper and the router:
//!
//! - [`config`]: the YAML configuration, loaded once at startup and validated
//! - [`topology`]: the resolved, immutable node set (one primary, N replicas)
//! - [`contract`]: the JSON request/response bodies exchanged over `/query`

pub mod config;
pub mod contract;
pub mod topology;

pub use config::{
    ClusterConfig, ConfigError, ConnectionPoolConfig, GatekeeperConfig, NodeConfig, ProbeConfig,
    ProbeMethod, RelayConfig, RouterConfig,
};
pub use contract::{
    generate_request_id, ErrorBody, Mode, QueryRequest, QueryResponse, QueryResult, Row,
    StatementType,
};
pub use topology::{Node, NodeRole, Topology};
