//! # relay-router
//!
//! The routing tier. For each statement it:
//!
//! 1. classifies it as READ or WRITE (`relay-policy`)
//! 2. picks a node according to the request's mode, probing replica latency
//!    for `ping` reads
//! 3. executes it on that node and returns the rows
//!
//! ## Architecture
//!
//! ```text
//!   Gatekeeper
//!       │  POST /query {sql, mode, request_id}
//!       ▼
//! ┌──────────────────┐
//! │  Router          │
//! │  1. Classify     │  ← relay-policy
//! │  2. Select node  │  ← probe (ping mode)
//! │  3. Execute      │  ← db
//! └────────┬─────────┘
//!          │
//!    ┌─────┴──────┬────────────┐
//!    ▼            ▼            ▼
//! primary     replica 1 …  replica N
//! ```

pub mod db;
pub mod error;
pub mod http;
pub mod probe;
pub mod router;

pub use db::{Database, MySqlDatabase};
pub use error::{RequestError, RouterError};
pub use http::{create_router, RouterServer};
pub use probe::{IcmpProbe, LatencyProbe, ProbeResult, TcpProbe, PROBE_FAILURE_LATENCY};
pub use router::{plan, random_replica, Plan, Routed, Router};
