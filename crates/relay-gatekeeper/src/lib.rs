//! # relay-gatekeeper
//!
//! The externally reachable edge in front of the router:
//!
//! 1. Authenticate: `X-API-Key` must equal the configured secret (401 otherwise)
//! 2. Filter: statements matching the deny list are refused (400)
//! 3. Correlate: assign a request id when the caller did not supply one
//! 4. Forward to the router and relay its status and body unchanged
//!
//! Steps 1 and 2 are decided locally; a rejected request is never forwarded.

pub mod auth;
pub mod error;
pub mod forward;
pub mod gatekeeper;
pub mod http;

pub use auth::{ApiKey, API_KEY_HEADER};
pub use error::GatekeeperError;
pub use forward::{Relayed, RouterClient};
pub use gatekeeper::Gatekeeper;
pub use http::{create_router, GatekeeperServer};
