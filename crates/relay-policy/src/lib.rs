//! # relay-policy
//!
//! The two pure decisions made on raw SQL text before it touches a database:
//!
//! - [`classify`]: READ vs WRITE, from the leading keyword
//! - [`DenyList`]: ALLOW vs BLOCK, from a substring scan against fixed tokens
//!
//! Neither parses SQL. Both normalize by trimming surrounding whitespace and
//! lower-casing, then do plain string matching.

pub mod classifier;
pub mod filter;

pub use classifier::{classify, READ_PREFIXES};
pub use filter::{allowed, DenyList, PolicyDecision, DEFAULT_DENY_LIST};

/// Normalization shared by the classifier and the filter.
pub(crate) fn normalize(sql: &str) -> String {
    sql.trim().to_lowercase()
}
