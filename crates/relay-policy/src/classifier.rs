//! Read/write statement classification.

use crate::normalize;
use relay_core::StatementType;

/// Leading keywords that make a statement a read.
pub const READ_PREFIXES: [&str; 3] = ["select", "show", "describe"];

/// Classify a statement by prefix.
///
/// This is a prefix test on the normalized text, not a parse: `selection`
/// counts as a read, `WITH ... SELECT` and `EXPLAIN` count as writes, and empty
/// input is a write.
pub fn classify(sql: &str) -> StatementType {
    let normalized = normalize(sql);
    if READ_PREFIXES.iter().any(|p| normalized.starts_with(p)) {
        StatementType::Read
    } else {
        StatementType::Write
    }
}
