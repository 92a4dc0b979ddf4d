//! Deny-list policy filter.
//!
//! A statement is blocked when its normalized text contains any deny-list token
//! as a literal substring. Each default token carries a trailing space, so
//! `drop table` is blocked but `DROP` at the very end of the input, or
//! `drop\ttable`, is not. A token inside a string literal or identifier still
//! blocks (`SELECT 'drop me'`). These are the intended semantics.

use crate::normalize;
use serde::Serialize;

/// Tokens blocked at the edge.
pub const DEFAULT_DENY_LIST: [&str; 5] = ["drop ", "truncate ", "shutdown ", "grant ", "revoke "];

/// Outcome of a policy check. Never mutated after it is computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "UPPERCASE")]
pub enum PolicyDecision {
    Allow,
    Block {
        /// The deny-list token that matched.
        token: String,
        /// Human-readable explanation.
        reason: String,
    },
}

impl PolicyDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, PolicyDecision::Allow)
    }
}

/// Fixed set of lower-case substrings that block a statement outright.
#[derive(Debug, Clone)]
pub struct DenyList {
    tokens: Vec<String>,
}

impl Default for DenyList {
    fn default() -> Self {
        Self::new(DEFAULT_DENY_LIST)
    }
}

impl DenyList {
    /// Build a deny list. Tokens are lower-cased so they compare against the
    /// normalized statement.
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            tokens: tokens
                .into_iter()
                .map(|t| t.as_ref().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Check a statement against the list. The first matching token, in list
    /// order, is reported.
    pub fn evaluate(&self, sql: &str) -> PolicyDecision {
        let normalized = normalize(sql);
        match self.tokens.iter().find(|t| normalized.contains(t.as_str())) {
            Some(token) => {
                tracing::debug!(token = %token.trim_end(), "Statement matched deny list");
                PolicyDecision::Block {
                    token: token.clone(),
                    reason: format!("statement contains denied keyword '{}'", token.trim_end()),
                }
            }
            None => PolicyDecision::Allow,
        }
    }

    pub fn allowed(&self, sql: &str) -> bool {
        self.evaluate(sql).is_allowed()
    }
}

/// Check a statement against [`DEFAULT_DENY_LIST`].
pub fn allowed(sql: &str) -> bool {
    DenyList::default().allowed(sql)
}
