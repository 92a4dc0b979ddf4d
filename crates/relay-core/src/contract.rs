//! Request/response bodies for the `/query` endpoint.
//!
//! Both tiers speak the same schema. The gatekeeper parses a [`QueryRequest`],
//! assigns a request id and forwards it; the router answers with a
//! [`QueryResponse`] or an [`ErrorBody`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single result row, one JSON value per column.
pub type Row = Vec<serde_json::Value>;

/// Replica selection strategy for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Every statement goes to the primary.
    #[default]
    Direct,
    /// Reads go to a uniformly chosen replica.
    Random,
    /// Reads go to the replica with the lowest probed latency.
    Ping,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Direct, Mode::Random, Mode::Ping];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Direct => "direct",
            Mode::Random => "random",
            Mode::Ping => "ping",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "direct" => Ok(Mode::Direct),
            "random" => Ok(Mode::Random),
            "ping" => Ok(Mode::Ping),
            other => Err(format!(
                "unknown mode '{}' (expected direct, random or ping)",
                other
            )),
        }
    }
}

/// Read/write classification of a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StatementType {
    Read,
    Write,
}

impl StatementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatementType::Read => "READ",
            StatementType::Write => "WRITE",
        }
    }
}

impl fmt::Display for StatementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `POST /query`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub sql: String,

    #[serde(default)]
    pub mode: Mode,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl QueryRequest {
    pub fn new(sql: impl Into<String>, mode: Mode) -> Self {
        Self {
            sql: sql.into(),
            mode,
            request_id: None,
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Parse a request body as JSON whatever its declared content type.
    pub fn from_body(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }

    /// Keep a caller-supplied id, otherwise generate a fresh one.
    ///
    /// An empty string counts as absent.
    pub fn assign_request_id(&mut self) -> &str {
        match &self.request_id {
            Some(id) if !id.is_empty() => {}
            _ => self.request_id = Some(generate_request_id()),
        }
        self.request_id.as_deref().unwrap_or_default()
    }
}

/// Rows produced by a statement; empty when it had no result set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub rows: Vec<Row>,
}

/// Successful router response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub request_id: String,
    pub mode: Mode,
    pub statement_type: StatementType,
    /// `manager` or `worker@<host>`.
    pub target: String,
    pub result: QueryResult,
}

/// Error body returned by either tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            detail: None,
            request_id: None,
            target: None,
        }
    }

    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }
}

/// Fresh correlation id (UUID v4).
pub fn generate_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
