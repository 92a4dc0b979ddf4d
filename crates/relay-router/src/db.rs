//! Statement execution against a database node.
//!
//! The router treats each node as an opaque executor: it sends the raw SQL text
//! and returns whatever rows come back. Every request holds exactly one
//! connection, either opened for the request and closed on every exit path, or
//! leased from a per-node pool and returned when the lease is dropped.

use crate::error::RouterError;
use async_trait::async_trait;
use relay_core::{ConnectionPoolConfig, Node, Row, Topology};
use serde_json::Value;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::{Connection, Row as SqlxRow, ValueRef};
use std::collections::HashMap;
use std::time::Duration;

/// Executes a statement on a chosen node.
#[async_trait]
pub trait Database: Send + Sync {
    /// Run `sql` on `node`. Statements without a result set yield no rows.
    async fn execute(&self, node: &Node, sql: &str) -> Result<Vec<Row>, RouterError>;
}

/// MySQL executor over sqlx.
pub struct MySqlDatabase {
    database: String,
    connect_timeout: Duration,
    /// Keyed by `host:port`. `None` means one connection per request.
    pools: Option<HashMap<String, MySqlPool>>,
}

impl MySqlDatabase {
    /// Executor that opens a dedicated connection for every statement.
    pub fn new(topology: &Topology, connect_timeout: Duration) -> Self {
        Self {
            database: topology.database().to_string(),
            connect_timeout,
            pools: None,
        }
    }

    /// Executor that leases connections from one lazily connected pool per node.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn pooled(topology: &Topology, connect_timeout: Duration, config: &ConnectionPoolConfig) -> Self {
        let mut db = Self::new(topology, connect_timeout);
        let nodes = std::iter::once(topology.primary()).chain(topology.replicas());
        let pools = nodes
            .map(|node| {
                let pool = MySqlPoolOptions::new()
                    .min_connections(config.min_connections)
                    .max_connections(config.max_connections)
                    .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
                    .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
                    .connect_lazy_with(db.connect_options(node));
                (node.address(), pool)
            })
            .collect();
        db.pools = Some(pools);
        db
    }

    fn connect_options(&self, node: &Node) -> MySqlConnectOptions {
        let options = MySqlConnectOptions::new()
            .host(&node.host)
            .port(node.port)
            .username(&node.username)
            .database(&self.database);
        match &node.password {
            Some(password) => options.password(password),
            None => options,
        }
    }

    async fn connect(&self, node: &Node) -> Result<MySqlConnection, RouterError> {
        let options = self.connect_options(node);
        let connect = MySqlConnection::connect_with(&options);
        match tokio::time::timeout(self.connect_timeout, connect).await {
            Ok(Ok(conn)) => Ok(conn),
            Ok(Err(e)) => Err(RouterError::UpstreamUnavailable {
                target: node.label(),
                message: e.to_string(),
            }),
            Err(_) => Err(RouterError::UpstreamUnavailable {
                target: node.label(),
                message: format!("connect timed out after {:?}", self.connect_timeout),
            }),
        }
    }
}

#[async_trait]
impl Database for MySqlDatabase {
    async fn execute(&self, node: &Node, sql: &str) -> Result<Vec<Row>, RouterError> {
        let target = node.label();

        if let Some(pool) = self.pools.as_ref().and_then(|p| p.get(&node.address())) {
            let mut conn = pool
                .acquire()
                .await
                .map_err(|e| RouterError::UpstreamUnavailable {
                    target: target.clone(),
                    message: e.to_string(),
                })?;
            // The lease goes back to the pool when `conn` drops.
            return run(&mut conn, sql, &target).await;
        }

        let mut conn = self.connect(node).await?;
        let outcome = run(&mut conn, sql, &target).await;
        if let Err(e) = conn.close().await {
            tracing::debug!(target = %target, error = %e, "Connection close failed");
        }
        outcome
    }
}

async fn run(conn: &mut MySqlConnection, sql: &str, target: &str) -> Result<Vec<Row>, RouterError> {
    let rows = sqlx::Executor::fetch_all(&mut *conn, sqlx::raw_sql(sql))
        .await
        .map_err(|e| map_error(target, e))?;
    Ok(rows.iter().map(row_values).collect())
}

/// Transport failures mean the node is unavailable; anything else is the
/// node rejecting the statement.
fn map_error(target: &str, e: sqlx::Error) -> RouterError {
    match e {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => RouterError::UpstreamUnavailable {
            target: target.to_string(),
            message: e.to_string(),
        },
        other => RouterError::Execution {
            target: target.to_string(),
            message: other.to_string(),
        },
    }
}

fn row_values(row: &MySqlRow) -> Row {
    (0..row.len()).map(|i| column_value(row, i)).collect()
}

/// Decode one column into JSON, trying the common MySQL types in turn.
/// Decimals are rendered as strings to keep their precision. Only SQL NULL
/// becomes `null`.
fn column_value(row: &MySqlRow, i: usize) -> Value {
    match row.try_get_raw(i) {
        Ok(raw) if raw.is_null() => return Value::Null,
        Ok(_) => {}
        Err(_) => return Value::Null,
    }

    let typed = row
        .try_get::<i64, _>(i)
        .map(Value::from)
        .or_else(|_| row.try_get::<u64, _>(i).map(Value::from))
        .or_else(|_| row.try_get::<f64, _>(i).map(Value::from))
        .or_else(|_| row.try_get::<f32, _>(i).map(|v| Value::from(f64::from(v))))
        .or_else(|_| {
            row.try_get::<bigdecimal::BigDecimal, _>(i)
                .map(|v| Value::String(v.to_string()))
        })
        .or_else(|_| row.try_get::<String, _>(i).map(Value::String))
        .or_else(|_| {
            row.try_get::<chrono::NaiveDateTime, _>(i)
                .map(|v| Value::String(v.to_string()))
        })
        .or_else(|_| {
            row.try_get::<chrono::NaiveDate, _>(i)
                .map(|v| Value::String(v.to_string()))
        })
        .or_else(|_| {
            row.try_get::<chrono::NaiveTime, _>(i)
                .map(|v| Value::String(v.to_string()))
        })
        .or_else(|_| row.try_get::<Vec<u8>, _>(i).map(|v| text_value(&v)));

    // JSON, GEOMETRY and zero dates match none of the typed decoders; raw_sql
    // uses the text protocol, so their wire bytes are the column's text.
    or_raw_text(typed, || row.try_get_unchecked::<Vec<u8>, _>(i))
}

fn text_value(bytes: &[u8]) -> Value {
    Value::String(String::from_utf8_lossy(bytes).into_owned())
}

fn or_raw_text<F>(typed: Result<Value, sqlx::Error>, raw: F) -> Value
where
    F: FnOnce() -> Result<Vec<u8>, sqlx::Error>,
{
    match typed {
        Ok(value) => value,
        Err(_) => match raw() {
            Ok(bytes) => text_value(&bytes),
            Err(e) => {
                tracing::warn!(error = %e, "Undecodable column returned as null");
                Value::Null
            }
        },
    }
}
