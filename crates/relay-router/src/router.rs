//! Node selection and statement dispatch.
//!
//! | mode   | READ                          | WRITE   |
//! |--------|-------------------------------|---------|
//! | direct | primary                       | primary |
//! | random | uniform choice among replicas | primary |
//! | ping   | replica with lowest latency   | primary |
//!
//! There is no failover: a statement that fails on its chosen node is reported
//! as failed, never retried elsewhere.

use crate::db::Database;
use crate::error::{RequestError, RouterError};
use crate::probe::{self, LatencyProbe};
use rand::Rng;
use relay_core::{Mode, Node, QueryRequest, QueryResponse, QueryResult, StatementType, Topology};
use std::sync::Arc;
use std::time::Duration;

/// Which node class a statement is sent to, before any replica is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plan {
    Primary,
    RandomReplica,
    FastestReplica,
}

/// Decide the node class from mode and statement type.
pub fn plan(mode: Mode, statement_type: StatementType) -> Plan {
    match (mode, statement_type) {
        (Mode::Direct, _) | (_, StatementType::Write) => Plan::Primary,
        (Mode::Random, StatementType::Read) => Plan::RandomReplica,
        (Mode::Ping, StatementType::Read) => Plan::FastestReplica,
    }
}

/// Uniform choice with replacement among `count` replicas.
pub fn random_replica<R: Rng + ?Sized>(rng: &mut R, count: usize) -> usize {
    rng.random_range(0..count)
}

/// Outcome of routing one statement.
#[derive(Debug, Clone)]
pub struct Routed {
    pub statement_type: StatementType,
    pub target: String,
    pub rows: Vec<relay_core::Row>,
}

/// Classifies statements, picks a node and executes on it.
///
/// Holds only immutable state, so one instance serves all requests.
pub struct Router {
    topology: Arc<Topology>,
    probe: Arc<dyn LatencyProbe>,
    database: Arc<dyn Database>,
    probe_budget: Duration,
}

impl Router {
    pub fn new(
        topology: Arc<Topology>,
        probe: Arc<dyn LatencyProbe>,
        database: Arc<dyn Database>,
        probe_budget: Duration,
    ) -> Self {
        Self {
            topology,
            probe,
            database,
            probe_budget,
        }
    }

    /// Resolve the node for a statement. Probes replicas for `ping` reads.
    pub async fn select_node(&self, mode: Mode, statement_type: StatementType) -> &Node {
        let replicas = self.topology.replicas();
        match plan(mode, statement_type) {
            Plan::Primary => self.topology.primary(),
            Plan::RandomReplica => {
                let index = random_replica(&mut rand::rng(), replicas.len());
                &replicas[index]
            }
            Plan::FastestReplica => {
                let results = probe::probe_all(self.probe.clone(), replicas, self.probe_budget).await;
                &replicas[probe::fastest(&results)]
            }
        }
    }

    /// Classify, select and execute one statement.
    pub async fn route(&self, request_id: &str, sql: &str, mode: Mode) -> Result<Routed, RouterError> {
        let statement_type = relay_policy::classify(sql);
        let node = self.select_node(mode, statement_type).await;
        let target = node.label();

        tracing::info!(
            request_id = %request_id,
            mode = %mode,
            statement_type = %statement_type,
            target = %target,
            "Routing statement"
        );

        let rows = self.database.execute(node, sql).await.inspect_err(|e| {
            tracing::warn!(request_id = %request_id, target = %target, error = %e, "Statement failed");
        })?;

        Ok(Routed {
            statement_type,
            target,
            rows,
        })
    }

    /// Handle a `/query` body. A request id is generated when absent.
    pub async fn handle(&self, mut request: QueryRequest) -> Result<QueryResponse, RequestError> {
        let request_id = request.assign_request_id().to_string();
        match self.route(&request_id, &request.sql, request.mode).await {
            Ok(routed) => Ok(QueryResponse {
                request_id,
                mode: request.mode,
                statement_type: routed.statement_type,
                target: routed.target,
                result: QueryResult { rows: routed.rows },
            }),
            Err(source) => Err(RequestError { request_id, source }),
        }
    }
}
