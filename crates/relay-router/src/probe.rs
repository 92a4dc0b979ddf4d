//! Replica latency probing for `ping` mode.
//!
//! Every routing decision probes every replica once; nothing is cached. Probes
//! run concurrently, one task per replica, and are joined against a single
//! deadline. Anything still running at the deadline is aborted and counted as
//! failed, so total probe time is bounded by one timeout, not N of them.

use async_trait::async_trait;
use relay_core::{Node, ProbeConfig, ProbeMethod};
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;

/// Latency reported for a probe that timed out or could not reach its host.
/// Sorts after every real measurement.
pub const PROBE_FAILURE_LATENCY: Duration = Duration::MAX;

/// Measures round-trip time to a single node.
#[async_trait]
pub trait LatencyProbe: Send + Sync {
    /// Probe once. Must return within the probe's own timeout and report
    /// [`PROBE_FAILURE_LATENCY`] instead of failing.
    async fn probe(&self, node: &Node) -> Duration;
}

/// Latency of one replica, by its position in configured order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeResult {
    pub index: usize,
    pub latency: Duration,
}

impl ProbeResult {
    pub fn failed(index: usize) -> Self {
        Self {
            index,
            latency: PROBE_FAILURE_LATENCY,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.latency == PROBE_FAILURE_LATENCY
    }
}

/// One ICMP echo through the system `ping` binary (`ping -c 1 -W <secs>`).
#[derive(Debug, Clone)]
pub struct IcmpProbe {
    timeout: Duration,
}

impl IcmpProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl LatencyProbe for IcmpProbe {
    async fn probe(&self, node: &Node) -> Duration {
        // `-W` takes whole seconds on most ping implementations.
        let wait_secs = self.timeout.as_secs_f64().ceil().max(1.0) as u64;
        let start = Instant::now();
        let mut command = tokio::process::Command::new("ping");
        command
            .args(["-c", "1", "-W", &wait_secs.to_string(), &node.host])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        match tokio::time::timeout(self.timeout, command.status()).await {
            Ok(Ok(status)) if status.success() => start.elapsed(),
            Ok(Ok(status)) => {
                tracing::debug!(host = %node.host, code = ?status.code(), "ping reported host unreachable");
                PROBE_FAILURE_LATENCY
            }
            Ok(Err(e)) => {
                tracing::warn!(host = %node.host, error = %e, "Failed to spawn ping");
                PROBE_FAILURE_LATENCY
            }
            Err(_) => PROBE_FAILURE_LATENCY,
        }
    }
}

/// Times a TCP connect to the node's database port. Needs no privileges and
/// no external binary.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl LatencyProbe for TcpProbe {
    async fn probe(&self, node: &Node) -> Duration {
        let start = Instant::now();
        let connect = tokio::net::TcpStream::connect((node.host.as_str(), node.port));
        match tokio::time::timeout(self.timeout, connect).await {
            Ok(Ok(_stream)) => start.elapsed(),
            Ok(Err(e)) => {
                tracing::debug!(node = %node.address(), error = %e, "TCP probe failed");
                PROBE_FAILURE_LATENCY
            }
            Err(_) => PROBE_FAILURE_LATENCY,
        }
    }
}

/// Build the probe selected in configuration.
pub fn from_config(config: &ProbeConfig) -> Arc<dyn LatencyProbe> {
    match config.method {
        ProbeMethod::Icmp => Arc::new(IcmpProbe::new(config.timeout())),
        ProbeMethod::Tcp => Arc::new(TcpProbe::new(config.timeout())),
    }
}

/// Probe every replica concurrently and return one result per replica, in
/// configured order.
///
/// Replicas whose probe has not finished by `budget` are aborted and reported
/// as failed.
pub async fn probe_all(
    probe: Arc<dyn LatencyProbe>,
    replicas: &[Node],
    budget: Duration,
) -> Vec<ProbeResult> {
    let mut results: Vec<ProbeResult> = (0..replicas.len()).map(ProbeResult::failed).collect();
    let mut tasks = JoinSet::new();

    for (index, node) in replicas.iter().cloned().enumerate() {
        let probe = probe.clone();
        tasks.spawn(async move {
            let latency = probe.probe(&node).await;
            ProbeResult { index, latency }
        });
    }

    let deadline = tokio::time::Instant::now() + budget;
    loop {
        match tokio::time::timeout_at(deadline, tasks.join_next()).await {
            Ok(Some(Ok(result))) => results[result.index] = result,
            Ok(Some(Err(e))) => {
                tracing::warn!(error = %e, "Probe task failed");
            }
            Ok(None) => break,
            Err(_) => {
                tracing::debug!(pending = tasks.len(), "Probe budget exhausted, aborting stragglers");
                tasks.abort_all();
                break;
            }
        }
    }

    for (result, node) in results.iter().zip(replicas) {
        tracing::debug!(
            replica = %node.label(),
            latency_ms = (!result.is_failure()).then(|| result.latency.as_secs_f64() * 1000.0),
            "Probe result"
        );
    }

    results
}

/// Index of the replica with the lowest latency.
///
/// Ties go to the earliest replica in configured order. If every probe failed
/// the first replica is chosen.
pub fn fastest(results: &[ProbeResult]) -> usize {
    let mut best: Option<&ProbeResult> = None;
    for result in results.iter().filter(|r| !r.is_failure()) {
        match best {
            Some(current) if result.latency >= current.latency => {}
            _ => best = Some(result),
        }
    }
    best.map(|r| r.index).unwrap_or(0)
}
