//! `relay bench` - latency benchmark through the gatekeeper.
//!
//! For each mode, issues `count` inserts into `sbtest.writes` followed by
//! `count` `SELECT COUNT(*)` reads, one at a time with a short pause, each
//! with a fresh request id. Failed calls (transport error, status >= 400 or a
//! non-JSON body) are counted and excluded from the latency figures.

use anyhow::Result;
use relay_core::{generate_request_id, Mode, QueryRequest};
use serde::Serialize;
use std::time::{Duration, Instant};

const READ_SQL: &str = "SELECT COUNT(*) FROM sbtest.writes;";

#[derive(Debug, Clone)]
pub struct BenchOptions {
    pub url: String,
    pub api_key: String,
    pub count: usize,
    pub pause: Duration,
    pub modes: Vec<Mode>,
    pub timeout: Duration,
}

/// Latency summary in milliseconds. All figures are `None` without samples.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatencyStats {
    pub count: usize,
    pub avg_ms: Option<f64>,
    pub p50_ms: Option<f64>,
    pub p95_ms: Option<f64>,
    pub max_ms: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModeReport {
    pub mode: Mode,
    pub writes: LatencyStats,
    pub writes_errors: usize,
    pub reads: LatencyStats,
    pub reads_errors: usize,
}

/// Nearest-rank-below percentile over sorted samples: index `floor(p * (n - 1))`.
pub fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let idx = (p * (sorted.len() - 1) as f64) as usize;
    sorted.get(idx).copied()
}

pub fn stats(samples: &[f64]) -> LatencyStats {
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let avg = (!sorted.is_empty()).then(|| sorted.iter().sum::<f64>() / sorted.len() as f64);
    LatencyStats {
        count: sorted.len(),
        avg_ms: avg,
        p50_ms: percentile(&sorted, 0.50),
        p95_ms: percentile(&sorted, 0.95),
        max_ms: sorted.last().copied(),
    }
}

fn write_sql(mode: Mode, i: usize) -> String {
    format!(r#"INSERT INTO sbtest.writes(name) VALUES("Bench_{}_{}");"#, mode, i)
}

struct Bench {
    client: reqwest::Client,
    options: BenchOptions,
}

impl Bench {
    /// One call; returns elapsed milliseconds on success.
    async fn call(&self, sql: String, mode: Mode) -> Option<f64> {
        let request = QueryRequest::new(sql, mode).with_request_id(generate_request_id());
        let start = Instant::now();
        let response = self
            .client
            .post(&self.options.url)
            .header("X-API-Key", &self.options.api_key)
            .json(&request)
            .send()
            .await;
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!(error = %e.without_url(), "Bench call failed");
                return None;
            }
        };
        if response.status().as_u16() >= 400 {
            tracing::debug!(status = response.status().as_u16(), "Bench call rejected");
            return None;
        }
        match response.json::<serde_json::Value>().await {
            Ok(_) => Some(elapsed_ms),
            Err(_) => None,
        }
    }

    async fn run_mode(&self, mode: Mode) -> ModeReport {
        let mut write_latency = Vec::with_capacity(self.options.count);
        let mut writes_errors = 0;
        for i in 0..self.options.count {
            match self.call(write_sql(mode, i), mode).await {
                Some(ms) => write_latency.push(ms),
                None => writes_errors += 1,
            }
            tokio::time::sleep(self.options.pause).await;
        }

        let mut read_latency = Vec::with_capacity(self.options.count);
        let mut reads_errors = 0;
        for _ in 0..self.options.count {
            match self.call(READ_SQL.to_string(), mode).await {
                Some(ms) => read_latency.push(ms),
                None => reads_errors += 1,
            }
            tokio::time::sleep(self.options.pause).await;
        }

        ModeReport {
            mode,
            writes: stats(&write_latency),
            writes_errors,
            reads: stats(&read_latency),
            reads_errors,
        }
    }
}

pub async fn run(options: BenchOptions) -> Result<()> {
    let client = reqwest::Client::builder().timeout(options.timeout).build()?;
    let modes = options.modes.clone();
    let bench = Bench { client, options };

    for mode in modes {
        tracing::info!(mode = %mode, count = bench.options.count, "Running benchmark");
        let report = bench.run_mode(mode).await;
        println!("{}", "=".repeat(60));
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_empty() {
        assert_eq!(
            stats(&[]),
            LatencyStats {
                count: 0,
                avg_ms: None,
                p50_ms: None,
                p95_ms: None,
                max_ms: None,
            }
        );
    }

    #[test]
    fn test_stats_unsorted_input() {
        let s = stats(&[30.0, 10.0, 20.0, 40.0]);
        assert_eq!(s.count, 4);
        assert_eq!(s.avg_ms, Some(25.0));
        // idx = floor(0.5 * 3) = 1
        assert_eq!(s.p50_ms, Some(20.0));
        // idx = floor(0.95 * 3) = 2
        assert_eq!(s.p95_ms, Some(30.0));
        assert_eq!(s.max_ms, Some(40.0));
    }

    #[test]
    fn test_percentile_over_hundred_samples() {
        let samples: Vec<f64> = (1..=100).map(f64::from).collect();
        // idx = floor(0.95 * 99) = 94
        assert_eq!(percentile(&samples, 0.95), Some(95.0));
        assert_eq!(percentile(&samples, 0.0), Some(1.0));
        assert_eq!(percentile(&samples, 1.0), Some(100.0));
    }

    #[test]
    fn test_write_sql_passes_policy() {
        let sql = write_sql(Mode::Ping, 7);
        assert_eq!(sql, r#"INSERT INTO sbtest.writes(name) VALUES("Bench_ping_7");"#);
        assert!(relay_policy::allowed(&sql));
        assert!(relay_policy::allowed(READ_SQL));
    }
}
