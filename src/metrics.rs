//! Run statistics for the fraud scoring pipeline.

use crate::pipeline::summary::BatchSummary;
use crate::types::ScoredTransaction;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::info;

/// Metrics collector shared by every run of a process
pub struct PipelineMetrics {
    /// Runs that reached the scoring stage
    pub runs_started: AtomicU64,
    /// Runs that produced scored results
    pub runs_succeeded: AtomicU64,
    /// Transactions scored across all runs
    pub rows_scored: AtomicU64,
    /// Transactions the model labelled as fraud
    pub rows_flagged: AtomicU64,
    /// Failures by error kind
    failures_by_kind: RwLock<HashMap<String, u64>>,
    /// Stage latencies (in microseconds)
    stage_times: RwLock<HashMap<String, Vec<u64>>>,
    /// Fraud probability distribution buckets
    probability_buckets: RwLock<[u64; 10]>,
    /// Process start, for uptime reporting
    start_time: Instant,
}

impl PipelineMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            runs_started: AtomicU64::new(0),
            runs_succeeded: AtomicU64::new(0),
            rows_scored: AtomicU64::new(0),
            rows_flagged: AtomicU64::new(0),
            failures_by_kind: RwLock::new(HashMap::new()),
            stage_times: RwLock::new(HashMap::new()),
            probability_buckets: RwLock::new([0; 10]),
            start_time: Instant::now(),
        }
    }

    pub fn record_run_started(&self) {
        self.runs_started.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a scored batch and its probability distribution
    pub fn record_success(&self, summary: &BatchSummary, transactions: &[ScoredTransaction]) {
        self.runs_succeeded.fetch_add(1, Ordering::Relaxed);
        self.rows_scored
            .fetch_add(summary.total() as u64, Ordering::Relaxed);
        self.rows_flagged
            .fetch_add(summary.fraud_count() as u64, Ordering::Relaxed);

        if let Ok(mut buckets) = self.probability_buckets.write() {
            for tx in transactions {
                let bucket = (tx.fraud_probability * 10.0).min(9.0) as usize;
                buckets[bucket] += 1;
            }
        }
    }

    /// Record a failed stage by error kind
    pub fn record_failure(&self, kind: &str) {
        if let Ok(mut by_kind) = self.failures_by_kind.write() {
            *by_kind.entry(kind.to_string()).or_insert(0) += 1;
        }
    }

    /// Record how long a stage took
    pub fn record_stage_time(&self, stage: &str, duration: Duration) {
        if let Ok(mut times) = self.stage_times.write() {
            let stage_times = times.entry(stage.to_string()).or_insert_with(Vec::new);
            stage_times.push(duration.as_micros() as u64);
            // Keep only last 1000 per stage
            if stage_times.len() > 1000 {
                stage_times.drain(0..500);
            }
        }
    }

    /// Latency statistics per stage
    pub fn get_stage_stats(&self) -> HashMap<String, StageStats> {
        let times = match self.stage_times.read() {
            Ok(times) => times,
            Err(_) => return HashMap::new(),
        };

        times
            .iter()
            .filter(|(_, stage_times)| !stage_times.is_empty())
            .map(|(stage, stage_times)| {
                let mut sorted = stage_times.clone();
                sorted.sort_unstable();

                let count = sorted.len();
                let sum: u64 = sorted.iter().sum();

                (
                    stage.clone(),
                    StageStats {
                        calls: count as u64,
                        mean_us: sum / count as u64,
                        p50_us: sorted[count / 2],
                        p95_us: sorted[((count as f64 * 0.95) as usize).min(count - 1)],
                        p99_us: sorted[((count as f64 * 0.99) as usize).min(count - 1)],
                        max_us: sorted[count - 1],
                    },
                )
            })
            .collect()
    }

    /// Failure counts by error kind
    pub fn get_failures_by_kind(&self) -> HashMap<String, u64> {
        self.failures_by_kind
            .read()
            .map(|by_kind| by_kind.clone())
            .unwrap_or_default()
    }

    /// Fraud probability distribution over all scored rows
    pub fn get_probability_distribution(&self) -> [u64; 10] {
        self.probability_buckets
            .read()
            .map(|buckets| *buckets)
            .unwrap_or([0; 10])
    }

    /// Share of scored rows labelled as fraud, in percent
    pub fn get_flag_rate(&self) -> f64 {
        let scored = self.rows_scored.load(Ordering::Relaxed);
        if scored > 0 {
            self.rows_flagged.load(Ordering::Relaxed) as f64 / scored as f64 * 100.0
        } else {
            0.0
        }
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let started = self.runs_started.load(Ordering::Relaxed);
        let succeeded = self.runs_succeeded.load(Ordering::Relaxed);
        let scored = self.rows_scored.load(Ordering::Relaxed);
        let flagged = self.rows_flagged.load(Ordering::Relaxed);
        let uptime = self.start_time.elapsed().as_secs_f64();

        info!("╔══════════════════════════════════════════════════════════════╗");
        info!("║            FRAUD SCORING PIPELINE - METRICS SUMMARY          ║");
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Runs Started: {:>8}  │  Runs Succeeded: {:>8}  │  {:>6.1}s ║",
            started, succeeded, uptime
        );
        info!(
            "║ Rows Scored:  {:>8}  │  Flagged: {:>8} ({:>5.2}%)          ║",
            scored,
            flagged,
            self.get_flag_rate()
        );

        let failures = self.get_failures_by_kind();
        if !failures.is_empty() {
            info!("╠══════════════════════════════════════════════════════════════╣");
            info!("║ Failures by Kind:                                            ║");
            for (kind, count) in &failures {
                info!("║   {:18}: {:>6}                                 ║", kind, count);
            }
        }

        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Fraud Probability Distribution:                              ║");
        let distribution = self.get_probability_distribution();
        let total: u64 = distribution.iter().sum();
        for (i, &count) in distribution.iter().enumerate() {
            let pct = if total > 0 { (count as f64 / total as f64) * 100.0 } else { 0.0 };
            let bar_len = (pct / 2.0) as usize;
            let bar: String = "█".repeat(bar_len.min(20));
            info!(
                "║   {:.1}-{:.1}: {:>6} ({:>5.1}%) {}",
                i as f64 / 10.0,
                (i + 1) as f64 / 10.0,
                count,
                pct,
                bar
            );
        }
        info!("╚══════════════════════════════════════════════════════════════╝");

        let stage_stats = self.get_stage_stats();
        if !stage_stats.is_empty() {
            info!("Stage Times (μs):");
            for (stage, stats) in &stage_stats {
                info!(
                    "  {}: mean={} p50={} p95={} p99={} max={} (calls={})",
                    stage, stats.mean_us, stats.p50_us, stats.p95_us, stats.p99_us, stats.max_us, stats.calls
                );
            }
        }
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Stage latency statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StageStats {
    pub calls: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}
