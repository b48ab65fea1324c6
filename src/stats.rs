//! Periodic statistics reporting.
//!
//! The reporter only reads: one short lock per target to copy its counters,
//! and a relaxed load of the live-worker count. It never slows the workers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::info;

use crate::pool::Pool;
use crate::target::{Target, TargetSnapshot};

/// Everything one reporting tick emits.
#[derive(Debug, Clone, Serialize)]
pub struct StatsReport {
    pub elapsed_secs: f64,
    pub active_workers: usize,
    pub total_requests: u64,
    pub total_errors: u64,
    pub targets: Vec<TargetSnapshot>,
}

impl StatsReport {
    /// Overall requests per second since the pool was created.
    pub fn requests_per_second(&self) -> f64 {
        if self.elapsed_secs > 0.0 {
            self.total_requests as f64 / self.elapsed_secs
        } else {
            0.0
        }
    }

    /// Format the per-target counters as a table.
    pub fn format_table(&self) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "\n=== Load Summary ({:.1}s, {} active workers) ===\n\n",
            self.elapsed_secs, self.active_workers
        ));
        output.push_str(&format!(
            "{:<50} {:>12} {:>12} {:>12} {:>8}\n",
            "Target", "Requests", "Successes", "Errors", "Err %"
        ));
        output.push_str(&"-".repeat(98));
        output.push('\n');

        for target in &self.targets {
            output.push_str(&format!(
                "{:<50} {:>12} {:>12} {:>12} {:>7.2}%\n",
                target.address,
                target.request_count,
                target.success_count(),
                target.error_count,
                target.error_rate()
            ));
        }

        output.push_str(&"-".repeat(98));
        output.push('\n');
        output.push_str(&format!(
            "{:<50} {:>12} {:>12} {:>12}   ({:.2} req/s)\n",
            "Total",
            self.total_requests,
            self.total_requests.saturating_sub(self.total_errors),
            self.total_errors,
            self.requests_per_second()
        ));
        output
    }
}

/// Read-only observer of a pool's targets.
pub struct StatsReporter {
    start_time: Instant,
    targets: Vec<Arc<Target>>,
    active_workers: Arc<AtomicUsize>,
    interval: Duration,
}

impl StatsReporter {
    pub fn new(pool: &Pool, interval: Duration) -> Self {
        Self {
            start_time: pool.start_time(),
            targets: pool.targets().to_vec(),
            active_workers: pool.active_workers_handle(),
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Takes a snapshot of every target.
    pub fn report(&self) -> StatsReport {
        let targets: Vec<TargetSnapshot> = self.targets.iter().map(|t| t.snapshot()).collect();
        let total_requests: u64 = targets.iter().map(|t| t.request_count).sum();
        let total_errors: u64 = targets.iter().map(|t| t.error_count).sum();

        StatsReport {
            elapsed_secs: self.start_time.elapsed().as_secs_f64(),
            active_workers: self.active_workers.load(Ordering::Relaxed),
            total_requests,
            total_errors,
            targets,
        }
    }

    /// Takes a snapshot and writes it to the log.
    pub fn log_report(&self) -> StatsReport {
        let report = self.report();

        info!(
            running_for = ?Duration::from_secs_f64(report.elapsed_secs),
            active_workers = report.active_workers,
            total_requests = report.total_requests,
            total_errors = report.total_errors,
            "Load statistics"
        );
        for target in &report.targets {
            info!(
                target_url = %target.address,
                requests = target.request_count,
                successes = target.success_count(),
                errors = target.error_count,
                "Target statistics"
            );
        }

        report
    }

    /// Reports on every interval tick, forever. Abort the handle to stop it.
    pub fn spawn(self) -> JoinHandle<()> {
        info!(interval = ?self.interval(), "Stats reporter started");
        tokio::spawn(async move {
            let mut ticker = time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                self.log_report();
            }
        })
    }
}
