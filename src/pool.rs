//! The worker pool.
//!
//! A [`Pool`] owns every [`Target`] and fans out `max_workers` workers per
//! target when [`Pool::run`] is called. Nothing in here ever stops a target:
//! `run` only returns once something outside the pool has signalled every
//! target (an OS signal handler, a test, an embedding application). Without
//! that, a load generator is supposed to keep going forever.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{error, info};

use crate::executor::RequestExecutor;
use crate::target::Target;
use crate::worker::{run_worker, WorkerConfig, WorkerState};

/// Result of a completed [`Pool::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub workers_spawned: usize,
    pub workers_stopped: usize,
    /// Workers whose task panicked; they count as stopped too.
    pub workers_panicked: usize,
}

pub struct Pool {
    start_time: Instant,
    max_workers: usize,
    targets: Vec<Arc<Target>>,
    executor: Arc<RequestExecutor>,
    active_workers: Arc<AtomicUsize>,
}

impl Pool {
    pub fn new(max_workers: usize, executor: RequestExecutor) -> Self {
        Self {
            start_time: Instant::now(),
            max_workers,
            targets: Vec::new(),
            executor: Arc::new(executor),
            active_workers: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Adds one target per address, in order.
    pub fn populate<I, S>(&mut self, addresses: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for address in addresses {
            self.add_target(address);
        }
    }

    pub fn add_target(&mut self, address: impl Into<String>) -> Arc<Target> {
        let target = Arc::new(Target::new(address));
        self.targets.push(target.clone());
        target
    }

    pub fn targets(&self) -> &[Arc<Target>] {
        &self.targets
    }

    pub fn start_time(&self) -> Instant {
        self.start_time
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Number of worker tasks currently alive.
    pub fn active_workers(&self) -> usize {
        self.active_workers.load(Ordering::Relaxed)
    }

    pub(crate) fn active_workers_handle(&self) -> Arc<AtomicUsize> {
        self.active_workers.clone()
    }

    /// Signals every target to stop.
    pub fn signal_stop_all(&self) {
        for target in &self.targets {
            target.signal_stop();
        }
    }

    /// Spawns `max_workers` workers per target and waits for all of them to stop.
    ///
    /// Returns immediately when the pool has no targets. Spawning for a target
    /// ends as soon as it is stopped, so a target stopped before `run` gets no
    /// workers at all.
    pub async fn run(&self) -> RunSummary {
        let mut handles = Vec::new();

        for target in &self.targets {
            for _ in 0..self.max_workers {
                if target.is_stopped() {
                    break;
                }
                let config = WorkerConfig {
                    worker_id: handles.len(),
                    target: target.clone(),
                    executor: self.executor.clone(),
                    active_workers: self.active_workers.clone(),
                };
                handles.push(tokio::spawn(run_worker(config)));
            }
        }

        let workers_spawned = handles.len();
        info!(
            targets = self.targets.len(),
            workers_per_target = self.max_workers,
            workers = workers_spawned,
            timeout_policy = %self.executor.timeout_policy(),
            "Workers spawned"
        );

        let mut summary = RunSummary {
            workers_spawned,
            workers_stopped: 0,
            workers_panicked: 0,
        };

        for handle in handles {
            match handle.await {
                Ok(WorkerState::Stopped) => summary.workers_stopped += 1,
                Ok(WorkerState::Running) => {
                    error!("Worker returned while still running");
                    summary.workers_stopped += 1;
                }
                Err(e) => {
                    error!(error = %e, "Worker task failed");
                    summary.workers_stopped += 1;
                    summary.workers_panicked += 1;
                }
            }
        }

        info!(
            workers_stopped = summary.workers_stopped,
            elapsed_secs = self.elapsed().as_secs_f64(),
            "All workers stopped"
        );

        summary
    }
}
