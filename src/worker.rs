use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::{debug, info};

use crate::executor::RequestExecutor;
use crate::metrics::ACTIVE_WORKERS;
use crate::target::Target;

/// Lifecycle of a worker. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Running,
    Stopped,
}

/// Everything a worker task needs, bound to one target for its whole life.
pub struct WorkerConfig {
    pub worker_id: usize,
    pub target: Arc<Target>,
    pub executor: Arc<RequestExecutor>,
    pub active_workers: Arc<AtomicUsize>,
}

/// Keeps the live-worker count right on every exit path, panics included.
struct ActiveGuard {
    active_workers: Arc<AtomicUsize>,
}

impl ActiveGuard {
    fn enter(active_workers: Arc<AtomicUsize>) -> Self {
        active_workers.fetch_add(1, Ordering::Relaxed);
        ACTIVE_WORKERS.inc();
        Self { active_workers }
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.active_workers.fetch_sub(1, Ordering::Relaxed);
        ACTIVE_WORKERS.dec();
    }
}

/// Sends requests to the bound target back to back until its stop signal fires.
///
/// There is no pacing between requests; throughput is bounded only by request
/// latency and the timeout policy. A request already in flight when the stop
/// fires is allowed to finish (or time out) first.
pub async fn run_worker(config: WorkerConfig) -> WorkerState {
    let _guard = ActiveGuard::enter(config.active_workers.clone());
    let mut state = WorkerState::Running;

    debug!(
        worker_id = config.worker_id,
        target_url = %config.target.address(),
        "Worker starting"
    );

    let mut requests: u64 = 0;
    while state == WorkerState::Running {
        if config.target.is_stopped() {
            state = WorkerState::Stopped;
            continue;
        }

        config.executor.execute(&config.target).await;
        requests += 1;

        // A transport that answers without suspending would otherwise keep
        // this task on its thread forever.
        tokio::task::yield_now().await;
    }

    info!(
        worker_id = config.worker_id,
        target_url = %config.target.address(),
        requests = requests,
        "Worker stopped"
    );

    state
}
