//! A single URL under load.
//!
//! A [`Target`] owns its request/error counters and a broadcast stop signal.
//! Both counters sit behind one mutex so a reader never sees an error that is
//! not yet reflected in the request count.

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info};

#[derive(Debug, Default, Clone, Copy)]
struct Counters {
    requests: u64,
    errors: u64,
}

/// Point-in-time copy of a target's counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetSnapshot {
    pub address: String,
    pub request_count: u64,
    pub error_count: u64,
}

impl TargetSnapshot {
    pub fn success_count(&self) -> u64 {
        self.request_count.saturating_sub(self.error_count)
    }

    /// Error percentage, 0.0 when nothing was sent yet.
    pub fn error_rate(&self) -> f64 {
        if self.request_count == 0 {
            return 0.0;
        }
        (self.error_count as f64 / self.request_count as f64) * 100.0
    }
}

/// One URL under sustained load.
#[derive(Debug)]
pub struct Target {
    address: String,
    counters: Mutex<Counters>,
    stop: watch::Sender<bool>,
}

impl Target {
    /// Create a target with zeroed counters.
    ///
    /// The address is not validated; a malformed URL simply fails every request.
    pub fn new(address: impl Into<String>) -> Self {
        let (stop, _) = watch::channel(false);
        Self {
            address: address.into(),
            counters: Mutex::new(Counters::default()),
            stop,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    fn counters(&self) -> MutexGuard<'_, Counters> {
        // Counters are plain integers, a panicked holder cannot leave them torn.
        self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Count one attempted request, and one error if `is_error` is set.
    pub fn record_outcome(&self, is_error: bool) {
        let mut counters = self.counters();
        counters.requests += 1;
        if is_error {
            counters.errors += 1;
        }
    }

    pub fn snapshot(&self) -> TargetSnapshot {
        let counters = *self.counters();
        TargetSnapshot {
            address: self.address.clone(),
            request_count: counters.requests,
            error_count: counters.errors,
        }
    }

    /// Tell every worker bound to this target to stop.
    ///
    /// Idempotent, and safe to call whether or not anyone is listening.
    pub fn signal_stop(&self) {
        let already_stopped = self.stop.send_replace(true);
        if !already_stopped {
            info!(target_url = %self.address, "Stop signalled");
        } else {
            debug!(target_url = %self.address, "Stop already signalled");
        }
    }

    pub fn is_stopped(&self) -> bool {
        *self.stop.borrow()
    }
}
