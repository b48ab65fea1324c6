//! Concurrent HTTP load generator.
//!
//! A [`pool::Pool`] holds one [`target::Target`] per URL and runs a fixed
//! number of workers against each of them, back to back, until the targets
//! are told to stop. A [`stats::StatsReporter`] logs the counters on a timer.

pub mod client;
pub mod config;
pub mod connection_pool;
pub mod errors;
pub mod executor;
pub mod logging;
pub mod metrics;
pub mod pool;
pub mod shutdown;
pub mod stats;
pub mod target;
pub mod target_file;
pub mod utils;
pub mod worker;
