//! OS signal handling.
//!
//! SIGINT (Ctrl+C) and, on Unix, SIGTERM stop every target. Workers finish the
//! request they are in and exit, which lets `Pool::run` return.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::pool::Pool;

/// Resolves with the name of the first shutdown signal received.
pub async fn shutdown_signal() -> std::io::Result<&'static str> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result.map(|_| "SIGINT"),
            _ = sigterm.recv() => Ok("SIGTERM"),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.map(|_| "Ctrl+C")
    }
}

/// Stops every target in `pool` once the process receives a shutdown signal.
pub fn spawn_stop_on_signal(pool: Arc<Pool>) -> JoinHandle<()> {
    tokio::spawn(async move {
        match shutdown_signal().await {
            Ok(signal) => {
                info!(
                    signal = signal,
                    targets = pool.targets().len(),
                    "Shutdown signal received, stopping all targets"
                );
                pool.signal_stop_all();
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for shutdown signals");
            }
        }
    })
}
