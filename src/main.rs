use std::sync::Arc;

use mimalloc::MiMalloc;
use tracing::{error, info};

use rust_urlswarm::client::build_client;
use rust_urlswarm::config::Config;
use rust_urlswarm::errors::StartupError;
use rust_urlswarm::executor::RequestExecutor;
use rust_urlswarm::logging::{self, LogFormat};
use rust_urlswarm::metrics::{register_metrics, start_metrics_server};
use rust_urlswarm::pool::Pool;
use rust_urlswarm::shutdown::spawn_stop_on_signal;
use rust_urlswarm::stats::StatsReporter;
use rust_urlswarm::target_file::load_targets;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Prints helpful configuration documentation.
fn print_config_help() {
    eprintln!("Optional environment variables:");
    eprintln!("  URLS_FILE               - File with one target URL per line (default: ./urls.txt)");
    eprintln!("  LOG_LEVEL               - trace, debug, info, warn or error (default: info)");
    eprintln!("  LOG_FORMAT              - text or json (default: text)");
    eprintln!("  MAX_WORKERS             - Concurrent workers per target (default: 50, must be > 0)");
    eprintln!("  STATS_INTERVAL          - How often statistics are logged: 500ms, 10s, 1m (default: 10s)");
    eprintln!();
    eprintln!("Request timeout configuration:");
    eprintln!("  TIMEOUT_POLICY          - fixed or randomized (default: fixed)");
    eprintln!("    fixed uses:");
    eprintln!("      REQUEST_TIMEOUT     - Timeout for every request (default: 5s)");
    eprintln!("    randomized uses:");
    eprintln!("      MAX_RANDOM_TIMEOUT  - Upper bound of the per-request timeout (default: 120s)");
    eprintln!();
    eprintln!("Advanced configuration:");
    eprintln!("  SKIP_TLS_VERIFY         - Skip TLS certificate verification (default: false)");
    eprintln!("  CUSTOM_HEADERS          - Comma-separated headers (use \\, for literal commas)");
    eprintln!("  METRICS_PORT            - Serve Prometheus metrics on this port (default: disabled)");
    eprintln!("  METRIC_NAMESPACE        - Prometheus metric namespace (default: rust_urlswarm)");
}

#[tokio::main]
async fn main() {
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}\n", e);
            print_config_help();
            std::process::exit(1);
        }
    };

    if let Err(e) = run(config).await {
        eprintln!("Startup error: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> Result<(), StartupError> {
    logging::init(&config.log_level, config.log_format)?;

    let addresses = load_targets(&config.urls_file)?;

    register_metrics()?;

    let client = build_client(&config.to_client_config())?;
    let executor = RequestExecutor::with_client(client, config.timeout_policy);

    let mut pool = Pool::new(config.max_workers, executor);
    pool.populate(addresses);
    config.log_summary(pool.targets().len());
    let pool = Arc::new(pool);

    if let Some(port) = config.metrics_port {
        tokio::spawn(start_metrics_server(port));
    }

    let final_reporter = StatsReporter::new(&pool, config.stats_interval);
    let stats_handle = StatsReporter::new(&pool, config.stats_interval).spawn();
    let signal_handle = spawn_stop_on_signal(pool.clone());

    // Only returns once every target has been stopped from outside the pool.
    let summary = pool.run().await;

    stats_handle.abort();
    signal_handle.abort();
    info!(
        workers_stopped = summary.workers_stopped,
        workers_panicked = summary.workers_panicked,
        "Load generation finished"
    );

    let report = final_reporter.log_report();
    match config.log_format {
        LogFormat::Json => match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => error!(error = %e, "Failed to serialize final report"),
        },
        LogFormat::Text => println!("{}", report.format_table()),
    }

    Ok(())
}
