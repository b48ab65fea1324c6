use std::env;
use std::path::PathBuf;
use tokio::time::Duration;
use tracing::{info, warn};

use crate::client::ClientConfig;
use crate::connection_pool::PoolConfig;
use crate::errors::ConfigError;
use crate::executor::TimeoutPolicy;
use crate::logging::LogFormat;
use crate::utils::{parse_bool_flag, parse_duration_string};

pub const DEFAULT_URLS_FILE: &str = "./urls.txt";
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_MAX_WORKERS: usize = 50;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_MAX_RANDOM_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_STATS_INTERVAL: Duration = Duration::from_secs(10);

/// Process-wide configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub urls_file: PathBuf,
    pub log_level: String,
    pub log_format: LogFormat,
    pub max_workers: usize,
    pub timeout_policy: TimeoutPolicy,
    pub stats_interval: Duration,
    pub skip_tls_verify: bool,
    pub custom_headers: Option<String>,
    pub metrics_port: Option<u16>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            urls_file: PathBuf::from(DEFAULT_URLS_FILE),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_format: LogFormat::Text,
            max_workers: DEFAULT_MAX_WORKERS,
            timeout_policy: TimeoutPolicy::Fixed(DEFAULT_REQUEST_TIMEOUT),
            stats_interval: DEFAULT_STATS_INTERVAL,
            skip_tls_verify: false,
            custom_headers: None,
            metrics_port: None,
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    ///
    /// Unset and empty variables fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Config::default();

        let urls_file = get("URLS_FILE")
            .map(PathBuf::from)
            .unwrap_or(defaults.urls_file);

        let log_level = get("LOG_LEVEL")
            .map(|v| v.trim().to_string())
            .unwrap_or(defaults.log_level);

        let log_format = match get("LOG_FORMAT") {
            Some(v) => v.parse().map_err(|message| ConfigError::InvalidValue {
                var: "LOG_FORMAT",
                value: v.clone(),
                message,
            })?,
            None => defaults.log_format,
        };

        let max_workers = match get("MAX_WORKERS") {
            Some(v) => v
                .trim()
                .parse::<usize>()
                .map_err(|e| ConfigError::InvalidValue {
                    var: "MAX_WORKERS",
                    value: v.clone(),
                    message: e.to_string(),
                })?,
            None => defaults.max_workers,
        };
        if max_workers == 0 {
            return Err(ConfigError::MustBePositive { var: "MAX_WORKERS" });
        }

        let timeout_policy = Self::parse_timeout_policy(&get)?;
        if let Some(var) = ignored_timeout_var(&timeout_policy, &get) {
            warn!(
                var = var,
                timeout_policy = %timeout_policy,
                "Timeout variable is set but does not apply to the selected TIMEOUT_POLICY, ignoring it"
            );
        }

        let stats_interval = match get("STATS_INTERVAL") {
            Some(v) => parse_duration_var("STATS_INTERVAL", &v)?,
            None => defaults.stats_interval,
        };
        if stats_interval.is_zero() {
            return Err(ConfigError::MustBePositive {
                var: "STATS_INTERVAL",
            });
        }

        let skip_tls_verify = get("SKIP_TLS_VERIFY")
            .map(|v| parse_bool_flag(&v))
            .unwrap_or(defaults.skip_tls_verify);

        let custom_headers = get("CUSTOM_HEADERS");

        let metrics_port = match get("METRICS_PORT") {
            Some(v) => Some(v.trim().parse::<u16>().map_err(|e| {
                ConfigError::InvalidValue {
                    var: "METRICS_PORT",
                    value: v.clone(),
                    message: e.to_string(),
                }
            })?),
            None => None,
        };

        Ok(Config {
            urls_file,
            log_level,
            log_format,
            max_workers,
            timeout_policy,
            stats_interval,
            skip_tls_verify,
            custom_headers,
            metrics_port,
        })
    }

    fn parse_timeout_policy<G>(get: &G) -> Result<TimeoutPolicy, ConfigError>
    where
        G: Fn(&str) -> Option<String>,
    {
        let policy = get("TIMEOUT_POLICY").unwrap_or_else(|| "fixed".to_string());

        match policy.trim().to_lowercase().as_str() {
            "fixed" => {
                let timeout = match get("REQUEST_TIMEOUT") {
                    Some(v) => parse_duration_var("REQUEST_TIMEOUT", &v)?,
                    None => DEFAULT_REQUEST_TIMEOUT,
                };
                if timeout.is_zero() {
                    return Err(ConfigError::MustBePositive {
                        var: "REQUEST_TIMEOUT",
                    });
                }
                Ok(TimeoutPolicy::Fixed(timeout))
            }
            "randomized" | "random" => {
                let max = match get("MAX_RANDOM_TIMEOUT") {
                    Some(v) => parse_duration_var("MAX_RANDOM_TIMEOUT", &v)?,
                    None => DEFAULT_MAX_RANDOM_TIMEOUT,
                };
                if max < Duration::from_millis(1) {
                    return Err(ConfigError::MustBePositive {
                        var: "MAX_RANDOM_TIMEOUT",
                    });
                }
                Ok(TimeoutPolicy::Randomized { max })
            }
            _ => Err(ConfigError::InvalidValue {
                var: "TIMEOUT_POLICY",
                value: policy.clone(),
                message: "expected 'fixed' or 'randomized'".to_string(),
            }),
        }
    }

    /// Creates a ClientConfig from this Config.
    pub fn to_client_config(&self) -> ClientConfig {
        ClientConfig {
            skip_tls_verify: self.skip_tls_verify,
            custom_headers: self.custom_headers.clone(),
            pool_config: PoolConfig::for_workers(self.max_workers),
        }
    }

    /// Logs the configuration summary.
    pub fn log_summary(&self, targets: usize) {
        info!(
            urls_file = %self.urls_file.display(),
            targets = targets,
            max_workers = self.max_workers,
            total_workers = targets.saturating_mul(self.max_workers),
            timeout_policy = %self.timeout_policy,
            stats_interval_secs = self.stats_interval.as_secs_f64(),
            skip_tls_verify = self.skip_tls_verify,
            custom_headers = self.custom_headers.is_some(),
            metrics_port = ?self.metrics_port,
            "Starting load generator"
        );
    }
}

/// The timeout variable that belongs to the policy not in use, if it is set.
fn ignored_timeout_var<G>(policy: &TimeoutPolicy, get: &G) -> Option<&'static str>
where
    G: Fn(&str) -> Option<String>,
{
    let other = match policy {
        TimeoutPolicy::Fixed(_) => "MAX_RANDOM_TIMEOUT",
        TimeoutPolicy::Randomized { .. } => "REQUEST_TIMEOUT",
    };
    get(other).map(|_| other)
}

fn parse_duration_var(var: &'static str, value: &str) -> Result<Duration, ConfigError> {
    parse_duration_string(value).map_err(|message| ConfigError::InvalidValue {
        var,
        value: value.to_string(),
        message,
    })
}
