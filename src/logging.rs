//! Structured logging setup.
//!
//! The level comes from configuration and is validated up front: an unknown
//! level is a startup error rather than a silently ignored filter. `RUST_LOG`
//! still wins when it is set, which is handy for per-module debugging.

use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::errors::StartupError;

/// Output format of the log stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}', expected 'text' or 'json'", other)),
        }
    }
}

/// Validates a log level name ("trace", "debug", "info", "warn", "error").
pub fn parse_level(level: &str) -> Result<Level, StartupError> {
    Level::from_str(level.trim()).map_err(|e| StartupError::InvalidLogLevel {
        level: level.to_string(),
        message: e.to_string(),
    })
}

/// Installs the global tracing subscriber, writing to stderr.
pub fn init(level: &str, format: LogFormat) -> Result<(), StartupError> {
    let level = parse_level(level)?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let installed = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    installed.map_err(|e| StartupError::Logging(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_levels_parse() {
        assert_eq!(parse_level("trace").unwrap(), Level::TRACE);
        assert_eq!(parse_level("debug").unwrap(), Level::DEBUG);
        assert_eq!(parse_level("info").unwrap(), Level::INFO);
        assert_eq!(parse_level("WARN").unwrap(), Level::WARN);
        assert_eq!(parse_level(" error ").unwrap(), Level::ERROR);
    }

    #[test]
    fn unknown_level_is_startup_error() {
        let err = parse_level("chatty").unwrap_err();
        assert!(matches!(err, StartupError::InvalidLogLevel { .. }));
        assert!(err.to_string().contains("chatty"));
    }

    #[test]
    fn log_format_parse() {
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
