//! Error types and request outcome categorization.
//!
//! Two families live here. [`ErrorCategory`] and [`TransportError`] describe
//! per-request failures; those never leave the request executor and only show
//! up as counters. [`ConfigError`] and [`StartupError`] are fatal and abort the
//! process before any worker is spawned.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Categories a failed request can fall into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// HTTP 3xx responses that reached the executor (redirect not followed)
    Redirection,

    /// HTTP 4xx errors (client errors)
    ClientError,

    /// HTTP 5xx errors (server errors)
    ServerError,

    /// Any other status code at or above 300 (600+, nonstandard)
    UnexpectedStatus,

    /// Network connectivity errors (DNS, connection refused, etc.)
    NetworkError,

    /// Request timeout errors
    TimeoutError,

    /// TLS/SSL certificate errors
    TlsError,

    /// Other/unknown errors
    OtherError,
}

impl ErrorCategory {
    /// Categorize an HTTP status code.
    ///
    /// Anything below 300 is a success and yields `None`. Everything from 300
    /// upwards counts as an error.
    pub fn from_status_code(status_code: u16) -> Option<Self> {
        match status_code {
            0..=299 => None,
            300..=399 => Some(ErrorCategory::Redirection),
            400..=499 => Some(ErrorCategory::ClientError),
            500..=599 => Some(ErrorCategory::ServerError),
            _ => Some(ErrorCategory::UnexpectedStatus),
        }
    }

    /// Categorize a reqwest error.
    pub fn from_reqwest_error(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            ErrorCategory::TimeoutError
        } else if error.is_connect() {
            // TLS handshake failures surface as connect errors too
            let chain = error_chain_lowercase(error);
            if chain.contains("certificate") || chain.contains("tls") || chain.contains("ssl") {
                ErrorCategory::TlsError
            } else {
                ErrorCategory::NetworkError
            }
        } else if error.is_request() || error.is_body() || error.is_decode() {
            ErrorCategory::NetworkError
        } else if error.is_redirect() {
            ErrorCategory::Redirection
        } else if error.is_builder() {
            // Malformed target URLs end up here
            ErrorCategory::OtherError
        } else {
            let chain = error_chain_lowercase(error);

            if chain.contains("certificate") || chain.contains("tls") || chain.contains("ssl") {
                ErrorCategory::TlsError
            } else if chain.contains("timeout") || chain.contains("timed out") {
                ErrorCategory::TimeoutError
            } else if chain.contains("dns")
                || chain.contains("resolve")
                || chain.contains("connect")
                || chain.contains("connection")
            {
                ErrorCategory::NetworkError
            } else {
                ErrorCategory::OtherError
            }
        }
    }

    /// Get the Prometheus label for this error category.
    pub fn label(&self) -> &'static str {
        match self {
            ErrorCategory::Redirection => "redirection",
            ErrorCategory::ClientError => "client_error",
            ErrorCategory::ServerError => "server_error",
            ErrorCategory::UnexpectedStatus => "unexpected_status",
            ErrorCategory::NetworkError => "network_error",
            ErrorCategory::TimeoutError => "timeout_error",
            ErrorCategory::TlsError => "tls_error",
            ErrorCategory::OtherError => "other_error",
        }
    }

    /// Get a human-readable description of this error category.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCategory::Redirection => "HTTP 3xx Redirections",
            ErrorCategory::ClientError => "HTTP 4xx Client Errors",
            ErrorCategory::ServerError => "HTTP 5xx Server Errors",
            ErrorCategory::UnexpectedStatus => "Nonstandard HTTP Status Codes",
            ErrorCategory::NetworkError => "Network/Connection Errors",
            ErrorCategory::TimeoutError => "Request Timeout Errors",
            ErrorCategory::TlsError => "TLS/SSL Certificate Errors",
            ErrorCategory::OtherError => "Other/Unknown Errors",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

fn error_chain_lowercase(error: &(dyn std::error::Error + 'static)) -> String {
    let mut out = error.to_string();
    let mut source = error.source();
    while let Some(inner) = source {
        out.push_str(": ");
        out.push_str(&inner.to_string());
        source = inner.source();
    }
    out.to_lowercase()
}

/// A request that never produced a response.
#[derive(Debug, Clone, Error)]
#[error("[{}] {message}", .category.label())]
pub struct TransportError {
    pub category: ErrorCategory,
    pub message: String,
}

impl TransportError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        Self {
            category: ErrorCategory::from_reqwest_error(&error),
            message: error.to_string(),
        }
    }
}

/// An environment variable held a value that could not be used.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Invalid {var} value '{value}': {message}")]
    InvalidValue {
        var: &'static str,
        value: String,
        message: String,
    },

    #[error("{var} must be greater than 0")]
    MustBePositive { var: &'static str },
}

/// Fatal errors raised before the worker pool starts.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid log level '{level}': {message}")]
    InvalidLogLevel { level: String, message: String },

    #[error("Failed to install log subscriber: {0}")]
    Logging(String),

    #[error("Failed to read target file {path:?}: {source}")]
    TargetFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    #[error("Failed to register metrics: {0}")]
    Metrics(#[from] prometheus::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorize_success_codes() {
        assert_eq!(ErrorCategory::from_status_code(100), None);
        assert_eq!(ErrorCategory::from_status_code(200), None);
        assert_eq!(ErrorCategory::from_status_code(201), None);
        assert_eq!(ErrorCategory::from_status_code(204), None);
        assert_eq!(ErrorCategory::from_status_code(299), None);
    }

    #[test]
    fn test_categorize_3xx_as_errors() {
        assert_eq!(
            ErrorCategory::from_status_code(300),
            Some(ErrorCategory::Redirection)
        );
        assert_eq!(
            ErrorCategory::from_status_code(301),
            Some(ErrorCategory::Redirection)
        );
        assert_eq!(
            ErrorCategory::from_status_code(304),
            Some(ErrorCategory::Redirection)
        );
    }

    #[test]
    fn test_categorize_4xx_errors() {
        assert_eq!(
            ErrorCategory::from_status_code(400),
            Some(ErrorCategory::ClientError)
        );
        assert_eq!(
            ErrorCategory::from_status_code(404),
            Some(ErrorCategory::ClientError)
        );
        assert_eq!(
            ErrorCategory::from_status_code(429),
            Some(ErrorCategory::ClientError)
        );
    }

    #[test]
    fn test_categorize_5xx_errors() {
        assert_eq!(
            ErrorCategory::from_status_code(500),
            Some(ErrorCategory::ServerError)
        );
        assert_eq!(
            ErrorCategory::from_status_code(503),
            Some(ErrorCategory::ServerError)
        );
        assert_eq!(
            ErrorCategory::from_status_code(600),
            Some(ErrorCategory::UnexpectedStatus)
        );
    }

    #[test]
    fn test_error_category_labels() {
        assert_eq!(ErrorCategory::Redirection.label(), "redirection");
        assert_eq!(ErrorCategory::ClientError.label(), "client_error");
        assert_eq!(ErrorCategory::ServerError.label(), "server_error");
        assert_eq!(ErrorCategory::NetworkError.label(), "network_error");
        assert_eq!(ErrorCategory::TimeoutError.label(), "timeout_error");
        assert_eq!(ErrorCategory::TlsError.label(), "tls_error");
    }

    #[test]
    fn test_all_categories_have_distinct_labels() {
        let categories = [
            ErrorCategory::Redirection,
            ErrorCategory::ClientError,
            ErrorCategory::ServerError,
            ErrorCategory::UnexpectedStatus,
            ErrorCategory::NetworkError,
            ErrorCategory::TimeoutError,
            ErrorCategory::TlsError,
            ErrorCategory::OtherError,
        ];

        let mut labels: Vec<_> = categories.iter().map(|c| c.label()).collect();
        labels.sort();
        labels.dedup();
        assert_eq!(labels.len(), 8);
    }

    #[test]
    fn test_transport_error_display() {
        let err = TransportError::new(ErrorCategory::NetworkError, "connection refused");
        let display = err.to_string();
        assert!(display.contains("network_error"));
        assert!(display.contains("connection refused"));
    }

    #[test]
    fn test_startup_error_wraps_config_error() {
        let err: StartupError = ConfigError::MustBePositive { var: "MAX_WORKERS" }.into();
        assert!(err.to_string().contains("MAX_WORKERS must be greater than 0"));
    }
}
