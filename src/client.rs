use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::str::FromStr;
use tracing::{info, warn};

use crate::connection_pool::PoolConfig;
use crate::errors::StartupError;
use crate::utils::split_escaped_headers;

/// Configuration for building the shared HTTP client.
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub skip_tls_verify: bool,
    pub custom_headers: Option<String>,
    pub pool_config: PoolConfig,
}

/// Builds the reqwest client every worker shares.
///
/// No client-wide timeout is set here; the request executor attaches one to
/// each request according to its timeout policy.
pub fn build_client(config: &ClientConfig) -> Result<reqwest::Client, StartupError> {
    let mut client_builder = reqwest::Client::builder();

    let parsed_headers = parse_custom_headers(config.custom_headers.as_deref())?;
    if !parsed_headers.is_empty() {
        info!(headers = parsed_headers.len(), "Configured custom default headers");
        client_builder = client_builder.default_headers(parsed_headers);
    }

    client_builder = config.pool_config.apply_to_builder(client_builder);
    info!(
        max_idle_per_host = config.pool_config.max_idle_per_host,
        idle_timeout = ?config.pool_config.idle_timeout,
        "Connection pool configured"
    );

    if config.skip_tls_verify {
        warn!("Skipping TLS certificate verification");
        client_builder = client_builder
            .danger_accept_invalid_certs(true)
            .danger_accept_invalid_hostnames(true);
    }

    client_builder
        .build()
        .map_err(|e| StartupError::Client(e.to_string()))
}

/// Parses `Name:Value` pairs separated by commas (`\,` for a literal comma).
pub fn parse_custom_headers(custom_headers_str: Option<&str>) -> Result<HeaderMap, StartupError> {
    let mut parsed_headers = HeaderMap::new();

    let headers_str = match custom_headers_str {
        Some(s) if !s.trim().is_empty() => s,
        _ => return Ok(parsed_headers),
    };

    for entry in split_escaped_headers(headers_str) {
        let (name_str, value_str) = entry.split_once(':').ok_or_else(|| {
            StartupError::Client(format!(
                "Invalid header format in CUSTOM_HEADERS: '{}'. Expected 'Name:Value'.",
                entry
            ))
        })?;

        let name_str = name_str.trim();
        let value_str = value_str.trim();
        if name_str.is_empty() {
            return Err(StartupError::Client(format!(
                "Header name cannot be empty in '{}'.",
                entry
            )));
        }

        let header_name = HeaderName::from_str(name_str).map_err(|e| {
            StartupError::Client(format!("Invalid header name '{}': {}", name_str, e))
        })?;
        let header_value = HeaderValue::from_str(value_str).map_err(|e| {
            StartupError::Client(format!(
                "Invalid header value for '{}': {}. Value: '{}'",
                name_str, e, value_str
            ))
        })?;

        parsed_headers.insert(header_name, header_value);
    }

    Ok(parsed_headers)
}
