//! Single-request execution against a target.
//!
//! [`RequestExecutor::execute`] issues one GET, classifies it and records it on
//! the target. Request failures never escape: they become an [`Outcome`] and an
//! incremented error counter. The HTTP backend sits behind the [`Transport`]
//! trait so the same classification and release logic runs against reqwest in
//! production and against instrumented transports in tests.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use rand::Rng;
use tracing::debug;

use crate::errors::{ErrorCategory, TransportError};
use crate::metrics::{REQUESTS_TOTAL, REQUEST_DURATION_SECONDS, REQUEST_ERRORS_TOTAL};
use crate::target::Target;

/// How long a single request may take before it is abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutPolicy {
    /// Same timeout for every request.
    Fixed(Duration),
    /// Fresh timeout per request, uniform over `(0, max]` at millisecond granularity.
    Randomized { max: Duration },
}

impl TimeoutPolicy {
    /// Timeout for the next request.
    pub fn next_timeout(&self) -> Duration {
        match *self {
            TimeoutPolicy::Fixed(timeout) => timeout,
            TimeoutPolicy::Randomized { max } => {
                let max_ms = u64::try_from(max.as_millis()).unwrap_or(u64::MAX).max(1);
                Duration::from_millis(rand::thread_rng().gen_range(1..=max_ms))
            }
        }
    }
}

impl fmt::Display for TimeoutPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeoutPolicy::Fixed(timeout) => write!(f, "fixed({:?})", timeout),
            TimeoutPolicy::Randomized { max } => write!(f, "randomized(0..{:?})", max),
        }
    }
}

/// Classification of a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success {
        status: u16,
    },
    Error {
        /// `None` when no response was received at all.
        status: Option<u16>,
        category: ErrorCategory,
    },
}

impl Outcome {
    /// Classifies a received status code: below 300 succeeds, the rest fails.
    pub fn from_status(status: u16) -> Self {
        match ErrorCategory::from_status_code(status) {
            None => Outcome::Success { status },
            Some(category) => Outcome::Error {
                status: Some(status),
                category,
            },
        }
    }

    pub fn from_transport_error(error: &TransportError) -> Self {
        Outcome::Error {
            status: None,
            category: error.category,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Outcome::Error { .. })
    }

    pub fn status(&self) -> Option<u16> {
        match *self {
            Outcome::Success { status } => Some(status),
            Outcome::Error { status, .. } => status,
        }
    }
}

/// A received response whose resources must be released.
#[async_trait]
pub trait TransportResponse: Send {
    fn status(&self) -> u16;

    /// Consumes and frees the response (body stream, connection slot).
    async fn release(self: Box<Self>) -> Result<(), TransportError>;
}

/// Issues GET requests.
///
/// Implementations are shared by every worker and must tolerate
/// unsynchronized concurrent use.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<Box<dyn TransportResponse>, TransportError>;
}

/// [`Transport`] backed by a shared `reqwest::Client`.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

struct ReqwestResponse(reqwest::Response);

#[async_trait]
impl TransportResponse for ReqwestResponse {
    fn status(&self) -> u16 {
        self.0.status().as_u16()
    }

    async fn release(self: Box<Self>) -> Result<(), TransportError> {
        let mut response = self.0;
        // Drain chunk by chunk so the connection can go back to the pool
        // without buffering whole bodies in memory.
        while response.chunk().await?.is_some() {}
        Ok(())
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<Box<dyn TransportResponse>, TransportError> {
        let response = self.client.get(url).timeout(timeout).send().await?;
        Ok(Box::new(ReqwestResponse(response)))
    }
}

/// Executes and records requests against targets.
#[derive(Clone)]
pub struct RequestExecutor {
    transport: Arc<dyn Transport>,
    timeout_policy: TimeoutPolicy,
}

impl RequestExecutor {
    pub fn new(transport: Arc<dyn Transport>, timeout_policy: TimeoutPolicy) -> Self {
        Self {
            transport,
            timeout_policy,
        }
    }

    /// Executor using reqwest as transport.
    pub fn with_client(client: reqwest::Client, timeout_policy: TimeoutPolicy) -> Self {
        Self::new(Arc::new(ReqwestTransport::new(client)), timeout_policy)
    }

    pub fn timeout_policy(&self) -> TimeoutPolicy {
        self.timeout_policy
    }

    /// Sends one GET to `target`, records the outcome on it and returns it.
    pub async fn execute(&self, target: &Target) -> Outcome {
        let timeout = self.timeout_policy.next_timeout();
        let started = Instant::now();

        let outcome = match self.transport.get(target.address(), timeout).await {
            Ok(response) => {
                let outcome = Outcome::from_status(response.status());
                // Released on every status; a failed release does not change the outcome.
                if let Err(e) = response.release().await {
                    debug!(
                        target_url = %target.address(),
                        error = %e,
                        "Failed to release response"
                    );
                }
                outcome
            }
            Err(e) => {
                debug!(
                    target_url = %target.address(),
                    error = %e,
                    timeout_ms = timeout.as_millis() as u64,
                    "Request failed"
                );
                Outcome::from_transport_error(&e)
            }
        };

        target.record_outcome(outcome.is_error());

        REQUEST_DURATION_SECONDS.observe(started.elapsed().as_secs_f64());
        REQUESTS_TOTAL.with_label_values(&[target.address()]).inc();
        if let Outcome::Error { category, .. } = outcome {
            REQUEST_ERRORS_TOTAL
                .with_label_values(&[target.address(), category.label()])
                .inc();
            debug!(
                target_url = %target.address(),
                status = ?outcome.status(),
                category = category.label(),
                "Request classified as error"
            );
        }

        outcome
    }
}
