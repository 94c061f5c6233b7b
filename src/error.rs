//! Error taxonomy for the balancer.
//!
//! Only `NoBackends`, the upstream variants and `RegistrationDecode` ever
//! reach an HTTP caller, and then only as a generic 500. Probe errors are
//! recorded as backend state and never surfaced.

use std::time::Duration;
use thiserror::Error;

/// Errors produced by the registry, the health monitor and the HTTP handlers.
#[derive(Debug, Error)]
pub enum BalancerError {
    /// Registry is empty or every record is dead.
    #[error("no live backends available")]
    NoBackends,

    /// Health probe failed at the transport level or returned a non-2xx status.
    #[error("health probe to {url} failed: {reason}")]
    ProbeFailure { url: String, reason: String },

    /// Health probe succeeded but the payload could not be understood.
    #[error("malformed health payload from {url}: {reason}")]
    MalformedHealthPayload { url: String, reason: String },

    /// Proxied GET failed at the transport level.
    #[error("upstream request to {url} failed: {reason}")]
    Upstream { url: String, reason: String },

    /// Proxied GET returned something other than 200.
    #[error("upstream {url} responded with status {status}")]
    UpstreamStatus { url: String, status: u16 },

    /// Proxied GET exceeded the configured deadline.
    #[error("upstream request to {url} timed out after {timeout:?}")]
    UpstreamTimeout { url: String, timeout: Duration },

    /// Registration body could not be decoded.
    #[error("failed to decode registration body: {0}")]
    RegistrationDecode(String),

    /// A backend base URL could not be combined with a request path.
    #[error("invalid backend url {url}: {reason}")]
    InvalidBackendUrl { url: String, reason: String },
}

impl BalancerError {
    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            BalancerError::NoBackends => "no_backends",
            BalancerError::ProbeFailure { .. } => "probe_failure",
            BalancerError::MalformedHealthPayload { .. } => "malformed_health_payload",
            BalancerError::Upstream { .. } => "upstream_error",
            BalancerError::UpstreamStatus { .. } => "upstream_status",
            BalancerError::UpstreamTimeout { .. } => "upstream_timeout",
            BalancerError::RegistrationDecode(_) => "registration_decode",
            BalancerError::InvalidBackendUrl { .. } => "invalid_backend_url",
        }
    }
}
