//! Probe outcome classification and backend state transitions.
//!
//! # Transitions
//! ```text
//! Healthy payload:    is_dead=false, revive_attempts=0
//! Failure / timeout:  is_dead=true,  revive_attempts+=1  (marked at max_tries)
//! Malformed payload:  unchanged
//! ```

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::BalancerError;
use crate::load_balancer::{Backend, BackendState};

/// Body a backend returns from its health endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HealthMessage {
    #[serde(alias = "Message")]
    pub message: String,
}

/// Result of a single probe.
#[derive(Debug)]
pub enum ProbeOutcome {
    Healthy,
    Failed(BalancerError),
    Malformed(BalancerError),
}

impl ProbeOutcome {
    pub fn failed(url: &Url, reason: impl Into<String>) -> Self {
        ProbeOutcome::Failed(BalancerError::ProbeFailure {
            url: url.to_string(),
            reason: reason.into(),
        })
    }

    pub fn malformed(url: &Url, reason: impl Into<String>) -> Self {
        ProbeOutcome::Malformed(BalancerError::MalformedHealthPayload {
            url: url.to_string(),
            reason: reason.into(),
        })
    }

    /// Classify the body of a 2xx health response.
    pub fn from_payload(url: &Url, body: &[u8]) -> Self {
        match serde_json::from_slice::<HealthMessage>(body) {
            Ok(_) => ProbeOutcome::Healthy,
            Err(e) => ProbeOutcome::malformed(url, e.to_string()),
        }
    }

    /// Metrics label.
    pub fn label(&self) -> &'static str {
        match self {
            ProbeOutcome::Healthy => "healthy",
            ProbeOutcome::Failed(_) => "failed",
            ProbeOutcome::Malformed(_) => "malformed",
        }
    }

    /// Apply this outcome to the record and return the resulting state.
    pub fn apply(&self, backend: &Backend, max_tries: u32) -> BackendState {
        match self {
            ProbeOutcome::Healthy => {
                backend.mark_alive();
                backend.state()
            }
            ProbeOutcome::Failed(_) => backend.record_failure(max_tries),
            ProbeOutcome::Malformed(_) => backend.state(),
        }
    }
}
