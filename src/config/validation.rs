//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (intervals, timeouts, thresholds > 0)
//! - Detect conflicting routes
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::ProxyConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field} must start with '/', got {value:?}")]
    RelativePath { field: &'static str, value: String },

    #[error("{field} is not a socket address: {value:?}")]
    BadAddress { field: &'static str, value: String },

    #[error("route {path:?} is used by both {first} and {second}")]
    RouteConflict {
        path: String,
        first: &'static str,
        second: &'static str,
    },
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let health = &config.health_check;
    for (field, value) in [
        ("health_check.interval_secs", health.interval_secs),
        ("health_check.timeout_secs", health.timeout_secs),
        ("health_check.max_tries", u64::from(health.max_tries)),
        ("proxy.upstream_timeout_secs", config.proxy.upstream_timeout_secs),
        ("proxy.request_timeout_secs", config.proxy.request_timeout_secs),
        ("registration.max_body_bytes", config.registration.max_body_bytes as u64),
    ] {
        if value == 0 {
            errors.push(ValidationError::Zero { field });
        }
    }

    let paths = [
        ("proxy.public_path", &config.proxy.public_path),
        ("proxy.upstream_path", &config.proxy.upstream_path),
        ("health_check.path", &health.path),
        ("registration.path", &config.registration.path),
    ];
    for (field, value) in paths {
        if !value.starts_with('/') {
            errors.push(ValidationError::RelativePath {
                field,
                value: value.clone(),
            });
        }
    }

    // Paths served by the balancer itself must not collide.
    let mut served = vec![
        ("proxy.public_path", config.proxy.public_path.as_str()),
        ("registration.path", config.registration.path.as_str()),
    ];
    if config.admin.enabled {
        served.push(("admin", "/admin/status"));
        served.push(("admin", "/admin/backends"));
    }
    for (i, (first, a)) in served.iter().enumerate() {
        for (second, b) in &served[i + 1..] {
            if a == b {
                errors.push(ValidationError::RouteConflict {
                    path: a.to_string(),
                    first: *first,
                    second: *second,
                });
            }
        }
    }

    for (field, value) in [
        ("listener.bind_address", &config.listener.bind_address),
        ("observability.metrics_address", &config.observability.metrics_address),
    ] {
        if value.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::BadAddress {
                field,
                value: value.clone(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
