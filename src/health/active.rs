//! Active health checking.
//!
//! # Responsibilities
//! - Periodically probe every registered backend, concurrently
//! - Update backend health state based on results
//! - Evict backends that exhausted their probe budget

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{header, Method, Request, Uri};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::sync::broadcast;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{self, MissedTickBehavior};

use crate::config::HealthCheckConfig;
use crate::health::state::ProbeOutcome;
use crate::load_balancer::{Backend, Registry};
use crate::observability::metrics;

/// Health payloads are tiny; anything larger is not a health payload.
const MAX_HEALTH_BODY: usize = 64 * 1024;

/// Summary of one health-check pass.
#[derive(Debug, Default)]
pub struct TickReport {
    pub probed: usize,
    pub healthy: usize,
    pub failed: usize,
    pub malformed: usize,
    /// Backends already out of attempts when the pass started.
    pub skipped: usize,
    pub evicted: Vec<Arc<Backend>>,
}

pub struct HealthMonitor {
    registry: Arc<Registry>,
    config: HealthCheckConfig,
    client: Client<HttpConnector, Body>,
}

impl HealthMonitor {
    pub fn new(registry: Arc<Registry>, config: HealthCheckConfig) -> Self {
        let client = Client::builder(TokioExecutor::new())
            .build(HttpConnector::new());

        Self {
            registry,
            config,
            client,
        }
    }

    /// Run the monitor on its own task until `shutdown` fires.
    pub fn spawn(self, shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if !self.config.enabled {
            tracing::info!("Active health checks disabled");
            return;
        }

        tracing::info!(
            interval = self.config.interval_secs,
            timeout = self.config.timeout_secs,
            max_tries = self.config.max_tries,
            path = %self.config.path,
            "Health monitor starting"
        );

        let interval = self.config.interval();
        // First probe one full interval after start.
        let mut ticker = time::interval_at(time::Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.check_all().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Probe every backend once, apply the results, then evict.
    pub async fn check_all(&self) -> TickReport {
        // Snapshot under the registry lock; probing holds no registry lock.
        let backends = self.registry.snapshot();
        let mut report = TickReport::default();
        if backends.is_empty() {
            return report;
        }

        let max_tries = self.config.max_tries;
        let timeout = self.config.timeout();
        let mut probes = JoinSet::new();

        for backend in backends {
            if backend.mark_if_exhausted(max_tries) {
                tracing::debug!(url = %backend.url(), "Backend out of revive attempts, skipping probe");
                report.skipped += 1;
                continue;
            }

            let client = self.client.clone();
            let path = self.config.path.clone();
            probes.spawn(async move {
                let outcome = probe(&client, &backend, &path, timeout).await;
                let state = outcome.apply(&backend, max_tries);

                match &outcome {
                    ProbeOutcome::Healthy => {
                        tracing::debug!(url = %backend.url(), "Health check succeeded");
                    }
                    ProbeOutcome::Failed(e) => {
                        tracing::warn!(
                            url = %backend.url(),
                            revive_attempts = state.revive_attempts,
                            marked_for_removal = state.marked_for_removal,
                            error = %e,
                            "Health check failed"
                        );
                    }
                    ProbeOutcome::Malformed(e) => {
                        tracing::warn!(url = %backend.url(), error = %e, "Health check payload malformed, state unchanged");
                    }
                }

                metrics::record_probe(outcome.label());
                metrics::record_backend_health(backend.url().as_str(), !state.is_dead);
                outcome
            });
        }

        // All record locks are released by the time a probe task finishes.
        while let Some(joined) = probes.join_next().await {
            report.probed += 1;
            match joined {
                Ok(ProbeOutcome::Healthy) => report.healthy += 1,
                Ok(ProbeOutcome::Failed(_)) => report.failed += 1,
                Ok(ProbeOutcome::Malformed(_)) => report.malformed += 1,
                Err(e) => tracing::error!(error = %e, "Health probe task panicked"),
            }
        }

        report.evicted = self.registry.evict(Backend::is_marked_for_removal);
        for backend in &report.evicted {
            tracing::info!(url = %backend.url(), id = backend.id(), "Removed backend after repeated failed health checks");
            metrics::record_eviction(backend.url().as_str());
        }
        metrics::record_registry_size(self.registry.len());

        report
    }
}

/// Issue one GET to the backend's health path under a hard deadline.
async fn probe(
    client: &Client<HttpConnector, Body>,
    backend: &Backend,
    path: &str,
    timeout: Duration,
) -> ProbeOutcome {
    let url = match backend.endpoint(path) {
        Ok(url) => url,
        Err(e) => return ProbeOutcome::failed(backend.url(), e.to_string()),
    };

    let uri: Uri = match url.as_str().parse() {
        Ok(uri) => uri,
        Err(e) => return ProbeOutcome::failed(&url, format!("invalid uri: {}", e)),
    };

    let request = match Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(header::USER_AGENT, "loadbalancer-health-check")
        .body(Body::empty())
    {
        Ok(req) => req,
        Err(e) => return ProbeOutcome::failed(&url, format!("failed to build request: {}", e)),
    };

    tracing::debug!(url = %url, "Sending health check");
    let started = Instant::now();

    let response = match time::timeout(timeout, client.request(request)).await {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => return ProbeOutcome::failed(&url, format!("connection error: {}", e)),
        Err(_) => return ProbeOutcome::failed(&url, format!("timed out after {:?}", timeout)),
    };

    let status = response.status();
    if !status.is_success() {
        return ProbeOutcome::failed(&url, format!("non-success status {}", status));
    }

    let remaining = timeout.saturating_sub(started.elapsed());
    let body = Body::new(response.into_body());
    match time::timeout(remaining, axum::body::to_bytes(body, MAX_HEALTH_BODY)).await {
        Ok(Ok(bytes)) => ProbeOutcome::from_payload(&url, &bytes),
        Ok(Err(e)) => ProbeOutcome::malformed(&url, format!("failed to read body: {}", e)),
        Err(_) => ProbeOutcome::failed(&url, format!("timed out after {:?}", timeout)),
    }
}
