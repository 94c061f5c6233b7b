//! Backend registry.
//!
//! # Responsibilities
//! - Hold registered backends in insertion order
//! - Select the next live backend round-robin
//! - Hand out consistent snapshots for health checking
//! - Evict records the health monitor has marked
//!
//! # Lock ordering
//! The registry lock is always taken before any record lock and is never
//! held across network I/O. Record locks are private to `Backend` and are
//! released before its methods return, so callers cannot invert the order.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use url::Url;

use crate::error::BalancerError;
use crate::load_balancer::{backend::Backend, round_robin};

#[derive(Debug, Default)]
struct Inner {
    backends: Vec<Arc<Backend>>,
    /// Next round-robin candidate. In `[0, len)` whenever `backends` is non-empty.
    cursor: usize,
}

/// Concurrency-safe, ordered collection of backends.
#[derive(Debug, Default)]
pub struct Registry {
    inner: Mutex<Inner>,
    next_id: AtomicU64,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new live backend.
    ///
    /// Registering the same URL twice creates two independent records.
    pub fn register(&self, url: Url) -> Arc<Backend> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let backend = Arc::new(Backend::new(id, url));
        self.inner.lock().backends.push(backend.clone());
        backend
    }

    /// Select the next live backend and advance the cursor past it.
    pub fn next_live(&self) -> Result<Arc<Backend>, BalancerError> {
        let mut inner = self.inner.lock();
        let index = round_robin::next_live_index(&inner.backends, inner.cursor)
            .ok_or(BalancerError::NoBackends)?;
        inner.cursor = (index + 1) % inner.backends.len();
        Ok(inner.backends[index].clone())
    }

    /// Remove every record matching `predicate`. Returns the removed records.
    ///
    /// Records before the cursor shift it down so rotation continues with the
    /// same successor; the result is then clamped modulo the new length.
    pub fn evict<F>(&self, predicate: F) -> Vec<Arc<Backend>>
    where
        F: Fn(&Backend) -> bool,
    {
        let mut inner = self.inner.lock();
        let cursor = inner.cursor;
        let mut removed = Vec::new();
        let mut shift = 0;
        let mut index = 0;

        inner.backends.retain(|backend| {
            let evict = predicate(backend.as_ref());
            if evict {
                if index < cursor {
                    shift += 1;
                }
                removed.push(backend.clone());
            }
            index += 1;
            !evict
        });

        let len = inner.backends.len();
        inner.cursor = if len == 0 { 0 } else { (cursor - shift) % len };
        removed
    }

    /// Consistent copy of the current records, in round-robin order.
    pub fn snapshot(&self) -> Vec<Arc<Backend>> {
        self.inner.lock().backends.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of records currently considered alive.
    pub fn live_count(&self) -> usize {
        self.inner.lock().backends.iter().filter(|b| !b.is_dead()).count()
    }
}
