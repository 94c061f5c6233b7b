//! Backend record.
//!
//! # Responsibilities
//! - Represent a single registered backend server
//! - Track health state (dead flag, consecutive failed probes, eviction mark)
//! - Build upstream URLs from the backend's base address
//!
//! # Design Decisions
//! - Each record owns its own lock; updating one backend never blocks
//!   traffic to another
//! - The lock is private and only held inside these methods, so it can
//!   never be held across network I/O or while taking the registry lock

use parking_lot::Mutex;
use url::Url;

use crate::error::BalancerError;

/// Mutable health fields of a backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackendState {
    /// True once a probe fails or times out.
    pub is_dead: bool,
    /// Consecutive failed probes since the last success.
    pub revive_attempts: u32,
    /// Set once a dead backend exhausts its probe budget. Never cleared.
    pub marked_for_removal: bool,
}

/// A single registered backend server.
#[derive(Debug)]
pub struct Backend {
    id: u64,
    url: Url,
    state: Mutex<BackendState>,
}

impl Backend {
    /// Create a live backend record.
    pub fn new(id: u64, url: Url) -> Self {
        Self {
            id,
            url,
            state: Mutex::new(BackendState::default()),
        }
    }

    /// Registry-assigned identifier, unique even for duplicate URLs.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Copy of the current health fields.
    pub fn state(&self) -> BackendState {
        *self.state.lock()
    }

    pub fn is_dead(&self) -> bool {
        self.state.lock().is_dead
    }

    pub fn is_marked_for_removal(&self) -> bool {
        self.state.lock().marked_for_removal
    }

    /// Record evidence of liveness: clears the dead flag and the failure count.
    ///
    /// A pending eviction mark is kept; a record is never resurrected once
    /// its probe budget is spent.
    pub fn mark_alive(&self) {
        let mut state = self.state.lock();
        state.is_dead = false;
        state.revive_attempts = 0;
    }

    /// Record a failed probe. Returns the resulting state.
    pub fn record_failure(&self, max_tries: u32) -> BackendState {
        let mut state = self.state.lock();
        state.is_dead = true;
        state.revive_attempts = state.revive_attempts.saturating_add(1);
        if state.revive_attempts >= max_tries {
            state.marked_for_removal = true;
        }
        *state
    }

    /// Mark the record for removal if it is dead and out of attempts.
    ///
    /// Returns true when the record is (now) marked.
    pub fn mark_if_exhausted(&self, max_tries: u32) -> bool {
        let mut state = self.state.lock();
        if state.is_dead && state.revive_attempts >= max_tries {
            state.marked_for_removal = true;
        }
        state.marked_for_removal
    }

    /// Join `path` onto the backend's base URL, keeping any base path.
    pub fn endpoint(&self, path: &str) -> Result<Url, BalancerError> {
        let mut url = self.url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| BalancerError::InvalidBackendUrl {
                url: self.url.to_string(),
                reason: "url cannot be a base".to_string(),
            })?;
            segments.pop_if_empty();
            segments.extend(path.split('/').filter(|s| !s.is_empty()));
        }
        Ok(url)
    }
}
