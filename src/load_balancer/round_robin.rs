//! Round-robin selection over live backends.

use std::sync::Arc;
use crate::load_balancer::backend::Backend;

/// Scan forward from `cursor`, wrapping, and return the index of the first
/// live backend. Visits each slot at most once, so an all-dead slice
/// yields `None` instead of spinning.
pub fn next_live_index(backends: &[Arc<Backend>], cursor: usize) -> Option<usize> {
    let len = backends.len();
    if len == 0 {
        return None;
    }

    (0..len)
        .map(|offset| (cursor + offset) % len)
        .find(|&index| !backends[index].is_dead())
}
