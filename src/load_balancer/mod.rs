//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! POST /register → registry.rs (append record)
//! Public request → registry.rs (lock, round_robin.rs scan) → backend.rs record
//! Health tick    → registry.rs snapshot → probe → backend.rs state → evict
//! ```
//!
//! # Design Decisions
//! - Insertion order is round-robin order
//! - Dead backends are skipped, not removed; only the health monitor evicts
//! - One registry-wide lock for the sequence and cursor, one lock per record

pub mod backend;
pub mod registry;
pub mod round_robin;

pub use backend::{Backend, BackendState};
pub use registry::Registry;
