//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active health checks (active.rs):
//!     Periodic timer
//!     → Snapshot registry
//!     → Probe each backend concurrently
//!     → Update record via state.rs
//!     → Evict records marked for removal
//! ```
//!
//! # Design Decisions
//! - Only the monitor demotes a backend; the dispatcher may only promote
//! - Health state is per-backend, guarded by the record's own lock
//! - A malformed payload is neither success nor failure

pub mod active;
pub mod state;

pub use active::HealthMonitor;
pub use state::{HealthMessage, ProbeOutcome};
