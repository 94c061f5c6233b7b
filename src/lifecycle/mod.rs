//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Bind listener → Spawn health monitor → Serve
//!
//! Shutdown (shutdown.rs):
//!     Signal received → broadcast → monitor exits, server drains → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Fail fast: a bind failure is fatal
//! - Every background task takes a shutdown receiver; none run unowned

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
