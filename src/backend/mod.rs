//! Demo backend: serves the proxied path and the health path, and
//! announces itself to the balancer on startup.

pub mod registration;
pub mod server;

pub use registration::{advertised_url, register, RegistrationError};
pub use server::router;
