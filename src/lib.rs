//! Registry-backed round-robin load balancer.
//!
//! Backends announce themselves over HTTP, a background monitor probes
//! them and evicts the ones that stay down, and the public path forwards
//! each request to the next live backend.

pub mod admin;
pub mod backend;
pub mod config;
pub mod error;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;

pub use config::schema::ProxyConfig;
pub use error::BalancerError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use load_balancer::Registry;
