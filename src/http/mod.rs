//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (log request metadata)
//!     → proxy.rs    public path: select backend, forward GET, stream body
//!     → register.rs registration path: decode announcement, append record
//!     → response.rs (generic 500 on any failure)
//!     → Send to client
//! ```

pub mod proxy;
pub mod register;
pub mod request;
pub mod response;
pub mod server;

pub use register::Registration;
pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer};
