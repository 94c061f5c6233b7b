//! Inbound request logging.

use std::net::SocketAddr;

use axum::{body::Body, extract::ConnectInfo, http::Request};

/// Header carrying the correlation id set by the request-id layer.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Remote peer address, when the server was started with connect info.
pub fn remote_addr(request: &Request<Body>) -> Option<SocketAddr> {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr)
}

/// Log method, path, protocol, remote address and headers of `request`.
pub fn log_request(request: &Request<Body>) {
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");
    let remote = remote_addr(request)
        .map(|addr| addr.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    tracing::info!(
        request_id = %request_id,
        remote_addr = %remote,
        method = %request.method(),
        uri = %request.uri(),
        version = ?request.version(),
        "Received request"
    );

    for (name, value) in request.headers() {
        tracing::debug!(
            request_id = %request_id,
            header = %name,
            value = ?value,
            "Request header"
        );
    }
}
