//! Request dispatcher for the public path.
//!
//! # Flow
//! ```text
//! log request → registry.next_live() → GET <backend>/<upstream_path>
//!     → 200: promote backend, stream body back
//!     → anything else: generic 500, backend state untouched
//! ```
//!
//! The inbound method and path are not forwarded; every request becomes a
//! GET of the configured upstream path.

use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{header, Method, Request, StatusCode, Uri},
    response::Response,
};
use futures_util::TryStreamExt;
use hyper::body::Incoming;
use tokio::time;

use crate::error::BalancerError;
use crate::http::{request, response, server::AppState};
use crate::observability::metrics;

pub async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    request::log_request(&request);

    match dispatch(&state).await {
        Ok(response) => {
            metrics::record_request("success", StatusCode::OK.as_u16(), start);
            response
        }
        Err(e) => {
            metrics::record_request(e.kind(), StatusCode::INTERNAL_SERVER_ERROR.as_u16(), start);
            response::internal_error(&e)
        }
    }
}

/// Pick a live backend, forward the GET and build the streamed response.
pub async fn dispatch(state: &AppState) -> Result<Response, BalancerError> {
    let backend = state.registry.next_live()?;
    let target = backend.endpoint(&state.proxy.upstream_path)?;
    let target_str = target.to_string();

    let upstream_error = |reason: String| BalancerError::Upstream {
        url: target_str.clone(),
        reason,
    };

    let uri: Uri = target
        .as_str()
        .parse()
        .map_err(|e| upstream_error(format!("invalid uri: {}", e)))?;
    let outbound = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .map_err(|e| upstream_error(format!("failed to build request: {}", e)))?;

    tracing::debug!(backend = %backend.url(), target = %target_str, "Forwarding request");

    let timeout = state.proxy.upstream_timeout();
    let upstream: axum::http::Response<Incoming> = match time::timeout(timeout, state.client.request(outbound)).await {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => return Err(upstream_error(e.to_string())),
        Err(_) => {
            return Err(BalancerError::UpstreamTimeout {
                url: target_str.clone(),
                timeout,
            })
        }
    };

    // Dropping `upstream` on the error path closes its body.
    if upstream.status() != StatusCode::OK {
        return Err(BalancerError::UpstreamStatus {
            url: target_str.clone(),
            status: upstream.status().as_u16(),
        });
    }

    backend.mark_alive();

    let (parts, body) = upstream.into_parts();
    let stream_url = target_str.clone();
    let stream = Body::new(body).into_data_stream().inspect_err(move |e| {
        tracing::error!(url = %stream_url, error = %e, "Upstream body failed mid-stream");
    });

    let mut builder = axum::http::Response::builder().status(StatusCode::OK);
    if let Some(content_type) = parts.headers.get(header::CONTENT_TYPE) {
        builder = builder.header(header::CONTENT_TYPE, content_type.clone());
    }
    builder
        .body(Body::from_stream(stream))
        .map_err(|e| upstream_error(format!("failed to build response: {}", e)))
}
