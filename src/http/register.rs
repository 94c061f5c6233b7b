//! Backend registration endpoint.
//!
//! `POST` with `{"serverURL": "<absolute http base URL>"}` appends a record
//! and answers 200. Any other method is a 400; an undecodable body is a 500.

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::BalancerError;
use crate::http::{response, server::AppState};
use crate::observability::metrics;

/// Announcement a backend sends when it starts.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Registration {
    #[serde(rename = "serverURL", alias = "ServerURL")]
    pub server_url: String,
}

/// Decode a registration body into the backend's base URL.
pub fn parse_registration(body: &[u8]) -> Result<Url, BalancerError> {
    let registration: Registration = serde_json::from_slice(body)
        .map_err(|e| BalancerError::RegistrationDecode(format!("failed to parse json: {}", e)))?;

    let url = Url::parse(&registration.server_url).map_err(|e| {
        BalancerError::RegistrationDecode(format!("invalid serverURL {:?}: {}", registration.server_url, e))
    })?;

    if url.scheme() == "https" {
        return Err(BalancerError::RegistrationDecode(format!(
            "serverURL {:?} uses https, but the balancer only speaks plain http to backends",
            registration.server_url
        )));
    }

    if url.scheme() != "http" || url.host().is_none() {
        return Err(BalancerError::RegistrationDecode(format!(
            "serverURL must be an absolute http url, got {:?}",
            registration.server_url
        )));
    }

    Ok(url)
}

pub async fn register_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    if request.method() != Method::POST {
        tracing::warn!(method = %request.method(), "Rejected registration with unsupported method");
        metrics::record_registration("bad_method");
        return StatusCode::BAD_REQUEST.into_response();
    }

    let limit = state.registration.max_body_bytes;
    let body = match axum::body::to_bytes(request.into_body(), limit).await {
        Ok(body) => body,
        Err(e) => {
            metrics::record_registration("decode_error");
            return response::internal_error(&BalancerError::RegistrationDecode(format!(
                "error reading request body: {}",
                e
            )));
        }
    };

    let url = match parse_registration(&body) {
        Ok(url) => url,
        Err(e) => {
            metrics::record_registration("decode_error");
            return response::internal_error(&e);
        }
    };

    let backend = state.registry.register(url);
    tracing::info!(url = %backend.url(), id = backend.id(), "Registered backend");
    metrics::record_registration("success");
    metrics::record_registry_size(state.registry.len());

    StatusCode::OK.into_response()
}
