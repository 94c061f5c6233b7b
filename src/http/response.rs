//! Response helpers.
//!
//! Callers only ever see "success" or a generic internal error; the real
//! cause is logged server-side and never written to the response.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::error::BalancerError;

/// Body of every balancer-generated 500.
pub const GENERIC_ERROR_BODY: &str = "Server error";

/// Log `err` and build the generic 500 response.
pub fn internal_error(err: &BalancerError) -> Response {
    tracing::error!(kind = err.kind(), error = %err, "Request failed");
    (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_ERROR_BODY).into_response()
}
