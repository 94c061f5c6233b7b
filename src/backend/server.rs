//! Demo backend routes.

use axum::{routing::get, Json, Router};

use crate::health::HealthMessage;

pub const HELLO_BODY: &str = "hello world";

/// `/hello` and `/health`, the two paths the balancer relies on.
pub fn router() -> Router {
    Router::new()
        .route("/hello", get(hello))
        .route("/health", get(health))
}

async fn hello() -> &'static str {
    tracing::debug!("Reached /hello");
    HELLO_BODY
}

async fn health() -> Json<HealthMessage> {
    tracing::debug!("Health checking");
    Json(HealthMessage {
        message: "health".to_string(),
    })
}
