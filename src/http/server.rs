//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Compose the Axum router from the balancer's routes
//! - Wire up middleware (tracing, timeout, request ID)
//! - Own the registry and start the health monitor alongside the server
//! - Stop both on the shared shutdown signal

use axum::{
    body::Body,
    http::HeaderName,
    routing::any,
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin;
use crate::config::{AdminConfig, ProxyConfig, ProxyPathConfig, RegistrationConfig};
use crate::health::HealthMonitor;
use crate::http::{proxy::proxy_handler, register::register_handler, request::X_REQUEST_ID};
use crate::lifecycle::{shutdown, Shutdown};
use crate::load_balancer::Registry;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
    pub client: Client<HttpConnector, Body>,
    pub proxy: ProxyPathConfig,
    pub registration: RegistrationConfig,
    pub admin: AdminConfig,
}

/// The load balancer's HTTP front end.
///
/// Has a router rather than being one: only the public path, the
/// registration path and the optional admin routes are served.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
    registry: Arc<Registry>,
}

impl HttpServer {
    /// Create a server with an empty registry.
    pub fn new(config: ProxyConfig) -> Self {
        Self::with_registry(config, Arc::new(Registry::new()))
    }

    /// Create a server around an existing registry.
    pub fn with_registry(config: ProxyConfig, registry: Arc<Registry>) -> Self {
        let client = Client::builder(TokioExecutor::new())
            .build(HttpConnector::new());

        let state = AppState {
            registry: registry.clone(),
            client,
            proxy: config.proxy.clone(),
            registration: config.registration.clone(),
            admin: config.admin.clone(),
        };

        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            registry,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        let x_request_id = HeaderName::from_static(X_REQUEST_ID);

        let mut router = Router::new()
            .route(&config.proxy.public_path, any(proxy_handler))
            .route(&config.registration.path, any(register_handler))
            .with_state(state.clone());

        if config.admin.enabled {
            router = router.merge(admin::setup_admin_router(state));
        }

        router
            .layer(TimeoutLayer::new(Duration::from_secs(config.proxy.request_timeout_secs)))
            .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(x_request_id, MakeRequestUuid))
    }

    /// Router for in-process use (tests, embedding).
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Serve on `listener` until `shutdown` fires, running the health
    /// monitor for the same lifetime.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            public_path = %self.config.proxy.public_path,
            registration_path = %self.config.registration.path,
            "HTTP server starting"
        );

        let monitor = HealthMonitor::new(self.registry.clone(), self.config.health_check.clone())
            .spawn(shutdown.subscribe());

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        let served = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown::wait(shutdown.subscribe()))
            .await;

        // Stop the monitor even if the server failed on its own.
        shutdown.trigger();
        if let Err(e) = monitor.await {
            tracing::error!(error = %e, "Health monitor task failed");
        }

        served?;
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Method, Request, StatusCode};
    use tower::ServiceExt;

    fn server() -> HttpServer {
        let mut config = ProxyConfig::default();
        config.health_check.enabled = false;
        config.admin.enabled = true;
        config.admin.api_key = "secret".into();
        HttpServer::new(config)
    }

    fn register_request(method: Method, body: &'static str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri("/register")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_register_adds_backend() {
        let server = server();
        let response = server
            .router()
            .oneshot(register_request(Method::POST, r#"{"serverURL":"http://x"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(server.registry().len(), 1);
    }

    #[tokio::test]
    async fn test_register_invalid_json_is_rejected() {
        let server = server();
        let response = server
            .router()
            .oneshot(register_request(Method::POST, "{not json"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(server.registry().len(), 0);
    }

    #[tokio::test]
    async fn test_register_wrong_method() {
        let server = server();
        let response = server
            .router()
            .oneshot(register_request(Method::GET, r#"{"serverURL":"http://x"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(server.registry().is_empty());
    }

    #[tokio::test]
    async fn test_proxy_without_backends_is_500() {
        let server = server();
        let response = server
            .router()
            .oneshot(Request::builder().uri("/hello").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().contains_key(X_REQUEST_ID));
    }

    #[tokio::test]
    async fn test_unknown_path_is_404() {
        let server = server();
        for uri in ["/other", "/admin/other"] {
            let response = server
                .router()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();

            // Admin auth guards only the admin routes, not the fallback.
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_admin_requires_key() {
        let server = server();
        server.registry().register("http://a".parse().unwrap());

        let denied = server
            .router()
            .oneshot(Request::builder().uri("/admin/backends").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);

        let allowed = server
            .router()
            .oneshot(
                Request::builder()
                    .uri("/admin/backends")
                    .header("authorization", "Bearer secret")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(allowed.status(), StatusCode::OK);

        let body = axum::body::to_bytes(allowed.into_body(), 64 * 1024).await.unwrap();
        let backends: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(backends[0]["url"], "http://a/");
        assert_eq!(backends[0]["is_dead"], false);
    }
}
