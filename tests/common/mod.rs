//! Shared utilities for integration tests.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use loadbalancer::config::ProxyConfig;
use loadbalancer::lifecycle::Shutdown;
use loadbalancer::{HttpServer, Registry};

pub const HEALTHY: &str = r#"{"message":"health"}"#;

/// Start a programmable mock backend on an ephemeral port.
///
/// `f` receives the request path and returns the status code and body.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let mut buf = vec![0u8; 4096];
                        let n = socket.read(&mut buf).await.unwrap_or(0);
                        let head = String::from_utf8_lossy(&buf[..n]);
                        let path = head
                            .lines()
                            .next()
                            .and_then(|line| line.split_whitespace().nth(1))
                            .unwrap_or("/")
                            .to_string();

                        let (status, body) = f(path).await;
                        let status_text = match status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// A healthy backend answering `/hello` with `name`.
pub async fn start_named_backend(name: &'static str) -> SocketAddr {
    start_programmable_backend(move |path| async move {
        match path.as_str() {
            "/health" => (200, HEALTHY.to_string()),
            "/hello" => (200, name.to_string()),
            _ => (404, "not found".to_string()),
        }
    })
    .await
}

/// An address with nothing listening on it.
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Config with the health monitor disabled; tests opt back in.
pub fn quiet_config() -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.health_check.enabled = false;
    config
}

pub struct RunningBalancer {
    pub addr: SocketAddr,
    pub registry: Arc<Registry>,
    pub shutdown: Shutdown,
}

impl RunningBalancer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for RunningBalancer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start a balancer on an ephemeral port.
pub async fn start_balancer(config: ProxyConfig) -> RunningBalancer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(config);
    let registry = server.registry();
    let shutdown = Shutdown::new();

    let server_shutdown = shutdown.clone();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });
    tokio::time::sleep(Duration::from_millis(100)).await;

    RunningBalancer {
        addr,
        registry,
        shutdown,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Register `backend` through the balancer's HTTP endpoint.
pub async fn register(client: &reqwest::Client, balancer: &RunningBalancer, backend: SocketAddr) -> reqwest::StatusCode {
    client
        .post(balancer.url("/register"))
        .json(&serde_json::json!({ "serverURL": format!("http://{}", backend) }))
        .send()
        .await
        .expect("balancer unreachable")
        .status()
}
