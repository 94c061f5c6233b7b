//! Load balancer (v1)
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────┐
//!                      │                LOAD BALANCER                  │
//!   POST /register     │  ┌──────────────┐       ┌────────────────┐    │
//!  ────────────────────┼─▶│ registration │──────▶│                │    │
//!                      │  └──────────────┘       │    registry    │    │
//!   GET /hello         │  ┌──────────────┐ next  │ (round-robin)  │    │
//!  ────────────────────┼─▶│  dispatcher  │◀─────▶│                │    │
//!  ◀───────────────────┼──│              │ live  └───────▲────────┘    │
//!                      │  └──────┬───────┘               │ probe/evict │
//!                      │         │ GET /hello    ┌───────┴────────┐    │
//!                      │         │               │ health monitor │    │
//!                      │         ▼               └───────┬────────┘    │
//!                      └─────────┼───────────────────────┼─────────────┘
//!                                ▼                       ▼ GET /health
//!                             backends ◀─────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use loadbalancer::config::{loader, ProxyConfig};
use loadbalancer::lifecycle::{signals, Shutdown};
use loadbalancer::observability::{logging, metrics};
use loadbalancer::HttpServer;

#[derive(Parser)]
#[command(name = "loadbalancer")]
#[command(about = "Round-robin load balancer with dynamic backend registration", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,

    /// Override `observability.log_level`.
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => loader::load_config(path)?,
        None => ProxyConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }
    if let Some(level) = cli.log_level {
        config.observability.log_level = level;
    }

    logging::init(&config.observability.log_level);

    tracing::info!("loadbalancer v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        health_interval_secs = config.health_check.interval_secs,
        health_timeout_secs = config.health_check.timeout_secs,
        max_tries = config.health_check.max_tries,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // Failing to bind is fatal.
    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(shutdown.clone());

    let server = HttpServer::new(config);
    server.run(listener, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
