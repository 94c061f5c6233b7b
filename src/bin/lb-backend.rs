use clap::Parser;
use tokio::net::TcpListener;
use url::Url;

use loadbalancer::backend;
use loadbalancer::lifecycle::signals;
use loadbalancer::observability::logging;

#[derive(Parser)]
#[command(name = "lb-backend")]
#[command(about = "Demo backend that registers itself with the load balancer", long_about = None)]
struct Cli {
    /// Port to listen on (0 picks a free port).
    #[arg(short, long, default_value_t = 80)]
    port: u16,

    /// Address to bind.
    #[arg(long, default_value = "0.0.0.0")]
    bind_host: String,

    /// Host name the balancer should use to reach this backend.
    #[arg(long, default_value = "localhost")]
    host: String,

    /// Base URL of the load balancer.
    #[arg(short, long, default_value = "http://localhost:8080")]
    balancer_url: Url,

    /// Registration path on the balancer.
    #[arg(long, default_value = "/register")]
    register_path: String,

    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init(&cli.log_level);

    let listener = TcpListener::bind((cli.bind_host.as_str(), cli.port)).await?;
    let server_url = backend::advertised_url(&cli.host, listener.local_addr()?)?;
    tracing::info!(server_url = %server_url, "Backend listening");

    let server = tokio::spawn(async move {
        axum::serve(listener, backend::router())
            .with_graceful_shutdown(signals::wait_for_signal())
            .await
    });

    // A rejected registration is a fatal startup condition.
    let client = reqwest::Client::new();
    if let Err(e) = backend::register(&client, &cli.balancer_url, &cli.register_path, &server_url).await {
        tracing::error!(error = %e, "Failed to register with load balancer");
        server.abort();
        return Err(e.into());
    }

    server.await??;
    Ok(())
}
