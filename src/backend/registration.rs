//! Self-registration with the balancer.

use reqwest::StatusCode;
use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::http::Registration;

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("registration request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("balancer rejected registration with status {0}")]
    Rejected(StatusCode),
}

/// Externally reachable base URL for a backend bound to `local`.
pub fn advertised_url(host: &str, local: SocketAddr) -> Result<Url, RegistrationError> {
    Ok(Url::parse(&format!("http://{}:{}", host, local.port()))?)
}

/// POST `server_url` to the balancer's registration path.
///
/// Anything but a 200 is an error; callers treat it as fatal.
pub async fn register(
    client: &reqwest::Client,
    balancer_url: &Url,
    registration_path: &str,
    server_url: &Url,
) -> Result<(), RegistrationError> {
    let endpoint = balancer_url.join(registration_path)?;
    let body = Registration {
        server_url: server_url.to_string(),
    };

    tracing::info!(endpoint = %endpoint, server_url = %server_url, "Sending registration");
    let response = client.post(endpoint).json(&body).send().await?;

    if response.status() != StatusCode::OK {
        return Err(RegistrationError::Rejected(response.status()));
    }

    tracing::info!("Successfully registered with load balancer");
    Ok(())
}
