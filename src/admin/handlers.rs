use axum::{extract::State, Json};
use serde::Serialize;

use crate::http::server::AppState;

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub registered_backends: usize,
    pub live_backends: usize,
}

#[derive(Debug, Serialize)]
pub struct BackendStatus {
    pub id: u64,
    pub url: String,
    pub is_dead: bool,
    pub revive_attempts: u32,
    pub marked_for_removal: bool,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        registered_backends: state.registry.len(),
        live_backends: state.registry.live_count(),
    })
}

/// Every record in round-robin order.
pub async fn get_backends(State(state): State<AppState>) -> Json<Vec<BackendStatus>> {
    let statuses = state
        .registry
        .snapshot()
        .iter()
        .map(|b| {
            let s = b.state();
            BackendStatus {
                id: b.id(),
                url: b.url().to_string(),
                is_dead: s.is_dead,
                revive_attempts: s.revive_attempts,
                marked_for_removal: s.marked_for_removal,
            }
        })
        .collect();

    Json(statuses)
}
