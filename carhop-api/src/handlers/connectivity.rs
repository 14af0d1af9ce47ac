use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ConnectivityResponse {
    pub online: bool,
    /// Set on updates: whether the report flipped the flag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changed: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ConnectivityReport {
    pub online: bool,
}

pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/v1/connectivity",
        get(get_connectivity).put(report_connectivity),
    )
}

pub async fn get_connectivity(State(state): State<AppState>) -> Json<ConnectivityResponse> {
    Json(ConnectivityResponse {
        online: state.monitor.is_online(),
        changed: None,
    })
}

/// Reachability reported by the client, which sees its own network before the server does
pub async fn report_connectivity(
    State(state): State<AppState>,
    Json(report): Json<ConnectivityReport>,
) -> Json<ConnectivityResponse> {
    let changed = state.monitor.set_online(report.online);
    if changed {
        info!(online = report.online, "Connectivity reported by client");
    }
    Json(ConnectivityResponse {
        online: state.monitor.is_online(),
        changed: Some(changed),
    })
}
