//! Health check handler.

use axum::{extract::State, Json};
use chrono::Utc;
use serde::Serialize;
use tracing::warn;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct DatabaseHealth {
    pub connected: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp: String,
    pub database: DatabaseHealth,
    pub storage: String,
    pub geocoder: String,
}

/// Report dependency status. Always 200; a down database shows as
/// `connected: false`.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let connected = match state.properties.repository().ping().await {
        Ok(()) => true,
        Err(e) => {
            warn!(subsystem = "api", error = %e, "Health check: database unreachable");
            false
        }
    };

    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now().to_rfc3339(),
        database: DatabaseHealth { connected },
        storage: state.properties.storage().name().to_string(),
        geocoder: state.properties.geocoder().name().to_string(),
    })
}
