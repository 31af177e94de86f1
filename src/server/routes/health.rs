//! Health check endpoint

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::backend::backend_name;
use crate::server::state::SharedState;
use crate::VERSION;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_seconds: u64,
    pub version: String,
    pub num_classes: usize,
    pub backend: String,
}

/// GET /health - Health check endpoint
pub async fn health_check(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_seconds: state.uptime_seconds(),
        version: VERSION.to_string(),
        num_classes: state.num_classes(),
        backend: backend_name().to_string(),
    })
}
