//! Health check endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::{AppState, StorageBackend};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub storage: StorageBackend,
}

/// GET /health: liveness plus the storage back end in use.
pub async fn check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        storage: state.storage,
    })
}
