/// Health check endpoint
///
/// Reports whether the server is running and whether the storage backend
/// answers. Always responds 200; a broken backend shows up as `degraded`.
///
/// # Endpoint
///
/// ```text
/// GET /api/health
/// ```
///
/// # Response
///
/// ```json
/// {
///   "status": "ok",
///   "message": "TaskFlow API v2.0",
///   "version": "2.0.0",
///   "storage": "memory",
///   "database": "connected"
/// }
/// ```

use crate::app::AppState;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `ok` or `degraded`
    pub status: String,

    pub message: String,

    /// Application version
    pub version: String,

    /// Storage backend name
    pub storage: String,

    /// `connected` or `disconnected`
    pub database: String,
}

/// Health check handler
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let connected = match state.storage.ping().await {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(error = %err, "Storage health check failed");
            false
        }
    };

    Json(HealthResponse {
        status: if connected { "ok" } else { "degraded" }.to_string(),
        message: "TaskFlow API v2.0".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        storage: state.storage.backend().to_string(),
        database: if connected { "connected" } else { "disconnected" }.to_string(),
    })
}
