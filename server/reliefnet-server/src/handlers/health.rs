use axum::{extract::State, Json};
use serde::Serialize;
use std::collections::HashMap;
use store_layer::tables;

use crate::error::{api_success, ApiError, ApiResponse};
use crate::server::ReliefServer;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall system health status
    pub status: String,
    /// Current timestamp in RFC3339 format
    pub timestamp: String,
    /// API version
    pub version: String,
    /// Individual service health checks
    pub checks: HashMap<String, String>,
}

/// Health check handler
pub async fn health_check(
    State(server): State<ReliefServer>,
) -> Result<Json<ApiResponse<HealthResponse>>, ApiError> {
    let mut checks = HashMap::new();

    // Probe the store with a cheap listing
    let store_healthy = server.store.query(tables::DISASTERS, &[]).await.is_ok();
    checks.insert(
        "store".to_string(),
        if store_healthy { "healthy" } else { "unhealthy" }.to_string(),
    );
    checks.insert(
        "fanout_subscribers".to_string(),
        server.fanout.subscriber_count().to_string(),
    );

    let response = HealthResponse {
        status: if store_healthy { "healthy" } else { "degraded" }.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks,
    };

    Ok(Json(api_success(response)))
}
