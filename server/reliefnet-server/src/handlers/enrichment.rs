use axum::{
    extract::{Path, State},
    Json,
};
use cache_engine::CacheOutcome;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::ApiError;
use crate::server::ReliefServer;

/// Enrichment responses carry a `cached` flag so callers can tell a
/// fresh provider answer from a replayed one
#[derive(Debug, Serialize)]
pub struct EnrichmentResponse {
    pub success: bool,
    pub data: Value,
    pub cached: bool,
}

impl From<CacheOutcome> for EnrichmentResponse {
    fn from(outcome: CacheOutcome) -> Self {
        Self {
            success: true,
            data: outcome.value,
            cached: outcome.was_cached,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GeocodeRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyImageRequest {
    pub image_url: String,
}

/// Free text to coordinates via location extraction + forward geocoding
pub async fn geocode(
    State(server): State<ReliefServer>,
    Json(request): Json<GeocodeRequest>,
) -> Result<Json<EnrichmentResponse>, ApiError> {
    let outcome = server.enrichment.geocode_text(&request.text).await?;
    Ok(Json(outcome.into()))
}

/// Headlines scraped from the official relief sources
pub async fn official_updates(
    State(server): State<ReliefServer>,
    Path(id): Path<Uuid>,
) -> Result<Json<EnrichmentResponse>, ApiError> {
    let outcome = server.enrichment.official_updates(id).await?;
    Ok(Json(outcome.into()))
}

/// Download and analyze a report image for plausibility
pub async fn verify_image(
    State(server): State<ReliefServer>,
    Path(id): Path<Uuid>,
    Json(request): Json<VerifyImageRequest>,
) -> Result<Json<EnrichmentResponse>, ApiError> {
    let outcome = server
        .enrichment
        .verify_image(id, &request.image_url)
        .await?;
    Ok(Json(outcome.into()))
}

/// Social posts mentioning the disaster area
pub async fn social_feed(
    State(server): State<ReliefServer>,
) -> Result<Json<EnrichmentResponse>, ApiError> {
    let outcome = server.enrichment.social_feed().await?;
    Ok(Json(outcome.into()))
}
