use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use record_engine::{Disaster, DisasterPatch, NewDisaster, Resource};
use serde::Deserialize;
use serde_json::json;
use store_layer::GeoPoint;
use uuid::Uuid;

use crate::error::{api_success, ApiError, ApiResponse};
use crate::middleware::Identity;
use crate::server::ReliefServer;

#[derive(Debug, Deserialize)]
pub struct DisasterListQuery {
    /// Restrict the listing to disasters carrying this tag
    pub tag: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NearbyQuery {
    pub lat: f64,
    pub lon: f64,
    /// Search radius in meters
    pub radius: Option<f64>,
}

pub async fn create_disaster(
    State(server): State<ReliefServer>,
    Extension(identity): Extension<Identity>,
    Json(new): Json<NewDisaster>,
) -> Result<(StatusCode, Json<ApiResponse<Disaster>>), ApiError> {
    let disaster = server.records.create_disaster(new, &identity.id).await?;
    Ok((StatusCode::CREATED, Json(api_success(disaster))))
}

pub async fn list_disasters(
    State(server): State<ReliefServer>,
    Query(query): Query<DisasterListQuery>,
) -> Result<Json<ApiResponse<Vec<Disaster>>>, ApiError> {
    let disasters = server.records.list_disasters(query.tag.as_deref()).await?;
    Ok(Json(api_success(disasters)))
}

pub async fn get_disaster(
    State(server): State<ReliefServer>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Disaster>>, ApiError> {
    let disaster = server.records.get_disaster(id).await?;
    Ok(Json(api_success(disaster)))
}

pub async fn update_disaster(
    State(server): State<ReliefServer>,
    Path(id): Path<Uuid>,
    Extension(identity): Extension<Identity>,
    Json(patch): Json<DisasterPatch>,
) -> Result<Json<ApiResponse<Disaster>>, ApiError> {
    let disaster = server
        .records
        .update_disaster(id, patch, &identity.id)
        .await?;
    Ok(Json(api_success(disaster)))
}

pub async fn delete_disaster(
    State(server): State<ReliefServer>,
    Path(id): Path<Uuid>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    server.records.delete_disaster(id, &identity.id).await?;
    Ok(Json(api_success(json!({ "id": id }))))
}

/// Resources of a disaster within a radius of a point, nearest first.
/// The radius defaults to the configured proximity radius (10 km).
pub async fn nearby_resources(
    State(server): State<ReliefServer>,
    Path(id): Path<Uuid>,
    Query(query): Query<NearbyQuery>,
) -> Result<Json<ApiResponse<Vec<Resource>>>, ApiError> {
    let center = GeoPoint {
        lat: query.lat,
        lng: query.lon,
    };
    let radius_m = query.radius.unwrap_or(server.config.default_radius_m);
    let resources = server.matcher.nearby(id, center, radius_m).await?;
    Ok(Json(api_success(resources)))
}
