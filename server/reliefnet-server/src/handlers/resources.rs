use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use record_engine::{NewResource, Resource, ResourcePatch};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::error::{api_success, ApiError, ApiResponse};
use crate::middleware::Identity;
use crate::server::ReliefServer;

#[derive(Debug, Deserialize)]
pub struct ResourceListQuery {
    pub disaster_id: Option<Uuid>,
}

pub async fn create_resource(
    State(server): State<ReliefServer>,
    Extension(identity): Extension<Identity>,
    Json(new): Json<NewResource>,
) -> Result<(StatusCode, Json<ApiResponse<Resource>>), ApiError> {
    let resource = server.records.create_resource(new, &identity.id).await?;
    Ok((StatusCode::CREATED, Json(api_success(resource))))
}

pub async fn list_resources(
    State(server): State<ReliefServer>,
    Query(query): Query<ResourceListQuery>,
) -> Result<Json<ApiResponse<Vec<Resource>>>, ApiError> {
    let resources = server.records.list_resources(query.disaster_id).await?;
    Ok(Json(api_success(resources)))
}

pub async fn update_resource(
    State(server): State<ReliefServer>,
    Path(id): Path<Uuid>,
    Extension(identity): Extension<Identity>,
    Json(patch): Json<ResourcePatch>,
) -> Result<Json<ApiResponse<Resource>>, ApiError> {
    let resource = server
        .records
        .update_resource(id, patch, &identity.id)
        .await?;
    Ok(Json(api_success(resource)))
}

pub async fn delete_resource(
    State(server): State<ReliefServer>,
    Path(id): Path<Uuid>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    server.records.delete_resource(id, &identity.id).await?;
    Ok(Json(api_success(json!({ "id": id }))))
}
