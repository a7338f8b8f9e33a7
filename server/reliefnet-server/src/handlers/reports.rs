use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use record_engine::{NewReport, Report, ReportPatch, VerificationStatus};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::error::{api_success, ApiError, ApiResponse};
use crate::middleware::Identity;
use crate::server::ReliefServer;

#[derive(Debug, Deserialize)]
pub struct ReportListQuery {
    pub disaster_id: Option<Uuid>,
    pub verification_status: Option<VerificationStatus>,
}

pub async fn create_report(
    State(server): State<ReliefServer>,
    Extension(identity): Extension<Identity>,
    Json(new): Json<NewReport>,
) -> Result<(StatusCode, Json<ApiResponse<Report>>), ApiError> {
    let report = server.records.create_report(new, &identity.id).await?;
    Ok((StatusCode::CREATED, Json(api_success(report))))
}

pub async fn list_reports(
    State(server): State<ReliefServer>,
    Query(query): Query<ReportListQuery>,
) -> Result<Json<ApiResponse<Vec<Report>>>, ApiError> {
    let reports = server
        .records
        .list_reports(query.disaster_id, query.verification_status)
        .await?;
    Ok(Json(api_success(reports)))
}

pub async fn update_report(
    State(server): State<ReliefServer>,
    Path(id): Path<Uuid>,
    Extension(identity): Extension<Identity>,
    Json(patch): Json<ReportPatch>,
) -> Result<Json<ApiResponse<Report>>, ApiError> {
    let report = server.records.update_report(id, patch, &identity.id).await?;
    Ok(Json(api_success(report)))
}

pub async fn delete_report(
    State(server): State<ReliefServer>,
    Path(id): Path<Uuid>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    server.records.delete_report(id, &identity.id).await?;
    Ok(Json(api_success(json!({ "id": id }))))
}
