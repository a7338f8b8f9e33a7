use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::{
    handlers::{disasters, enrichment, health, reports, resources, websocket},
    server::ReliefServer,
};

/// Create health check routes
pub fn health_routes() -> Router<ReliefServer> {
    Router::new().route("/health", get(health::health_check))
}

/// Create disaster routes, including the per-disaster enrichment and
/// proximity endpoints
pub fn disaster_routes() -> Router<ReliefServer> {
    Router::new()
        .route("/disasters", get(disasters::list_disasters))
        .route("/disasters", post(disasters::create_disaster))
        .route("/disasters/:id", get(disasters::get_disaster))
        .route("/disasters/:id", put(disasters::update_disaster))
        .route("/disasters/:id", delete(disasters::delete_disaster))
        .route("/disasters/:id/resources", get(disasters::nearby_resources))
        .route(
            "/disasters/:id/official-updates",
            get(enrichment::official_updates),
        )
        .route(
            "/disasters/:id/verify-image",
            post(enrichment::verify_image),
        )
}

/// Create report routes
pub fn report_routes() -> Router<ReliefServer> {
    Router::new()
        .route("/reports", get(reports::list_reports))
        .route("/reports", post(reports::create_report))
        .route("/reports/:id", put(reports::update_report))
        .route("/reports/:id", delete(reports::delete_report))
}

/// Create resource routes
pub fn resource_routes() -> Router<ReliefServer> {
    Router::new()
        .route("/resources", get(resources::list_resources))
        .route("/resources", post(resources::create_resource))
        .route("/resources/:id", put(resources::update_resource))
        .route("/resources/:id", delete(resources::delete_resource))
}

/// Create standalone enrichment routes
pub fn enrichment_routes() -> Router<ReliefServer> {
    Router::new()
        .route("/geocode", post(enrichment::geocode))
        .route("/social-feed", get(enrichment::social_feed))
}

/// Create WebSocket routes for the change fanout
pub fn realtime_routes() -> Router<ReliefServer> {
    Router::new().route("/ws", get(websocket::websocket_handler))
}

/// Create all application routes
pub fn create_routes() -> Router<ReliefServer> {
    Router::new()
        .merge(health_routes())
        .merge(disaster_routes())
        .merge(report_routes())
        .merge(resource_routes())
        .merge(enrichment_routes())
        .merge(realtime_routes())
}
