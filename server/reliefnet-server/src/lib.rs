//! ReliefNet Server - disaster coordination API
//!
//! This library provides the core functionality of the ReliefNet HTTP
//! server: audited entity endpoints, cache-guarded enrichment endpoints,
//! and the WebSocket change-notification surface.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;

// Re-export commonly used types
pub use error::*;
pub use server::{ReliefServer, ServerConfig};

use axum::{middleware::from_fn, Router};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Create the main application router with all routes and middleware
pub fn create_app(server: ReliefServer) -> Router {
    routes::create_routes()
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::create_cors_layer())
                .layer(from_fn(middleware::request_timing_middleware))
                .layer(from_fn(middleware::identity_middleware)),
        )
        .with_state(server)
}
