use axum::{
    extract::Request,
    http::{header, HeaderMap, Method},
    middleware::Next,
    response::Response,
};
use serde::Serialize;
use std::time::{Duration, Instant};
use tower_http::cors::CorsLayer;

/// Coarse role tag attached to each request. Roles are informational
/// only; the API does not enforce permissions beyond tagging actions
/// with the actor who performed them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Contributor,
}

/// The identity a request acts as, resolved from the `x-user-id` header
#[derive(Debug, Clone, Serialize)]
pub struct Identity {
    pub id: String,
    pub role: Role,
}

// Static identity table, matching the operator-provisioned accounts.
const USERS: [(&str, Role); 4] = [
    ("netrunnerX", Role::Admin),
    ("reliefAdmin", Role::Admin),
    ("citizen1", Role::Contributor),
    ("citizen2", Role::Contributor),
];

const DEFAULT_USER: &str = "citizen1";

/// Resolve an identity token to a known identity. Unknown or missing
/// tokens deliberately fall back to the low-privilege default rather
/// than rejecting the request.
pub fn resolve_role(token: Option<&str>) -> Identity {
    let token = token.unwrap_or(DEFAULT_USER);
    let (id, role) = USERS
        .iter()
        .find(|(id, _)| *id == token)
        .copied()
        .unwrap_or((DEFAULT_USER, Role::Contributor));
    Identity {
        id: id.to_string(),
        role,
    }
}

/// Attach the resolved identity to the request extensions
pub async fn identity_middleware(headers: HeaderMap, mut request: Request, next: Next) -> Response {
    let token = headers.get("x-user-id").and_then(|h| h.to_str().ok());
    let identity = resolve_role(token);
    request.extensions_mut().insert(identity);
    next.run(request).await
}

/// Request timing middleware for performance monitoring
pub async fn request_timing_middleware(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let start = Instant::now();
    let response = next.run(request).await;
    let duration = start.elapsed();

    // Log slow requests
    if duration > Duration::from_secs(1) {
        tracing::warn!(
            path = %path,
            duration_ms = duration.as_millis(),
            "Slow request detected"
        );
    }

    response
}

/// Create CORS layer for browser clients
pub fn create_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::HeaderName::from_static("x-user-id"),
        ])
        .max_age(Duration::from_secs(3600))
}
