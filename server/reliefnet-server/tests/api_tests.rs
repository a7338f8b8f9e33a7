use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use enrichment::{
    Geocoder, ImageAnalyst, ImageFetcher, LocationExtractor, PageScraper, ProviderSet, SocialFeed,
    SocialPost,
};
use error_common::Result;
use serde_json::{json, Value};
use store_layer::{GeoPoint, MemoryStore};
use tower::ServiceExt;

use reliefnet_server::{create_app, ReliefServer, ServerConfig};

struct StubProviders;

#[async_trait]
impl LocationExtractor for StubProviders {
    async fn extract_location(&self, _text: &str) -> Result<String> {
        Ok("Manhattan, NYC".to_string())
    }
}

#[async_trait]
impl Geocoder for StubProviders {
    async fn geocode(&self, _location_name: &str) -> Result<GeoPoint> {
        Ok(GeoPoint {
            lat: 40.7831,
            lng: -73.9712,
        })
    }
}

#[async_trait]
impl ImageAnalyst for StubProviders {
    async fn analyze_image(&self, _image: &[u8]) -> Result<String> {
        Ok("plausible disaster imagery".to_string())
    }
}

#[async_trait]
impl ImageFetcher for StubProviders {
    async fn fetch_image(&self, _url: &str) -> Result<Vec<u8>> {
        Ok(vec![0xff, 0xd8, 0xff])
    }
}

#[async_trait]
impl PageScraper for StubProviders {
    async fn fetch_page_title(&self, url: &str) -> Result<String> {
        Ok(format!("Updates from {url}"))
    }
}

#[async_trait]
impl SocialFeed for StubProviders {
    async fn fetch_posts(&self) -> Result<Vec<SocialPost>> {
        Ok(vec![SocialPost {
            post: "#floodrelief Need food in NYC".to_string(),
            user: "citizen1".to_string(),
        }])
    }
}

fn test_app() -> Router {
    let providers = ProviderSet {
        extractor: Arc::new(StubProviders),
        geocoder: Arc::new(StubProviders),
        analyst: Arc::new(StubProviders),
        fetcher: Arc::new(StubProviders),
        scraper: Arc::new(StubProviders),
        feed: Arc::new(StubProviders),
    };
    let server = ReliefServer::new(
        Arc::new(MemoryStore::new()),
        providers,
        ServerConfig::default(),
    );
    create_app(server)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post(uri: &str, user: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-user-id", user)
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn put(uri: &str, user: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-user-id", user)
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn health_check_reports_healthy() {
    let app = test_app();
    let (status, body) = send(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "healthy");
    assert_eq!(body["data"]["checks"]["store"], "healthy");
}

#[tokio::test]
async fn disaster_lifecycle_grows_the_audit_trail() {
    let app = test_app();

    let (status, created) = send(
        &app,
        post(
            "/disasters",
            "netrunnerX",
            json!({ "title": "Flood A", "tags": ["flood"] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let disaster = &created["data"];
    assert_eq!(disaster["title"], "Flood A");
    assert_eq!(disaster["audit_trail"].as_array().unwrap().len(), 1);
    assert_eq!(disaster["audit_trail"][0]["actor_id"], "netrunnerX");
    let id = disaster["id"].as_str().unwrap().to_string();

    let (status, updated) = send(
        &app,
        put(
            &format!("/disasters/{id}"),
            "reliefAdmin",
            json!({ "description": "river overflow" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let disaster = &updated["data"];
    assert_eq!(disaster["description"], "river overflow");
    // Partial update left the title alone
    assert_eq!(disaster["title"], "Flood A");
    let trail = disaster["audit_trail"].as_array().unwrap();
    assert_eq!(trail.len(), 2);
    assert_eq!(trail[1]["action"], "update");
    assert_eq!(trail[1]["actor_id"], "reliefAdmin");

    let delete = Request::builder()
        .method("DELETE")
        .uri(format!("/disasters/{id}"))
        .header("x-user-id", "netrunnerX")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, delete).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, get(&format!("/disasters/{id}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn missing_required_fields_are_rejected() {
    let app = test_app();

    let (status, body) = send(
        &app,
        post("/disasters", "citizen1", json!({ "description": "no title" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_type"], "validation_error");
}

#[tokio::test]
async fn updating_a_missing_disaster_is_not_found() {
    let app = test_app();

    let (status, body) = send(
        &app,
        put(
            &format!("/disasters/{}", uuid::Uuid::new_v4()),
            "citizen1",
            json!({ "title": "ghost" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error_type"], "not_found");
}

#[tokio::test]
async fn unknown_identity_falls_back_to_default_contributor() {
    let app = test_app();

    let request = Request::builder()
        .method("POST")
        .uri("/reports")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "disaster_id": create_disaster(&app).await,
                "content": "water rising fast",
            })
            .to_string(),
        ))
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["reporter_id"], "citizen1");
    assert_eq!(body["data"]["verification_status"], "pending");
}

#[tokio::test]
async fn nearby_resources_respects_radius_and_order() {
    let app = test_app();
    let disaster_id = create_disaster(&app).await;

    // Two resources near the center, one on another continent
    for (name, lat, lng) in [
        ("Shelter B", 40.80, -73.96),
        ("Shelter A", 40.7831, -73.9712),
        ("Shelter far", 48.85, 2.35),
    ] {
        let (status, _) = send(
            &app,
            post(
                "/resources",
                "reliefAdmin",
                json!({
                    "disaster_id": disaster_id,
                    "name": name,
                    "location": { "lat": lat, "lng": lng },
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(
        &app,
        get(&format!(
            "/disasters/{disaster_id}/resources?lat=40.7831&lon=-73.9712"
        )),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    // Nearest first, distant resource excluded by the 10 km default
    assert_eq!(names, vec!["Shelter A", "Shelter B"]);
}

#[tokio::test]
async fn geocode_tags_repeat_answers_as_cached() {
    let app = test_app();
    let body = json!({ "text": "Flooding reported in Manhattan" });

    let (status, first) = send(&app, post("/geocode", "citizen1", body.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["cached"], false);
    assert_eq!(first["data"]["location_name"], "Manhattan, NYC");
    assert_eq!(first["data"]["lat"], 40.7831);

    let (status, second) = send(&app, post("/geocode", "citizen1", body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["cached"], true);
    assert_eq!(second["data"], first["data"]);
}

#[tokio::test]
async fn official_updates_and_social_feed_are_cached() {
    let app = test_app();
    let disaster_id = create_disaster(&app).await;

    let uri = format!("/disasters/{disaster_id}/official-updates");
    let (status, first) = send(&app, get(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["cached"], false);
    assert_eq!(first["data"].as_array().unwrap().len(), 2);
    assert_eq!(first["data"][0]["source"], "FEMA");

    let (_, second) = send(&app, get(&uri)).await;
    assert_eq!(second["cached"], true);

    let (status, feed) = send(&app, get("/social-feed")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(feed["cached"], false);
    let (_, feed_again) = send(&app, get("/social-feed")).await;
    assert_eq!(feed_again["cached"], true);
}

#[tokio::test]
async fn verify_image_returns_analysis() {
    let app = test_app();
    let disaster_id = create_disaster(&app).await;

    let (status, body) = send(
        &app,
        post(
            &format!("/disasters/{disaster_id}/verify-image"),
            "reliefAdmin",
            json!({ "image_url": "https://example.com/flood.jpg" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["analysis"], "plausible disaster imagery");
    assert_eq!(body["data"]["image_url"], "https://example.com/flood.jpg");
}

async fn create_disaster(app: &Router) -> String {
    let (status, body) = send(
        app,
        post(
            "/disasters",
            "netrunnerX",
            json!({ "title": "Flood A", "tags": ["flood"] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["data"]["id"].as_str().unwrap().to_string()
}
