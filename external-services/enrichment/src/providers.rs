// Capability traits for the external enrichment providers
use async_trait::async_trait;
use error_common::Result;
use serde::{Deserialize, Serialize};
use store_layer::GeoPoint;

/// Pulls a location name out of free text
#[async_trait]
pub trait LocationExtractor: Send + Sync {
    async fn extract_location(&self, text: &str) -> Result<String>;
}

/// Forward geocoding: location name to coordinates
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, location_name: &str) -> Result<GeoPoint>;
}

/// Judges a report image for manipulation or disaster context
#[async_trait]
pub trait ImageAnalyst: Send + Sync {
    async fn analyze_image(&self, image: &[u8]) -> Result<String>;
}

/// Downloads image bytes for analysis
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>>;
}

/// Fetches the title of a web page, used for official-update headlines
#[async_trait]
pub trait PageScraper: Send + Sync {
    async fn fetch_page_title(&self, url: &str) -> Result<String>;
}

/// A social media post surfaced to responders
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialPost {
    pub post: String,
    pub user: String,
}

/// Source of social media posts mentioning the disaster
#[async_trait]
pub trait SocialFeed: Send + Sync {
    async fn fetch_posts(&self) -> Result<Vec<SocialPost>>;
}
