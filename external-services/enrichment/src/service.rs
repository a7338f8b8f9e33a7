// Cache-guarded enrichment flows
use std::sync::Arc;

use cache_engine::{text_key, CacheAside, CacheOutcome, DEFAULT_TTL};
use error_common::{ReliefError, Result};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::providers::{
    Geocoder, ImageAnalyst, ImageFetcher, LocationExtractor, PageScraper, SocialFeed,
};

/// Official sources scraped for update headlines
pub const OFFICIAL_SOURCES: [(&str, &str); 2] = [
    ("FEMA", "https://www.fema.gov"),
    ("Red Cross", "https://www.redcross.org"),
];

/// The providers an [`EnrichmentService`] drives
pub struct ProviderSet {
    pub extractor: Arc<dyn LocationExtractor>,
    pub geocoder: Arc<dyn Geocoder>,
    pub analyst: Arc<dyn ImageAnalyst>,
    pub fetcher: Arc<dyn ImageFetcher>,
    pub scraper: Arc<dyn PageScraper>,
    pub feed: Arc<dyn SocialFeed>,
}

/// Runs the enrichment chains behind the cache-aside layer.
///
/// Chains cache the final answer only: a compound enrichment that fails
/// partway caches nothing and fails fast, so a cache hit is always a
/// complete, directly returnable result.
pub struct EnrichmentService {
    cache: Arc<CacheAside>,
    providers: ProviderSet,
}

impl EnrichmentService {
    pub fn new(cache: Arc<CacheAside>, providers: ProviderSet) -> Self {
        Self { cache, providers }
    }

    /// Free text to coordinates: extract a location name, then geocode it.
    /// The combined `{location_name, lat, lng}` is what gets cached.
    pub async fn geocode_text(&self, text: &str) -> Result<CacheOutcome> {
        if text.trim().is_empty() {
            return Err(ReliefError::validation("text is required"));
        }
        let key = text_key("geocode", text);
        let outcome = self
            .cache
            .get_or_compute(&key, DEFAULT_TTL, || async {
                let location_name = self.providers.extractor.extract_location(text).await?;
                let point = self.providers.geocoder.geocode(&location_name).await?;
                Ok::<_, ReliefError>(json!({
                    "location_name": location_name,
                    "lat": point.lat,
                    "lng": point.lng,
                }))
            })
            .await?;

        if !outcome.was_cached {
            info!(
                location_name = outcome.value["location_name"].as_str().unwrap_or(""),
                "Geocode resolved"
            );
        }
        Ok(outcome)
    }

    /// Headlines from the official sources, scraped concurrently
    pub async fn official_updates(&self, disaster_id: Uuid) -> Result<CacheOutcome> {
        let key = format!("official-updates:{disaster_id}");
        let outcome = self
            .cache
            .get_or_compute(&key, DEFAULT_TTL, || async {
                let headlines = futures::future::try_join_all(
                    OFFICIAL_SOURCES
                        .iter()
                        .map(|(_, url)| self.providers.scraper.fetch_page_title(url)),
                )
                .await?;
                let updates: Vec<_> = OFFICIAL_SOURCES
                    .iter()
                    .zip(headlines)
                    .map(|((source, _), headline)| {
                        json!({ "source": source, "headline": headline })
                    })
                    .collect();
                Ok::<_, ReliefError>(json!(updates))
            })
            .await?;

        if !outcome.was_cached {
            info!(disaster_id = %disaster_id, "Official updates fetched");
        }
        Ok(outcome)
    }

    /// Download a report image and judge its plausibility
    pub async fn verify_image(&self, disaster_id: Uuid, image_url: &str) -> Result<CacheOutcome> {
        if image_url.trim().is_empty() {
            return Err(ReliefError::validation("image_url is required"));
        }
        let key = text_key(&format!("verify-image:{disaster_id}"), image_url);
        let outcome = self
            .cache
            .get_or_compute(&key, DEFAULT_TTL, || async {
                let image = self.providers.fetcher.fetch_image(image_url).await?;
                let analysis = self.providers.analyst.analyze_image(&image).await?;
                Ok::<_, ReliefError>(json!({ "image_url": image_url, "analysis": analysis }))
            })
            .await?;

        if !outcome.was_cached {
            info!(disaster_id = %disaster_id, image_url = image_url, "Image verified");
        }
        Ok(outcome)
    }

    /// Social posts mentioning the disaster area
    pub async fn social_feed(&self) -> Result<CacheOutcome> {
        let outcome = self
            .cache
            .get_or_compute("social-feed", DEFAULT_TTL, || async {
                let posts = self.providers.feed.fetch_posts().await?;
                serde_json::to_value(posts).map_err(|e| ReliefError::Internal(anyhow::anyhow!(e)))
            })
            .await?;

        if !outcome.was_cached {
            info!(
                count = outcome.value.as_array().map_or(0, Vec::len),
                "Social feed fetched"
            );
        }
        Ok(outcome)
    }
}
