use std::env;
use std::sync::Arc;

use anyhow::Result;
use cache_engine::CacheAside;
use enrichment::{
    EnrichmentService, GeminiClient, HtmlTitleScraper, HttpImageFetcher, NominatimGeocoder,
    ProviderSet, SampleSocialFeed,
};
use event_fanout::ChangeFanout;
use record_engine::{GeoMatcher, RecordService};
use store_layer::{DurableStore, MemoryStore, PostgresStore};
use tracing::{info, warn};

/// Main ReliefNet server state
#[derive(Clone)]
pub struct ReliefServer {
    /// Server configuration
    pub config: ServerConfig,
    /// Durable entity store
    pub store: Arc<dyn DurableStore>,
    /// Audited record service
    pub records: Arc<RecordService>,
    /// Geospatial proximity matcher
    pub matcher: Arc<GeoMatcher>,
    /// Change-notification fanout
    pub fanout: Arc<ChangeFanout>,
    /// Cache-guarded enrichment flows
    pub enrichment: Arc<EnrichmentService>,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server name
    pub name: String,
    /// Default proximity search radius in meters
    pub default_radius_m: f64,
    /// Broadcast channel capacity per fanout
    pub fanout_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "ReliefNet Engine".to_string(),
            default_radius_m: 10_000.0,
            fanout_capacity: 1000,
        }
    }
}

impl ReliefServer {
    /// Assemble the server around a store and a provider set
    pub fn new(store: Arc<dyn DurableStore>, providers: ProviderSet, config: ServerConfig) -> Self {
        let fanout = Arc::new(ChangeFanout::new(config.fanout_capacity));
        let records = Arc::new(RecordService::new(store.clone(), fanout.clone()));
        let matcher = Arc::new(GeoMatcher::new(store.clone()));
        let cache = Arc::new(CacheAside::new());
        let enrichment = Arc::new(EnrichmentService::new(cache, providers));

        Self {
            config,
            store,
            records,
            matcher,
            fanout,
            enrichment,
        }
    }

    /// Build the server from environment configuration.
    ///
    /// `DATABASE_URL` selects the Postgres store; without it the server
    /// runs on the in-memory store, which is fine for development but
    /// loses everything on restart.
    pub async fn from_env() -> Result<Self> {
        let store: Arc<dyn DurableStore> = match env::var("DATABASE_URL") {
            Ok(url) => {
                let store = PostgresStore::connect(&url).await?;
                info!("Connected to Postgres store");
                Arc::new(store)
            }
            Err(_) => {
                warn!("DATABASE_URL not set, using in-memory store (data is not persisted)");
                Arc::new(MemoryStore::new())
            }
        };

        let http = reqwest::Client::builder().build()?;

        let api_key = env::var("GEMINI_API_KEY").unwrap_or_default();
        if api_key.is_empty() {
            warn!("GEMINI_API_KEY not set, location extraction and image analysis will fail");
        }
        let gemini = Arc::new(GeminiClient::new(http.clone(), api_key));

        let providers = ProviderSet {
            extractor: gemini.clone(),
            geocoder: Arc::new(NominatimGeocoder::new(http.clone())),
            analyst: gemini,
            fetcher: Arc::new(HttpImageFetcher::new(http.clone())),
            scraper: Arc::new(HtmlTitleScraper::new(http)),
            feed: Arc::new(SampleSocialFeed),
        };

        Ok(Self::new(store, providers, ServerConfig::default()))
    }
}

impl std::fmt::Debug for ReliefServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReliefServer")
            .field("config", &self.config)
            .field("subscribers", &self.fanout.subscriber_count())
            .finish()
    }
}
