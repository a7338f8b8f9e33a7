//! External enrichment providers for the ReliefNet engine
//!
//! Derives extra facts from raw input: a location name from free text, a
//! coordinate pair from a location name, a plausibility analysis from a
//! report image, and headline summaries scraped from official sources.
//! Providers are slow and rate-limited, so every call goes through the
//! cache-aside layer, and only complete, directly returnable answers are
//! cached, never the intermediate step of a chain.
//!
//! Each provider sits behind a small capability trait so the service can
//! be exercised with stubs; the reqwest-backed clients live in
//! [`clients`].

pub mod clients;
pub mod providers;
pub mod service;

pub use clients::{
    GeminiClient, HtmlTitleScraper, HttpImageFetcher, NominatimGeocoder, SampleSocialFeed,
};
pub use providers::{
    Geocoder, ImageAnalyst, ImageFetcher, LocationExtractor, PageScraper, SocialFeed, SocialPost,
};
pub use service::{EnrichmentService, ProviderSet, OFFICIAL_SOURCES};
