// Reqwest-backed provider clients
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use error_common::{ReliefError, Result};
use serde_json::{json, Value};
use store_layer::GeoPoint;
use tracing::debug;

use crate::providers::{
    Geocoder, ImageAnalyst, ImageFetcher, LocationExtractor, PageScraper, SocialFeed, SocialPost,
};

const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(15);

fn map_reqwest(provider: &str, timeout: Duration, e: reqwest::Error) -> ReliefError {
    if e.is_timeout() {
        ReliefError::ProviderTimeout {
            provider: provider.to_string(),
            timeout,
        }
    } else {
        ReliefError::provider(provider, e.to_string())
    }
}

/// Google Gemini client, used both for location extraction from free text
/// and for image plausibility analysis
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    call_timeout: Duration,
}

impl GeminiClient {
    pub fn new(http: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.5-flash".to_string(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    async fn generate(&self, parts: Value) -> Result<String> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let body = json!({ "contents": [{ "parts": parts }] });

        let request = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send();
        let response = match tokio::time::timeout(self.call_timeout, request).await {
            Ok(r) => r.map_err(|e| map_reqwest("gemini", self.call_timeout, e))?,
            Err(_) => {
                return Err(ReliefError::ProviderTimeout {
                    provider: "gemini".to_string(),
                    timeout: self.call_timeout,
                })
            }
        };
        let response = response
            .error_for_status()
            .map_err(|e| map_reqwest("gemini", self.call_timeout, e))?;
        let value: Value = response
            .json()
            .await
            .map_err(|e| map_reqwest("gemini", self.call_timeout, e))?;

        value
            .pointer("/candidates/0/content/parts/0/text")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(ToString::to_string)
            .ok_or_else(|| ReliefError::provider("gemini", "empty model response"))
    }
}

#[async_trait]
impl LocationExtractor for GeminiClient {
    async fn extract_location(&self, text: &str) -> Result<String> {
        let prompt = format!("Extract the location name from: {text}");
        let location_name = self.generate(json!([{ "text": prompt }])).await?;
        debug!(location_name = %location_name, "location extracted");
        Ok(location_name)
    }
}

#[async_trait]
impl ImageAnalyst for GeminiClient {
    async fn analyze_image(&self, image: &[u8]) -> Result<String> {
        let parts = json!([
            {
                "inline_data": {
                    "mime_type": "image/jpeg",
                    "data": BASE64.encode(image),
                }
            },
            { "text": "Analyze this image for signs of manipulation or disaster context." }
        ]);
        self.generate(parts).await
    }
}

/// OpenStreetMap Nominatim forward geocoder. Nominatim requires an
/// identifying User-Agent on every request.
#[derive(Clone)]
pub struct NominatimGeocoder {
    http: reqwest::Client,
    base_url: String,
    user_agent: String,
    call_timeout: Duration,
}

impl NominatimGeocoder {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: "ReliefNet/1.0 (ops@reliefnet.dev)".to_string(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, location_name: &str) -> Result<GeoPoint> {
        let url = format!("{}/search", self.base_url);
        let request = self
            .http
            .get(&url)
            .query(&[("q", location_name), ("format", "json"), ("limit", "1")])
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .send();
        let response = match tokio::time::timeout(self.call_timeout, request).await {
            Ok(r) => r.map_err(|e| map_reqwest("nominatim", self.call_timeout, e))?,
            Err(_) => {
                return Err(ReliefError::ProviderTimeout {
                    provider: "nominatim".to_string(),
                    timeout: self.call_timeout,
                })
            }
        };
        let results: Vec<Value> = response
            .error_for_status()
            .map_err(|e| map_reqwest("nominatim", self.call_timeout, e))?
            .json()
            .await
            .map_err(|e| map_reqwest("nominatim", self.call_timeout, e))?;

        let first = results
            .first()
            .ok_or_else(|| ReliefError::provider("nominatim", "no geocode result"))?;
        let lat = coordinate(first, "lat")?;
        let lng = coordinate(first, "lon")?;
        GeoPoint::new(lat, lng)
            .map_err(|e| ReliefError::provider("nominatim", format!("bad coordinates: {e}")))
    }
}

// Nominatim returns coordinates as strings.
fn coordinate(result: &Value, field: &str) -> Result<f64> {
    result
        .get(field)
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| ReliefError::provider("nominatim", format!("missing {field} in result")))
}

/// Fetches a page and pulls out its `<title>` text
#[derive(Clone)]
pub struct HtmlTitleScraper {
    http: reqwest::Client,
    call_timeout: Duration,
}

impl HtmlTitleScraper {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }
}

#[async_trait]
impl PageScraper for HtmlTitleScraper {
    async fn fetch_page_title(&self, url: &str) -> Result<String> {
        let request = self.http.get(url).send();
        let response = match tokio::time::timeout(self.call_timeout, request).await {
            Ok(r) => r.map_err(|e| map_reqwest("scraper", self.call_timeout, e))?,
            Err(_) => {
                return Err(ReliefError::ProviderTimeout {
                    provider: "scraper".to_string(),
                    timeout: self.call_timeout,
                })
            }
        };
        let body = response
            .error_for_status()
            .map_err(|e| map_reqwest("scraper", self.call_timeout, e))?
            .text()
            .await
            .map_err(|e| map_reqwest("scraper", self.call_timeout, e))?;

        // scraper's DOM is not Send, so keep it off the await points.
        let title = {
            let document = scraper::Html::parse_document(&body);
            let selector = scraper::Selector::parse("title")
                .map_err(|e| ReliefError::provider("scraper", format!("{e:?}")))?;
            document
                .select(&selector)
                .next()
                .map(|el| el.text().collect::<String>().trim().to_string())
        };
        match title {
            Some(title) if !title.is_empty() => Ok(title),
            _ => Err(ReliefError::provider(
                "scraper",
                format!("no title found at {url}"),
            )),
        }
    }
}

/// Downloads image bytes over HTTP for analysis
#[derive(Clone)]
pub struct HttpImageFetcher {
    http: reqwest::Client,
    call_timeout: Duration,
}

impl HttpImageFetcher {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>> {
        let request = self.http.get(url).send();
        let response = match tokio::time::timeout(self.call_timeout, request).await {
            Ok(r) => r.map_err(|e| map_reqwest("image-fetch", self.call_timeout, e))?,
            Err(_) => {
                return Err(ReliefError::ProviderTimeout {
                    provider: "image-fetch".to_string(),
                    timeout: self.call_timeout,
                })
            }
        };
        let bytes = response
            .error_for_status()
            .map_err(|e| map_reqwest("image-fetch", self.call_timeout, e))?
            .bytes()
            .await
            .map_err(|e| map_reqwest("image-fetch", self.call_timeout, e))?;
        Ok(bytes.to_vec())
    }
}

/// Stand-in social feed until a real social media integration lands
#[derive(Clone, Default)]
pub struct SampleSocialFeed;

#[async_trait]
impl SocialFeed for SampleSocialFeed {
    async fn fetch_posts(&self) -> Result<Vec<SocialPost>> {
        Ok(vec![
            SocialPost {
                post: "#floodrelief Need food in NYC".to_string(),
                user: "citizen1".to_string(),
            },
            SocialPost {
                post: "Power outage in Lower East Side".to_string(),
                user: "citizen2".to_string(),
            },
            SocialPost {
                post: "Red Cross shelter open in Brooklyn".to_string(),
                user: "reliefAdmin".to_string(),
            },
            SocialPost {
                post: "Urgent: SOS in Queens".to_string(),
                user: "citizen1".to_string(),
            },
        ])
    }
}
