//! TTL cache-aside layer for the ReliefNet engine
//!
//! Guards calls to slow or rate-limited enrichment providers: a lookup is
//! tried first, and only on a miss does the wrapped computation run, with
//! its result stored under a deadline. Expiry is lazy: an expired entry is
//! treated as a miss on read, no background sweep runs.
//!
//! The cache is constructed explicitly and handed to the components that
//! need it; nothing here is process-global state.

use std::future::Future;
use std::time::{Duration, Instant};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use dashmap::DashMap;
use serde_json::Value;
use tracing::debug;

/// TTL applied when the caller does not choose one
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    expires_at: Instant,
}

/// Result of a cache-aside lookup, tagging whether the value was served
/// from cache so callers can surface provenance
#[derive(Debug, Clone)]
pub struct CacheOutcome {
    pub value: Value,
    pub was_cached: bool,
}

/// In-process TTL cache. Concurrent writers to the same key race with
/// last-writer-wins semantics; cached values are derived and re-computable,
/// so no compare-and-swap is needed.
#[derive(Default)]
pub struct CacheAside {
    entries: DashMap<String, CacheEntry>,
}

impl CacheAside {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up `key`; on a live hit return it tagged `was_cached`. On a
    /// miss run `compute`, store its result for `ttl`, and return it fresh.
    ///
    /// A failed computation propagates unmodified and leaves no entry
    /// behind, so the next request recomputes instead of reusing a
    /// poisoned slot.
    pub async fn get_or_compute<E, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        compute: F,
    ) -> Result<CacheOutcome, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, E>>,
    {
        if let Some(value) = self.get(key) {
            debug!(key = key, "cache hit");
            return Ok(CacheOutcome {
                value,
                was_cached: true,
            });
        }

        let value = compute().await?;
        self.insert(key, value.clone(), ttl);
        debug!(key = key, ttl_secs = ttl.as_secs(), "cache fill");
        Ok(CacheOutcome {
            value,
            was_cached: false,
        })
    }

    /// Live value for `key`, treating an expired entry as absent
    pub fn get(&self, key: &str) -> Option<Value> {
        let entry = self.entries.get(key)?;
        if entry.expires_at <= Instant::now() {
            drop(entry);
            // Lazy expiry: reclaim the slot on the read path.
            self.entries.remove(key);
            return None;
        }
        Some(entry.value.clone())
    }

    /// Store `value` under `key` until `ttl` elapses
    pub fn insert(&self, key: &str, value: Value, ttl: Duration) {
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Number of physically present entries, expired or not
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Build a cache key from a prefix and free text. The text is base64
/// encoded so identical logical requests collide to the same slot no
/// matter what characters they contain.
pub fn text_key(prefix: &str, text: &str) -> String {
    format!("{prefix}:{}", BASE64.encode(text))
}
