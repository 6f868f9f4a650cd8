//! Response cache implementation.

use crate::{CategoryTtls, ResourceCategory};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::{HashMap, VecDeque};
use tokio::time::Instant;

/// Cached payload with its storage and expiry instants.
#[derive(Debug, Clone, Getters)]
pub struct CachedResponse {
    payload: JsonValue,
    category: ResourceCategory,
    stored_at: Instant,
    expires_at: Instant,
}

impl CachedResponse {
    /// Check if this entry is expired at the given instant.
    ///
    /// An entry is live strictly before `expires_at`.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Configuration for the response cache.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Serialize,
    Deserialize,
    Getters,
    derive_setters::Setters,
    derive_builder::Builder,
)]
#[setters(prefix = "with_")]
pub struct ResponseCacheConfig {
    /// Whether caching is enabled
    #[serde(default = "default_enabled")]
    #[builder(default = "default_enabled()")]
    enabled: bool,

    /// Maximum number of entries before the oldest insertion is evicted
    #[serde(default = "default_max_entries")]
    #[builder(default = "default_max_entries()")]
    max_entries: usize,

    /// Time-to-live per resource category
    #[serde(default)]
    #[builder(default)]
    ttl: CategoryTtls,
}

fn default_enabled() -> bool {
    true
}

fn default_max_entries() -> usize {
    200
}

impl Default for ResponseCacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            max_entries: default_max_entries(),
            ttl: CategoryTtls::default(),
        }
    }
}

/// In-process cache of upstream payloads keyed by canonical request URL.
///
/// Expiry is checked lazily on read; there is no background sweep. When the
/// entry count exceeds `max_entries`, the oldest *inserted* entry is evicted.
/// This is insertion order, not least-recently-used: reads do not refresh an
/// entry's position.
///
/// # Example
///
/// ```
/// use courier_cache::{ResourceCategory, ResponseCache, ResponseCacheConfig};
/// use serde_json::json;
///
/// let mut cache = ResponseCache::new(ResponseCacheConfig::default());
/// let url = "https://www.reddit.com/r/rust/about.json";
///
/// cache.put(url, json!({"subscribers": 100}), ResourceCategory::About);
///
/// if let Some(payload) = cache.get(url) {
///     println!("Cached: {}", payload);
/// }
/// ```
#[derive(Debug)]
pub struct ResponseCache {
    config: ResponseCacheConfig,
    entries: HashMap<String, CachedResponse>,
    insertion_order: VecDeque<String>,
}

impl ResponseCache {
    /// Create a new response cache with configuration.
    pub fn new(config: ResponseCacheConfig) -> Self {
        tracing::debug!(
            max_entries = config.max_entries,
            enabled = config.enabled,
            "Creating new ResponseCache"
        );
        Self {
            config,
            entries: HashMap::new(),
            insertion_order: VecDeque::new(),
        }
    }

    /// Get the cache configuration.
    pub fn config(&self) -> &ResponseCacheConfig {
        &self.config
    }

    /// Get an independent copy of the cached payload for `url`.
    ///
    /// Returns None if:
    /// - Entry doesn't exist
    /// - Entry is expired (it is dropped)
    /// - Cache is disabled
    pub fn get(&mut self, url: &str) -> Option<JsonValue> {
        self.get_at(url, Instant::now())
    }

    /// Same as [`get`](Self::get), evaluated at an explicit instant.
    #[tracing::instrument(skip(self, now), fields(cache_size = self.entries.len()))]
    pub fn get_at(&mut self, url: &str, now: Instant) -> Option<JsonValue> {
        if !self.config.enabled {
            return None;
        }

        let entry = self.entries.get(url)?;
        if entry.is_expired_at(now) {
            tracing::debug!(category = %entry.category, "Cache entry expired, removing");
            self.remove(url);
            return None;
        }

        tracing::debug!(
            category = %entry.category,
            time_remaining = ?entry.expires_at.saturating_duration_since(now),
            "Cache hit"
        );
        Some(entry.payload.clone())
    }

    /// Store a payload with the TTL of its category.
    pub fn put(&mut self, url: impl Into<String>, payload: JsonValue, category: ResourceCategory) {
        self.put_at(url, payload, category, Instant::now());
    }

    /// Same as [`put`](Self::put), stored at an explicit instant.
    pub fn put_at(
        &mut self,
        url: impl Into<String>,
        payload: JsonValue,
        category: ResourceCategory,
        now: Instant,
    ) {
        if !self.config.enabled {
            tracing::debug!("Cache disabled, skipping insert");
            return;
        }

        let url = url.into();
        let ttl = self.config.ttl.ttl_for(category);

        if self.entries.contains_key(&url) {
            self.forget_position(&url);
        }
        self.insertion_order.push_back(url.clone());
        self.entries.insert(
            url,
            CachedResponse {
                payload,
                category,
                stored_at: now,
                expires_at: now + ttl,
            },
        );

        while self.entries.len() > self.config.max_entries {
            let Some(oldest) = self.insertion_order.pop_front() else {
                break;
            };
            tracing::debug!(url = %oldest, "Evicting oldest cache entry");
            self.entries.remove(&oldest);
        }

        tracing::debug!(%category, ttl = ?ttl, cache_size = self.entries.len(), "Stored cache entry");
    }

    /// Inspect the stored entry for `url` without expiry checks.
    pub fn entry(&self, url: &str) -> Option<&CachedResponse> {
        self.entries.get(url)
    }

    /// Drop the entry for `url`, returning whether one existed.
    pub fn invalidate(&mut self, url: &str) -> bool {
        self.remove(url).is_some()
    }

    /// Remove expired entries from cache.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();

        self.entries.retain(|_, entry| !entry.is_expired_at(now));
        let entries = &self.entries;
        self.insertion_order.retain(|url| entries.contains_key(url));

        let removed = before - self.entries.len();
        if removed > 0 {
            tracing::info!(removed, remaining = self.entries.len(), "Cleaned up expired cache entries");
        }
        removed
    }

    /// Clear all cache entries.
    pub fn clear(&mut self) {
        let count = self.entries.len();
        self.entries.clear();
        self.insertion_order.clear();
        tracing::info!(cleared = count, "Cleared cache");
    }

    /// Get number of cached entries, including expired ones not yet read.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn remove(&mut self, url: &str) -> Option<CachedResponse> {
        let removed = self.entries.remove(url)?;
        self.forget_position(url);
        Some(removed)
    }

    fn forget_position(&mut self, url: &str) {
        if let Some(pos) = self.insertion_order.iter().position(|k| k == url) {
            self.insertion_order.remove(pos);
        }
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(ResponseCacheConfig::default())
    }
}
