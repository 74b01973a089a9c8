//! Advanced Cache
//!
//! Read-through, tag-invalidatable cache over a [`KeyValueStore`].
//! Separating `set` (policy: TTL + tags) from raw store writes lets every
//! caller share one expiry/invalidation discipline; the envelope's own
//! `expires_at` is re-validated on read as a second line of defense
//! against store TTL drift.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, warn};

use super::entry::CacheEntry;
use super::strategy::CacheStrategy;
use super::{MAX_QUERY_KEY_LEN, TAG_SET_TTL};
use crate::error::Result;
use crate::store::{KeyValueStore, StoreInfo};

/// Producer used by [`AdvancedCache::warmup`]: computes one warmable value.
pub type WarmupProducer =
    Box<dyn Fn() -> BoxFuture<'static, Result<serde_json::Value>> + Send + Sync>;

/// Cache statistics snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    /// Keys currently held under this cache's namespace
    pub total_keys: usize,
    /// Namespace prefix
    pub prefix: String,
    /// Backing store metrics
    pub store: StoreInfo,
    /// When these statistics were gathered
    pub last_updated: chrono::DateTime<Utc>,
}

/// Strategy-tiered read-through cache with tag invalidation.
///
/// All keys are namespaced as `prefix:key`; tag membership sets live under
/// `prefix:tag:<tag>`.
pub struct AdvancedCache {
    store: Arc<dyn KeyValueStore>,
    prefix: String,
}

impl AdvancedCache {
    /// Create a cache over `store`, namespacing keys under `prefix`.
    pub fn new(store: Arc<dyn KeyValueStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    /// Namespace prefix for this cache.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Store `data` under `key` with the TTL of `strategy`, registering the
    /// key in every tag's membership set.
    ///
    /// Tag registration is best-effort: a failed registration is logged and
    /// does not roll back the primary write, so invalidation completeness
    /// degrades rather than the write failing.
    pub async fn set<T: Serialize>(
        &self,
        key: &str,
        data: &T,
        strategy: CacheStrategy,
        tags: &[&str],
    ) -> Result<()> {
        let entry = CacheEntry::new(
            serde_json::to_value(data)?,
            strategy,
            tags.iter().map(|t| t.to_string()).collect(),
        );
        let payload = serde_json::to_string(&entry)?;

        let full_key = self.build_key(key);
        self.store.set(&full_key, &payload, strategy.ttl()).await?;

        for tag in tags {
            if let Err(e) = self.register_tag(tag, &full_key).await {
                warn!("failed to register key {} under tag {}: {}", full_key, tag, e);
            }
        }

        Ok(())
    }

    /// Fetch and deserialize the value under `key`.
    ///
    /// A store miss returns `Ok(None)`. A corrupt envelope or a
    /// soft-expired entry also reads as a miss and eagerly deletes the
    /// stale key.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let full_key = self.build_key(key);

        let raw = match self.store.get(&full_key).await? {
            Some(raw) => raw,
            None => return Ok(None),
        };

        let entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                debug!("deleting undecodable cache entry {}: {}", full_key, e);
                self.evict_stale(&full_key).await;
                return Ok(None);
            }
        };

        if entry.is_expired() {
            debug!("deleting soft-expired cache entry {}", full_key);
            self.evict_stale(&full_key).await;
            return Ok(None);
        }

        Ok(Some(serde_json::from_value(entry.data)?))
    }

    /// Read-through: return the cached value, or produce, cache, and
    /// return a fresh one.
    ///
    /// The producer runs at most once per actual miss and its errors
    /// propagate verbatim. A failed write-back is logged and swallowed; it
    /// must never fail the read path.
    pub async fn get_or_set<T, F, Fut>(
        &self,
        key: &str,
        producer: F,
        strategy: CacheStrategy,
        tags: &[&str],
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        if let Some(cached) = self.get(key).await? {
            return Ok(cached);
        }

        let value = producer().await?;

        if let Err(e) = self.set(key, &value, strategy, tags).await {
            warn!("failed to cache produced value for {}: {}", key, e);
        }

        Ok(value)
    }

    /// Delete every key carrying `tag`, then the tag set itself.
    ///
    /// Returns how many keys were invalidated; an unknown tag is a no-op.
    /// Members whose data key already expired are tolerated.
    #[instrument(skip(self))]
    pub async fn invalidate_by_tag(&self, tag: &str) -> Result<u64> {
        let tag_key = self.build_tag_key(tag);

        let members = self.store.smembers(&tag_key).await?;
        if members.is_empty() {
            return Ok(0);
        }

        let deleted = self.store.delete_many(&members).await?;
        self.store.delete(&tag_key).await?;

        info!("invalidated {} keys under tag {}", deleted, tag);
        Ok(deleted)
    }

    /// Delete every key matching `pattern` (glob, applied under the
    /// namespace). Coarse invalidation for entries written without tags.
    #[instrument(skip(self))]
    pub async fn invalidate_pattern(&self, pattern: &str) -> Result<u64> {
        let full_pattern = self.build_key(pattern);

        let keys = self.store.keys(&full_pattern).await?;
        if keys.is_empty() {
            return Ok(0);
        }

        self.store.delete_many(&keys).await
    }

    /// Force-update `key`: delete, then set.
    ///
    /// The two steps are sequential, not atomic; a concurrent `get`
    /// between them observes a miss.
    pub async fn refresh<T: Serialize>(
        &self,
        key: &str,
        data: &T,
        strategy: CacheStrategy,
        tags: &[&str],
    ) -> Result<()> {
        if let Err(e) = self.delete(key).await {
            debug!("refresh: delete of {} failed: {}", key, e);
        }
        self.set(key, data, strategy, tags).await
    }

    /// Remove `key` unconditionally. Absent keys are not an error.
    pub async fn delete(&self, key: &str) -> Result<()> {
        self.store.delete(&self.build_key(key)).await
    }

    /// Gather cache statistics.
    pub async fn stats(&self) -> Result<CacheStats> {
        let keys = self.store.keys(&self.build_key("*")).await?;
        let store = self.store.info().await?;

        Ok(CacheStats {
            total_keys: keys.len(),
            prefix: self.prefix.clone(),
            store,
            last_updated: Utc::now(),
        })
    }

    /// Populate the cache from a map of key → producer.
    ///
    /// Individual producer or write failures are logged and skipped;
    /// warmed entries use the medium-term tier and are tagged `warmup`
    /// plus the key's category.
    #[instrument(skip(self, producers))]
    pub async fn warmup(&self, producers: HashMap<String, WarmupProducer>) -> Result<()> {
        info!("starting cache warmup for {} producers", producers.len());

        for (key, producer) in &producers {
            let value = match producer().await {
                Ok(value) => value,
                Err(e) => {
                    warn!("warmup producer for {} failed: {}", key, e);
                    continue;
                }
            };

            let category = Self::key_category(key);
            if let Err(e) = self
                .set(key, &value, CacheStrategy::MediumTerm, &["warmup", category])
                .await
            {
                warn!("failed to cache warmup data for {}: {}", key, e);
            }
        }

        info!("cache warmup completed");
        Ok(())
    }

    /// Deterministic cache key for a parameterized query.
    ///
    /// Parameters are sorted, so equal maps yield equal keys regardless of
    /// iteration order. Keys longer than [`MAX_QUERY_KEY_LEN`] are
    /// replaced by a digest key, bounding length while staying
    /// deterministic for identical inputs.
    pub fn build_query_key(
        &self,
        table: &str,
        operation: &str,
        params: &HashMap<String, String>,
    ) -> String {
        let mut pairs: Vec<String> = params.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        pairs.sort();

        let key = format!("query:{}:{}:{}", table, operation, pairs.join("&"));
        if key.len() <= MAX_QUERY_KEY_LEN {
            return key;
        }

        let digest = Sha256::digest(key.as_bytes());
        format!("query:hash:{}", hex::encode(digest))
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn build_key(&self, key: &str) -> String {
        format!("{}:{}", self.prefix, key)
    }

    fn build_tag_key(&self, tag: &str) -> String {
        format!("{}:tag:{}", self.prefix, tag)
    }

    /// Best-effort removal during self-cleaning reads; a failed delete
    /// must not turn a miss into an error.
    async fn evict_stale(&self, full_key: &str) {
        if let Err(e) = self.store.delete(full_key).await {
            warn!("failed to evict stale cache entry {}: {}", full_key, e);
        }
    }

    async fn register_tag(&self, tag: &str, full_key: &str) -> Result<()> {
        let tag_key = self.build_tag_key(tag);
        self.store.sadd(&tag_key, full_key).await?;
        // Tag sets outlive the longest data tier so they never expire
        // before their members.
        self.store.expire(&tag_key, TAG_SET_TTL).await
    }

    fn key_category(key: &str) -> &str {
        key.split(':').next().filter(|p| !p.is_empty()).unwrap_or("general")
    }
}

// =============================================================================
// Tests
// =============================================================================
