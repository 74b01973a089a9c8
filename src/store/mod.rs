//! Key/Value Store Port
//!
//! The freshness layer talks to its backing store exclusively through the
//! [`KeyValueStore`] trait. Adapters implement it for concrete stores:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              AdvancedCache / Warmer / AlertManager           │
//! │  ┌─────────────────────────────────────────────────────┐    │
//! │  │                 KeyValueStore (trait)                │    │
//! │  └─────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Adapters                              │
//! │  ┌─────────────────────────────────────────────────────┐    │
//! │  │        MemoryStore          │       RedisStore       │    │
//! │  └─────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Any store offering string values with per-key TTL, set membership, and
//! glob key enumeration satisfies the contract.

mod memory;
mod redis;

pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Store-level health and capacity metrics.
///
/// Produced by [`KeyValueStore::info`] and consumed by the alert manager's
/// cache-metrics checks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreInfo {
    /// Hit rate as a percentage (0.0 - 100.0)
    pub hit_rate: f64,
    /// Memory in use, in megabytes
    pub used_memory_mb: f64,
    /// Currently connected clients
    pub connected_clients: u64,
    /// Total keys held
    pub keys: u64,
}

/// Backing key/value store contract.
///
/// Implementations must be safe for concurrent use by many callers; the
/// cache, warmer, and alert manager all share one instance behind an `Arc`.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Get the value under `key`, or `None` if absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Set `key` to `value` with a per-key TTL.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Remove `key`. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Remove every key in `keys`, returning how many existed.
    async fn delete_many(&self, keys: &[String]) -> Result<u64>;

    /// Add `member` to the set under `set_key`.
    async fn sadd(&self, set_key: &str, member: &str) -> Result<()>;

    /// All members of the set under `set_key` (empty if absent).
    async fn smembers(&self, set_key: &str) -> Result<Vec<String>>;

    /// Reset the TTL of an existing key.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<()>;

    /// All keys matching a glob pattern (`*` wildcard).
    async fn keys(&self, pattern: &str) -> Result<Vec<String>>;

    /// Push `value` onto the head of the list under `list_key`, trimming the
    /// list to at most `max_len` entries.
    async fn lpush_trim(&self, list_key: &str, value: &str, max_len: usize) -> Result<()>;

    /// Store health and capacity metrics; doubles as the liveness probe.
    async fn info(&self) -> Result<StoreInfo>;
}

/// Minimal glob matcher for key patterns (`*` matches any run of characters).
///
/// Shared by the in-memory adapter; Redis evaluates patterns server-side.
pub(crate) fn glob_match(pattern: &str, key: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == key;
    }

    let mut rest = key;
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        if i == 0 {
            match rest.strip_prefix(part) {
                Some(r) => rest = r,
                None => return false,
            }
        } else if i == parts.len() - 1 {
            return rest.ends_with(part);
        } else {
            match rest.find(part) {
                Some(idx) => rest = &rest[idx + part.len()..],
                None => return false,
            }
        }
    }

    // Pattern ended with '*'
    true
}

// =============================================================================
// Tests
// =============================================================================
