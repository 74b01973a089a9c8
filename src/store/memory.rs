//! In-Memory Store Backend
//!
//! Process-local [`KeyValueStore`] used by tests and single-node
//! deployments. Entries carry absolute deadlines on the tokio clock, so
//! tests can drive expiry with a paused runtime. Expired keys are reaped
//! lazily on access.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;

use super::{glob_match, KeyValueStore, StoreInfo};
use crate::error::Result;

struct StoredValue {
    value: String,
    expires_at: Instant,
}

impl StoredValue {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

struct StoredSet {
    members: HashSet<String>,
    /// Sets have no TTL until `expire` is called, matching store semantics.
    expires_at: Option<Instant>,
}

impl StoredSet {
    fn is_expired(&self) -> bool {
        matches!(self.expires_at, Some(at) if Instant::now() >= at)
    }
}

/// In-memory key/value store with per-key TTL and real hit/miss counters.
pub struct MemoryStore {
    entries: DashMap<String, StoredValue>,
    sets: DashMap<String, StoredSet>,
    lists: DashMap<String, VecDeque<String>>,
    hits: AtomicU64,
    misses: AtomicU64,
    payload_bytes: AtomicU64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            entries: DashMap::new(),
            sets: DashMap::new(),
            lists: DashMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            payload_bytes: AtomicU64::new(0),
        }
    }
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Hit count since creation.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Miss count since creation.
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Current length of the list under `list_key` (for mirror inspection).
    pub fn list_len(&self, list_key: &str) -> usize {
        self.lists.get(list_key).map(|l| l.len()).unwrap_or(0)
    }

    fn remove_entry(&self, key: &str) -> bool {
        if let Some((_, old)) = self.entries.remove(key) {
            self.payload_bytes
                .fetch_sub(old.value.len() as u64, Ordering::Relaxed);
            !old.is_expired()
        } else {
            false
        }
    }
}

#[async_trait::async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let expired = match self.entries.get(key) {
            Some(entry) if !entry.is_expired() => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(Some(entry.value.clone()));
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            self.remove_entry(key);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let stored = StoredValue {
            value: value.to_string(),
            expires_at: Instant::now() + ttl,
        };
        self.payload_bytes
            .fetch_add(value.len() as u64, Ordering::Relaxed);
        if let Some(old) = self.entries.insert(key.to_string(), stored) {
            self.payload_bytes
                .fetch_sub(old.value.len() as u64, Ordering::Relaxed);
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.remove_entry(key);
        self.sets.remove(key);
        Ok(())
    }

    async fn delete_many(&self, keys: &[String]) -> Result<u64> {
        let mut removed = 0;
        for key in keys {
            if self.remove_entry(key) {
                removed += 1;
            }
            if self.sets.remove(key).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn sadd(&self, set_key: &str, member: &str) -> Result<()> {
        let mut set = self.sets.entry(set_key.to_string()).or_insert_with(|| StoredSet {
            members: HashSet::new(),
            expires_at: None,
        });
        if set.is_expired() {
            set.members.clear();
            set.expires_at = None;
        }
        set.members.insert(member.to_string());
        Ok(())
    }

    async fn smembers(&self, set_key: &str) -> Result<Vec<String>> {
        let expired = match self.sets.get(set_key) {
            Some(set) if !set.is_expired() => {
                return Ok(set.members.iter().cloned().collect());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            self.sets.remove(set_key);
        }
        Ok(Vec::new())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<()> {
        let deadline = Instant::now() + ttl;
        if let Some(mut entry) = self.entries.get_mut(key) {
            entry.expires_at = deadline;
        }
        if let Some(mut set) = self.sets.get_mut(key) {
            set.expires_at = Some(deadline);
        }
        Ok(())
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let mut matched: Vec<String> = self
            .entries
            .iter()
            .filter(|e| !e.value().is_expired() && glob_match(pattern, e.key()))
            .map(|e| e.key().clone())
            .collect();
        matched.extend(
            self.sets
                .iter()
                .filter(|e| !e.value().is_expired() && glob_match(pattern, e.key()))
                .map(|e| e.key().clone()),
        );
        Ok(matched)
    }

    async fn lpush_trim(&self, list_key: &str, value: &str, max_len: usize) -> Result<()> {
        let mut list = self
            .lists
            .entry(list_key.to_string())
            .or_insert_with(VecDeque::new);
        list.push_front(value.to_string());
        list.truncate(max_len);
        Ok(())
    }

    async fn info(&self) -> Result<StoreInfo> {
        let hits = self.hits();
        let misses = self.misses();
        let total = hits + misses;
        let hit_rate = if total > 0 {
            hits as f64 / total as f64 * 100.0
        } else {
            0.0
        };

        let live_entries = self.entries.iter().filter(|e| !e.value().is_expired()).count();
        let live_sets = self.sets.iter().filter(|e| !e.value().is_expired()).count();

        Ok(StoreInfo {
            hit_rate,
            used_memory_mb: self.payload_bytes.load(Ordering::Relaxed) as f64 / (1024.0 * 1024.0),
            connected_clients: 1,
            keys: (live_entries + live_sets) as u64,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
