//! Cache Entry Envelope
//!
//! Every value the [`AdvancedCache`](super::AdvancedCache) stores is
//! wrapped in this envelope before serialization. The embedded
//! `expires_at` duplicates the store-level TTL on purpose: it is
//! re-checked on read, so an entry outliving its TTL in the store (clock
//! skew, manual key copies) still reads as a miss.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::strategy::CacheStrategy;

/// Versioned, tagged wrapper around a cached payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Serialized payload
    pub data: serde_json::Value,
    /// When the entry was written
    pub created_at: DateTime<Utc>,
    /// `created_at` + strategy TTL
    pub expires_at: DateTime<Utc>,
    /// Creation-time tag, for debugging and auditing
    pub version: String,
    /// Labels for group invalidation
    pub tags: Vec<String>,
}

impl CacheEntry {
    /// Wrap `data` under the TTL of `strategy`.
    pub fn new(data: serde_json::Value, strategy: CacheStrategy, tags: Vec<String>) -> Self {
        let now = Utc::now();
        let ttl = chrono::Duration::from_std(strategy.ttl()).unwrap_or(chrono::Duration::zero());

        Self {
            data,
            created_at: now,
            expires_at: now + ttl,
            version: format!("v{}", now.timestamp()),
            tags,
        }
    }

    /// Soft-expiry check against the embedded deadline.
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_window_matches_strategy() {
        let entry = CacheEntry::new(
            serde_json::json!({"a": 1}),
            CacheStrategy::ShortTerm,
            vec![],
        );

        let window = entry.expires_at - entry.created_at;
        assert_eq!(window.num_seconds(), 300);
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_version_tracks_creation_time() {
        let entry = CacheEntry::new(serde_json::json!(null), CacheStrategy::Daily, vec![]);
        assert_eq!(entry.version, format!("v{}", entry.created_at.timestamp()));
    }

    #[test]
    fn test_past_deadline_reads_expired() {
        let mut entry = CacheEntry::new(
            serde_json::json!("x"),
            CacheStrategy::MediumTerm,
            vec!["t".to_string()],
        );
        entry.expires_at = Utc::now() - chrono::Duration::seconds(1);
        assert!(entry.is_expired());
    }

    #[test]
    fn test_envelope_round_trips() {
        let entry = CacheEntry::new(
            serde_json::json!({"symbol": "ACME"}),
            CacheStrategy::LongTerm,
            vec!["companies".to_string()],
        );

        let json = serde_json::to_string(&entry).unwrap();
        let back: CacheEntry = serde_json::from_str(&json).unwrap();

        assert_eq!(back.data, entry.data);
        assert_eq!(back.version, entry.version);
        assert_eq!(back.tags, entry.tags);
    }
}
