//! Tiered Read-Through Cache
//!
//! Strategy-based caching over a shared key/value store:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                         Advanced Cache                                │
//! ├──────────────────────────────────────────────────────────────────────┤
//! │  Envelope (versioned, tagged)  │  TTL tiers  │  Tag/pattern invalidation │
//! │  ┌──────────────────────────┐  │  ShortTerm  │  prefix:tag:<tag> sets    │
//! │  │ data / created / expires │  │  MediumTerm │  SMEMBERS → bulk delete   │
//! │  │ version / tags           │  │  LongTerm   │  glob → bulk delete       │
//! │  └──────────────────────────┘  │  Daily      │                           │
//! └──────────────────────────────────────────────────────────────────────┘
//!                                  │
//!                                  ▼
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                      KeyValueStore (shared)                           │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The [`CacheWarmer`] runs beside the cache on its own ticker, writing
//! plain (unversioned, untagged) payloads for hot read paths; staleness of
//! warmed data is bounded by the warming interval rather than by tags.
//!
//! # Design Principles
//!
//! - Callers pick a [`CacheStrategy`]; TTL arithmetic lives in one place
//! - A miss is `Ok(None)`, never an error
//! - Corrupt or soft-expired entries are deleted on read (self-cleaning)
//! - A failed write-back never fails the read path

mod advanced;
mod entry;
mod strategy;
mod warmer;

pub use advanced::{AdvancedCache, CacheStats, WarmupProducer};
pub use entry::CacheEntry;
pub use strategy::CacheStrategy;
pub use warmer::{CacheWarmer, WarmerHandle};

use std::time::Duration;

/// TTL for tag membership sets: one hour longer than the longest data
/// tier, so invalidation sets outlive every member they reference.
pub const TAG_SET_TTL: Duration = Duration::from_secs(25 * 60 * 60);

/// Longest key produced by query-key construction before digesting.
pub const MAX_QUERY_KEY_LEN: usize = 200;

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_set_ttl_exceeds_longest_tier() {
        assert!(TAG_SET_TTL > CacheStrategy::Daily.ttl());
    }
}
