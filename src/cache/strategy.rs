//! Cache Strategies
//!
//! Named TTL tiers. Strategy choice is a caller decision based on how
//! volatile the underlying data is; the mapping to a duration lives here
//! so no call site repeats TTL arithmetic.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// TTL tier for cached data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CacheStrategy {
    /// Frequently changing data (5 minutes)
    ShortTerm,
    /// Moderately changing data (30 minutes)
    MediumTerm,
    /// Stable data (2 hours)
    LongTerm,
    /// Daily aggregations (24 hours)
    Daily,
}

impl CacheStrategy {
    /// Time-to-live for entries stored under this strategy.
    pub fn ttl(&self) -> Duration {
        match self {
            CacheStrategy::ShortTerm => Duration::from_secs(5 * 60),
            CacheStrategy::MediumTerm => Duration::from_secs(30 * 60),
            CacheStrategy::LongTerm => Duration::from_secs(2 * 60 * 60),
            CacheStrategy::Daily => Duration::from_secs(24 * 60 * 60),
        }
    }
}

impl std::fmt::Display for CacheStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheStrategy::ShortTerm => write!(f, "short_term"),
            CacheStrategy::MediumTerm => write!(f, "medium_term"),
            CacheStrategy::LongTerm => write!(f, "long_term"),
            CacheStrategy::Daily => write!(f, "daily"),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
