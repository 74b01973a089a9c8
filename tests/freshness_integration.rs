//! Freshness Layer Integration Tests
//!
//! End-to-end scenarios over the in-process store:
//! - Read-through caching with tag invalidation
//! - TTL tier expiry
//! - Scheduled warming output
//! - Alert dedup, resolution, and retention

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use finfresh::db::Database;
use finfresh::error::Result;
use finfresh::model::{Company, EsgScore};
use finfresh::monitoring::{
    AlertManager, AlertType, AppMetrics, DatabaseMetrics, MetricsRegistry, MonitoringSnapshot,
    StoreMetrics, SystemMetrics,
};
use finfresh::store::KeyValueStore;
use finfresh::{AdvancedCache, CacheStrategy, CacheWarmer, MemoryStore};

// =============================================================================
// Shared Fixtures
// =============================================================================

struct FixtureDatabase;

fn fixture_company(id: i64, symbol: &str, sector: &str) -> Company {
    Company {
        id,
        name: format!("{} Corp", symbol),
        symbol: symbol.to_string(),
        sector: Some(sector.to_string()),
        industry: Some("Software".to_string()),
        country: Some("US".to_string()),
        market_cap: Some(1e10),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn fixture_score(company_id: i64, overall: f64) -> EsgScore {
    EsgScore {
        id: company_id,
        company_id,
        environmental_score: overall - 5.0,
        social_score: overall,
        governance_score: overall + 5.0,
        overall_score: overall,
        score_date: NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
        data_source: "fixture".to_string(),
    }
}

#[async_trait]
impl Database for FixtureDatabase {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn companies(&self) -> Result<Vec<Company>> {
        Ok(vec![
            fixture_company(1, "ALPHA", "Technology"),
            fixture_company(2, "BETA", "Energy"),
        ])
    }

    async fn latest_esg_scores(&self) -> Result<Vec<EsgScore>> {
        Ok(vec![fixture_score(1, 82.0), fixture_score(2, 64.0)])
    }

    async fn sectors(&self) -> Result<Vec<String>> {
        Ok(vec!["Technology".to_string(), "Energy".to_string()])
    }

    async fn company_count(&self) -> Result<i64> {
        Ok(2)
    }

    async fn esg_score_count(&self) -> Result<i64> {
        Ok(2)
    }

    async fn active_connections(&self) -> Result<i64> {
        Ok(4)
    }

    async fn slow_query_count(&self) -> Result<i64> {
        Ok(0)
    }

    async fn lock_count(&self) -> Result<i64> {
        Ok(1)
    }
}

fn healthy_snapshot() -> MonitoringSnapshot {
    MonitoringSnapshot::new(
        DatabaseMetrics {
            response_time_ms: 10.0,
            active_connections: 4,
            slow_queries: 0,
            locks: 1,
        },
        StoreMetrics {
            hit_rate: 97.0,
            used_memory_mb: 32.0,
            connected_clients: 2,
            keys: 100,
        },
        SystemMetrics::default(),
        AppMetrics::default(),
    )
}

// =============================================================================
// Scenario: Read-Through Cache with Tag Invalidation
// =============================================================================

mod cache_scenarios {
    use super::*;

    #[tokio::test]
    async fn test_set_get_invalidate_by_tag() {
        let store = Arc::new(MemoryStore::new());
        let cache = AdvancedCache::new(store.clone(), "finfresh");

        let company = fixture_company(1, "ALPHA", "Technology");
        cache
            .set("co:1", &company, CacheStrategy::MediumTerm, &["companies"])
            .await
            .unwrap();

        let cached: Option<Company> = cache.get("co:1").await.unwrap();
        assert_eq!(cached, Some(company));

        cache.invalidate_by_tag("companies").await.unwrap();

        let after: Option<Company> = cache.get("co:1").await.unwrap();
        assert!(after.is_none());
    }

    #[tokio::test]
    async fn test_read_through_produces_once() {
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        struct SectorStats {
            sector: String,
            avg_score: f64,
        }

        let store = Arc::new(MemoryStore::new());
        let cache = AdvancedCache::new(store, "finfresh");
        let produced = Arc::new(std::sync::atomic::AtomicU32::new(0));

        for _ in 0..4 {
            let produced = produced.clone();
            let stats: SectorStats = cache
                .get_or_set(
                    "stats:sector:Technology",
                    move || async move {
                        produced.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                        Ok(SectorStats {
                            sector: "Technology".to_string(),
                            avg_score: 81.4,
                        })
                    },
                    CacheStrategy::ShortTerm,
                    &["stats"],
                )
                .await
                .unwrap();
            assert_eq!(stats.avg_score, 81.4);
        }

        assert_eq!(produced.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_strategy_ttl_boundaries() {
        let store = Arc::new(MemoryStore::new());
        let cache = AdvancedCache::new(store.clone(), "finfresh");

        cache
            .set("volatile", &"v".to_string(), CacheStrategy::ShortTerm, &[])
            .await
            .unwrap();

        // Just inside the 5 minute tier
        tokio::time::advance(Duration::from_secs(299)).await;
        let hit: Option<String> = cache.get("volatile").await.unwrap();
        assert_eq!(hit, Some("v".to_string()));

        // Just past it: a miss, and the store no longer holds the key
        tokio::time::advance(Duration::from_secs(2)).await;
        let miss: Option<String> = cache.get("volatile").await.unwrap();
        assert!(miss.is_none());
        assert!(store.get("finfresh:volatile").await.unwrap().is_none());
    }
}

// =============================================================================
// Scenario: Scheduled Warming
// =============================================================================

mod warming_scenarios {
    use super::*;

    #[tokio::test]
    async fn test_one_pass_populates_hot_keys() {
        let store = Arc::new(MemoryStore::new());
        let warmer = CacheWarmer::new(store.clone(), Arc::new(FixtureDatabase));

        warmer.warm_cache().await;

        for key in [
            "cache:companies:all",
            "cache:companies:sector:Technology",
            "cache:company:1",
            "cache:company:symbol:BETA",
            "cache:esg:scores:all",
            "cache:esg:company:2:latest",
            "cache:esg:top:overall",
            "cache:sectors:all",
            "cache:analytics:summary",
        ] {
            assert!(
                store.get(key).await.unwrap().is_some(),
                "expected warmed key {}",
                key
            );
        }

        let raw = store.get("cache:esg:top:overall").await.unwrap().unwrap();
        let top: Vec<EsgScore> = serde_json::from_str(&raw).unwrap();
        assert_eq!(top[0].company_id, 1);
    }

    #[tokio::test]
    async fn test_warming_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let warmer = CacheWarmer::new(store.clone(), Arc::new(FixtureDatabase));

        warmer.warm_cache().await;
        let first = store.get("cache:companies:all").await.unwrap().unwrap();

        warmer.warm_cache().await;
        let second = store.get("cache:companies:all").await.unwrap().unwrap();

        let a: Vec<Company> = serde_json::from_str(&first).unwrap();
        let b: Vec<Company> = serde_json::from_str(&second).unwrap();
        assert_eq!(a.len(), b.len());
    }
}

// =============================================================================
// Scenario: Alert Lifecycle
// =============================================================================

mod alert_scenarios {
    use super::*;

    fn manager_over(store: Arc<MemoryStore>) -> Arc<AlertManager> {
        Arc::new(AlertManager::new(
            Arc::new(FixtureDatabase),
            store,
            Arc::new(MetricsRegistry::new()),
        ))
    }

    #[tokio::test]
    async fn test_sustained_breach_raises_exactly_one_alert() {
        let manager = manager_over(Arc::new(MemoryStore::new()));

        // DB responding at 600ms against a 500ms threshold, five ticks.
        let mut snapshot = healthy_snapshot();
        snapshot.database.response_time_ms = 600.0;

        for tick in 1..=5 {
            manager.evaluate(&snapshot);

            let active = manager.active_alerts();
            assert_eq!(active.len(), 1, "tick {}", tick);
            assert_eq!(active[0].alert_type, AlertType::DatabaseResponseTime);
        }
    }

    #[tokio::test]
    async fn test_recovery_does_not_auto_resolve() {
        let manager = manager_over(Arc::new(MemoryStore::new()));

        let mut breach = healthy_snapshot();
        breach.database.response_time_ms = 600.0;
        manager.evaluate(&breach);

        // Metric falls back under threshold; resolution stays explicit.
        manager.evaluate(&healthy_snapshot());
        assert_eq!(manager.active_alerts().len(), 1);

        let id = manager.active_alerts()[0].id.clone();
        manager.resolve_alert(&id).unwrap();
        assert!(manager.active_alerts().is_empty());

        // Resolved alerts stay queryable inside the retention window.
        assert_eq!(manager.all_alerts().len(), 1);
        assert!(manager.all_alerts()[0].resolved);
    }

    #[tokio::test]
    async fn test_resolving_unknown_id_errors() {
        let manager = manager_over(Arc::new(MemoryStore::new()));
        assert!(manager.resolve_alert("memory_usage_123").is_err());
    }

    #[tokio::test]
    async fn test_tick_mirrors_state_to_store() {
        let store = Arc::new(MemoryStore::new());
        let manager = manager_over(store.clone());

        manager.check_metrics().await;

        // Snapshot mirror is observable by an external dashboard.
        let current = store.get("monitoring:current").await.unwrap();
        assert!(current.is_some());
        let snapshot: MonitoringSnapshot =
            serde_json::from_str(&current.unwrap()).unwrap();
        assert_eq!(snapshot.database.active_connections, 4);
    }
}
