//! Monitoring Snapshots
//!
//! Point-in-time aggregates of database, store, process, and application
//! health, produced once per monitoring tick by the [`MetricsSampler`].
//! All values are measured: database latency is timed around the ping,
//! store metrics come from the adapter's INFO parsing, and application
//! rates are derived from registry counter deltas between ticks.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::registry::{
    MetricsRegistry, APP_ACTIVE_USERS, APP_ERRORS_TOTAL, APP_REQUESTS_TOTAL,
    APP_REQUEST_LATENCY_SECONDS, PROCESS_BACKGROUND_TASKS, PROCESS_CPU_PERCENT,
    PROCESS_DISK_PERCENT, PROCESS_MEMORY_PERCENT,
};
use crate::db::Database;
use crate::store::KeyValueStore;

/// Backing database health.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatabaseMetrics {
    /// Ping round-trip in milliseconds
    pub response_time_ms: f64,
    /// Active connections
    pub active_connections: i64,
    /// Queries over the slow cutoff
    pub slow_queries: i64,
    /// Locks currently held
    pub locks: i64,
}

/// Key/value store health.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreMetrics {
    /// Hit rate percentage (0.0 when the store has no recorded lookups)
    pub hit_rate: f64,
    /// Memory in use, megabytes
    pub used_memory_mb: f64,
    /// Connected clients
    pub connected_clients: u64,
    /// Keys held
    pub keys: u64,
}

/// Process-level health, read from the injected registry's gauges.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemMetrics {
    /// Memory usage percent
    pub memory_usage_percent: f64,
    /// CPU usage percent
    pub cpu_usage_percent: f64,
    /// Disk usage percent
    pub disk_usage_percent: f64,
    /// Live background tasks
    pub background_tasks: u64,
}

/// Application-level health, derived from registry counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppMetrics {
    /// Requests per second since the previous tick
    pub requests_per_second: f64,
    /// Failed fraction of requests since the previous tick, percent
    pub error_rate_percent: f64,
    /// Mean request latency, milliseconds
    pub avg_response_time_ms: f64,
    /// Currently active users
    pub active_users: u64,
}

/// One monitoring tick's full view of the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringSnapshot {
    pub database: DatabaseMetrics,
    pub store: StoreMetrics,
    pub system: SystemMetrics,
    pub app: AppMetrics,
    pub timestamp: DateTime<Utc>,
}

impl MonitoringSnapshot {
    /// Assemble a snapshot stamped with the current time.
    pub fn new(
        database: DatabaseMetrics,
        store: StoreMetrics,
        system: SystemMetrics,
        app: AppMetrics,
    ) -> Self {
        Self {
            database,
            store,
            system,
            app,
            timestamp: Utc::now(),
        }
    }
}

struct AppSampleState {
    requests: u64,
    errors: u64,
    at: Instant,
}

/// Collects one [`MonitoringSnapshot`] per tick from the shared ports and
/// the injected registry.
pub struct MetricsSampler {
    db: Arc<dyn Database>,
    store: Arc<dyn KeyValueStore>,
    registry: Arc<MetricsRegistry>,
    last_app: Mutex<AppSampleState>,
}

impl MetricsSampler {
    /// Create a sampler over the shared collaborators.
    pub fn new(
        db: Arc<dyn Database>,
        store: Arc<dyn KeyValueStore>,
        registry: Arc<MetricsRegistry>,
    ) -> Self {
        let requests = registry.counter(APP_REQUESTS_TOTAL).get();
        let errors = registry.counter(APP_ERRORS_TOTAL).get();
        Self {
            db,
            store,
            registry,
            last_app: Mutex::new(AppSampleState {
                requests,
                errors,
                at: Instant::now(),
            }),
        }
    }

    /// Sample everything. Partial collection failures are logged and leave
    /// zeroed fields; sampling itself never fails.
    pub async fn collect(&self) -> MonitoringSnapshot {
        MonitoringSnapshot::new(
            self.collect_database().await,
            self.collect_store().await,
            self.collect_system(),
            self.collect_app(),
        )
    }

    async fn collect_database(&self) -> DatabaseMetrics {
        let started = Instant::now();
        let ping = self.db.ping().await;
        let response_time_ms = started.elapsed().as_secs_f64() * 1000.0;

        let mut metrics = DatabaseMetrics {
            response_time_ms,
            ..Default::default()
        };

        match ping {
            Ok(()) => {
                metrics.active_connections =
                    or_zero(self.db.active_connections().await, "active connections");
                metrics.slow_queries =
                    or_zero(self.db.slow_query_count().await, "slow query count");
                metrics.locks = or_zero(self.db.lock_count().await, "lock count");
            }
            Err(e) => warn!("database ping failed: {}", e),
        }

        metrics
    }

    async fn collect_store(&self) -> StoreMetrics {
        match self.store.info().await {
            Ok(info) => StoreMetrics {
                hit_rate: info.hit_rate,
                used_memory_mb: info.used_memory_mb,
                connected_clients: info.connected_clients,
                keys: info.keys,
            },
            Err(e) => {
                warn!("failed to sample store info: {}", e);
                StoreMetrics::default()
            }
        }
    }

    fn collect_system(&self) -> SystemMetrics {
        SystemMetrics {
            memory_usage_percent: self.registry.gauge(PROCESS_MEMORY_PERCENT).get() as f64,
            cpu_usage_percent: self.registry.gauge(PROCESS_CPU_PERCENT).get() as f64,
            disk_usage_percent: self.registry.gauge(PROCESS_DISK_PERCENT).get() as f64,
            background_tasks: self.registry.gauge(PROCESS_BACKGROUND_TASKS).get(),
        }
    }

    fn collect_app(&self) -> AppMetrics {
        let requests = self.registry.counter(APP_REQUESTS_TOTAL).get();
        let errors = self.registry.counter(APP_ERRORS_TOTAL).get();

        let mut last = self.last_app.lock();
        let elapsed = last.at.elapsed().as_secs_f64();
        let request_delta = requests.saturating_sub(last.requests) as f64;
        let error_delta = errors.saturating_sub(last.errors) as f64;

        let requests_per_second = if elapsed > 0.0 {
            request_delta / elapsed
        } else {
            0.0
        };
        let error_rate_percent = if request_delta > 0.0 {
            error_delta / request_delta * 100.0
        } else {
            0.0
        };

        *last = AppSampleState {
            requests,
            errors,
            at: Instant::now(),
        };

        AppMetrics {
            requests_per_second,
            error_rate_percent,
            avg_response_time_ms: self
                .registry
                .histogram(APP_REQUEST_LATENCY_SECONDS)
                .average()
                * 1000.0,
            active_users: self.registry.gauge(APP_ACTIVE_USERS).get(),
        }
    }
}

fn or_zero(result: crate::error::Result<i64>, what: &str) -> i64 {
    match result {
        Ok(value) => value,
        Err(e) => {
            warn!("failed to sample {}: {}", what, e);
            0
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::model::{Company, EsgScore};
    use crate::store::MemoryStore;
    use async_trait::async_trait;

    struct StubDatabase {
        healthy: bool,
    }

    #[async_trait]
    impl Database for StubDatabase {
        async fn ping(&self) -> Result<()> {
            if self.healthy {
                Ok(())
            } else {
                Err(Error::Database("connection refused".to_string()))
            }
        }
        async fn companies(&self) -> Result<Vec<Company>> {
            Ok(vec![])
        }
        async fn latest_esg_scores(&self) -> Result<Vec<EsgScore>> {
            Ok(vec![])
        }
        async fn sectors(&self) -> Result<Vec<String>> {
            Ok(vec![])
        }
        async fn company_count(&self) -> Result<i64> {
            Ok(0)
        }
        async fn esg_score_count(&self) -> Result<i64> {
            Ok(0)
        }
        async fn active_connections(&self) -> Result<i64> {
            Ok(12)
        }
        async fn slow_query_count(&self) -> Result<i64> {
            Ok(2)
        }
        async fn lock_count(&self) -> Result<i64> {
            Ok(5)
        }
    }

    fn sampler(healthy: bool) -> MetricsSampler {
        MetricsSampler::new(
            Arc::new(StubDatabase { healthy }),
            Arc::new(MemoryStore::new()),
            Arc::new(MetricsRegistry::new()),
        )
    }

    #[tokio::test]
    async fn test_collect_database_scalars_when_healthy() {
        let snapshot = sampler(true).collect().await;

        assert_eq!(snapshot.database.active_connections, 12);
        assert_eq!(snapshot.database.slow_queries, 2);
        assert_eq!(snapshot.database.locks, 5);
        assert!(snapshot.database.response_time_ms >= 0.0);
    }

    #[tokio::test]
    async fn test_unreachable_database_zeroes_scalars() {
        let snapshot = sampler(false).collect().await;

        assert_eq!(snapshot.database.active_connections, 0);
        assert_eq!(snapshot.database.slow_queries, 0);
    }

    #[tokio::test]
    async fn test_app_rates_derive_from_counter_deltas() {
        let registry = Arc::new(MetricsRegistry::new());
        let sampler = MetricsSampler::new(
            Arc::new(StubDatabase { healthy: true }),
            Arc::new(MemoryStore::new()),
            registry.clone(),
        );

        registry.counter(APP_REQUESTS_TOTAL).add(100);
        registry.counter(APP_ERRORS_TOTAL).add(10);
        registry.gauge(APP_ACTIVE_USERS).set(7);

        let snapshot = sampler.collect().await;
        assert!((snapshot.app.error_rate_percent - 10.0).abs() < f64::EPSILON);
        assert!(snapshot.app.requests_per_second > 0.0);
        assert_eq!(snapshot.app.active_users, 7);

        // No traffic between ticks reads as zero rates, not stale ones.
        let idle = sampler.collect().await;
        assert_eq!(idle.app.error_rate_percent, 0.0);
    }

    #[tokio::test]
    async fn test_system_metrics_come_from_gauges() {
        let registry = Arc::new(MetricsRegistry::new());
        registry.gauge(PROCESS_MEMORY_PERCENT).set(88);
        registry.gauge(PROCESS_BACKGROUND_TASKS).set(3);

        let sampler = MetricsSampler::new(
            Arc::new(StubDatabase { healthy: true }),
            Arc::new(MemoryStore::new()),
            registry,
        );

        let snapshot = sampler.collect().await;
        assert_eq!(snapshot.system.memory_usage_percent, 88.0);
        assert_eq!(snapshot.system.background_tasks, 3);
        // Gauges the embedder never set sample as zero.
        assert_eq!(snapshot.system.cpu_usage_percent, 0.0);
    }

    #[tokio::test]
    async fn test_snapshot_serializes() {
        let snapshot = sampler(true).collect().await;
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("\"database\""));
        assert!(json.contains("\"timestamp\""));
    }
}
