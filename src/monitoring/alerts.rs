//! Alert Manager
//!
//! Evaluates each monitoring snapshot against fixed thresholds and keeps a
//! deduplicated, self-expiring alert feed.
//!
//! State machine per alert type:
//!
//! ```text
//! none ──breach──▶ active (unresolved) ──resolve_alert──▶ resolved ──1h──▶ dropped
//!        ▲                   │
//!        └── further breaches of the same type are suppressed ──┘
//! ```
//!
//! At most one unresolved alert per type exists at a time, so a metric
//! that stays over threshold for many consecutive ticks raises exactly
//! one alert. Resolution is explicit: a sample falling back under
//! threshold does not auto-resolve.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::registry::MetricsRegistry;
use super::snapshot::{MetricsSampler, MonitoringSnapshot};
use crate::db::Database;
use crate::error::{Error, Result};
use crate::store::KeyValueStore;

/// Store key holding the most recent snapshot.
const MONITORING_CURRENT_KEY: &str = "monitoring:current";
/// Store key prefix for timestamped snapshot history.
const MONITORING_HISTORY_PREFIX: &str = "monitoring:history";
/// Capped store list mirroring raised alerts.
const ALERTS_LIST_KEY: &str = "alerts:active";
/// How many mirrored alerts the store list retains.
const ALERTS_LIST_CAP: usize = 100;

/// TTL of the "current" snapshot key.
const CURRENT_SNAPSHOT_TTL: Duration = Duration::from_secs(60 * 60);
/// TTL of each history snapshot key.
const HISTORY_SNAPSHOT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// How long a resolved alert stays visible before cleanup drops it.
const RESOLVED_RETENTION: Duration = Duration::from_secs(60 * 60);

// =============================================================================
// Alert Types
// =============================================================================

/// Kind of condition an alert reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    DatabaseResponseTime,
    DatabaseConnections,
    CacheHitRate,
    MemoryUsage,
    ErrorRate,
    RequestRate,
    DiskSpace,
    QueryPerformance,
}

impl AlertType {
    /// Stable identifier used in alert ids and serialization.
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::DatabaseResponseTime => "database_response_time",
            AlertType::DatabaseConnections => "database_connections",
            AlertType::CacheHitRate => "cache_hit_rate",
            AlertType::MemoryUsage => "memory_usage",
            AlertType::ErrorRate => "error_rate",
            AlertType::RequestRate => "request_rate",
            AlertType::DiskSpace => "disk_space",
            AlertType::QueryPerformance => "query_performance",
        }
    }
}

impl std::fmt::Display for AlertType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Alert severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl Severity {
    /// Stable identifier used in logs and serialization.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A raised system alert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    /// `<type>_<unix seconds>`; used for dedup-free addressing
    pub id: String,
    /// Condition kind
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    /// Severity
    pub severity: Severity,
    /// Human-readable description
    pub message: String,
    /// Observed value
    pub value: f64,
    /// Threshold that was crossed
    pub threshold: f64,
    /// When the alert was raised
    pub timestamp: DateTime<Utc>,
    /// Whether the alert has been resolved
    pub resolved: bool,
    /// When it was resolved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Fixed monitoring thresholds, set once at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thresholds {
    /// Database ping latency ceiling (ms)
    pub database_response_time_ms: f64,
    /// Active connection ceiling
    pub database_max_connections: f64,
    /// Slow query count ceiling
    pub max_slow_queries: f64,
    /// Cache hit rate floor (percent)
    pub cache_min_hit_rate: f64,
    /// Process memory ceiling (percent)
    pub max_memory_usage_percent: f64,
    /// Background task ceiling
    pub max_background_tasks: f64,
    /// Error rate ceiling (percent)
    pub max_error_rate_percent: f64,
    /// Request rate ceiling (req/s)
    pub max_requests_per_second: f64,
    /// Free disk floor (percent)
    pub min_disk_space_percent: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            database_response_time_ms: 500.0,
            database_max_connections: 80.0,
            max_slow_queries: 5.0,
            cache_min_hit_rate: 80.0,
            max_memory_usage_percent: 85.0,
            max_background_tasks: 1000.0,
            max_error_rate_percent: 5.0,
            max_requests_per_second: 1000.0,
            min_disk_space_percent: 15.0,
        }
    }
}

/// A threshold breach observed during evaluation, before dedup.
struct Breach {
    alert_type: AlertType,
    severity: Severity,
    message: String,
    value: f64,
    threshold: f64,
}

// =============================================================================
// Alert Manager
// =============================================================================

/// Periodic health evaluation with a deduplicated in-memory alert list.
///
/// The in-memory list is the source of truth for dedup and resolution;
/// the store mirror exists so dashboards and other processes can observe
/// alerts without sharing it.
pub struct AlertManager {
    sampler: MetricsSampler,
    store: Arc<dyn KeyValueStore>,
    alerts: RwLock<Vec<Alert>>,
    thresholds: Thresholds,
    token: CancellationToken,
}

impl AlertManager {
    /// Create a manager with default thresholds.
    pub fn new(
        db: Arc<dyn Database>,
        store: Arc<dyn KeyValueStore>,
        registry: Arc<MetricsRegistry>,
    ) -> Self {
        Self::with_thresholds(db, store, registry, Thresholds::default())
    }

    /// Create a manager with explicit thresholds.
    pub fn with_thresholds(
        db: Arc<dyn Database>,
        store: Arc<dyn KeyValueStore>,
        registry: Arc<MetricsRegistry>,
        thresholds: Thresholds,
    ) -> Self {
        Self {
            sampler: MetricsSampler::new(db, store.clone(), registry),
            store,
            alerts: RwLock::new(Vec::new()),
            thresholds,
            token: CancellationToken::new(),
        }
    }

    /// Launch the monitoring loop: one [`check_metrics`](Self::check_metrics)
    /// per `interval`, starting one interval from now.
    pub fn start_monitoring(self: &Arc<Self>, interval: Duration) {
        let manager = Arc::clone(self);
        let token = self.token.clone();

        tokio::spawn(async move {
            let first = tokio::time::Instant::now() + interval;
            let mut tick = tokio::time::interval_at(first, interval);
            info!("starting performance monitoring every {:?}", interval);

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        info!("performance monitoring stopped");
                        break;
                    }
                    _ = tick.tick() => {
                        manager.check_metrics().await;
                    }
                }
            }
        });
    }

    /// Stop the monitoring loop. Idempotent.
    pub fn stop_monitoring(&self) {
        self.token.cancel();
    }

    /// Run one monitoring tick: sample, evaluate, persist, clean up.
    ///
    /// Persistence failures are logged; a tick never fails outright.
    pub async fn check_metrics(&self) {
        let snapshot = self.sampler.collect().await;

        let raised = self.evaluate(&snapshot);
        for alert in &raised {
            if let Err(e) = self.mirror_alert(alert).await {
                warn!("failed to mirror alert {}: {}", alert.id, e);
            }
        }

        if let Err(e) = self.persist_snapshot(&snapshot).await {
            warn!("failed to persist monitoring snapshot: {}", e);
        }

        self.cleanup_resolved();
    }

    /// Evaluate a snapshot against the thresholds, raising alerts for
    /// breaches whose type has no unresolved alert outstanding. Returns
    /// the newly raised alerts.
    pub fn evaluate(&self, snapshot: &MonitoringSnapshot) -> Vec<Alert> {
        let breaches = self.find_breaches(snapshot);
        if breaches.is_empty() {
            return Vec::new();
        }

        let mut alerts = self.alerts.write();
        let mut raised = Vec::new();

        for breach in breaches {
            let outstanding = alerts
                .iter()
                .any(|a| a.alert_type == breach.alert_type && !a.resolved);
            if outstanding {
                continue;
            }

            let now = Utc::now();
            let alert = Alert {
                id: format!("{}_{}", breach.alert_type.as_str(), now.timestamp()),
                alert_type: breach.alert_type,
                severity: breach.severity,
                message: breach.message,
                value: breach.value,
                threshold: breach.threshold,
                timestamp: now,
                resolved: false,
                resolved_at: None,
            };

            warn!("ALERT [{}]: {}", alert.severity, alert.message);
            alerts.push(alert.clone());
            raised.push(alert);
        }

        raised
    }

    /// All unresolved alerts.
    pub fn active_alerts(&self) -> Vec<Alert> {
        self.alerts
            .read()
            .iter()
            .filter(|a| !a.resolved)
            .cloned()
            .collect()
    }

    /// The full retained list, resolved-but-not-yet-dropped included.
    pub fn all_alerts(&self) -> Vec<Alert> {
        self.alerts.read().clone()
    }

    /// Mark the alert with `id` resolved.
    ///
    /// Fails with [`Error::AlertNotFound`] if no matching unresolved
    /// alert exists.
    pub fn resolve_alert(&self, id: &str) -> Result<()> {
        let mut alerts = self.alerts.write();

        for alert in alerts.iter_mut() {
            if alert.id == id && !alert.resolved {
                alert.resolved = true;
                alert.resolved_at = Some(Utc::now());
                info!("alert resolved: {}", alert.message);
                return Ok(());
            }
        }

        Err(Error::AlertNotFound { id: id.to_string() })
    }

    // =========================================================================
    // Threshold Checks
    // =========================================================================

    fn find_breaches(&self, snapshot: &MonitoringSnapshot) -> Vec<Breach> {
        let t = &self.thresholds;
        let mut breaches = Vec::new();

        let db = &snapshot.database;
        if db.response_time_ms > t.database_response_time_ms {
            breaches.push(Breach {
                alert_type: AlertType::DatabaseResponseTime,
                severity: Severity::Critical,
                message: format!(
                    "Database response time is {:.2}ms (threshold: {:.2}ms)",
                    db.response_time_ms, t.database_response_time_ms
                ),
                value: db.response_time_ms,
                threshold: t.database_response_time_ms,
            });
        }
        if db.active_connections as f64 > t.database_max_connections {
            breaches.push(Breach {
                alert_type: AlertType::DatabaseConnections,
                severity: Severity::Warning,
                message: format!(
                    "High database connections: {} (threshold: {:.0})",
                    db.active_connections, t.database_max_connections
                ),
                value: db.active_connections as f64,
                threshold: t.database_max_connections,
            });
        }
        if db.slow_queries as f64 > t.max_slow_queries {
            breaches.push(Breach {
                alert_type: AlertType::QueryPerformance,
                severity: Severity::Warning,
                message: format!("High number of slow queries: {}", db.slow_queries),
                value: db.slow_queries as f64,
                threshold: t.max_slow_queries,
            });
        }

        // Hit rate alerts below threshold; a store with no recorded
        // lookups reports 0.0 and is skipped rather than treated as cold.
        let store = &snapshot.store;
        if store.hit_rate > 0.0 && store.hit_rate < t.cache_min_hit_rate {
            breaches.push(Breach {
                alert_type: AlertType::CacheHitRate,
                severity: Severity::Warning,
                message: format!(
                    "Low cache hit rate: {:.2}% (threshold: {:.2}%)",
                    store.hit_rate, t.cache_min_hit_rate
                ),
                value: store.hit_rate,
                threshold: t.cache_min_hit_rate,
            });
        }

        let system = &snapshot.system;
        if system.memory_usage_percent > t.max_memory_usage_percent {
            breaches.push(Breach {
                alert_type: AlertType::MemoryUsage,
                severity: Severity::Critical,
                message: format!(
                    "High memory usage: {:.2}% (threshold: {:.2}%)",
                    system.memory_usage_percent, t.max_memory_usage_percent
                ),
                value: system.memory_usage_percent,
                threshold: t.max_memory_usage_percent,
            });
        }
        if system.background_tasks as f64 > t.max_background_tasks {
            breaches.push(Breach {
                alert_type: AlertType::MemoryUsage,
                severity: Severity::Warning,
                message: format!("High number of background tasks: {}", system.background_tasks),
                value: system.background_tasks as f64,
                threshold: t.max_background_tasks,
            });
        }
        let max_disk_used = 100.0 - t.min_disk_space_percent;
        if system.disk_usage_percent > max_disk_used {
            breaches.push(Breach {
                alert_type: AlertType::DiskSpace,
                severity: Severity::Warning,
                message: format!(
                    "Low free disk space: {:.2}% used (threshold: {:.2}% used)",
                    system.disk_usage_percent, max_disk_used
                ),
                value: system.disk_usage_percent,
                threshold: max_disk_used,
            });
        }

        let app = &snapshot.app;
        if app.error_rate_percent > t.max_error_rate_percent {
            breaches.push(Breach {
                alert_type: AlertType::ErrorRate,
                severity: Severity::Critical,
                message: format!(
                    "High error rate: {:.2}% (threshold: {:.2}%)",
                    app.error_rate_percent, t.max_error_rate_percent
                ),
                value: app.error_rate_percent,
                threshold: t.max_error_rate_percent,
            });
        }
        if app.requests_per_second > t.max_requests_per_second {
            breaches.push(Breach {
                alert_type: AlertType::RequestRate,
                severity: Severity::Warning,
                message: format!(
                    "High request rate: {:.2} req/s (threshold: {:.2} req/s)",
                    app.requests_per_second, t.max_requests_per_second
                ),
                value: app.requests_per_second,
                threshold: t.max_requests_per_second,
            });
        }

        breaches
    }

    // =========================================================================
    // Retention & Persistence
    // =========================================================================

    /// Drop resolved alerts older than the retention window. Unresolved
    /// alerts are never dropped.
    fn cleanup_resolved(&self) {
        let retention =
            chrono::Duration::from_std(RESOLVED_RETENTION).unwrap_or(chrono::Duration::zero());
        self.cleanup_resolved_before(Utc::now() - retention);
    }

    pub(crate) fn cleanup_resolved_before(&self, cutoff: DateTime<Utc>) {
        self.alerts
            .write()
            .retain(|a| !a.resolved || matches!(a.resolved_at, Some(at) if at > cutoff));
    }

    async fn persist_snapshot(&self, snapshot: &MonitoringSnapshot) -> Result<()> {
        let payload = serde_json::to_string(snapshot)?;

        self.store
            .set(MONITORING_CURRENT_KEY, &payload, CURRENT_SNAPSHOT_TTL)
            .await?;

        let history_key = format!(
            "{}:{}",
            MONITORING_HISTORY_PREFIX,
            snapshot.timestamp.format("%Y%m%d_%H%M")
        );
        self.store
            .set(&history_key, &payload, HISTORY_SNAPSHOT_TTL)
            .await
    }

    async fn mirror_alert(&self, alert: &Alert) -> Result<()> {
        let payload = serde_json::to_string(alert)?;
        self.store
            .lpush_trim(ALERTS_LIST_KEY, &payload, ALERTS_LIST_CAP)
            .await
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitoring::snapshot::{
        AppMetrics, DatabaseMetrics, StoreMetrics, SystemMetrics,
    };
    use crate::store::MemoryStore;
    use assert_matches::assert_matches;
    use async_trait::async_trait;

    struct StubDatabase;

    #[async_trait]
    impl Database for StubDatabase {
        async fn ping(&self) -> Result<()> {
            Ok(())
        }
        async fn companies(&self) -> Result<Vec<crate::model::Company>> {
            Ok(vec![])
        }
        async fn latest_esg_scores(&self) -> Result<Vec<crate::model::EsgScore>> {
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
            Ok(1)
        }
        async fn slow_query_count(&self) -> Result<i64> {
            Ok(0)
        }
        async fn lock_count(&self) -> Result<i64> {
            Ok(0)
        }
    }

    fn manager() -> (Arc<AlertManager>, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let manager = Arc::new(AlertManager::new(
            Arc::new(StubDatabase),
            store.clone(),
            Arc::new(MetricsRegistry::new()),
        ));
        (manager, store)
    }

    fn healthy_snapshot() -> MonitoringSnapshot {
        MonitoringSnapshot::new(
            DatabaseMetrics {
                response_time_ms: 12.0,
                active_connections: 10,
                slow_queries: 0,
                locks: 2,
            },
            StoreMetrics {
                hit_rate: 95.0,
                used_memory_mb: 64.0,
                connected_clients: 3,
                keys: 500,
            },
            SystemMetrics::default(),
            AppMetrics::default(),
        )
    }

    fn slow_db_snapshot() -> MonitoringSnapshot {
        let mut snapshot = healthy_snapshot();
        snapshot.database.response_time_ms = 600.0;
        snapshot
    }

    #[test]
    fn test_healthy_snapshot_raises_nothing() {
        let (manager, _) = manager();
        assert!(manager.evaluate(&healthy_snapshot()).is_empty());
        assert!(manager.active_alerts().is_empty());
    }

    #[test]
    fn test_breach_raises_one_alert() {
        let (manager, _) = manager();

        let raised = manager.evaluate(&slow_db_snapshot());
        assert_eq!(raised.len(), 1);

        let alert = &raised[0];
        assert_eq!(alert.alert_type, AlertType::DatabaseResponseTime);
        assert_eq!(alert.severity, Severity::Critical);
        assert_eq!(alert.value, 600.0);
        assert_eq!(alert.threshold, 500.0);
        assert!(alert.id.starts_with("database_response_time_"));
    }

    #[test]
    fn test_repeated_breaches_are_deduplicated() {
        let (manager, _) = manager();

        for _ in 0..5 {
            manager.evaluate(&slow_db_snapshot());
        }

        let active = manager.active_alerts();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].alert_type, AlertType::DatabaseResponseTime);
    }

    #[test]
    fn test_resolve_then_breach_raises_again() {
        let (manager, _) = manager();

        manager.evaluate(&slow_db_snapshot());
        let id = manager.active_alerts()[0].id.clone();
        manager.resolve_alert(&id).unwrap();
        assert!(manager.active_alerts().is_empty());

        // A later breach of the same type may raise a fresh alert.
        manager.evaluate(&slow_db_snapshot());
        assert_eq!(manager.active_alerts().len(), 1);
        assert_eq!(manager.all_alerts().len(), 2);
    }

    #[test]
    fn test_resolve_unknown_alert_fails() {
        let (manager, _) = manager();

        let result = manager.resolve_alert("database_response_time_0");
        assert_matches!(result, Err(Error::AlertNotFound { .. }));
    }

    #[test]
    fn test_resolve_twice_fails() {
        let (manager, _) = manager();

        manager.evaluate(&slow_db_snapshot());
        let id = manager.active_alerts()[0].id.clone();

        manager.resolve_alert(&id).unwrap();
        assert_matches!(
            manager.resolve_alert(&id),
            Err(Error::AlertNotFound { .. })
        );
    }

    #[test]
    fn test_hit_rate_alerts_below_threshold() {
        let (manager, _) = manager();

        let mut snapshot = healthy_snapshot();
        snapshot.store.hit_rate = 60.0;

        let raised = manager.evaluate(&snapshot);
        assert_eq!(raised.len(), 1);
        assert_eq!(raised[0].alert_type, AlertType::CacheHitRate);
    }

    #[test]
    fn test_idle_store_hit_rate_is_not_a_breach() {
        let (manager, _) = manager();

        let mut snapshot = healthy_snapshot();
        snapshot.store.hit_rate = 0.0;

        assert!(manager.evaluate(&snapshot).is_empty());
    }

    #[test]
    fn test_multiple_distinct_types_raise_together() {
        let (manager, _) = manager();

        let mut snapshot = slow_db_snapshot();
        snapshot.system.memory_usage_percent = 95.0;
        snapshot.app.error_rate_percent = 9.0;

        let raised = manager.evaluate(&snapshot);
        let mut types: Vec<AlertType> = raised.iter().map(|a| a.alert_type).collect();
        types.sort_by_key(|t| t.as_str());
        assert_eq!(
            types,
            vec![
                AlertType::DatabaseResponseTime,
                AlertType::ErrorRate,
                AlertType::MemoryUsage,
            ]
        );
    }

    #[test]
    fn test_disk_space_breach() {
        let (manager, _) = manager();

        let mut snapshot = healthy_snapshot();
        snapshot.system.disk_usage_percent = 92.0;

        let raised = manager.evaluate(&snapshot);
        assert_eq!(raised.len(), 1);
        assert_eq!(raised[0].alert_type, AlertType::DiskSpace);
        assert_eq!(raised[0].threshold, 85.0);
    }

    #[test]
    fn test_cleanup_drops_only_stale_resolved_alerts() {
        let (manager, _) = manager();

        manager.evaluate(&slow_db_snapshot());
        let id = manager.active_alerts()[0].id.clone();
        manager.resolve_alert(&id).unwrap();

        // Freshly resolved: retained.
        manager.cleanup_resolved_before(Utc::now() - chrono::Duration::hours(1));
        assert_eq!(manager.all_alerts().len(), 1);

        // Simulate the retention window passing.
        manager.cleanup_resolved_before(Utc::now() + chrono::Duration::seconds(1));
        assert!(manager.all_alerts().is_empty());
    }

    #[test]
    fn test_cleanup_never_drops_unresolved_alerts() {
        let (manager, _) = manager();

        manager.evaluate(&slow_db_snapshot());
        manager.cleanup_resolved_before(Utc::now() + chrono::Duration::days(365));

        assert_eq!(manager.active_alerts().len(), 1);
    }

    #[tokio::test]
    async fn test_check_metrics_persists_snapshot_and_mirrors_alerts() {
        let store = Arc::new(MemoryStore::new());
        let registry = Arc::new(MetricsRegistry::new());
        // Over the 85% memory threshold.
        registry
            .gauge(crate::monitoring::registry::PROCESS_MEMORY_PERCENT)
            .set(95);

        let manager = Arc::new(AlertManager::new(
            Arc::new(StubDatabase),
            store.clone(),
            registry,
        ));

        manager.check_metrics().await;

        assert!(store.get(MONITORING_CURRENT_KEY).await.unwrap().is_some());
        assert_eq!(manager.active_alerts().len(), 1);
        assert_eq!(store.list_len(ALERTS_LIST_KEY), 1);

        let history = store
            .keys(&format!("{}:*", MONITORING_HISTORY_PREFIX))
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_monitoring_is_idempotent() {
        let (manager, store) = manager();

        manager.start_monitoring(Duration::from_secs(30));

        // First tick fires one interval in.
        tokio::time::sleep(Duration::from_secs(31)).await;
        assert!(store.get(MONITORING_CURRENT_KEY).await.unwrap().is_some());

        manager.stop_monitoring();
        manager.stop_monitoring();

        store.delete(MONITORING_CURRENT_KEY).await.unwrap();
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert!(store.get(MONITORING_CURRENT_KEY).await.unwrap().is_none());
    }

    #[test]
    fn test_alert_serialization_shape() {
        let alert = Alert {
            id: "error_rate_1700000000".to_string(),
            alert_type: AlertType::ErrorRate,
            severity: Severity::Critical,
            message: "High error rate".to_string(),
            value: 9.5,
            threshold: 5.0,
            timestamp: Utc::now(),
            resolved: false,
            resolved_at: None,
        };

        let json = serde_json::to_string(&alert).unwrap();
        assert!(json.contains("\"type\":\"error_rate\""));
        assert!(json.contains("\"severity\":\"critical\""));
        assert!(!json.contains("resolved_at"));
    }
}
