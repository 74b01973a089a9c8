//! Monitoring and Alerting
//!
//! Periodic health evaluation for the freshness layer:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                        Alert Manager                              │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  MetricsSampler            │  Thresholds  │  Alert list           │
//! │  db ping + scalars         │  fixed at    │  dedup by type        │
//! │  store INFO                │  construction│  explicit resolve     │
//! │  registry counters/gauges  │              │  1h resolved retention│
//! └──────────────────────────────────────────────────────────────────┘
//!         │                                        │
//!         ▼                                        ▼
//!   MetricsRegistry (injected)          KeyValueStore (snapshot +
//!                                        alert mirror for dashboards)
//! ```
//!
//! The registry is constructed explicitly and passed to whatever needs to
//! read or record metrics; there is no package-level singleton.

pub mod alerts;
pub mod registry;
pub mod snapshot;

pub use alerts::{Alert, AlertManager, AlertType, Severity, Thresholds};
pub use registry::{Counter, Gauge, Histogram, MetricsRegistry};
pub use snapshot::{
    AppMetrics, DatabaseMetrics, MetricsSampler, MonitoringSnapshot, StoreMetrics, SystemMetrics,
};
