//! Metrics Registry
//!
//! Explicitly constructed, injected registry of application metrics. The
//! embedding service records requests, errors, latency, and process
//! gauges here; the alert sampler reads them back each monitoring tick.
//! There is deliberately no global registry: whoever needs one receives
//! it by `Arc`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

// =============================================================================
// Well-Known Metric Names
// =============================================================================

/// Total requests served, incremented by the request layer.
pub const APP_REQUESTS_TOTAL: &str = "app_requests_total";
/// Total failed requests.
pub const APP_ERRORS_TOTAL: &str = "app_errors_total";
/// Request latency histogram, in seconds.
pub const APP_REQUEST_LATENCY_SECONDS: &str = "app_request_latency_seconds";
/// Currently active users.
pub const APP_ACTIVE_USERS: &str = "app_active_users";
/// Process memory usage, whole percent, supplied by the embedder.
pub const PROCESS_MEMORY_PERCENT: &str = "process_memory_percent";
/// Process CPU usage, whole percent, supplied by the embedder.
pub const PROCESS_CPU_PERCENT: &str = "process_cpu_percent";
/// Disk usage of the data volume, whole percent, supplied by the embedder.
pub const PROCESS_DISK_PERCENT: &str = "process_disk_percent";
/// Live background tasks across the process.
pub const PROCESS_BACKGROUND_TASKS: &str = "process_background_tasks";

// =============================================================================
// Metric Types
// =============================================================================

/// Monotonic counter.
#[derive(Default)]
pub struct Counter {
    value: AtomicU64,
}

impl Counter {
    /// Create a new counter
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment by 1
    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment by n
    pub fn add(&self, n: u64) {
        self.value.fetch_add(n, Ordering::Relaxed);
    }

    /// Get current value
    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Point-in-time gauge.
#[derive(Default)]
pub struct Gauge {
    value: AtomicU64,
}

impl Gauge {
    /// Create a new gauge
    pub fn new() -> Self {
        Self::default()
    }

    /// Set value
    pub fn set(&self, value: u64) {
        self.value.store(value, Ordering::Relaxed);
    }

    /// Increment by 1
    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    /// Decrement by 1
    pub fn dec(&self) {
        self.value.fetch_sub(1, Ordering::Relaxed);
    }

    /// Get current value
    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Observation histogram. Sum is held in micro-units so averages keep
/// sub-second precision in an atomic.
pub struct Histogram {
    sum_micros: AtomicU64,
    count: AtomicU64,
}

impl Histogram {
    /// Create an empty histogram
    pub fn new() -> Self {
        Self {
            sum_micros: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// Observe a value (in seconds for latency metrics)
    pub fn observe(&self, value: f64) {
        self.count.fetch_add(1, Ordering::Relaxed);
        self.sum_micros
            .fetch_add((value * 1_000_000.0) as u64, Ordering::Relaxed);
    }

    /// Observe a duration
    pub fn observe_duration(&self, duration: Duration) {
        self.observe(duration.as_secs_f64());
    }

    /// Number of observations
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Sum of observations
    pub fn sum(&self) -> f64 {
        self.sum_micros.load(Ordering::Relaxed) as f64 / 1_000_000.0
    }

    /// Mean observation, 0.0 when empty
    pub fn average(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            return 0.0;
        }
        self.sum() / count as f64
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Named metrics, created on first use and shared by handle.
pub struct MetricsRegistry {
    counters: RwLock<HashMap<String, Arc<Counter>>>,
    gauges: RwLock<HashMap<String, Arc<Gauge>>>,
    histograms: RwLock<HashMap<String, Arc<Histogram>>>,
    start_time: Instant,
}

impl MetricsRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            counters: RwLock::new(HashMap::new()),
            gauges: RwLock::new(HashMap::new()),
            histograms: RwLock::new(HashMap::new()),
            start_time: Instant::now(),
        }
    }

    /// Get or create a counter
    pub fn counter(&self, name: &str) -> Arc<Counter> {
        if let Some(counter) = self.counters.read().get(name) {
            return counter.clone();
        }

        self.counters
            .write()
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Counter::new()))
            .clone()
    }

    /// Get or create a gauge
    pub fn gauge(&self, name: &str) -> Arc<Gauge> {
        if let Some(gauge) = self.gauges.read().get(name) {
            return gauge.clone();
        }

        self.gauges
            .write()
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Gauge::new()))
            .clone()
    }

    /// Get or create a histogram
    pub fn histogram(&self, name: &str) -> Arc<Histogram> {
        if let Some(histogram) = self.histograms.read().get(name) {
            return histogram.clone();
        }

        self.histograms
            .write()
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Histogram::new()))
            .clone()
    }

    /// Time since the registry was constructed.
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Snapshot of all counter values.
    pub fn counters(&self) -> HashMap<String, u64> {
        self.counters
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.get()))
            .collect()
    }

    /// Snapshot of all gauge values.
    pub fn gauges(&self) -> HashMap<String, u64> {
        self.gauges
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.get()))
            .collect()
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
