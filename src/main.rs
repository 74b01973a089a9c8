//! finfreshd - Freshness Layer Daemon
//!
//! Runs the cache warmer and alert manager against a shared store. The
//! HTTP surface that consumes the cache lives elsewhere; this daemon only
//! keeps derived data fresh and observable.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                       finfreshd                          │
//! ├─────────────────────────────────────────────────────────┤
//! │  ┌──────────────┐              ┌──────────────┐          │
//! │  │ Cache Warmer │              │Alert Manager │          │
//! │  └──────┬───────┘              └──────┬───────┘          │
//! │         └───────────┬────────────────┘                   │
//! │                     ▼                                    │
//! │          Redis  (or in-memory store)                     │
//! └─────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use finfresh::db::Database;
use finfresh::error::Result;
use finfresh::model::{Company, EsgScore};
use finfresh::monitoring::AlertManager;
use finfresh::store::{KeyValueStore, MemoryStore, RedisStore};
use finfresh::{CacheWarmer, MetricsRegistry};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Freshness layer daemon - cache warming and threshold alerting
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Redis URL; omit to run on the in-process store
    #[arg(long, env = "REDIS_URL")]
    redis_url: Option<String>,

    /// Cache warming interval in seconds
    #[arg(long, env = "WARM_INTERVAL_SECONDS", default_value = "300")]
    warm_interval_seconds: u64,

    /// Monitoring interval in seconds
    #[arg(long, env = "MONITOR_INTERVAL_SECONDS", default_value = "30")]
    monitor_interval_seconds: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args);

    info!("Starting finfresh daemon");
    info!("  Warm interval: {}s", args.warm_interval_seconds);
    info!("  Monitor interval: {}s", args.monitor_interval_seconds);

    let store: Arc<dyn KeyValueStore> = match &args.redis_url {
        Some(url) => Arc::new(RedisStore::connect(url).await.map_err(|e| {
            error!("Failed to connect to redis: {}", e);
            e
        })?),
        None => {
            info!("No redis URL configured; using in-process store");
            Arc::new(MemoryStore::new())
        }
    };

    // The SQL repository layer is wired in by the embedding service; the
    // standalone daemon runs against an empty data source.
    let db: Arc<dyn Database> = Arc::new(EmptyDatabase);
    let registry = Arc::new(MetricsRegistry::new());

    let warmer = Arc::new(CacheWarmer::new(store.clone(), db.clone()));
    let warmer_handle = warmer.start(Duration::from_secs(args.warm_interval_seconds));

    let alert_manager = Arc::new(AlertManager::new(db, store, registry));
    alert_manager.start_monitoring(Duration::from_secs(args.monitor_interval_seconds));

    info!("Freshness loops running; press ctrl-c to stop");

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| finfresh::Error::Internal(format!("signal handler failed: {}", e)))?;

    info!("Shutting down");
    warmer_handle.stop();
    alert_manager.stop_monitoring();

    info!("Shutdown complete");
    Ok(())
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .init();
    }
}

// =============================================================================
// Placeholder Data Source
// =============================================================================

/// Empty `Database` used when the daemon runs standalone, without the
/// repository layer that normally implements the port.
struct EmptyDatabase;

#[async_trait::async_trait]
impl Database for EmptyDatabase {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn companies(&self) -> Result<Vec<Company>> {
        Ok(Vec::new())
    }

    async fn latest_esg_scores(&self) -> Result<Vec<EsgScore>> {
        Ok(Vec::new())
    }

    async fn sectors(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    async fn company_count(&self) -> Result<i64> {
        Ok(0)
    }

    async fn esg_score_count(&self) -> Result<i64> {
        Ok(0)
    }

    async fn active_connections(&self) -> Result<i64> {
        Ok(0)
    }

    async fn slow_query_count(&self) -> Result<i64> {
        Ok(0)
    }

    async fn lock_count(&self) -> Result<i64> {
        Ok(0)
    }
}
