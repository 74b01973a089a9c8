//! Cache Warmer
//!
//! Proactively repopulates hot read paths on a fixed cadence so the first
//! request after expiry never pays cold-query latency. The warmer writes
//! plain serialized payloads straight to the store, bypassing the
//! [`AdvancedCache`](super::AdvancedCache) envelope: warmed data's
//! staleness is bounded by the next pass, so it trades tag invalidation
//! for directness.
//!
//! Every pass fully overwrites the keys it owns, which makes warming
//! idempotent: a crashed or skipped pass leaves prior (aging) data in
//! place rather than corrupting it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::db::Database;
use crate::error::Result;
use crate::model::{AnalyticsSummary, Company, EsgScore, ScoreMetric};
use crate::store::KeyValueStore;

/// TTL for warmed entity data (company lists and lookups).
const ENTITY_TTL: Duration = Duration::from_secs(30 * 60);
/// TTL for frequently-changing score aggregates.
const SCORE_TTL: Duration = Duration::from_secs(15 * 60);
/// TTL for the slowly-changing sector taxonomy.
const TAXONOMY_TTL: Duration = Duration::from_secs(60 * 60);
/// TTL for the analytics summary.
const SUMMARY_TTL: Duration = Duration::from_secs(10 * 60);

/// How many entries each top-performer ranking holds.
const TOP_PERFORMER_LIMIT: usize = 10;

/// Ranked score metrics warmed on every pass.
const TOP_METRICS: [ScoreMetric; 4] = [
    ScoreMetric::Overall,
    ScoreMetric::Environmental,
    ScoreMetric::Social,
    ScoreMetric::Governance,
];

/// Handle to a running warming loop.
///
/// Dropping the handle does not stop the loop; call [`stop`](Self::stop),
/// which is safe to call any number of times.
pub struct WarmerHandle {
    token: CancellationToken,
}

impl WarmerHandle {
    /// Cancel the warming loop. Idempotent.
    pub fn stop(&self) {
        self.token.cancel();
    }

    /// Whether the loop has been told to stop.
    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Scheduled background population of hot cache keys.
pub struct CacheWarmer {
    store: Arc<dyn KeyValueStore>,
    db: Arc<dyn Database>,
}

impl CacheWarmer {
    /// Create a warmer over the shared store and backing database.
    pub fn new(store: Arc<dyn KeyValueStore>, db: Arc<dyn Database>) -> Self {
        Self { store, db }
    }

    /// Run one full warming cycle.
    ///
    /// Each pass is independent: a failure is logged and the remaining
    /// passes still run, so freshness degrades gracefully instead of
    /// failing loudly.
    #[instrument(skip(self))]
    pub async fn warm_cache(&self) {
        info!("starting cache warming");

        if let Err(e) = self.warm_companies().await {
            warn!("error warming companies: {}", e);
        }
        if let Err(e) = self.warm_esg_scores().await {
            warn!("error warming ESG scores: {}", e);
        }
        if let Err(e) = self.warm_sectors().await {
            warn!("error warming sectors: {}", e);
        }
        if let Err(e) = self.warm_analytics().await {
            warn!("error warming analytics: {}", e);
        }

        info!("cache warming completed");
    }

    /// Launch the periodic warming loop: one pass immediately, then one
    /// per `interval` tick until the handle is stopped.
    pub fn start(self: &Arc<Self>, interval: Duration) -> WarmerHandle {
        let token = CancellationToken::new();
        let child = token.clone();
        let warmer = Arc::clone(self);

        tokio::spawn(async move {
            let mut tick = tokio::time::interval(interval);
            info!("cache warming scheduled every {:?}", interval);

            loop {
                tokio::select! {
                    biased;
                    _ = child.cancelled() => {
                        info!("cache warming stopped");
                        break;
                    }
                    _ = tick.tick() => {
                        warmer.warm_cache().await;
                    }
                }
            }
        });

        WarmerHandle { token }
    }

    // =========================================================================
    // Warming Passes
    // =========================================================================

    async fn warm_companies(&self) -> Result<()> {
        let companies = self.db.companies().await?;

        self.put_json(keys::COMPANIES_ALL, &companies, ENTITY_TTL)
            .await?;

        // Group by sector; unclassified companies stay out of sector keys.
        let mut by_sector: HashMap<&str, Vec<&Company>> = HashMap::new();
        for company in &companies {
            if let Some(sector) = company.sector.as_deref().filter(|s| !s.is_empty()) {
                by_sector.entry(sector).or_default().push(company);
            }
        }
        for (sector, members) in &by_sector {
            self.put_json(&keys::companies_by_sector(sector), members, ENTITY_TTL)
                .await?;
        }

        for company in &companies {
            self.put_json(&keys::company_by_id(company.id), company, ENTITY_TTL)
                .await?;
            self.put_json(&keys::company_by_symbol(&company.symbol), company, ENTITY_TTL)
                .await?;
        }

        info!("warmed {} companies", companies.len());
        Ok(())
    }

    async fn warm_esg_scores(&self) -> Result<()> {
        let scores = self.db.latest_esg_scores().await?;

        self.put_json(keys::ESG_SCORES_ALL, &scores, SCORE_TTL).await?;

        for score in &scores {
            self.put_json(
                &keys::esg_latest_for_company(score.company_id),
                score,
                SCORE_TTL,
            )
            .await?;
        }

        for metric in TOP_METRICS {
            let top = top_performers(&scores, metric, TOP_PERFORMER_LIMIT);
            self.put_json(&keys::esg_top(metric), &top, SCORE_TTL).await?;
        }

        info!("warmed {} ESG scores", scores.len());
        Ok(())
    }

    async fn warm_sectors(&self) -> Result<()> {
        let sectors = self.db.sectors().await?;
        self.put_json(keys::SECTORS_ALL, &sectors, TAXONOMY_TTL).await?;

        info!("warmed {} sectors", sectors.len());
        Ok(())
    }

    async fn warm_analytics(&self) -> Result<()> {
        let summary = AnalyticsSummary {
            total_companies: self.db.company_count().await?,
            total_esg_scores: self.db.esg_score_count().await?,
            last_updated: Utc::now(),
        };
        self.put_json(keys::ANALYTICS_SUMMARY, &summary, SUMMARY_TTL)
            .await?;

        info!("warmed analytics summary");
        Ok(())
    }

    async fn put_json<T: serde::Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<()> {
        let payload = serde_json::to_string(value)?;
        self.store.set(key, &payload, ttl).await
    }
}

/// Top `limit` scores ranked descending by `metric`.
fn top_performers(scores: &[EsgScore], metric: ScoreMetric, limit: usize) -> Vec<EsgScore> {
    let mut ranked: Vec<EsgScore> = scores.to_vec();
    ranked.sort_by(|a, b| {
        b.metric(metric)
            .partial_cmp(&a.metric(metric))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked.truncate(limit);
    ranked
}

/// Fixed key naming owned by the warmer.
pub mod keys {
    use crate::model::ScoreMetric;

    pub const COMPANIES_ALL: &str = "cache:companies:all";
    pub const ESG_SCORES_ALL: &str = "cache:esg:scores:all";
    pub const SECTORS_ALL: &str = "cache:sectors:all";
    pub const ANALYTICS_SUMMARY: &str = "cache:analytics:summary";

    pub fn companies_by_sector(sector: &str) -> String {
        format!("cache:companies:sector:{}", sector)
    }

    pub fn company_by_id(id: i64) -> String {
        format!("cache:company:{}", id)
    }

    pub fn company_by_symbol(symbol: &str) -> String {
        format!("cache:company:symbol:{}", symbol)
    }

    pub fn esg_latest_for_company(company_id: i64) -> String {
        format!("cache:esg:company:{}:latest", company_id)
    }

    pub fn esg_top(metric: ScoreMetric) -> String {
        format!("cache:esg:top:{}", metric)
    }
}

// =============================================================================
// Tests
// =============================================================================
