//! Domain DTOs carried by the warmer and by cache call sites.
//!
//! The relational schema itself lives outside this crate; these are the
//! serialized shapes that cross the cache boundary.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A listed company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    /// Database identifier
    pub id: i64,
    /// Legal name
    pub name: String,
    /// Ticker symbol
    pub symbol: String,
    /// Sector, if classified
    pub sector: Option<String>,
    /// Industry, if classified
    pub industry: Option<String>,
    /// Country of incorporation
    pub country: Option<String>,
    /// Market capitalization in USD
    pub market_cap: Option<f64>,
    /// Row creation time
    pub created_at: DateTime<Utc>,
    /// Row update time
    pub updated_at: DateTime<Utc>,
}

/// An ESG score record for a company at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EsgScore {
    /// Database identifier
    pub id: i64,
    /// Company this score belongs to
    pub company_id: i64,
    /// Environmental component
    pub environmental_score: f64,
    /// Social component
    pub social_score: f64,
    /// Governance component
    pub governance_score: f64,
    /// Weighted overall score
    pub overall_score: f64,
    /// Date the score applies to
    pub score_date: NaiveDate,
    /// Provider that produced the score
    pub data_source: String,
}

impl EsgScore {
    /// Component value for a given performance metric.
    pub fn metric(&self, metric: ScoreMetric) -> f64 {
        match metric {
            ScoreMetric::Overall => self.overall_score,
            ScoreMetric::Environmental => self.environmental_score,
            ScoreMetric::Social => self.social_score,
            ScoreMetric::Governance => self.governance_score,
        }
    }
}

/// ESG score component used for top-performer rankings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreMetric {
    Overall,
    Environmental,
    Social,
    Governance,
}

impl ScoreMetric {
    /// Short name used in cache key construction.
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreMetric::Overall => "overall",
            ScoreMetric::Environmental => "environmental",
            ScoreMetric::Social => "social",
            ScoreMetric::Governance => "governance",
        }
    }
}

impl std::fmt::Display for ScoreMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Aggregate counts cached by the analytics warming pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    /// Total companies in the backing store
    pub total_companies: i64,
    /// Total ESG score rows in the backing store
    pub total_esg_scores: i64,
    /// When this summary was computed
    pub last_updated: DateTime<Utc>,
}

// =============================================================================
// Tests
// =============================================================================
