//! Relational Store Port
//!
//! The warmer and alert manager query the backing database only through
//! this trait; the schema and SQL live with the (external) repository
//! layer that implements it. The surface is deliberately narrow: the row
//! sets the warming passes serialize, the scalar counts the analytics
//! summary needs, and the health probes the alert manager samples.

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{Company, EsgScore};

/// Backing relational database contract.
#[async_trait]
pub trait Database: Send + Sync {
    /// Liveness probe; the caller measures latency around this call.
    async fn ping(&self) -> Result<()>;

    /// All companies, for the entity warming pass.
    async fn companies(&self) -> Result<Vec<Company>>;

    /// Latest ESG score per company, for the score warming pass.
    async fn latest_esg_scores(&self) -> Result<Vec<EsgScore>>;

    /// Distinct non-empty sector names.
    async fn sectors(&self) -> Result<Vec<String>>;

    /// Total company count.
    async fn company_count(&self) -> Result<i64>;

    /// Total ESG score row count.
    async fn esg_score_count(&self) -> Result<i64>;

    /// Currently active connections.
    async fn active_connections(&self) -> Result<i64>;

    /// Queries running for longer than the slow-query cutoff.
    async fn slow_query_count(&self) -> Result<i64>;

    /// Locks currently held.
    async fn lock_count(&self) -> Result<i64>;
}
