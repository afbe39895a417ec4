//! Run-history persistence
//!
//! The engine knows nothing about storage; callers inject a [`RunStore`]
//! when a run should be kept. The shipped implementation is Postgres-backed
//! ([`PgRunStore`]), writing the full report as JSONB next to a small queue
//! summary for cheap listing.

mod postgres;

pub use postgres::PgRunStore;

use crate::analytics::Report;
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Result type for history operations
pub type HistoryResult<T> = std::result::Result<T, HistoryError>;

/// Errors raised by the run-history store
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    /// No connection string could be resolved
    #[error(
        "database DSN missing: set --db-url, RQF_DATABASE_URL, or DATABASE_URL"
    )]
    MissingDsn,

    /// Underlying database failure
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    /// Report could not be encoded for storage
    #[error("failed to encode report: {0}")]
    Encode(#[from] serde_json::Error),

    /// Building the seed run failed
    #[error("failed to build seed run: {0}")]
    Seed(String),
}

impl From<HistoryError> for AppError {
    fn from(err: HistoryError) -> Self {
        match err {
            HistoryError::MissingDsn => AppError::Configuration(err.to_string()),
            other => AppError::Database(other.to_string()),
        }
    }
}

/// Provenance recorded alongside a persisted run
#[derive(Debug, Clone)]
pub struct RunContext {
    pub input_path: String,
    pub queue_path: Option<String>,
    pub sla_days: i64,
    pub throughput_days: i64,
}

/// One row of the run-history listing
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub generated_at: DateTime<Utc>,
    pub total_events: i32,
    pub sla_days: i32,
    pub throughput_days: i32,
    pub queue_pending: Option<i32>,
    pub queue_assigned: Option<i32>,
    pub queue_overdue: Option<i32>,
}

/// Sink for finished reports
#[async_trait]
pub trait RunStore: Send + Sync {
    /// Persist a run and return its id.
    async fn save(&self, report: &Report, ctx: &RunContext) -> HistoryResult<i64>;

    /// List persisted runs, newest first. Non-positive limits fall back
    /// to 5.
    async fn recent(&self, limit: i64) -> HistoryResult<Vec<RunSummary>>;
}

/// Resolve the connection string: explicit flag first, then the configured
/// url, then the `RQF_DATABASE_URL` and `DATABASE_URL` environment
/// variables.
pub fn resolve_dsn(flag: Option<&str>, configured: Option<&str>) -> HistoryResult<String> {
    let candidates = [
        flag.map(str::to_string),
        configured.map(str::to_string),
        std::env::var("RQF_DATABASE_URL").ok(),
        std::env::var("DATABASE_URL").ok(),
    ];
    candidates
        .into_iter()
        .flatten()
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
        .ok_or(HistoryError::MissingDsn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dsn_prefers_the_flag() {
        let dsn = resolve_dsn(Some("postgres://flag"), Some("postgres://config")).unwrap();
        assert_eq!(dsn, "postgres://flag");
    }

    #[test]
    fn dsn_falls_back_to_config() {
        let dsn = resolve_dsn(None, Some(" postgres://config ")).unwrap();
        assert_eq!(dsn, "postgres://config");
    }

    #[test]
    fn blank_flag_is_skipped() {
        let dsn = resolve_dsn(Some("   "), Some("postgres://config")).unwrap();
        assert_eq!(dsn, "postgres://config");
    }
}
