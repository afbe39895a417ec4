//! Postgres-backed run history

use crate::analytics::{build_report, Report, ReportParams};
use crate::history::{HistoryError, HistoryResult, RunContext, RunStore, RunSummary};
use crate::models::{QueueItem, ReviewEvent};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};

const DEFAULT_SCHEMA: &str = "review_queue_forecaster";
const DEFAULT_LIST_LIMIT: i64 = 5;

/// Run history persisted in a Postgres schema
pub struct PgRunStore {
    pool: PgPool,
    schema: String,
}

impl PgRunStore {
    /// Connect and make sure the schema and runs table exist.
    pub async fn connect(url: &str, schema: &str) -> HistoryResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(4)
            .acquire_timeout(std::time::Duration::from_secs(5))
            .connect(url)
            .await?;

        let schema = if schema.trim().is_empty() {
            DEFAULT_SCHEMA.to_string()
        } else {
            schema.trim().to_string()
        };

        let store = Self { pool, schema };
        store.ensure_schema().await?;
        tracing::debug!(schema = %store.schema, "run-history schema ready");
        Ok(store)
    }

    fn schema_ident(&self) -> String {
        quote_ident(&self.schema)
    }

    async fn ensure_schema(&self) -> HistoryResult<()> {
        let schema = self.schema_ident();
        sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {schema}"))
            .execute(&self.pool)
            .await?;
        sqlx::query(&format!(
            r#"
CREATE TABLE IF NOT EXISTS {schema}.review_runs (
    id BIGSERIAL PRIMARY KEY,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    generated_at TIMESTAMPTZ NOT NULL,
    input_path TEXT,
    queue_path TEXT,
    sla_days INT NOT NULL,
    throughput_days INT NOT NULL,
    total_events INT NOT NULL,
    report JSONB NOT NULL,
    queue_summary JSONB
)
"#
        ))
        .execute(&self.pool)
        .await?;
        sqlx::query(&format!(
            "CREATE INDEX IF NOT EXISTS review_runs_created_at_idx \
             ON {schema}.review_runs (created_at DESC)"
        ))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Insert one representative run when the table is empty, so a fresh
    /// database has something to list. Returns whether a seed was written.
    pub async fn seed_if_empty(&self) -> HistoryResult<bool> {
        let count: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM {}.review_runs",
            self.schema_ident()
        ))
        .fetch_one(&self.pool)
        .await?;
        if count > 0 {
            return Ok(false);
        }

        let report = seed_report().map_err(|err| HistoryError::Seed(err.to_string()))?;
        let ctx = RunContext {
            input_path: "seed:sample-events.csv".to_string(),
            queue_path: Some("seed:sample-queue.csv".to_string()),
            sla_days: report.sla_days,
            throughput_days: report.throughput.window_days,
        };
        self.save(&report, &ctx).await?;
        Ok(true)
    }
}

#[async_trait]
impl RunStore for PgRunStore {
    async fn save(&self, report: &Report, ctx: &RunContext) -> HistoryResult<i64> {
        let report_json = serde_json::to_value(report)?;
        let queue_json = report.queue.as_ref().map(|queue| {
            serde_json::json!({
                "total_pending": queue.total_pending,
                "assigned_count": queue.assigned_count,
                "unassigned_count": queue.unassigned_count,
                "overdue_count": queue.overdue_count,
            })
        });

        let id: i64 = sqlx::query_scalar(&format!(
            r#"
INSERT INTO {}.review_runs
    (generated_at, input_path, queue_path, sla_days, throughput_days,
     total_events, report, queue_summary)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
RETURNING id
"#,
            self.schema_ident()
        ))
        .bind(report.generated_at)
        .bind(&ctx.input_path)
        .bind(&ctx.queue_path)
        .bind(ctx.sla_days as i32)
        .bind(ctx.throughput_days as i32)
        .bind(report.total_events as i32)
        .bind(report_json)
        .bind(queue_json)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn recent(&self, limit: i64) -> HistoryResult<Vec<RunSummary>> {
        let limit = effective_limit(limit);
        let rows = sqlx::query(&format!(
            r#"
SELECT id, created_at, generated_at, total_events, sla_days, throughput_days,
    (queue_summary->>'total_pending')::INT AS queue_pending,
    (queue_summary->>'assigned_count')::INT AS queue_assigned,
    (queue_summary->>'overdue_count')::INT AS queue_overdue
FROM {}.review_runs
ORDER BY created_at DESC
LIMIT $1
"#,
            self.schema_ident()
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(RunSummary {
                    id: row.try_get("id")?,
                    created_at: row.try_get("created_at")?,
                    generated_at: row.try_get("generated_at")?,
                    total_events: row.try_get("total_events")?,
                    sla_days: row.try_get("sla_days")?,
                    throughput_days: row.try_get("throughput_days")?,
                    queue_pending: row.try_get("queue_pending")?,
                    queue_assigned: row.try_get("queue_assigned")?,
                    queue_overdue: row.try_get("queue_overdue")?,
                })
            })
            .collect()
    }
}

fn effective_limit(limit: i64) -> i64 {
    if limit <= 0 {
        DEFAULT_LIST_LIMIT
    } else {
        limit
    }
}

/// Quote a Postgres identifier; embedded quotes double up.
fn quote_ident(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// A representative run produced by the real engine over synthetic events,
/// anchored a day in the past.
fn seed_report() -> crate::analytics::AnalyticsResult<Report> {
    let as_of = Utc::now() - Duration::days(1);
    let stages = ["screening", "underwriting", "final"];
    let reviewers = ["r-101", "r-202", "r-303", ""];

    let mut events = Vec::new();
    for i in 0..24i64 {
        let stage = stages[(i % 3) as usize];
        let reviewed_at = as_of - Duration::days(i % 40);
        events.push(ReviewEvent {
            application_id: format!("seed-app-{i:03}"),
            stage: stage.to_string(),
            submitted_at: reviewed_at - Duration::days(2 + (i % 11)),
            reviewed_at,
            reviewer_id: reviewers[(i % 4) as usize].to_string(),
        });
    }

    let queue: Vec<QueueItem> = (0..9i64)
        .map(|i| QueueItem {
            application_id: format!("seed-pending-{i:03}"),
            stage: stages[(i % 3) as usize].to_string(),
            submitted_at: as_of - Duration::days(i % 13),
            reviewer_id: reviewers[(i % 4) as usize].to_string(),
        })
        .collect();

    let params = ReportParams {
        as_of: Some(as_of),
        ..ReportParams::default()
    };
    build_report(&events, &queue, &params)
}
