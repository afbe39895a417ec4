//! CSV export: one file per report sub-table
//!
//! File contents are assembled in memory and written out in one shot, so a
//! failing row never leaves a truncated file behind.

use crate::analytics::{
    LatencyTrend, QueueReport, Report, ReviewerStats, StageStats, ThroughputSummary,
    ThroughputTrend,
};
use crate::error::{AppError, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Write every sub-report under the resolved base path. Queue files are
/// only produced when the report carries a queue section.
pub async fn write_csv_reports(report: &Report, output: &str) -> Result<()> {
    let base = resolve_base(output).await?;

    write_file(&suffixed(&base, "-stage-summary.csv"), stage_csv(&report.stages)?).await?;
    write_file(
        &suffixed(&base, "-reviewer-summary.csv"),
        reviewer_csv(&report.reviewers)?,
    )
    .await?;
    write_file(
        &suffixed(&base, "-throughput-summary.csv"),
        throughput_csv(&report.throughput)?,
    )
    .await?;
    write_file(
        &suffixed(&base, "-throughput-trend.csv"),
        throughput_trend_csv(&report.throughput_trend.trends)?,
    )
    .await?;
    write_file(
        &suffixed(&base, "-latency-trend.csv"),
        latency_trend_csv(&report.latency_trend.trends)?,
    )
    .await?;

    if let Some(queue) = &report.queue {
        write_file(&suffixed(&base, "-queue-forecast.csv"), queue_csv(queue)?).await?;
        if !queue.reviewers.is_empty() {
            write_file(
                &suffixed(&base, "-queue-reviewer-forecast.csv"),
                queue_reviewer_csv(queue)?,
            )
            .await?;
        }
    }
    Ok(())
}

/// Resolve the base path: an existing directory maps to
/// `<dir>/review-queue`, anything else is a prefix with a trailing `.csv`
/// trimmed.
async fn resolve_base(output: &str) -> Result<PathBuf> {
    let trimmed = output.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("csv output path is empty".to_string()));
    }
    match fs::metadata(trimmed).await {
        Ok(meta) if meta.is_dir() => Ok(Path::new(trimmed).join("review-queue")),
        Ok(_) => Ok(prefix_of(trimmed)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(prefix_of(trimmed)),
        Err(err) => Err(err.into()),
    }
}

fn prefix_of(output: &str) -> PathBuf {
    PathBuf::from(output.strip_suffix(".csv").unwrap_or(output))
}

fn suffixed(base: &Path, suffix: &str) -> PathBuf {
    PathBuf::from(format!("{}{suffix}", base.display()))
}

async fn write_file(path: &Path, contents: Vec<u8>) -> Result<()> {
    fs::write(path, contents)
        .await
        .map_err(|err| AppError::Export(format!("failed to write {}: {err}", path.display())))
}

fn days(value: f64) -> String {
    format!("{value:.2}")
}

fn pct(value: f64) -> String {
    format!("{value:.1}")
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>> {
    writer
        .into_inner()
        .map_err(|err| AppError::Export(err.to_string()))
}

fn stage_csv(stages: &[StageStats]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record([
            "stage",
            "count",
            "avg_days",
            "median_days",
            "p90_days",
            "max_days",
            "sla_breach_count",
            "sla_breach_rate",
            "distinct_reviewers",
            "on_time",
            "at_risk",
            "overdue",
            "risk_tier",
        ])?;
    for stage in stages {
        writer
            .write_record([
                stage.stage.clone(),
                stage.stats.count.to_string(),
                days(stage.stats.average_days),
                days(stage.stats.median_days),
                days(stage.stats.p90_days),
                days(stage.stats.max_days),
                stage.stats.sla_breach_count.to_string(),
                pct(stage.stats.sla_breach_rate),
                stage.stats.distinct_reviewers.to_string(),
                stage.stats.aging_buckets.on_time.to_string(),
                stage.stats.aging_buckets.at_risk.to_string(),
                stage.stats.aging_buckets.overdue.to_string(),
                stage.stats.risk_tier.to_string(),
            ])?;
    }
    finish(writer)
}

fn reviewer_csv(reviewers: &[ReviewerStats]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record([
            "reviewer_id",
            "count",
            "avg_days",
            "median_days",
            "p90_days",
            "max_days",
            "sla_breach_count",
            "sla_breach_rate",
            "last_reviewed_at",
            "throughput_per_week",
            "window_count",
            "on_time",
            "at_risk",
            "overdue",
            "risk_tier",
        ])?;
    for reviewer in reviewers {
        writer
            .write_record([
                reviewer.reviewer_id.clone(),
                reviewer.stats.count.to_string(),
                days(reviewer.stats.average_days),
                days(reviewer.stats.median_days),
                days(reviewer.stats.p90_days),
                days(reviewer.stats.max_days),
                reviewer.stats.sla_breach_count.to_string(),
                pct(reviewer.stats.sla_breach_rate),
                reviewer.last_reviewed_at.to_rfc3339(),
                days(reviewer.throughput_per_week),
                reviewer.window_count.to_string(),
                reviewer.stats.aging_buckets.on_time.to_string(),
                reviewer.stats.aging_buckets.at_risk.to_string(),
                reviewer.stats.aging_buckets.overdue.to_string(),
                reviewer.stats.risk_tier.to_string(),
            ])?;
    }
    finish(writer)
}

fn throughput_csv(throughput: &ThroughputSummary) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(["as_of", "window_days", "events_in_window", "throughput_per_week"])?;
    writer
        .write_record([
            throughput.as_of.to_rfc3339(),
            throughput.window_days.to_string(),
            throughput.events_in_window.to_string(),
            days(throughput.throughput_per_week),
        ])?;
    finish(writer)
}

fn throughput_trend_csv(trends: &[ThroughputTrend]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record([
            "label",
            "current_count",
            "prior_count",
            "delta",
            "delta_percent",
            "current_per_week",
            "prior_per_week",
            "trend",
        ])?;
    for trend in trends {
        writer
            .write_record([
                trend.label.clone(),
                trend.current_count.to_string(),
                trend.prior_count.to_string(),
                trend.delta.to_string(),
                pct(trend.delta_percent),
                days(trend.current_per_week),
                days(trend.prior_per_week),
                trend.trend.to_string(),
            ])?;
    }
    finish(writer)
}

fn latency_trend_csv(trends: &[LatencyTrend]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record([
            "label",
            "current_count",
            "prior_count",
            "current_avg_days",
            "prior_avg_days",
            "avg_delta_days",
            "avg_delta_percent",
            "current_median_days",
            "prior_median_days",
            "median_delta_days",
            "median_delta_percent",
            "trend",
        ])?;
    for trend in trends {
        writer
            .write_record([
                trend.label.clone(),
                trend.current_count.to_string(),
                trend.prior_count.to_string(),
                days(trend.current_avg_days),
                days(trend.prior_avg_days),
                days(trend.avg_delta_days),
                pct(trend.avg_delta_percent),
                days(trend.current_median_days),
                days(trend.prior_median_days),
                days(trend.median_delta_days),
                pct(trend.median_delta_pct),
                trend.trend.to_string(),
            ])?;
    }
    finish(writer)
}

fn queue_csv(queue: &QueueReport) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record([
            "stage",
            "pending_count",
            "avg_age_days",
            "overdue_count",
            "due_soon_count",
            "on_track_count",
            "daily_throughput",
            "estimated_clear_days",
            "clearance_status",
            "assigned_count",
            "unassigned_count",
        ])?;
    // Roll-up row first; it has no throughput columns of its own.
    writer
        .write_record([
            "overall".to_string(),
            queue.total_pending.to_string(),
            days(queue.avg_age_days),
            queue.overdue_count.to_string(),
            queue.due_soon_count.to_string(),
            queue.on_track_count.to_string(),
            String::new(),
            String::new(),
            String::new(),
            queue.assigned_count.to_string(),
            queue.unassigned_count.to_string(),
        ])?;
    for stage in &queue.stages {
        writer
            .write_record([
                stage.stage.clone(),
                stage.pending_count.to_string(),
                days(stage.avg_age_days),
                stage.overdue_count.to_string(),
                stage.due_soon_count.to_string(),
                stage.on_track_count.to_string(),
                days(stage.daily_throughput),
                days(stage.estimated_clear_days),
                stage.clearance_status.to_string(),
                String::new(),
                String::new(),
            ])?;
    }
    finish(writer)
}

fn queue_reviewer_csv(queue: &QueueReport) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record([
            "reviewer_id",
            "pending_count",
            "avg_age_days",
            "overdue_count",
            "due_soon_count",
            "on_track_count",
            "throughput_per_week",
            "estimated_clear_days",
            "clearance_status",
        ])?;
    for reviewer in &queue.reviewers {
        writer
            .write_record([
                reviewer.reviewer_id.clone(),
                reviewer.pending_count.to_string(),
                days(reviewer.avg_age_days),
                reviewer.overdue_count.to_string(),
                reviewer.due_soon_count.to_string(),
                reviewer.on_track_count.to_string(),
                days(reviewer.throughput_per_week),
                days(reviewer.estimated_clear_days),
                reviewer.clearance_status.to_string(),
            ])?;
    }
    finish(writer)
}
