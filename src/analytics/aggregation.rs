//! Stage and reviewer aggregation over completed review events

use crate::analytics::statistics::{round_to, DurationStats};
use crate::analytics::OVERALL_LABEL;
use crate::models::{normalize_reviewer, ReviewEvent};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Duration snapshot for one stage (or the "overall" pseudo-stage)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageStats {
    pub stage: String,
    #[serde(flatten)]
    pub stats: DurationStats,
}

/// Duration snapshot for one reviewer, with trailing-window throughput
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewerStats {
    pub reviewer_id: String,
    #[serde(flatten)]
    pub stats: DurationStats,
    pub last_reviewed_at: DateTime<Utc>,
    pub throughput_per_week: f64,
    /// Reviews completed inside the trailing window
    pub window_count: usize,
}

/// Completion volume over the trailing window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThroughputSummary {
    pub as_of: DateTime<Utc>,
    pub window_days: i64,
    pub events_in_window: usize,
    pub throughput_per_week: f64,
}

/// Build per-stage stats, sorted by average duration, slowest first.
pub fn stage_stats(events: &[ReviewEvent], sla_days: i64) -> Vec<StageStats> {
    let mut buckets: HashMap<&str, Vec<&ReviewEvent>> = HashMap::new();
    for event in events {
        buckets.entry(event.stage.as_str()).or_default().push(event);
    }

    let mut stages: Vec<StageStats> = buckets
        .into_iter()
        .map(|(stage, bucket)| StageStats {
            stage: stage.to_string(),
            stats: DurationStats::from_events(bucket.into_iter(), sla_days),
        })
        .collect();

    stages.sort_by(|a, b| b.stats.average_days.total_cmp(&a.stats.average_days));
    stages
}

/// Stats over the full unpartitioned event set, under the reserved label.
pub fn overall_stats(events: &[ReviewEvent], sla_days: i64) -> StageStats {
    StageStats {
        stage: OVERALL_LABEL.to_string(),
        stats: DurationStats::from_events(events.iter(), sla_days),
    }
}

/// Build per-reviewer stats. Blank reviewer ids group under "unassigned".
///
/// Ordered by throughput per week, then average duration, then count, all
/// descending. The window test is inclusive at both edges.
pub fn reviewer_stats(
    events: &[ReviewEvent],
    sla_days: i64,
    window_start: DateTime<Utc>,
    as_of: DateTime<Utc>,
    window_days: i64,
) -> Vec<ReviewerStats> {
    let mut buckets: HashMap<&str, Vec<&ReviewEvent>> = HashMap::new();
    for event in events {
        buckets
            .entry(normalize_reviewer(&event.reviewer_id))
            .or_default()
            .push(event);
    }

    let weeks = window_days as f64 / 7.0;
    let mut reviewers: Vec<ReviewerStats> = buckets
        .into_iter()
        .map(|(reviewer_id, bucket)| {
            let last_reviewed_at = bucket
                .iter()
                .map(|event| event.reviewed_at)
                .max()
                .unwrap_or(as_of);
            let window_count = bucket
                .iter()
                .filter(|event| event.reviewed_at >= window_start && event.reviewed_at <= as_of)
                .count();
            ReviewerStats {
                reviewer_id: reviewer_id.to_string(),
                stats: DurationStats::from_events(bucket.into_iter(), sla_days),
                last_reviewed_at,
                throughput_per_week: round_to(window_count as f64 / weeks, 2),
                window_count,
            }
        })
        .collect();

    reviewers.sort_by(|a, b| {
        b.throughput_per_week
            .total_cmp(&a.throughput_per_week)
            .then(b.stats.average_days.total_cmp(&a.stats.average_days))
            .then(b.stats.count.cmp(&a.stats.count))
    });
    reviewers
}

/// Count completions in the trailing window and derive a weekly rate.
pub fn throughput_summary(
    events: &[ReviewEvent],
    window_days: i64,
    window_start: DateTime<Utc>,
    as_of: DateTime<Utc>,
) -> ThroughputSummary {
    let events_in_window = events
        .iter()
        .filter(|event| event.reviewed_at >= window_start && event.reviewed_at <= as_of)
        .count();

    ThroughputSummary {
        as_of,
        window_days,
        events_in_window,
        throughput_per_week: round_to(events_in_window as f64 / (window_days as f64 / 7.0), 2),
    }
}
