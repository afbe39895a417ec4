//! Backlog aging and clearance forecasting for pending queue items

use crate::analytics::statistics::round_to;
use crate::models::{QueueItem, ReviewEvent, UNASSIGNED};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum::Display;

/// Fallback when the caller's due-soon ratio falls outside (0, 1).
pub const DEFAULT_DUE_SOON_RATIO: f64 = 0.8;

/// How long a backlog partition will take to drain at observed throughput
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum ClearanceStatus {
    /// Clears within a week
    #[serde(rename = "healthy")]
    #[strum(serialize = "healthy")]
    Healthy,
    /// Clears within two weeks
    #[serde(rename = "watch")]
    #[strum(serialize = "watch")]
    Watch,
    /// More than two weeks of backlog
    #[serde(rename = "at risk")]
    #[strum(serialize = "at risk")]
    AtRisk,
    /// Nothing completed in the window; no basis for an estimate
    #[serde(rename = "no throughput data")]
    #[strum(serialize = "no throughput data")]
    NoThroughputData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueStageForecast {
    pub stage: String,
    pub pending_count: usize,
    pub avg_age_days: f64,
    pub overdue_count: usize,
    pub due_soon_count: usize,
    pub on_track_count: usize,
    pub daily_throughput: f64,
    pub estimated_clear_days: f64,
    pub clearance_status: ClearanceStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueReviewerForecast {
    pub reviewer_id: String,
    pub pending_count: usize,
    pub avg_age_days: f64,
    pub overdue_count: usize,
    pub due_soon_count: usize,
    pub on_track_count: usize,
    pub throughput_per_week: f64,
    pub estimated_clear_days: f64,
    pub clearance_status: ClearanceStatus,
}

/// Backlog roll-up plus per-stage and per-reviewer clearance forecasts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueReport {
    pub as_of: DateTime<Utc>,
    pub total_pending: usize,
    pub assigned_count: usize,
    pub unassigned_count: usize,
    pub overdue_count: usize,
    pub due_soon_count: usize,
    pub on_track_count: usize,
    pub avg_age_days: f64,
    pub stages: Vec<QueueStageForecast>,
    pub reviewers: Vec<QueueReviewerForecast>,
    pub throughput_days: i64,
    pub due_soon_ratio: f64,
}

/// Aging counters accumulated per partition
#[derive(Debug, Default)]
struct AgeTally {
    pending: usize,
    age_sum: f64,
    overdue: usize,
    due_soon: usize,
    on_track: usize,
}

impl AgeTally {
    /// Overdue takes precedence over due-soon at the shared boundary.
    fn add(&mut self, age: f64, sla: f64, due_soon_threshold: f64) {
        self.pending += 1;
        self.age_sum += age;
        if age >= sla {
            self.overdue += 1;
        } else if age >= due_soon_threshold {
            self.due_soon += 1;
        } else {
            self.on_track += 1;
        }
    }

    fn avg_age(&self) -> f64 {
        if self.pending == 0 {
            return 0.0;
        }
        self.age_sum / self.pending as f64
    }
}

fn clearance(pending: usize, daily_throughput: f64) -> (f64, ClearanceStatus) {
    if daily_throughput > 0.0 {
        let estimate = pending as f64 / daily_throughput;
        let status = if estimate <= 7.0 {
            ClearanceStatus::Healthy
        } else if estimate <= 14.0 {
            ClearanceStatus::Watch
        } else {
            ClearanceStatus::AtRisk
        };
        (estimate, status)
    } else {
        (0.0, ClearanceStatus::NoThroughputData)
    }
}

/// Forecast backlog clearance against trailing completion throughput.
///
/// Returns `None` when there is nothing pending. An out-of-range due-soon
/// ratio silently falls back to [`DEFAULT_DUE_SOON_RATIO`].
pub fn build_queue_report(
    queue_items: &[QueueItem],
    events: &[ReviewEvent],
    sla_days: i64,
    throughput_days: i64,
    as_of: DateTime<Utc>,
    due_soon_ratio: f64,
) -> Option<QueueReport> {
    if queue_items.is_empty() {
        return None;
    }

    let ratio = if due_soon_ratio <= 0.0 || due_soon_ratio >= 1.0 {
        DEFAULT_DUE_SOON_RATIO
    } else {
        due_soon_ratio
    };
    let sla = sla_days as f64;
    let due_soon_threshold = sla * ratio;
    let window_start = as_of - Duration::days(throughput_days);

    // Completions in the trailing window, tallied once per stage and per
    // reviewer, both window edges inclusive.
    let mut stage_window: HashMap<&str, usize> = HashMap::new();
    let mut reviewer_window: HashMap<&str, usize> = HashMap::new();
    for event in events {
        if event.reviewed_at >= window_start && event.reviewed_at <= as_of {
            *stage_window.entry(event.stage.as_str()).or_insert(0) += 1;
            *reviewer_window
                .entry(crate::models::normalize_reviewer(&event.reviewer_id))
                .or_insert(0) += 1;
        }
    }

    let mut totals = AgeTally::default();
    let mut assigned_count = 0;
    let mut unassigned_count = 0;
    let mut stage_tallies: HashMap<&str, AgeTally> = HashMap::new();
    let mut reviewer_tallies: HashMap<&str, AgeTally> = HashMap::new();

    for item in queue_items {
        let age = item.age_days(as_of);
        totals.add(age, sla, due_soon_threshold);
        stage_tallies
            .entry(item.stage.as_str())
            .or_default()
            .add(age, sla, due_soon_threshold);

        let reviewer = item.reviewer_id.trim();
        let key = if reviewer.is_empty() {
            unassigned_count += 1;
            UNASSIGNED
        } else {
            assigned_count += 1;
            reviewer
        };
        reviewer_tallies
            .entry(key)
            .or_default()
            .add(age, sla, due_soon_threshold);
    }

    let mut stages: Vec<QueueStageForecast> = stage_tallies
        .into_iter()
        .map(|(stage, tally)| {
            let window_count = stage_window.get(stage).copied().unwrap_or(0);
            let daily_throughput = window_count as f64 / throughput_days as f64;
            let (estimate, status) = clearance(tally.pending, daily_throughput);
            QueueStageForecast {
                stage: stage.to_string(),
                pending_count: tally.pending,
                avg_age_days: round_to(tally.avg_age(), 2),
                overdue_count: tally.overdue,
                due_soon_count: tally.due_soon,
                on_track_count: tally.on_track,
                daily_throughput: round_to(daily_throughput, 2),
                estimated_clear_days: round_to(estimate, 2),
                clearance_status: status,
            }
        })
        .collect();
    stages.sort_by(|a, b| {
        b.pending_count
            .cmp(&a.pending_count)
            .then(b.avg_age_days.total_cmp(&a.avg_age_days))
    });

    let weeks = throughput_days as f64 / 7.0;
    let mut reviewers: Vec<QueueReviewerForecast> = reviewer_tallies
        .into_iter()
        .map(|(reviewer_id, tally)| {
            let window_count = reviewer_window.get(reviewer_id).copied().unwrap_or(0);
            let throughput_per_week = window_count as f64 / weeks;
            let (estimate, status) = clearance(tally.pending, throughput_per_week / 7.0);
            QueueReviewerForecast {
                reviewer_id: reviewer_id.to_string(),
                pending_count: tally.pending,
                avg_age_days: round_to(tally.avg_age(), 2),
                overdue_count: tally.overdue,
                due_soon_count: tally.due_soon,
                on_track_count: tally.on_track,
                throughput_per_week: round_to(throughput_per_week, 2),
                estimated_clear_days: round_to(estimate, 2),
                clearance_status: status,
            }
        })
        .collect();
    reviewers.sort_by(|a, b| {
        b.pending_count
            .cmp(&a.pending_count)
            .then(b.avg_age_days.total_cmp(&a.avg_age_days))
    });

    Some(QueueReport {
        as_of,
        total_pending: totals.pending,
        assigned_count,
        unassigned_count,
        overdue_count: totals.overdue,
        due_soon_count: totals.due_soon,
        on_track_count: totals.on_track,
        avg_age_days: round_to(totals.avg_age(), 2),
        stages,
        reviewers,
        throughput_days,
        due_soon_ratio: ratio,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn as_of() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
    }

    fn pending(stage: &str, reviewer: &str, age_days: i64) -> QueueItem {
        QueueItem {
            application_id: format!("app-{stage}-{age_days}"),
            stage: stage.to_string(),
            submitted_at: as_of() - Duration::days(age_days),
            reviewer_id: reviewer.to_string(),
        }
    }

    fn completed(stage: &str, reviewer: &str, reviewed_days_ago: i64) -> ReviewEvent {
        let reviewed_at = as_of() - Duration::days(reviewed_days_ago);
        ReviewEvent {
            application_id: "app".to_string(),
            stage: stage.to_string(),
            submitted_at: reviewed_at - Duration::days(3),
            reviewed_at,
            reviewer_id: reviewer.to_string(),
        }
    }

    #[test]
    fn empty_queue_produces_no_report() {
        assert!(build_queue_report(&[], &[], 10, 28, as_of(), 0.8).is_none());
    }

    #[test]
    fn overdue_takes_precedence_over_due_soon() {
        // age 12 >= sla 10, even though it also clears the due-soon
        // threshold of 8.
        let items = vec![pending("intake", "alice", 12)];
        let report = build_queue_report(&items, &[], 10, 28, as_of(), 0.8).unwrap();
        assert_eq!(report.overdue_count, 1);
        assert_eq!(report.due_soon_count, 0);
    }

    #[test]
    fn aging_classification_bands() {
        let items = vec![
            pending("intake", "alice", 2),  // on track
            pending("intake", "alice", 9),  // due soon (>= 8)
            pending("intake", "alice", 11), // overdue
        ];
        let report = build_queue_report(&items, &[], 10, 28, as_of(), 0.8).unwrap();
        assert_eq!(report.on_track_count, 1);
        assert_eq!(report.due_soon_count, 1);
        assert_eq!(report.overdue_count, 1);
    }

    #[test]
    fn out_of_range_ratio_falls_back_to_default() {
        let items = vec![pending("intake", "alice", 2)];
        let report = build_queue_report(&items, &[], 10, 28, as_of(), 1.5).unwrap();
        assert_eq!(report.due_soon_ratio, DEFAULT_DUE_SOON_RATIO);
        let report = build_queue_report(&items, &[], 10, 28, as_of(), 0.0).unwrap();
        assert_eq!(report.due_soon_ratio, DEFAULT_DUE_SOON_RATIO);
    }

    #[test]
    fn clearance_estimate_and_status() {
        // 14 completions over 7 days -> 2/day; 10 pending -> 5 days.
        let mut events = Vec::new();
        for i in 0..14 {
            events.push(completed("intake", "alice", i % 7));
        }
        let items: Vec<QueueItem> = (0..10).map(|i| pending("intake", "alice", i % 5)).collect();
        let report = build_queue_report(&items, &events, 10, 7, as_of(), 0.8).unwrap();

        let stage = &report.stages[0];
        assert_eq!(stage.daily_throughput, 2.0);
        assert_eq!(stage.estimated_clear_days, 5.0);
        assert_eq!(stage.clearance_status, ClearanceStatus::Healthy);
    }

    #[test]
    fn no_throughput_data_iff_zero_daily_rate() {
        let items = vec![pending("intake", "alice", 2)];
        let report = build_queue_report(&items, &[], 10, 28, as_of(), 0.8).unwrap();
        assert_eq!(
            report.stages[0].clearance_status,
            ClearanceStatus::NoThroughputData
        );
        assert_eq!(report.stages[0].estimated_clear_days, 0.0);

        // One completion in another stage leaves this stage at zero.
        let events = vec![completed("other", "bob", 1)];
        let report = build_queue_report(&items, &events, 10, 28, as_of(), 0.8).unwrap();
        assert_eq!(
            report.stages[0].clearance_status,
            ClearanceStatus::NoThroughputData
        );
    }

    #[test]
    fn watch_and_at_risk_bands() {
        // 7 completions over 7 days -> 1/day.
        let events: Vec<ReviewEvent> = (0..7).map(|i| completed("intake", "a", i)).collect();

        let items: Vec<QueueItem> = (0..10).map(|i| pending("intake", "a", i % 3)).collect();
        let report = build_queue_report(&items, &events, 10, 7, as_of(), 0.8).unwrap();
        assert_eq!(report.stages[0].clearance_status, ClearanceStatus::Watch);

        let items: Vec<QueueItem> = (0..20).map(|i| pending("intake", "a", i % 3)).collect();
        let report = build_queue_report(&items, &events, 10, 7, as_of(), 0.8).unwrap();
        assert_eq!(report.stages[0].clearance_status, ClearanceStatus::AtRisk);
    }

    #[test]
    fn unassigned_items_are_counted_and_grouped() {
        let items = vec![
            pending("intake", "", 2),
            pending("intake", "  ", 3),
            pending("intake", "alice", 4),
        ];
        let report = build_queue_report(&items, &[], 10, 28, as_of(), 0.8).unwrap();
        assert_eq!(report.unassigned_count, 2);
        assert_eq!(report.assigned_count, 1);

        let unassigned = report
            .reviewers
            .iter()
            .find(|r| r.reviewer_id == UNASSIGNED)
            .unwrap();
        assert_eq!(unassigned.pending_count, 2);
    }

    #[test]
    fn stages_sort_by_pending_then_age() {
        let items = vec![
            pending("busy", "a", 1),
            pending("busy", "a", 2),
            pending("old", "a", 9),
            pending("young", "a", 1),
        ];
        let report = build_queue_report(&items, &[], 10, 28, as_of(), 0.8).unwrap();
        let order: Vec<&str> = report.stages.iter().map(|s| s.stage.as_str()).collect();
        assert_eq!(order, vec!["busy", "old", "young"]);
    }

    #[test]
    fn reviewer_weekly_rate_feeds_daily_estimate() {
        // 7 completions in a 7-day window -> 7/week -> 1/day.
        let events: Vec<ReviewEvent> = (0..7).map(|i| completed("intake", "alice", i)).collect();
        let items: Vec<QueueItem> = (0..5).map(|i| pending("intake", "alice", i)).collect();
        let report = build_queue_report(&items, &events, 10, 7, as_of(), 0.8).unwrap();

        let alice = &report.reviewers[0];
        assert_eq!(alice.throughput_per_week, 7.0);
        assert_eq!(alice.estimated_clear_days, 5.0);
        assert_eq!(alice.clearance_status, ClearanceStatus::Healthy);
    }
}
