//! Windowed trend comparison: the current period against the one before it

use crate::analytics::statistics::{mean, percentile, round_to};
use crate::analytics::OVERALL_LABEL;
use crate::models::ReviewEvent;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use strum::Display;

/// Three-valued direction of a trend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Flat,
}

/// Completion-volume comparison for one label
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThroughputTrend {
    pub label: String,
    pub current_count: usize,
    pub prior_count: usize,
    pub delta: i64,
    pub delta_percent: f64,
    pub current_per_week: f64,
    pub prior_per_week: f64,
    pub trend: TrendDirection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThroughputTrendSummary {
    pub current_window_start: DateTime<Utc>,
    pub current_window_end: DateTime<Utc>,
    pub prior_window_start: DateTime<Utc>,
    pub prior_window_end: DateTime<Utc>,
    pub window_days: i64,
    /// The "overall" entry first, then stages by current count descending
    pub trends: Vec<ThroughputTrend>,
}

/// Latency-distribution comparison for one label
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatencyTrend {
    pub label: String,
    pub current_count: usize,
    pub prior_count: usize,
    pub current_avg_days: f64,
    pub prior_avg_days: f64,
    pub avg_delta_days: f64,
    pub avg_delta_percent: f64,
    pub current_median_days: f64,
    pub prior_median_days: f64,
    pub median_delta_days: f64,
    pub median_delta_pct: f64,
    pub trend: TrendDirection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatencyTrendSummary {
    pub current_window_start: DateTime<Utc>,
    pub current_window_end: DateTime<Utc>,
    pub prior_window_start: DateTime<Utc>,
    pub prior_window_end: DateTime<Utc>,
    pub window_days: i64,
    /// The "overall" entry first, then stages by current average descending
    pub trends: Vec<LatencyTrend>,
}

/// Two adjacent equal-length windows ending at the as-of instant.
///
/// The prior window's right edge coincides with the current window's left
/// edge; membership tests check the current window first (right edge
/// inclusive) and the prior window with an exclusive right edge, so the
/// boundary instant always counts as current.
#[derive(Debug, Clone, Copy)]
struct TrendWindows {
    current_start: DateTime<Utc>,
    current_end: DateTime<Utc>,
    prior_start: DateTime<Utc>,
    prior_end: DateTime<Utc>,
}

impl TrendWindows {
    fn new(as_of: DateTime<Utc>, window_days: i64) -> Self {
        let current_start = as_of - Duration::days(window_days);
        Self {
            current_start,
            current_end: as_of,
            prior_start: current_start - Duration::days(window_days),
            prior_end: current_start,
        }
    }

    fn in_current(&self, value: DateTime<Utc>) -> bool {
        in_window(value, self.current_start, self.current_end, true)
    }

    fn in_prior(&self, value: DateTime<Utc>) -> bool {
        in_window(value, self.prior_start, self.prior_end, false)
    }
}

fn in_window(
    value: DateTime<Utc>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    include_end: bool,
) -> bool {
    if value < start {
        return false;
    }
    if include_end {
        value <= end
    } else {
        value < end
    }
}

/// Compare completion volume between the two windows, per stage and overall.
pub fn build_throughput_trends(
    events: &[ReviewEvent],
    as_of: DateTime<Utc>,
    window_days: i64,
) -> ThroughputTrendSummary {
    let windows = TrendWindows::new(as_of, window_days);

    let mut stage_current: HashMap<&str, usize> = HashMap::new();
    let mut stage_prior: HashMap<&str, usize> = HashMap::new();
    let mut current_total = 0;
    let mut prior_total = 0;

    for event in events {
        if windows.in_current(event.reviewed_at) {
            *stage_current.entry(event.stage.as_str()).or_insert(0) += 1;
            current_total += 1;
        } else if windows.in_prior(event.reviewed_at) {
            *stage_prior.entry(event.stage.as_str()).or_insert(0) += 1;
            prior_total += 1;
        }
    }

    let labels: HashSet<&str> = stage_current
        .keys()
        .chain(stage_prior.keys())
        .copied()
        .collect();

    let mut stage_trends: Vec<ThroughputTrend> = labels
        .into_iter()
        .map(|stage| {
            throughput_trend(
                stage,
                stage_current.get(stage).copied().unwrap_or(0),
                stage_prior.get(stage).copied().unwrap_or(0),
                window_days,
            )
        })
        .collect();

    stage_trends.sort_by(|a, b| {
        b.current_count
            .cmp(&a.current_count)
            .then(b.delta.cmp(&a.delta))
    });

    let mut trends = vec![throughput_trend(
        OVERALL_LABEL,
        current_total,
        prior_total,
        window_days,
    )];
    trends.extend(stage_trends);

    ThroughputTrendSummary {
        current_window_start: windows.current_start,
        current_window_end: windows.current_end,
        prior_window_start: windows.prior_start,
        prior_window_end: windows.prior_end,
        window_days,
        trends,
    }
}

fn throughput_trend(label: &str, current: usize, prior: usize, window_days: i64) -> ThroughputTrend {
    let delta = current as i64 - prior as i64;
    let delta_percent = if prior > 0 {
        delta as f64 / prior as f64 * 100.0
    } else {
        0.0
    };
    let weeks = window_days as f64 / 7.0;

    let trend = if delta > 0 {
        TrendDirection::Up
    } else if delta < 0 {
        TrendDirection::Down
    } else {
        TrendDirection::Flat
    };

    ThroughputTrend {
        label: label.to_string(),
        current_count: current,
        prior_count: prior,
        delta,
        delta_percent: round_to(delta_percent, 1),
        current_per_week: round_to(current as f64 / weeks, 2),
        prior_per_week: round_to(prior as f64 / weeks, 2),
        trend,
    }
}

/// Compare latency distributions between the two windows, per stage and
/// overall. The overall entry pools durations across all stages.
pub fn build_latency_trends(
    events: &[ReviewEvent],
    as_of: DateTime<Utc>,
    window_days: i64,
) -> LatencyTrendSummary {
    let windows = TrendWindows::new(as_of, window_days);

    let mut current: HashMap<&str, Vec<f64>> = HashMap::new();
    let mut prior: HashMap<&str, Vec<f64>> = HashMap::new();

    for event in events {
        let days = event.duration_days();
        if windows.in_current(event.reviewed_at) {
            current.entry(event.stage.as_str()).or_default().push(days);
        } else if windows.in_prior(event.reviewed_at) {
            prior.entry(event.stage.as_str()).or_default().push(days);
        }
    }

    let labels: HashSet<&str> = current.keys().chain(prior.keys()).copied().collect();

    let mut stage_trends: Vec<LatencyTrend> = labels
        .into_iter()
        .map(|stage| {
            latency_trend(
                stage,
                current.get(stage).cloned().unwrap_or_default(),
                prior.get(stage).cloned().unwrap_or_default(),
            )
        })
        .collect();

    stage_trends.sort_by(|a, b| {
        b.current_avg_days
            .total_cmp(&a.current_avg_days)
            .then(b.avg_delta_days.total_cmp(&a.avg_delta_days))
    });

    let flatten = |buckets: &HashMap<&str, Vec<f64>>| -> Vec<f64> {
        buckets.values().flatten().copied().collect()
    };

    let mut trends = vec![latency_trend(OVERALL_LABEL, flatten(&current), flatten(&prior))];
    trends.extend(stage_trends);

    LatencyTrendSummary {
        current_window_start: windows.current_start,
        current_window_end: windows.current_end,
        prior_window_start: windows.prior_start,
        prior_window_end: windows.prior_end,
        window_days,
        trends,
    }
}

fn latency_trend(label: &str, mut current: Vec<f64>, mut prior: Vec<f64>) -> LatencyTrend {
    current.sort_by(f64::total_cmp);
    prior.sort_by(f64::total_cmp);

    let current_avg = mean(&current);
    let prior_avg = mean(&prior);
    let current_median = percentile(&current, 50.0);
    let prior_median = percentile(&prior, 50.0);

    let avg_delta = current_avg - prior_avg;
    let median_delta = current_median - prior_median;

    let avg_delta_pct = if prior_avg > 0.0 {
        avg_delta / prior_avg * 100.0
    } else {
        0.0
    };
    let median_delta_pct = if prior_median > 0.0 {
        median_delta / prior_median * 100.0
    } else {
        0.0
    };

    // Half-day dead-zone either side before calling a direction.
    let trend = if avg_delta > 0.5 {
        TrendDirection::Up
    } else if avg_delta < -0.5 {
        TrendDirection::Down
    } else {
        TrendDirection::Flat
    };

    LatencyTrend {
        label: label.to_string(),
        current_count: current.len(),
        prior_count: prior.len(),
        current_avg_days: round_to(current_avg, 2),
        prior_avg_days: round_to(prior_avg, 2),
        avg_delta_days: round_to(avg_delta, 2),
        avg_delta_percent: round_to(avg_delta_pct, 1),
        current_median_days: round_to(current_median, 2),
        prior_median_days: round_to(prior_median, 2),
        median_delta_days: round_to(median_delta, 2),
        median_delta_pct: round_to(median_delta_pct, 1),
        trend,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
    }

    fn event_reviewed_at(stage: &str, reviewed_at: DateTime<Utc>, duration_days: i64) -> ReviewEvent {
        ReviewEvent {
            application_id: "app".to_string(),
            stage: stage.to_string(),
            submitted_at: reviewed_at - Duration::days(duration_days),
            reviewed_at,
            reviewer_id: "alice".to_string(),
        }
    }

    #[test]
    fn doubled_volume_reads_as_up() {
        let trend = throughput_trend("overall", 20, 10, 14);
        assert_eq!(trend.delta, 10);
        assert_eq!(trend.delta_percent, 100.0);
        assert_eq!(trend.current_per_week, 10.0);
        assert_eq!(trend.prior_per_week, 5.0);
        assert_eq!(trend.trend, TrendDirection::Up);
    }

    #[test]
    fn delta_percent_is_zero_without_prior_volume() {
        let trend = throughput_trend("intake", 8, 0, 14);
        assert_eq!(trend.delta, 8);
        assert_eq!(trend.delta_percent, 0.0);
        assert_eq!(trend.trend, TrendDirection::Up);
    }

    #[test]
    fn boundary_event_counts_as_current_not_prior() {
        let as_of = base();
        let boundary = as_of - Duration::days(14);
        let events = vec![event_reviewed_at("intake", boundary, 3)];

        let summary = build_throughput_trends(&events, as_of, 14);
        assert_eq!(summary.prior_window_end, summary.current_window_start);

        let overall = &summary.trends[0];
        assert_eq!(overall.label, OVERALL_LABEL);
        assert_eq!(overall.current_count, 1);
        assert_eq!(overall.prior_count, 0);
    }

    #[test]
    fn overall_is_listed_first_then_stages_by_current_count() {
        let as_of = base();
        let events = vec![
            event_reviewed_at("big", as_of - Duration::days(1), 2),
            event_reviewed_at("big", as_of - Duration::days(2), 2),
            event_reviewed_at("small", as_of - Duration::days(3), 2),
        ];
        let summary = build_throughput_trends(&events, as_of, 14);
        let labels: Vec<&str> = summary.trends.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, vec![OVERALL_LABEL, "big", "small"]);
    }

    #[test]
    fn latency_dead_zone_is_half_a_day() {
        let flat = latency_trend("s", vec![5.4], vec![5.0]);
        assert_eq!(flat.trend, TrendDirection::Flat);

        let up = latency_trend("s", vec![5.6], vec![5.0]);
        assert_eq!(up.trend, TrendDirection::Up);

        let down = latency_trend("s", vec![4.4], vec![5.0]);
        assert_eq!(down.trend, TrendDirection::Down);
    }

    #[test]
    fn latency_percent_deltas_guard_zero_prior() {
        let trend = latency_trend("s", vec![4.0, 6.0], vec![]);
        assert_eq!(trend.prior_avg_days, 0.0);
        assert_eq!(trend.avg_delta_percent, 0.0);
        assert_eq!(trend.median_delta_pct, 0.0);
        assert_eq!(trend.current_avg_days, 5.0);
    }

    #[test]
    fn latency_overall_pools_every_stage() {
        let as_of = base();
        let events = vec![
            event_reviewed_at("a", as_of - Duration::days(1), 2),
            event_reviewed_at("b", as_of - Duration::days(2), 6),
            event_reviewed_at("a", as_of - Duration::days(20), 4),
        ];
        let summary = build_latency_trends(&events, as_of, 14);
        let overall = &summary.trends[0];
        assert_eq!(overall.label, OVERALL_LABEL);
        assert_eq!(overall.current_count, 2);
        assert_eq!(overall.prior_count, 1);
        assert_eq!(overall.current_avg_days, 4.0);
    }
}
