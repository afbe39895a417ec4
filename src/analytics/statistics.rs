//! Duration statistics and risk classification

use crate::models::ReviewEvent;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use strum::Display;

/// Histogram of durations relative to the SLA threshold.
///
/// A duration lands on-time when it is at most the threshold, at-risk up to
/// twice the threshold, and overdue beyond that. The on-time boundary is
/// inclusive while the breach test below is also inclusive, so a duration
/// exactly at the threshold is both on-time and a breach.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgingBuckets {
    pub on_time: usize,
    pub at_risk: usize,
    pub overdue: usize,
}

/// Three-tier severity label for a duration distribution
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RiskTier {
    High,
    Medium,
    #[default]
    Low,
}

/// Read-only duration snapshot for one partition of events
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DurationStats {
    pub count: usize,
    pub average_days: f64,
    pub median_days: f64,
    pub p90_days: f64,
    pub max_days: f64,
    pub sla_breach_count: usize,
    /// Breach rate as a percentage, rounded to one decimal place
    pub sla_breach_rate: f64,
    pub distinct_reviewers: usize,
    pub aging_buckets: AgingBuckets,
    pub risk_tier: RiskTier,
}

impl DurationStats {
    /// Compute a snapshot over a partition of events.
    ///
    /// An empty partition yields the zeroed default rather than an error.
    /// Day values round to 2 decimal places, the breach rate to 1; the risk
    /// classifier sees the unrounded average and rate.
    pub fn from_events<'a, I>(events: I, sla_days: i64) -> Self
    where
        I: IntoIterator<Item = &'a ReviewEvent>,
    {
        let sla = sla_days as f64;
        let mut durations = Vec::new();
        let mut reviewers = HashSet::new();
        let mut breach_count = 0;
        let mut buckets = AgingBuckets::default();

        for event in events {
            let days = event.duration_days();
            durations.push(days);
            if days >= sla {
                breach_count += 1;
            }
            if days <= sla {
                buckets.on_time += 1;
            } else if days <= sla * 2.0 {
                buckets.at_risk += 1;
            } else {
                buckets.overdue += 1;
            }
            if !event.reviewer_id.is_empty() {
                reviewers.insert(event.reviewer_id.as_str());
            }
        }

        if durations.is_empty() {
            return Self::default();
        }

        durations.sort_by(f64::total_cmp);

        let average = mean(&durations);
        let breach_rate = breach_count as f64 / durations.len() as f64;

        Self {
            count: durations.len(),
            average_days: round_to(average, 2),
            median_days: round_to(percentile(&durations, 50.0), 2),
            p90_days: round_to(percentile(&durations, 90.0), 2),
            max_days: round_to(durations[durations.len() - 1], 2),
            sla_breach_count: breach_count,
            sla_breach_rate: round_to(breach_rate * 100.0, 1),
            distinct_reviewers: reviewers.len(),
            aging_buckets: buckets,
            risk_tier: classify_risk(average, breach_rate, sla_days),
        }
    }
}

/// Map an average duration and breach rate to a risk tier.
///
/// Checked in order, first match wins:
/// high when `breach_rate >= 0.4` or the average meets the SLA threshold,
/// medium when `breach_rate >= 0.2` or the average reaches 80% of it.
pub fn classify_risk(avg_days: f64, breach_rate: f64, sla_days: i64) -> RiskTier {
    let sla = sla_days as f64;
    if breach_rate >= 0.4 || avg_days >= sla {
        RiskTier::High
    } else if breach_rate >= 0.2 || avg_days >= sla * 0.8 {
        RiskTier::Medium
    } else {
        RiskTier::Low
    }
}

/// Arithmetic mean; zero for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Linear-interpolated percentile over ascending `sorted` values.
///
/// rank = (p/100)·(n−1), interpolating between the floor and ceil order
/// statistics by the fractional weight. `p <= 0` returns the minimum,
/// `p >= 100` the maximum, and a single-element slice that element.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 || p <= 0.0 {
        return sorted[0];
    }
    if p >= 100.0 {
        return sorted[sorted.len() - 1];
    }

    let rank = (p / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank as usize;
    let upper = lower + 1;
    if upper >= sorted.len() {
        return sorted[lower];
    }
    let weight = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}

/// Round half-up to `places` decimal places
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor + 0.5).floor() / factor
}
