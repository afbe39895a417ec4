//! Qualitative operational signals derived from a finished report

use crate::analytics::report::Report;
use crate::analytics::statistics::RiskTier;
use crate::analytics::trends::TrendDirection;
use crate::analytics::OVERALL_LABEL;
use serde::{Deserialize, Serialize};
use strum::Display;

/// How urgently a signal deserves attention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

/// One operational signal: where to look and why
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Insight {
    pub area: String,
    pub severity: Severity,
    pub message: String,
}

impl Insight {
    fn new(area: &str, severity: Severity, message: String) -> Self {
        Self {
            area: area.to_string(),
            severity,
            message,
        }
    }
}

/// Derive signals from the report, rule by rule. Quiet reports yield an
/// empty vector.
pub fn build_insights(report: &Report) -> Vec<Insight> {
    let mut insights = Vec::new();

    let overall = &report.overall.stats;
    if overall.count > 0 {
        let severity = match overall.risk_tier {
            RiskTier::High => Some(Severity::High),
            RiskTier::Medium => Some(Severity::Medium),
            RiskTier::Low => None,
        };
        if let Some(severity) = severity {
            insights.push(Insight::new(
                "overall",
                severity,
                format!(
                    "overall average is {:.2} days against a {}-day SLA with a {:.1}% breach rate",
                    overall.average_days, report.sla_days, overall.sla_breach_rate
                ),
            ));
        }
    }

    if let Some(worst) = report.stages.first() {
        if worst.stats.risk_tier == RiskTier::High {
            insights.push(Insight::new(
                "stage",
                Severity::High,
                format!(
                    "stage \"{}\" averages {:.2} days with {} of {} reviews breaching",
                    worst.stage,
                    worst.stats.average_days,
                    worst.stats.sla_breach_count,
                    worst.stats.count
                ),
            ));
        }
    }

    if let Some(trend) = report
        .throughput_trend
        .trends
        .iter()
        .find(|t| t.label == OVERALL_LABEL)
    {
        if trend.trend == TrendDirection::Down {
            insights.push(Insight::new(
                "throughput",
                Severity::Medium,
                format!(
                    "completed reviews fell from {} to {} between windows",
                    trend.prior_count, trend.current_count
                ),
            ));
        }
    }

    if let Some(trend) = report
        .latency_trend
        .trends
        .iter()
        .find(|t| t.label == OVERALL_LABEL)
    {
        if trend.trend == TrendDirection::Up {
            insights.push(Insight::new(
                "latency",
                Severity::Medium,
                format!(
                    "average latency rose {:.2} days between windows",
                    trend.avg_delta_days
                ),
            ));
        }
    }

    if let Some(queue) = &report.queue {
        if queue.overdue_count > 0 {
            let severity = if queue.overdue_count > queue.due_soon_count {
                Severity::High
            } else {
                Severity::Medium
            };
            insights.push(Insight::new(
                "queue",
                severity,
                format!(
                    "{} of {} pending items are past the SLA threshold",
                    queue.overdue_count, queue.total_pending
                ),
            ));
        }
        if queue.unassigned_count > queue.assigned_count {
            insights.push(Insight::new(
                "coverage",
                Severity::Medium,
                format!(
                    "{} pending items are unassigned against {} assigned",
                    queue.unassigned_count, queue.assigned_count
                ),
            ));
        }
    }

    insights
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::report::{build_report, ReportParams};
    use crate::models::{QueueItem, ReviewEvent};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn as_of() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
    }

    fn event(stage: &str, reviewed_days_ago: i64, duration_days: i64) -> ReviewEvent {
        let reviewed_at = as_of() - Duration::days(reviewed_days_ago);
        ReviewEvent {
            application_id: "app".to_string(),
            stage: stage.to_string(),
            submitted_at: reviewed_at - Duration::days(duration_days),
            reviewed_at,
            reviewer_id: "alice".to_string(),
        }
    }

    fn find<'a>(insights: &'a [Insight], area: &str) -> Option<&'a Insight> {
        insights.iter().find(|insight| insight.area == area)
    }

    #[test]
    fn high_risk_overall_fires_overall_insight() {
        // Averages well past the SLA -> overall tier high.
        let events = vec![event("intake", 1, 12), event("intake", 2, 14)];
        let report = build_report(&events, &[], &ReportParams::default()).unwrap();

        let insights = build_insights(&report);
        let overall = find(&insights, "overall").expect("expected overall insight");
        assert_eq!(overall.severity, Severity::High);
    }

    #[test]
    fn unassigned_majority_fires_coverage_insight() {
        let events = vec![event("intake", 1, 2)];
        let queue: Vec<QueueItem> = (0..10)
            .map(|i| QueueItem {
                application_id: format!("app-{i}"),
                stage: "intake".to_string(),
                submitted_at: as_of() - Duration::days(1),
                reviewer_id: if i < 4 { "alice".to_string() } else { String::new() },
            })
            .collect();
        let report = build_report(&events, &queue, &ReportParams::default()).unwrap();

        let insights = build_insights(&report);
        let coverage = find(&insights, "coverage").expect("expected coverage insight");
        assert_eq!(coverage.severity, Severity::Medium);
    }

    #[test]
    fn quiet_report_yields_no_insights() {
        // Short durations, no queue, flat single-window volume.
        let events = vec![event("intake", 1, 2), event("intake", 2, 3)];
        let report = build_report(&events, &[], &ReportParams::default()).unwrap();
        let insights = build_insights(&report);
        assert!(find(&insights, "overall").is_none());
        assert!(find(&insights, "queue").is_none());
        assert!(find(&insights, "coverage").is_none());
    }

    #[test]
    fn overdue_majority_is_high_severity() {
        let events = vec![event("intake", 1, 2)];
        let queue: Vec<QueueItem> = (0..3)
            .map(|i| QueueItem {
                application_id: format!("app-{i}"),
                stage: "intake".to_string(),
                submitted_at: as_of() - Duration::days(15),
                reviewer_id: "alice".to_string(),
            })
            .collect();
        let report = build_report(&events, &queue, &ReportParams::default()).unwrap();

        let insights = build_insights(&report);
        let queue_insight = find(&insights, "queue").expect("expected queue insight");
        assert_eq!(queue_insight.severity, Severity::High);
    }
}
