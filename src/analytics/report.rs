//! Report assembly: parameter validation, as-of resolution, and the
//! orchestration of the independent report sections

use crate::analytics::aggregation::{self, ReviewerStats, StageStats, ThroughputSummary};
use crate::analytics::error::{AnalyticsError, AnalyticsResult};
use crate::analytics::forecast::{self, QueueReport, DEFAULT_DUE_SOON_RATIO};
use crate::analytics::trends::{self, LatencyTrendSummary, ThroughputTrendSummary};
use crate::models::{QueueItem, ReviewEvent};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tunable inputs for one report build
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportParams {
    /// SLA threshold in days
    pub sla_days: i64,

    /// Trailing window length for throughput and trend comparisons
    pub throughput_window_days: i64,

    /// Reference instant for all windowing; inferred from the latest
    /// reviewed-at when absent
    pub as_of: Option<DateTime<Utc>>,

    /// Fraction of the SLA at which pending work counts as due soon
    pub due_soon_ratio: f64,
}

impl Default for ReportParams {
    fn default() -> Self {
        Self {
            sla_days: 10,
            throughput_window_days: 28,
            as_of: None,
            due_soon_ratio: DEFAULT_DUE_SOON_RATIO,
        }
    }
}

/// The root aggregate produced by one engine invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub total_events: usize,
    pub overall: StageStats,
    pub stages: Vec<StageStats>,
    pub reviewers: Vec<ReviewerStats>,
    pub sla_days: i64,
    pub throughput: ThroughputSummary,
    pub throughput_trend: ThroughputTrendSummary,
    pub latency_trend: LatencyTrendSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue: Option<QueueReport>,
}

/// Build the full report from a batch of events and pending queue items.
///
/// Pure except for the `generated_at` stamp and the report id: the same
/// inputs always produce the same statistics. Fails fast on non-positive
/// parameters and on an uninferable as-of instant; there is no partial
/// report on failure.
pub fn build_report(
    events: &[ReviewEvent],
    queue_items: &[QueueItem],
    params: &ReportParams,
) -> AnalyticsResult<Report> {
    if params.sla_days <= 0 {
        return Err(AnalyticsError::InvalidParameter(
            "sla_days must be positive".to_string(),
        ));
    }
    if params.throughput_window_days <= 0 {
        return Err(AnalyticsError::InvalidParameter(
            "throughput_window_days must be positive".to_string(),
        ));
    }

    let as_of = resolve_as_of(events, params.as_of)?;
    let sla_days = params.sla_days;
    let window_days = params.throughput_window_days;
    let window_start = as_of - Duration::days(window_days);

    // The sections read the same immutable slices and fill disjoint report
    // fields, so they fan out across the rayon pool without coordination.
    let ((stages, overall), ((throughput, reviewers), (throughput_trend, (latency_trend, queue)))) =
        rayon::join(
            || {
                (
                    aggregation::stage_stats(events, sla_days),
                    aggregation::overall_stats(events, sla_days),
                )
            },
            || {
                rayon::join(
                    || {
                        (
                            aggregation::throughput_summary(
                                events,
                                window_days,
                                window_start,
                                as_of,
                            ),
                            aggregation::reviewer_stats(
                                events,
                                sla_days,
                                window_start,
                                as_of,
                                window_days,
                            ),
                        )
                    },
                    || {
                        rayon::join(
                            || trends::build_throughput_trends(events, as_of, window_days),
                            || {
                                rayon::join(
                                    || trends::build_latency_trends(events, as_of, window_days),
                                    || {
                                        forecast::build_queue_report(
                                            queue_items,
                                            events,
                                            sla_days,
                                            window_days,
                                            as_of,
                                            params.due_soon_ratio,
                                        )
                                    },
                                )
                            },
                        )
                    },
                )
            },
        );

    Ok(Report {
        id: Uuid::new_v4(),
        generated_at: Utc::now(),
        total_events: events.len(),
        overall,
        stages,
        reviewers,
        sla_days,
        throughput,
        throughput_trend,
        latency_trend,
        queue,
    })
}

/// Use the supplied as-of instant, else the latest reviewed-at across all
/// events.
pub fn resolve_as_of(
    events: &[ReviewEvent],
    explicit: Option<DateTime<Utc>>,
) -> AnalyticsResult<DateTime<Utc>> {
    if let Some(as_of) = explicit {
        return Ok(as_of);
    }
    events
        .iter()
        .map(|event| event.reviewed_at)
        .max()
        .ok_or(AnalyticsError::EmptyTimeline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn event(stage: &str, reviewed_at: DateTime<Utc>, duration_days: i64) -> ReviewEvent {
        ReviewEvent {
            application_id: "app".to_string(),
            stage: stage.to_string(),
            submitted_at: reviewed_at - Duration::days(duration_days),
            reviewed_at,
            reviewer_id: "alice".to_string(),
        }
    }

    #[test]
    fn rejects_non_positive_parameters() {
        let params = ReportParams {
            sla_days: 0,
            ..ReportParams::default()
        };
        assert!(matches!(
            build_report(&[], &[], &params),
            Err(AnalyticsError::InvalidParameter(_))
        ));

        let params = ReportParams {
            throughput_window_days: -7,
            ..ReportParams::default()
        };
        assert!(matches!(
            build_report(&[], &[], &params),
            Err(AnalyticsError::InvalidParameter(_))
        ));
    }

    #[test]
    fn empty_events_need_an_explicit_as_of() {
        assert!(matches!(
            build_report(&[], &[], &ReportParams::default()),
            Err(AnalyticsError::EmptyTimeline)
        ));

        let params = ReportParams {
            as_of: Some(Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()),
            ..ReportParams::default()
        };
        let report = build_report(&[], &[], &params).unwrap();
        assert_eq!(report.total_events, 0);
        assert_eq!(report.overall.stats.count, 0);
        assert!(report.queue.is_none());
    }

    #[test]
    fn as_of_defaults_to_latest_review() {
        let latest = Utc.with_ymd_and_hms(2025, 6, 10, 12, 0, 0).unwrap();
        let events = vec![
            event("a", latest - Duration::days(5), 2),
            event("a", latest, 3),
            event("a", latest - Duration::days(1), 4),
        ];
        assert_eq!(resolve_as_of(&events, None).unwrap(), latest);

        let explicit = Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap();
        assert_eq!(resolve_as_of(&events, Some(explicit)).unwrap(), explicit);
    }
}
