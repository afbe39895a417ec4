//! Metrics aggregation and forecasting engine for review workflows
//!
//! This module is the computational core: everything in it is a pure
//! function from in-memory batches to an immutable [`Report`].
//!
//! # Features
//!
//! - **Duration Statistics**: count, mean, median, p90, max, SLA breach
//!   rate, and aging buckets per partition
//! - **Risk Tiering**: three-tier classification from average latency and
//!   breach rate
//! - **Stage/Reviewer Aggregation**: severity-ordered snapshots per stage
//!   and per reviewer
//! - **Trend Comparison**: current vs. prior window for both completion
//!   volume and latency distribution
//! - **Queue Forecasting**: backlog aging and clearance estimates against
//!   trailing throughput
//! - **Insights**: qualitative signals derived from a finished report
//!
//! # Example
//!
//! ```no_run
//! use chrono::{TimeZone, Utc};
//! use review_queue_forecaster::analytics::{build_report, ReportParams};
//! use review_queue_forecaster::models::ReviewEvent;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let events = vec![ReviewEvent {
//!     application_id: "app-1".to_string(),
//!     stage: "initial".to_string(),
//!     submitted_at: Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap(),
//!     reviewed_at: Utc.with_ymd_and_hms(2025, 3, 6, 0, 0, 0).unwrap(),
//!     reviewer_id: "alice".to_string(),
//! }];
//!
//! let report = build_report(&events, &[], &ReportParams::default())?;
//! println!("overall average: {:.2} days", report.overall.stats.average_days);
//! # Ok(())
//! # }
//! ```

mod aggregation;
mod error;
mod forecast;
mod insights;
mod report;
mod statistics;
mod trends;

/// Reserved sentinel label for the unpartitioned aggregate. Not a real
/// stage; it is unioned into the per-stage label sets.
pub const OVERALL_LABEL: &str = "overall";

pub use aggregation::{ReviewerStats, StageStats, ThroughputSummary};
pub use error::{AnalyticsError, AnalyticsResult};
pub use forecast::{
    ClearanceStatus, QueueReport, QueueReviewerForecast, QueueStageForecast,
    DEFAULT_DUE_SOON_RATIO,
};
pub use insights::{build_insights, Insight, Severity};
pub use report::{build_report, resolve_as_of, Report, ReportParams};
pub use statistics::{
    classify_risk, mean, percentile, round_to, AgingBuckets, DurationStats, RiskTier,
};
pub use trends::{
    build_latency_trends, build_throughput_trends, LatencyTrend, LatencyTrendSummary,
    ThroughputTrend, ThroughputTrendSummary, TrendDirection,
};
