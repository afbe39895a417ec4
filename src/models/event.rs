use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Grouping label for work without a reviewer.
pub const UNASSIGNED: &str = "unassigned";

/// A completed review: one application passing through one stage.
///
/// Invariant: `reviewed_at >= submitted_at`, enforced at ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewEvent {
    pub application_id: String,
    pub stage: String,
    pub submitted_at: DateTime<Utc>,
    pub reviewed_at: DateTime<Utc>,
    pub reviewer_id: String,
}

impl ReviewEvent {
    /// Review latency in fractional days (hours / 24, not calendar days).
    pub fn duration_days(&self) -> f64 {
        (self.reviewed_at - self.submitted_at).num_milliseconds() as f64 / MILLIS_PER_DAY
    }
}

/// Work submitted but not yet reviewed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueItem {
    pub application_id: String,
    pub stage: String,
    pub submitted_at: DateTime<Utc>,
    /// Empty or whitespace-only means unassigned.
    pub reviewer_id: String,
}

impl QueueItem {
    /// Backlog age in fractional days at `as_of`, floored at zero.
    pub fn age_days(&self, as_of: DateTime<Utc>) -> f64 {
        ((as_of - self.submitted_at).num_milliseconds() as f64 / MILLIS_PER_DAY).max(0.0)
    }
}

/// Normalize a reviewer id for grouping: blank ids collapse to
/// [`UNASSIGNED`], everything else is trimmed.
pub fn normalize_reviewer(id: &str) -> &str {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        UNASSIGNED
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn duration_is_fractional_days() {
        let event = ReviewEvent {
            application_id: "app-1".to_string(),
            stage: "initial".to_string(),
            submitted_at: Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap(),
            reviewed_at: Utc.with_ymd_and_hms(2025, 3, 2, 12, 0, 0).unwrap(),
            reviewer_id: "alice".to_string(),
        };
        assert!((event.duration_days() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn age_never_negative() {
        let item = QueueItem {
            application_id: "app-2".to_string(),
            stage: "initial".to_string(),
            submitted_at: Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap(),
            reviewer_id: String::new(),
        };
        let earlier = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(item.age_days(earlier), 0.0);
    }

    #[test]
    fn blank_reviewer_groups_as_unassigned() {
        assert_eq!(normalize_reviewer(""), UNASSIGNED);
        assert_eq!(normalize_reviewer("   "), UNASSIGNED);
        assert_eq!(normalize_reviewer(" bob "), "bob");
    }
}
