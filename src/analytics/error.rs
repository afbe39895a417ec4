//! Error types for the analytics engine

use crate::error::AppError;

/// Result type for analytics operations
pub type AnalyticsResult<T> = std::result::Result<T, AnalyticsError>;

/// Errors that can occur while building a report
#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    /// A caller-supplied parameter is out of range
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The as-of instant must be inferred but there are no events
    #[error("no events to resolve the as-of instant")]
    EmptyTimeline,
}

impl From<AnalyticsError> for AppError {
    fn from(err: AnalyticsError) -> Self {
        match err {
            AnalyticsError::InvalidParameter(msg) => AppError::Validation(msg),
            AnalyticsError::EmptyTimeline => AppError::Analytics(err.to_string()),
        }
    }
}
