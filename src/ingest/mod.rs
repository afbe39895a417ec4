//! CSV ingestion for review events and pending-queue snapshots
//!
//! Columns are mapped by header name (trimmed, lowercased), so column order
//! is free. Rows are validated as they are read: a review that finishes
//! before it was submitted never reaches the engine.

use crate::error::AppError;
use crate::models::{QueueItem, ReviewEvent};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::collections::HashMap;
use std::path::Path;

/// Result type for ingestion operations
pub type IngestResult<T> = std::result::Result<T, IngestError>;

/// Errors raised while loading input files
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// Underlying CSV or IO failure
    #[error(transparent)]
    Csv(#[from] csv::Error),

    /// A required column is absent from the header
    #[error("missing required column: {0}")]
    MissingColumn(String),

    /// The file holds a header but no data rows
    #[error("{0} must include a header and at least one row")]
    Empty(&'static str),

    /// A timestamp cell failed to parse; rows are 1-based, header included
    #[error("row {row}: invalid {column}: {value}")]
    InvalidTimestamp {
        row: usize,
        column: &'static str,
        value: String,
    },

    /// reviewed_at precedes submitted_at
    #[error("row {row}: reviewed_at is before submitted_at")]
    NegativeInterval { row: usize },

    /// No accepted layout matched
    #[error("unsupported timestamp format: {0}")]
    UnsupportedTimestamp(String),
}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        AppError::Ingestion(err.to_string())
    }
}

const EVENT_COLUMNS: [&str; 5] = [
    "application_id",
    "stage",
    "submitted_at",
    "reviewed_at",
    "reviewer_id",
];
const QUEUE_COLUMNS: [&str; 3] = ["application_id", "stage", "submitted_at"];

/// Load completed review events.
pub fn load_events(path: impl AsRef<Path>) -> IngestResult<Vec<ReviewEvent>> {
    let mut reader = open(path)?;
    let columns = map_columns(&mut reader, &EVENT_COLUMNS)?;

    let mut events = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let row = index + 2; // 1-based, after the header
        let get = |key: &str| field(&record, &columns, key);

        let submitted_at = parse_cell(get("submitted_at"), row, "submitted_at")?;
        let reviewed_at = parse_cell(get("reviewed_at"), row, "reviewed_at")?;
        if reviewed_at < submitted_at {
            return Err(IngestError::NegativeInterval { row });
        }

        events.push(ReviewEvent {
            application_id: get("application_id").to_string(),
            stage: get("stage").to_string(),
            submitted_at,
            reviewed_at,
            reviewer_id: get("reviewer_id").to_string(),
        });
    }

    if events.is_empty() {
        return Err(IngestError::Empty("events CSV"));
    }
    Ok(events)
}

/// Load the pending-queue snapshot. `reviewer_id` is optional; blank means
/// unassigned.
pub fn load_queue(path: impl AsRef<Path>) -> IngestResult<Vec<QueueItem>> {
    let mut reader = open(path)?;
    let columns = map_columns(&mut reader, &QUEUE_COLUMNS)?;

    let mut items = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let row = index + 2;
        let get = |key: &str| field(&record, &columns, key);

        let submitted_at = parse_cell(get("submitted_at"), row, "submitted_at")?;

        items.push(QueueItem {
            application_id: get("application_id").to_string(),
            stage: get("stage").to_string(),
            submitted_at,
            reviewer_id: get("reviewer_id").to_string(),
        });
    }

    if items.is_empty() {
        return Err(IngestError::Empty("queue CSV"));
    }
    Ok(items)
}

/// Parse a timestamp in any accepted layout: RFC 3339, `YYYY-MM-DD`
/// (midnight UTC), or `YYYY-MM-DD HH:MM:SS` (UTC).
pub fn parse_timestamp(value: &str) -> IngestResult<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Ok(instant.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date.and_time(chrono::NaiveTime::MIN).and_utc());
    }
    if let Ok(datetime) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Ok(datetime.and_utc());
    }
    Err(IngestError::UnsupportedTimestamp(value.to_string()))
}

fn open(path: impl AsRef<Path>) -> IngestResult<csv::Reader<std::fs::File>> {
    Ok(csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)?)
}

/// Map required header names to column positions; headers are matched
/// case-insensitively after trimming.
fn map_columns(
    reader: &mut csv::Reader<std::fs::File>,
    required: &[&str],
) -> IngestResult<HashMap<String, usize>> {
    let headers = reader.headers()?;
    let columns: HashMap<String, usize> = headers
        .iter()
        .enumerate()
        .map(|(index, name)| (name.trim().to_lowercase(), index))
        .collect();

    for key in required {
        if !columns.contains_key(*key) {
            return Err(IngestError::MissingColumn((*key).to_string()));
        }
    }
    Ok(columns)
}

fn field<'a>(record: &'a csv::StringRecord, columns: &HashMap<String, usize>, key: &str) -> &'a str {
    columns
        .get(key)
        .and_then(|&index| record.get(index))
        .unwrap_or("")
        .trim()
}

fn parse_cell(value: &str, row: usize, column: &'static str) -> IngestResult<DateTime<Utc>> {
    parse_timestamp(value).map_err(|_| IngestError::InvalidTimestamp {
        row,
        column,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn accepts_all_timestamp_layouts() {
        let expected = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2025-03-01").unwrap(), expected);
        assert_eq!(
            parse_timestamp("2025-03-01T00:00:00Z").unwrap(),
            expected
        );
        assert_eq!(
            parse_timestamp("2025-03-01 00:00:00").unwrap(),
            expected
        );
    }

    #[test]
    fn rejects_unknown_layouts() {
        assert!(matches!(
            parse_timestamp("03/01/2025"),
            Err(IngestError::UnsupportedTimestamp(_))
        ));
        assert!(parse_timestamp("").is_err());
    }

    #[test]
    fn rfc3339_offsets_normalize_to_utc() {
        let parsed = parse_timestamp("2025-03-01T02:00:00+02:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap());
    }
}
