//! CSV ingestion tests over real files

use review_queue_forecaster::ingest::{load_events, load_queue, IngestError};
use std::io::Write;
use tempfile::NamedTempFile;

fn write_csv(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn loads_events_with_mixed_timestamp_formats() {
    let file = write_csv(
        "application_id,stage,submitted_at,reviewed_at,reviewer_id\n\
         app-1,initial,2025-03-01,2025-03-06,alice\n\
         app-2,initial,2025-03-01T08:00:00Z,2025-03-04T20:00:00Z,bob\n\
         app-3,final,2025-03-02 09:30:00,2025-03-03 09:30:00,\n",
    );

    let events = load_events(file.path()).unwrap();
    assert_eq!(events.len(), 3);
    assert_eq!(events[0].application_id, "app-1");
    assert_eq!(events[0].duration_days(), 5.0);
    assert_eq!(events[1].reviewer_id, "bob");
    assert_eq!(events[2].reviewer_id, "");
    assert_eq!(events[2].duration_days(), 1.0);
}

#[test]
fn header_order_and_case_are_free() {
    let file = write_csv(
        "Reviewer_ID, Stage ,reviewed_at,submitted_at,application_id\n\
         alice,initial,2025-03-06,2025-03-01,app-1\n",
    );

    let events = load_events(file.path()).unwrap();
    assert_eq!(events[0].stage, "initial");
    assert_eq!(events[0].reviewer_id, "alice");
}

#[test]
fn missing_column_is_reported_by_name() {
    let file = write_csv(
        "application_id,stage,submitted_at,reviewer_id\n\
         app-1,initial,2025-03-01,alice\n",
    );

    match load_events(file.path()) {
        Err(IngestError::MissingColumn(column)) => assert_eq!(column, "reviewed_at"),
        other => panic!("expected missing column error, got {other:?}"),
    }
}

#[test]
fn reversed_interval_names_the_row() {
    let file = write_csv(
        "application_id,stage,submitted_at,reviewed_at,reviewer_id\n\
         app-1,initial,2025-03-01,2025-03-06,alice\n\
         app-2,initial,2025-03-10,2025-03-06,bob\n",
    );

    match load_events(file.path()) {
        Err(IngestError::NegativeInterval { row }) => assert_eq!(row, 3),
        other => panic!("expected negative interval error, got {other:?}"),
    }
}

#[test]
fn bad_timestamp_names_row_and_column() {
    let file = write_csv(
        "application_id,stage,submitted_at,reviewed_at,reviewer_id\n\
         app-1,initial,not-a-date,2025-03-06,alice\n",
    );

    match load_events(file.path()) {
        Err(IngestError::InvalidTimestamp { row, column, value }) => {
            assert_eq!(row, 2);
            assert_eq!(column, "submitted_at");
            assert_eq!(value, "not-a-date");
        }
        other => panic!("expected timestamp error, got {other:?}"),
    }
}

#[test]
fn header_only_file_is_an_error() {
    let file = write_csv("application_id,stage,submitted_at,reviewed_at,reviewer_id\n");
    assert!(matches!(
        load_events(file.path()),
        Err(IngestError::Empty(_))
    ));
}

#[test]
fn queue_reviewer_column_is_optional() {
    let file = write_csv(
        "application_id,stage,submitted_at\n\
         app-1,initial,2025-03-01\n\
         app-2,final,2025-03-02\n",
    );

    let items = load_queue(file.path()).unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].reviewer_id, "");
}

#[test]
fn queue_rows_keep_assigned_reviewers() {
    let file = write_csv(
        "application_id,stage,submitted_at,reviewer_id\n\
         app-1,initial,2025-03-01,alice\n\
         app-2,initial,2025-03-02,\n",
    );

    let items = load_queue(file.path()).unwrap();
    assert_eq!(items[0].reviewer_id, "alice");
    assert_eq!(items[1].reviewer_id, "");
}
