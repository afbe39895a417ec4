//! Batch-scoped input records for the analytics engine

mod event;

pub use event::{normalize_reviewer, QueueItem, ReviewEvent, UNASSIGNED};
