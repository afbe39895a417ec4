//! Review Queue Forecaster
//!
//! Batch analytics for review workflows: latency distributions, SLA
//! compliance, throughput and latency trends, and backlog-clearance
//! forecasts, assembled into one immutable [`Report`](analytics::Report).
//!
//! The crate splits into a pure computational core ([`analytics`]) and thin
//! adapters around it: [`ingest`] reads CSV batches, [`output`] renders the
//! report to CSV files or the console, and [`history`] persists runs behind
//! an injected store trait.

pub mod analytics;
pub mod config;
pub mod error;
pub mod history;
pub mod ingest;
pub mod models;
pub mod output;

pub use analytics::{build_report, Report, ReportParams};
pub use error::{AppError, Result};
