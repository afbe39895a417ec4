//! Report encoders: CSV files and console text

mod console;
mod export;

pub use console::print_report;
pub use export::write_csv_reports;
