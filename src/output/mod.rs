//! Report writers and progress display.

mod csv;
mod json;
mod progress;
mod types;
mod writer;

pub use csv::CsvReportWriter;
pub use json::JsonReportWriter;
pub use progress::{create_dataset_progress, finish_progress, inc_progress, set_progress_message};
pub use types::ReportFormat;
pub use writer::{ReportWriter, ensure_output_dir, report_path, write_report};
