//! Report writer trait and the shared write path.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::error::{Error, Result};
use crate::output::{CsvReportWriter, JsonReportWriter, ReportFormat};

/// Trait for writing report rows.
pub trait ReportWriter<T: Serialize> {
    /// Write a single row.
    fn write_row(&mut self, row: &T) -> Result<()>;

    /// Finalize the output (flush, close, etc.).
    fn finalize(&mut self) -> Result<()>;
}

/// Create the output directory if it does not exist.
pub fn ensure_output_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|source| Error::OutputDirCreateFailed {
        path: dir.to_path_buf(),
        source,
    })
}

/// Where a named report lands inside `dir`.
pub fn report_path(dir: &Path, name: &str, format: ReportFormat) -> PathBuf {
    dir.join(format!("{name}.{}", format.extension()))
}

/// Write `rows` to `<dir>/<name>.<ext>` and return the path written.
pub fn write_report<T: Serialize>(
    dir: &Path,
    name: &str,
    format: ReportFormat,
    csv_bom: bool,
    rows: &[T],
) -> Result<PathBuf> {
    ensure_output_dir(dir)?;
    let path = report_path(dir, name, format);

    let mut writer: Box<dyn ReportWriter<T>> = match format {
        ReportFormat::Csv => Box::new(CsvReportWriter::new(&path, csv_bom)?),
        ReportFormat::Json => Box::new(JsonReportWriter::new(&path)),
    };
    for row in rows {
        writer.write_row(row)?;
    }
    writer.finalize()?;

    info!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(path)
}
