//! JSON report writer.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{Error, Result};
use crate::output::ReportWriter;

/// Writer collecting rows into a single pretty-printed JSON array.
pub struct JsonReportWriter<T> {
    rows: Vec<serde_json::Value>,
    path: PathBuf,
    _row: PhantomData<T>,
}

impl<T> JsonReportWriter<T> {
    /// Create a new JSON writer; nothing is written until [`ReportWriter::finalize`].
    pub fn new(path: &Path) -> Self {
        Self {
            rows: Vec::new(),
            path: path.to_path_buf(),
            _row: PhantomData,
        }
    }

    fn json_error(&self, source: serde_json::Error) -> Error {
        Error::JsonWrite {
            path: self.path.clone(),
            source,
        }
    }
}

impl<T: Serialize> ReportWriter<T> for JsonReportWriter<T> {
    fn write_row(&mut self, row: &T) -> Result<()> {
        let value = serde_json::to_value(row).map_err(|e| self.json_error(e))?;
        self.rows.push(value);
        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        let mut writer = BufWriter::new(File::create(&self.path)?);
        serde_json::to_writer_pretty(&mut writer, &self.rows).map_err(|e| self.json_error(e))?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}
