//! CSV report writer.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::constants::UTF8_BOM;
use crate::error::{Error, Result};
use crate::output::ReportWriter;

/// CSV format report writer. The header row comes from the row type's field names.
pub struct CsvReportWriter<T> {
    writer: csv::Writer<BufWriter<File>>,
    path: PathBuf,
    _row: PhantomData<T>,
}

impl<T> CsvReportWriter<T> {
    /// Create a new CSV writer, optionally starting the file with a UTF-8 BOM.
    pub fn new(path: &Path, bom: bool) -> Result<Self> {
        let mut file = BufWriter::new(File::create(path)?);
        if bom {
            file.write_all(UTF8_BOM.as_bytes())?;
        }
        Ok(Self {
            writer: csv::Writer::from_writer(file),
            path: path.to_path_buf(),
            _row: PhantomData,
        })
    }
}

impl<T: Serialize> ReportWriter<T> for CsvReportWriter<T> {
    fn write_row(&mut self, row: &T) -> Result<()> {
        self.writer.serialize(row).map_err(|source| Error::CsvWrite {
            path: self.path.clone(),
            source,
        })
    }

    fn finalize(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
