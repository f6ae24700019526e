//! JSON corpus archives: an array of file records.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::detections::FileDetectionRecord;
use crate::error::{Error, Result};

/// Read a JSON corpus archive.
pub fn read_json(path: &Path) -> Result<Vec<FileDetectionRecord>> {
    let file = File::open(path).map_err(|e| Error::CorpusRead {
        path: path.to_path_buf(),
        source: Box::new(e),
    })?;

    serde_json::from_reader(BufReader::new(file)).map_err(|e| Error::CorpusRead {
        path: path.to_path_buf(),
        source: Box::new(e),
    })
}

/// Write a JSON corpus archive.
pub fn write_json(corpus: &[FileDetectionRecord], path: &Path) -> Result<()> {
    let write_err = |e: Box<dyn std::error::Error + Send + Sync>| Error::CorpusWrite {
        path: path.to_path_buf(),
        source: e,
    };

    let file = File::create(path).map_err(|e| write_err(Box::new(e)))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, corpus).map_err(|e| write_err(Box::new(e)))?;
    writer.flush().map_err(|e| write_err(Box::new(e)))?;
    Ok(())
}
