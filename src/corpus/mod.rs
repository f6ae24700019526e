//! Detection corpus archives.
//!
//! A corpus is the full per-file classifier output for one dataset. Archives
//! are JSON (an array of file records) or flat Parquet tables; the format is
//! chosen by file extension.

mod json_archive;
mod parquet_archive;

use std::path::Path;

use tracing::{debug, info};

use crate::constants::confidence;
use crate::detections::{FileDetectionRecord, detection_time};
use crate::error::{Error, Result};

pub use json_archive::{read_json, write_json};
pub use parquet_archive::{read_parquet, write_parquet};

/// Supported corpus archive formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorpusFormat {
    /// JSON array of file records.
    Json,
    /// Flat Parquet table.
    Parquet,
}

impl CorpusFormat {
    /// Infer the archive format from the file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase());
        match extension.as_deref() {
            Some("json") => Ok(Self::Json),
            Some("parquet") => Ok(Self::Parquet),
            _ => Err(Error::UnsupportedCorpusFormat {
                path: path.to_path_buf(),
            }),
        }
    }
}

/// Load a corpus archive and check its detections.
///
/// Confidences must lie within 0.0-1.0 and offsets must be finite,
/// non-negative and give a representable detection time.
pub fn load_corpus(path: &Path) -> Result<Vec<FileDetectionRecord>> {
    debug!("Loading detection corpus: {}", path.display());

    let corpus = match CorpusFormat::from_path(path)? {
        CorpusFormat::Json => read_json(path)?,
        CorpusFormat::Parquet => read_parquet(path)?,
    };

    validate_corpus(&corpus, path)?;

    let detections: usize = corpus.iter().map(|f| f.detections.len()).sum();
    info!(
        "Loaded {} files with {} detections from {}",
        corpus.len(),
        detections,
        path.display()
    );

    Ok(corpus)
}

/// Write a corpus archive in the format implied by `path`.
pub fn save_corpus(corpus: &[FileDetectionRecord], path: &Path) -> Result<()> {
    match CorpusFormat::from_path(path)? {
        CorpusFormat::Json => write_json(corpus, path),
        CorpusFormat::Parquet => write_parquet(corpus, path),
    }
}

fn validate_corpus(corpus: &[FileDetectionRecord], path: &Path) -> Result<()> {
    for file in corpus {
        if let Some(bad) = file
            .detections
            .iter()
            .find(|d| !(confidence::MIN..=confidence::MAX).contains(&d.confidence))
        {
            return Err(Error::InvalidCorpus {
                path: path.to_path_buf(),
                message: format!(
                    "site '{}' at {}: confidence {} for '{}' is outside 0.0-1.0",
                    file.site, file.start, bad.confidence, bad.common_name
                ),
            });
        }
        if let Some(bad) = file
            .detections
            .iter()
            .find(|d| detection_time(file.start, d.offset_seconds).is_none())
        {
            return Err(Error::InvalidCorpus {
                path: path.to_path_buf(),
                message: format!(
                    "site '{}' at {}: offset {}s for '{}' does not give a valid detection time",
                    file.site, file.start, bad.offset_seconds, bad.common_name
                ),
            });
        }
    }
    Ok(())
}
