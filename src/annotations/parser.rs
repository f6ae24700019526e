//! Annotation table parsing.
//!
//! Reads the human-review table exported from the labelling spreadsheet.
//! Uses the `csv` crate, so quoted names with embedded commas and a leading
//! UTF-8 BOM are handled.

use std::path::Path;

use serde::Deserialize;
use tracing::{debug, warn};

use super::AnnotatedInstance;
use crate::Error;

/// Internal record for CSV deserialization.
#[derive(Debug, Deserialize)]
struct AnnotationRecord {
    #[serde(rename = "Common name")]
    common_name: String,
    #[serde(rename = "Confidence")]
    confidence: f64,
    #[serde(rename = "BirdNET correct?", default)]
    verdict: String,
}

/// Parse an annotation table.
///
/// Required columns: `Common name`, `Confidence`, `BirdNET correct?`.
/// Other columns are ignored. Verdicts outside `yes`/`maybe`/`no` are kept as
/// unrecognised and counted in a warning.
///
/// # Errors
///
/// Returns an error if:
/// - The file cannot be read
/// - Required columns are missing
/// - A confidence cannot be parsed or lies outside 0.0-1.0
pub fn parse_annotation_file(path: &Path) -> Result<Vec<AnnotatedInstance>, Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| Error::AnnotationParseFailed {
            path: path.to_path_buf(),
            source: Box::new(e),
        })?;

    let mut annotations = Vec::new();

    for (line_num, result) in reader.deserialize::<AnnotationRecord>().enumerate() {
        let record = result.map_err(|e| Error::InvalidAnnotationFormat {
            message: format!("line {}: {e}", line_num + 2),
        })?;

        if !(0.0..=1.0).contains(&record.confidence) {
            return Err(Error::InvalidAnnotationFormat {
                message: format!(
                    "line {}: confidence {} is outside 0.0-1.0",
                    line_num + 2,
                    record.confidence
                ),
            });
        }

        annotations.push(AnnotatedInstance::new(
            record.common_name,
            record.confidence,
            &record.verdict,
        ));
    }

    let unrecognized = annotations
        .iter()
        .filter(|a| !a.verdict.is_recognized())
        .count();
    if unrecognized > 0 {
        warn!(
            "{}: {unrecognized} of {} annotations have a verdict other than yes/maybe/no",
            path.display(),
            annotations.len()
        );
    }
    debug!(
        "Loaded {} annotations from {}",
        annotations.len(),
        path.display()
    );

    Ok(annotations)
}
