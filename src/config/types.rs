//! Configuration type definitions.

use crate::constants::{calibration, report};
use crate::output::ReportFormat;
use crate::stats::DurationMode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configured datasets, in report order.
    #[serde(default)]
    pub datasets: Vec<DatasetConfig>,

    /// Threshold sweep settings.
    #[serde(default)]
    pub calibration: CalibrationConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// Configuration for a single dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Identifier used on the command line and in report names.
    pub short_name: String,

    /// Display name.
    pub name: String,

    /// Nominal length of each audio file in minutes.
    pub minutes_per_file: f64,

    /// Detection corpus archive (`.json` or `.parquet`).
    pub corpus: PathBuf,

    /// Annotation table (CSV).
    pub annotations: PathBuf,

    /// Site metadata table for habitat analyses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_info: Option<PathBuf>,

    /// Hours to add to recorder clock times to get local time.
    #[serde(default)]
    pub utc_offset_hours: f64,

    /// How recording hours are derived.
    #[serde(default)]
    pub duration: DurationMode,
}

/// Threshold sweep settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Lowest candidate threshold.
    pub grid_min: f64,

    /// Highest candidate threshold.
    pub grid_max: f64,

    /// Number of evenly spaced thresholds.
    pub grid_points: usize,

    /// Report the lowest threshold reaching this precision.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_precision: Option<f64>,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            grid_min: calibration::GRID_MIN,
            grid_max: calibration::GRID_MAX,
            grid_points: calibration::GRID_POINTS,
            target_precision: None,
        }
    }
}

/// Report settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Confidence gate for raw, uncalibrated counts.
    pub global_confidence: f64,

    /// Detections a species needs to count as well sampled.
    pub min_detections: usize,

    /// Medium calibrated precision cutoff.
    pub medium_precision: f64,

    /// High calibrated precision cutoff.
    pub high_precision: f64,

    /// Calibrated precision a species needs to appear in activity reports.
    pub species_precision: f64,

    /// Report file format.
    pub format: ReportFormat,

    /// Start CSV reports with a UTF-8 BOM for spreadsheet software.
    pub csv_bom: bool,

    /// Directory reports are written to.
    pub output_dir: PathBuf,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            global_confidence: report::GLOBAL_CONFIDENCE,
            min_detections: report::MIN_DETECTIONS,
            medium_precision: report::MEDIUM_PRECISION,
            high_precision: report::HIGH_PRECISION,
            species_precision: report::SPECIES_PRECISION,
            format: ReportFormat::Csv,
            csv_bom: false,
            output_dir: PathBuf::from(report::OUTPUT_DIR),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_report_config_default_values() {
        let report = ReportConfig::default();
        assert_eq!(report.global_confidence, 0.8);
        assert_eq!(report.min_detections, 50);
        assert_eq!(report.species_precision, 1.0);
        assert_eq!(report.format, ReportFormat::Csv);
    }

    #[test]
    fn test_dataset_optional_fields_default() {
        let dataset: DatasetConfig = toml::from_str(
            r#"
short_name = "brazil"
name = "Brazil"
minutes_per_file = 1.0
corpus = "data/brazil.parquet"
annotations = "data/brazil_labelled.csv"
"#,
        )
        .unwrap();
        assert!(dataset.site_info.is_none());
        assert_eq!(dataset.utc_offset_hours, 0.0);
        assert_eq!(dataset.duration, DurationMode::Nominal);
    }

    #[test]
    fn test_duration_mode_snake_case() {
        let dataset: DatasetConfig = toml::from_str(
            r#"
short_name = "taiwan"
name = "Taiwan"
minutes_per_file = 5.0
corpus = "taiwan.json"
annotations = "taiwan.csv"
duration = "per_file"
"#,
        )
        .unwrap();
        assert_eq!(dataset.duration, DurationMode::PerFile);
    }
}
