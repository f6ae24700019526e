//! Configuration validation.

use std::collections::HashSet;

use crate::calibration::ThresholdGrid;
use crate::config::{Config, DatasetConfig};
use crate::constants::{confidence, report::MAX_UTC_OFFSET_HOURS};
use crate::error::{Error, Result};

/// Validate the entire configuration.
pub fn validate_config(config: &Config) -> Result<()> {
    validate_calibration(config)?;
    validate_report(config)?;
    validate_datasets(config)?;
    Ok(())
}

fn check_unit_range(field: &str, value: f64) -> Result<()> {
    if (confidence::MIN..=confidence::MAX).contains(&value) {
        Ok(())
    } else {
        Err(Error::ConfigValidation {
            message: format!(
                "{field} must be between {} and {}, got {value}",
                confidence::MIN,
                confidence::MAX
            ),
        })
    }
}

/// Validate threshold sweep settings.
fn validate_calibration(config: &Config) -> Result<()> {
    let calibration = &config.calibration;

    check_unit_range("calibration.grid_min", calibration.grid_min)?;
    check_unit_range("calibration.grid_max", calibration.grid_max)?;
    if let Some(target) = calibration.target_precision {
        check_unit_range("calibration.target_precision", target)?;
    }

    // Surfaces point-count and ordering problems as config errors
    build_grid(config).map(|_| ())
}

/// Validate report settings.
fn validate_report(config: &Config) -> Result<()> {
    let report = &config.report;

    check_unit_range("report.global_confidence", report.global_confidence)?;
    check_unit_range("report.medium_precision", report.medium_precision)?;
    check_unit_range("report.high_precision", report.high_precision)?;
    check_unit_range("report.species_precision", report.species_precision)?;

    if report.medium_precision > report.high_precision {
        return Err(Error::ConfigValidation {
            message: format!(
                "report.medium_precision ({}) must not exceed report.high_precision ({})",
                report.medium_precision, report.high_precision
            ),
        });
    }

    Ok(())
}

/// Validate dataset entries.
fn validate_datasets(config: &Config) -> Result<()> {
    let mut seen = HashSet::new();

    for dataset in &config.datasets {
        if dataset.short_name.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "dataset short_name must not be empty".to_string(),
            });
        }

        if !seen.insert(dataset.short_name.as_str()) {
            return Err(Error::ConfigValidation {
                message: format!("duplicate dataset short_name '{}'", dataset.short_name),
            });
        }

        if dataset.minutes_per_file <= 0.0 {
            return Err(Error::ConfigValidation {
                message: format!(
                    "dataset '{}': minutes_per_file must be positive, got {}",
                    dataset.short_name, dataset.minutes_per_file
                ),
            });
        }

        if dataset.utc_offset_hours.abs() > MAX_UTC_OFFSET_HOURS {
            return Err(Error::ConfigValidation {
                message: format!(
                    "dataset '{}': utc_offset_hours must be within ±{MAX_UTC_OFFSET_HOURS}, got {}",
                    dataset.short_name, dataset.utc_offset_hours
                ),
            });
        }
    }

    Ok(())
}

/// Build the threshold grid described by the `[calibration]` section.
pub fn build_grid(config: &Config) -> Result<ThresholdGrid> {
    let calibration = &config.calibration;
    ThresholdGrid::linspace(
        calibration.grid_min,
        calibration.grid_max,
        calibration.grid_points,
    )
    .map_err(|e| Error::ConfigValidation {
        message: format!("calibration grid: {e}"),
    })
}

/// Get a dataset by short name from the config.
pub fn get_dataset<'a>(config: &'a Config, name: &str) -> Result<&'a DatasetConfig> {
    if config.datasets.is_empty() {
        return Err(Error::NoDatasets);
    }
    config
        .datasets
        .iter()
        .find(|d| d.short_name == name)
        .ok_or_else(|| Error::DatasetNotFound {
            name: name.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::DurationMode;
    use std::path::PathBuf;

    fn dataset(short_name: &str) -> DatasetConfig {
        DatasetConfig {
            short_name: short_name.to_string(),
            name: short_name.to_uppercase(),
            minutes_per_file: 5.0,
            corpus: PathBuf::from("corpus.json"),
            annotations: PathBuf::from("labelled.csv"),
            site_info: None,
            utc_offset_hours: 0.0,
            duration: DurationMode::Nominal,
        }
    }

    #[test]
    fn test_validate_valid_config() {
        let mut config = Config::default();
        config.datasets.push(dataset("norway"));
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_invalid_confidence() {
        let mut config = Config::default();
        config.report.global_confidence = 1.5;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_inverted_grid() {
        let mut config = Config::default();
        config.calibration.grid_min = 0.95;
        config.calibration.grid_max = 0.9;
        let result = validate_config(&config);
        assert!(matches!(result, Err(Error::ConfigValidation { .. })));
    }

    #[test]
    fn test_validate_zero_grid_points() {
        let mut config = Config::default();
        config.calibration.grid_points = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_medium_above_high() {
        let mut config = Config::default();
        config.report.medium_precision = 0.9;
        config.report.high_precision = 0.8;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_duplicate_dataset() {
        let mut config = Config::default();
        config.datasets.push(dataset("taiwan"));
        config.datasets.push(dataset("taiwan"));
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_dataset_fields() {
        let mut config = Config::default();
        let mut bad = dataset("brazil");
        bad.minutes_per_file = 0.0;
        config.datasets.push(bad);
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        let mut bad = dataset("brazil");
        bad.utc_offset_hours = -15.0;
        config.datasets.push(bad);
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_get_dataset() {
        let mut config = Config::default();
        assert!(matches!(get_dataset(&config, "norway"), Err(Error::NoDatasets)));

        config.datasets.push(dataset("norway"));
        assert!(get_dataset(&config, "norway").is_ok());
        assert!(matches!(
            get_dataset(&config, "chile"),
            Err(Error::DatasetNotFound { .. })
        ));
    }

    #[test]
    fn test_build_default_grid() {
        let grid = build_grid(&Config::default());
        assert_eq!(grid.ok(), Some(ThresholdGrid::default()));
    }
}
