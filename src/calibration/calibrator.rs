//! Per-species threshold calibration.
//!
//! Sweeps a [`ThresholdGrid`] through the precision estimator and picks, for
//! every species annotated at the lowest threshold, the threshold with the
//! highest precision. Ties go to the lowest threshold.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::{debug, info};

use super::{PrecisionEstimate, ThresholdGrid, estimate};
use crate::annotations::AnnotatedInstance;
use crate::constants::calibration::THRESHOLD_DECIMALS;
use crate::detections::{FileDetectionRecord, Gate};

/// Calibrated threshold for one species.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeciesCalibration {
    /// Selected threshold, rounded to three decimals.
    pub threshold: f64,
    /// Precision measured at the selected threshold.
    pub precision: f64,
    /// Annotated instances behind that precision.
    pub annotated: usize,
    /// Corpus detections at or above the threshold, once a corpus is attached.
    pub detections: Option<usize>,
    /// Target-precision report, when a target was requested.
    pub target: Option<TargetReport>,
}

/// Where a species first reaches the requested precision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetReport {
    /// Lowest grid threshold reaching the target, if any.
    pub threshold: Option<f64>,
    /// Corpus detections at or above that threshold, once a corpus is attached.
    pub detections: Option<usize>,
    /// Fewer than the minimum number of corpus detections back this threshold.
    pub low_sample: bool,
}

/// Result of a calibration sweep.
#[derive(Debug, Clone)]
pub struct Calibration {
    grid: ThresholdGrid,
    species: BTreeSet<String>,
    cells: BTreeMap<String, Vec<Option<PrecisionEstimate>>>,
    calibrated: BTreeMap<String, SpeciesCalibration>,
    uncalibrated: Vec<String>,
    target_precision: Option<f64>,
}

/// Run the threshold sweep over `annotations`.
///
/// The species universe is every species annotated at or above the grid's
/// lowest threshold. A species whose row holds no estimate at all, because
/// none of its verdicts there is recognised, is listed in
/// [`Calibration::uncalibrated`] instead of receiving a threshold.
pub fn calibrate(
    annotations: &[AnnotatedInstance],
    grid: &ThresholdGrid,
    target_precision: Option<f64>,
) -> Calibration {
    let columns: Vec<BTreeMap<String, PrecisionEstimate>> = grid
        .thresholds()
        .iter()
        .map(|&threshold| estimate(annotations, threshold))
        .collect();

    let species: BTreeSet<String> = annotations
        .iter()
        .filter(|a| a.confidence >= grid.lowest())
        .map(|a| a.common_name.clone())
        .collect();

    let cells: BTreeMap<String, Vec<Option<PrecisionEstimate>>> = species
        .iter()
        .map(|name| {
            let row = columns.iter().map(|column| column.get(name).copied()).collect();
            (name.clone(), row)
        })
        .collect();

    let mut calibrated = BTreeMap::new();
    let mut uncalibrated = Vec::new();

    for (name, row) in &cells {
        let Some((best, at_best)) = first_maximum(row) else {
            uncalibrated.push(name.clone());
            continue;
        };

        let target = target_precision.map(|target| TargetReport {
            threshold: row
                .iter()
                .position(|cell| cell.is_some_and(|e| e.precision >= target))
                .map(|idx| round_threshold(grid.thresholds()[idx])),
            detections: None,
            low_sample: false,
        });

        let calibration = SpeciesCalibration {
            threshold: round_threshold(grid.thresholds()[best]),
            precision: at_best.precision,
            annotated: at_best.total,
            detections: None,
            target,
        };
        debug!(
            "{name}: threshold {:.3}, precision {:.3} ({} annotated)",
            calibration.threshold, calibration.precision, calibration.annotated
        );
        calibrated.insert(name.clone(), calibration);
    }

    info!(
        "Calibrated {} species over {} thresholds ({} uncalibrated)",
        calibrated.len(),
        grid.len(),
        uncalibrated.len()
    );

    Calibration {
        grid: grid.clone(),
        species,
        cells,
        calibrated,
        uncalibrated,
        target_precision,
    }
}

/// First maximum among populated cells, scanning ascending.
fn first_maximum(row: &[Option<PrecisionEstimate>]) -> Option<(usize, PrecisionEstimate)> {
    let mut best: Option<(usize, PrecisionEstimate)> = None;
    for (idx, cell) in row.iter().enumerate() {
        if let Some(estimate) = cell
            && best.is_none_or(|(_, top)| estimate.precision > top.precision)
        {
            best = Some((idx, *estimate));
        }
    }
    best
}

fn round_threshold(threshold: f64) -> f64 {
    let scale = 10f64.powi(THRESHOLD_DECIMALS);
    (threshold * scale).round() / scale
}

impl Calibration {
    /// Grid the sweep ran over.
    pub fn grid(&self) -> &ThresholdGrid {
        &self.grid
    }

    /// Species universe in sorted order.
    pub fn species(&self) -> &BTreeSet<String> {
        &self.species
    }

    /// Calibrated species and their thresholds.
    pub fn calibrated(&self) -> &BTreeMap<String, SpeciesCalibration> {
        &self.calibrated
    }

    /// Species that never produced an estimate on the grid.
    pub fn uncalibrated(&self) -> &[String] {
        &self.uncalibrated
    }

    /// Target precision requested for this sweep.
    pub fn target_precision(&self) -> Option<f64> {
        self.target_precision
    }

    /// Precision of `species` at every grid threshold; `None` where unobserved.
    pub fn precision_row(&self, species: &str) -> Option<Vec<Option<f64>>> {
        self.cells
            .get(species)
            .map(|row| row.iter().map(|cell| cell.map(|e| e.precision)).collect())
    }

    /// Calibration for a single species.
    pub fn get(&self, species: &str) -> Option<&SpeciesCalibration> {
        self.calibrated.get(species)
    }

    /// Species whose calibrated precision is at least `min_precision`.
    pub fn allowed_species(&self, min_precision: f64) -> Vec<&str> {
        self.calibrated
            .iter()
            .filter(|(_, c)| c.precision >= min_precision)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Per-species gate built from the calibrated thresholds.
    ///
    /// With `min_precision`, species below that precision are left out of the
    /// gate and therefore dropped by the filter.
    pub fn gate(&self, min_precision: Option<f64>) -> Gate {
        Gate::PerSpecies(
            self.calibrated
                .iter()
                .filter(|(_, c)| min_precision.is_none_or(|min| c.precision >= min))
                .map(|(name, c)| (name.clone(), c.threshold))
                .collect(),
        )
    }

    /// Attach corpus detection counts under each species' thresholds.
    ///
    /// Returns a new calibration; species whose target threshold is backed by
    /// fewer than `min_detections` corpus detections are flagged `low_sample`.
    #[must_use]
    pub fn with_corpus(&self, corpus: &[FileDetectionRecord], min_detections: usize) -> Self {
        let mut confidences: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
        for detection in corpus.iter().flat_map(|file| &file.detections) {
            if self.calibrated.contains_key(&detection.common_name) {
                confidences
                    .entry(detection.common_name.as_str())
                    .or_default()
                    .push(detection.confidence);
            }
        }

        let count_at = |species: &str, threshold: f64| {
            confidences
                .get(species)
                .map_or(0, |values| values.iter().filter(|&&c| c >= threshold).count())
        };

        let calibrated = self
            .calibrated
            .iter()
            .map(|(name, calibration)| {
                let target = calibration.target.as_ref().map(|target| {
                    let detections = target.threshold.map(|t| count_at(name, t));
                    TargetReport {
                        threshold: target.threshold,
                        detections,
                        low_sample: detections.is_some_and(|n| n < min_detections),
                    }
                });
                let updated = SpeciesCalibration {
                    detections: Some(count_at(name, calibration.threshold)),
                    target,
                    ..calibration.clone()
                };
                (name.clone(), updated)
            })
            .collect();

        Self {
            calibrated,
            ..self.clone()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::detections::RawDetection;
    use chrono::NaiveDate;

    fn ann(species: &str, confidence: f64, verdict: &str) -> AnnotatedInstance {
        AnnotatedInstance::new(species, confidence, verdict)
    }

    fn repeat(species: &str, confidence: f64, yes: usize, no: usize) -> Vec<AnnotatedInstance> {
        let mut rows = vec![ann(species, confidence, "yes"); yes];
        rows.extend(vec![ann(species, confidence, "no"); no]);
        rows
    }

    #[test]
    fn test_first_maximum_prefers_lowest_threshold() {
        let cell = |p: f64| {
            Some(PrecisionEstimate {
                precision: p,
                unsure_rate: 0.0,
                incorrect_rate: 1.0 - p,
                total: 10,
                unrecognized: 0,
            })
        };
        let index = |row: &[Option<PrecisionEstimate>]| first_maximum(row).map(|(idx, _)| idx);
        let row = vec![cell(0.5), cell(0.7), cell(0.7), cell(0.3)];
        assert_eq!(index(&row), Some(1));
        assert_eq!(index(&[None, None]), None);
        assert_eq!(index(&[None, cell(0.2)]), Some(1));
    }

    #[test]
    fn test_round_threshold() {
        assert!((round_threshold(0.810_000_000_1) - 0.81).abs() < 1e-12);
        assert!((round_threshold(0.9449) - 0.945).abs() < 1e-12);
    }

    #[test]
    fn test_calibrate_picks_best_threshold() {
        let mut annotations = repeat("Wren", 0.82, 0, 5);
        annotations.extend(repeat("Wren", 0.95, 5, 0));
        let grid = ThresholdGrid::new(vec![0.8, 0.9]).unwrap();

        let calibration = calibrate(&annotations, &grid, None);
        let wren = calibration.get("Wren").unwrap();
        assert!((wren.threshold - 0.9).abs() < 1e-12);
        assert!((wren.precision - 1.0).abs() < 1e-12);
        assert_eq!(wren.annotated, 5);
        assert!(wren.detections.is_none());
    }

    #[test]
    fn test_species_annotated_below_grid_is_outside_universe() {
        let annotations = vec![ann("Robin", 0.95, "yes"), ann("Jay", 0.5, "yes")];
        let grid = ThresholdGrid::new(vec![0.8, 0.9]).unwrap();

        let calibration = calibrate(&annotations, &grid, None);
        assert!(calibration.get("Jay").is_none());
        assert!(!calibration.species().contains("Jay"));
        assert!(calibration.get("Robin").is_some());
    }

    #[test]
    fn test_only_unrecognized_rows_are_uncalibrated() {
        let annotations = vec![ann("Robin", 0.95, "yes"), ann("Owl", 0.95, "??")];
        let grid = ThresholdGrid::new(vec![0.8]).unwrap();

        let calibration = calibrate(&annotations, &grid, None);
        assert!(calibration.get("Owl").is_none());
        assert!(calibration.species().contains("Owl"));
        assert_eq!(calibration.uncalibrated(), ["Owl".to_string()]);
        assert_eq!(calibration.precision_row("Owl"), Some(vec![None]));
        assert_eq!(calibration.calibrated().len(), 1);
    }

    #[test]
    fn test_precision_row_marks_unobserved_cells() {
        let annotations = vec![ann("Robin", 0.85, "yes")];
        let grid = ThresholdGrid::new(vec![0.8, 0.9]).unwrap();

        let calibration = calibrate(&annotations, &grid, None);
        assert_eq!(calibration.precision_row("Robin"), Some(vec![Some(1.0), None]));
        assert!(calibration.precision_row("Jay").is_none());
    }

    #[test]
    fn test_gate_respects_min_precision() {
        let mut annotations = repeat("Robin", 0.9, 1, 1);
        annotations.extend(repeat("Wren", 0.9, 2, 0));
        let grid = ThresholdGrid::new(vec![0.8]).unwrap();
        let calibration = calibrate(&annotations, &grid, None);

        let Gate::PerSpecies(all) = calibration.gate(None) else {
            panic!("calibration gate must be per-species");
        };
        assert_eq!(all.len(), 2);

        let Gate::PerSpecies(strict) = calibration.gate(Some(1.0)) else {
            panic!("calibration gate must be per-species");
        };
        assert_eq!(strict.keys().collect::<Vec<_>>(), vec!["Wren"]);
        assert_eq!(calibration.allowed_species(1.0), vec!["Wren"]);
    }

    #[test]
    fn test_target_threshold_and_corpus_counts() {
        let mut annotations = repeat("Robin", 0.82, 1, 3);
        annotations.extend(repeat("Robin", 0.92, 4, 1));
        annotations.extend(repeat("Robin", 0.97, 3, 0));
        let grid = ThresholdGrid::new(vec![0.8, 0.9, 0.95]).unwrap();

        let calibration = calibrate(&annotations, &grid, Some(0.75));
        let robin = calibration.get("Robin").unwrap();
        // 0.80: 8/12, 0.90: 7/8, 0.95: 3/3
        assert!((robin.threshold - 0.95).abs() < 1e-12);
        let target = robin.target.as_ref().unwrap();
        assert_eq!(target.threshold, Some(0.9));

        let start = NaiveDate::from_ymd_opt(2022, 5, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let corpus = vec![FileDetectionRecord {
            site: "A".to_string(),
            start,
            lat: None,
            lon: None,
            duration_minutes: 1.0,
            detections: [0.85, 0.91, 0.96, 0.99]
                .iter()
                .map(|&confidence| RawDetection {
                    common_name: "Robin".to_string(),
                    confidence,
                    offset_seconds: 0.0,
                })
                .collect(),
        }];

        let counted = calibration.with_corpus(&corpus, 3);
        let robin = counted.get("Robin").unwrap();
        assert_eq!(robin.detections, Some(2));
        let target = robin.target.as_ref().unwrap();
        assert_eq!(target.detections, Some(3));
        assert!(!target.low_sample);

        let sparse = calibration.with_corpus(&corpus, 10);
        assert!(sparse.get("Robin").unwrap().target.as_ref().unwrap().low_sample);

        // the original calibration is untouched
        assert!(calibration.get("Robin").unwrap().detections.is_none());
    }

    #[test]
    fn test_unmet_target_has_no_threshold() {
        let annotations = repeat("Robin", 0.9, 1, 1);
        let grid = ThresholdGrid::new(vec![0.8]).unwrap();

        let calibration = calibrate(&annotations, &grid, Some(0.9));
        let target = calibration.get("Robin").unwrap().target.clone().unwrap();
        assert!(target.threshold.is_none());
        assert!(!target.low_sample);
    }

    #[test]
    fn test_empty_annotations_produce_empty_calibration() {
        let calibration = calibrate(&[], &ThresholdGrid::default(), None);
        assert!(calibration.calibrated().is_empty());
        assert!(calibration.uncalibrated().is_empty());
        assert!(calibration.species().is_empty());
    }
}
