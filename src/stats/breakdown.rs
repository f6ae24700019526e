//! Precision tables: raw verdict breakdown and calibrated thresholds.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::calibration::{Calibration, PrecisionEstimate};

/// Verdict proportions for one species over every annotated row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerdictRow {
    /// Species common name.
    pub species: String,
    /// Proportion judged correct.
    pub correct: f64,
    /// Proportion judged unsure.
    pub unsure: f64,
    /// Proportion judged incorrect.
    pub incorrect: f64,
    /// Rows with a recognised verdict.
    pub annotated: usize,
    /// Rows with an unrecognised verdict.
    pub unrecognized: usize,
}

/// Breakdown rows ordered by correct share, then correct plus unsure, then name.
pub fn verdict_rows(breakdown: &BTreeMap<String, PrecisionEstimate>) -> Vec<VerdictRow> {
    let mut rows: Vec<VerdictRow> = breakdown
        .iter()
        .map(|(species, e)| VerdictRow {
            species: species.clone(),
            correct: e.precision,
            unsure: e.unsure_rate,
            incorrect: e.incorrect_rate,
            annotated: e.total,
            unrecognized: e.unrecognized,
        })
        .collect();

    rows.sort_by(|a, b| {
        a.correct
            .total_cmp(&b.correct)
            .then_with(|| (a.correct + a.unsure).total_cmp(&(b.correct + b.unsure)))
            .then_with(|| a.species.cmp(&b.species))
    });
    rows
}

/// How many species sit at the ends of the precision scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PrecisionCounts {
    /// Species considered.
    pub total: usize,
    /// Species with precision exactly 1.
    pub perfect: usize,
    /// Species with precision at or above the medium cutoff.
    pub medium: usize,
    /// Species with precision exactly 0.
    pub zero: usize,
}

/// Count perfect, medium-or-better and zero precisions.
#[allow(clippy::float_cmp)]
pub fn precision_counts(precisions: impl IntoIterator<Item = f64>, medium: f64) -> PrecisionCounts {
    precisions.into_iter().fold(
        PrecisionCounts {
            total: 0,
            perfect: 0,
            medium: 0,
            zero: 0,
        },
        |mut counts, precision| {
            counts.total += 1;
            counts.perfect += usize::from(precision == 1.0);
            counts.medium += usize::from(precision >= medium);
            counts.zero += usize::from(precision == 0.0);
            counts
        },
    )
}

/// One species' calibrated threshold, as reported.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalibratedRow {
    /// Species common name.
    pub species: String,
    /// Selected threshold.
    pub threshold: f64,
    /// Precision at the selected threshold (true-positive share).
    pub precision: f64,
    /// False-positive share at the selected threshold.
    pub false_positive: f64,
    /// Annotated rows behind the estimate.
    pub annotated: usize,
    /// Corpus detections at or above the threshold.
    pub detections: Option<usize>,
    /// Lowest threshold meeting the target precision.
    pub target_threshold: Option<f64>,
    /// Corpus detections at or above the target threshold.
    pub target_detections: Option<usize>,
    /// Target threshold is backed by too few detections.
    pub low_sample: Option<bool>,
}

/// Calibrated species ordered by precision, then name.
pub fn calibrated_rows(calibration: &Calibration) -> Vec<CalibratedRow> {
    let mut rows: Vec<CalibratedRow> = calibration
        .calibrated()
        .iter()
        .map(|(species, c)| CalibratedRow {
            species: species.clone(),
            threshold: c.threshold,
            precision: c.precision,
            false_positive: 1.0 - c.precision,
            annotated: c.annotated,
            detections: c.detections,
            target_threshold: c.target.as_ref().and_then(|t| t.threshold),
            target_detections: c.target.as_ref().and_then(|t| t.detections),
            low_sample: c.target.as_ref().map(|t| t.low_sample),
        })
        .collect();

    rows.sort_by(|a, b| {
        a.precision
            .total_cmp(&b.precision)
            .then_with(|| a.species.cmp(&b.species))
    });
    rows
}

/// One cell of the species by threshold precision grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridRow {
    /// Species common name.
    pub species: String,
    /// Grid threshold.
    pub threshold: f64,
    /// Precision at this threshold; empty when no annotation reaches it.
    pub precision: Option<f64>,
}

/// The full precision grid in long form, species-major.
pub fn precision_grid_rows(calibration: &Calibration) -> Vec<GridRow> {
    let thresholds = calibration.grid().thresholds();
    calibration
        .species()
        .iter()
        .flat_map(|species| {
            let row = calibration.precision_row(species).unwrap_or_default();
            thresholds
                .iter()
                .zip(row)
                .map(move |(&threshold, precision)| GridRow {
                    species: species.clone(),
                    threshold,
                    precision,
                })
        })
        .collect()
}
