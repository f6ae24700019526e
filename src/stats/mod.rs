//! Aggregate statistics over filtered detections.
//!
//! Every function here is a pure computation over already-loaded data; the
//! command handlers in `lib.rs` do the loading and writing.

mod breakdown;
mod diurnal;
mod habitat;
mod latitudinal;
mod seasonal;
mod summary;

pub use breakdown::{
    CalibratedRow, GridRow, PrecisionCounts, VerdictRow, calibrated_rows, precision_counts,
    precision_grid_rows, verdict_rows,
};
pub use diurnal::{DiurnalProfile, DiurnalRow, diurnal_profiles};
pub use habitat::{
    HabitatActivity, HabitatActivityRow, HabitatDay, HabitatRichness, HabitatRow,
    display_habitat, habitat_activity, habitat_richness,
};
pub use latitudinal::{LatitudinalMatrix, LatitudinalRow, RegionRow, latitudinal_arrival, region_of};
pub use seasonal::{SeasonalMatrix, SeasonalRow, box_smooth, seasonal_occurrence};
pub use summary::{
    DatasetSummary, DurationMode, SharedSpeciesRow, SummaryOptions, SummaryTotals, TotalsRow,
    summarize_dataset,
};

/// Median of `values`; `None` when empty.
pub(crate) fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some(f64::midpoint(sorted[mid - 1], sorted[mid]))
    } else {
        Some(sorted[mid])
    }
}

/// Arithmetic mean of `values`; `None` when empty.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Divide every value by the maximum. All-zero input stays all zero.
pub(crate) fn normalise_by_max(values: &[f64]) -> Vec<f64> {
    let max = values.iter().copied().fold(0.0_f64, f64::max);
    if max > 0.0 {
        values.iter().map(|v| v / max).collect()
    } else {
        vec![0.0; values.len()]
    }
}

/// `part / whole` as a percentage rounded to a whole number; zero when `whole` is zero.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        (part as f64 / whole as f64 * 100.0).round()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median() {
        assert_eq!(median(&[]), None);
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), Some(2.5));
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[1.0, 2.0, 6.0]), Some(3.0));
    }

    #[test]
    fn test_normalise_by_max() {
        assert_eq!(normalise_by_max(&[1.0, 4.0, 2.0]), vec![0.25, 1.0, 0.5]);
        assert_eq!(normalise_by_max(&[0.0, 0.0]), vec![0.0, 0.0]);
        assert!(normalise_by_max(&[]).is_empty());
    }

    #[test]
    fn test_percentage_guards_zero() {
        assert!((percentage(1, 3) - 33.0).abs() < f64::EPSILON);
        assert!((percentage(5, 0)).abs() < f64::EPSILON);
    }
}
