//! Smoothed species occurrence through the season.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::Serialize;

use crate::detections::ValidDetection;

/// Species by day occurrence, smoothed and scaled to the global maximum.
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonalMatrix {
    /// Days with at least one detection of any listed species, ascending.
    pub days: Vec<NaiveDate>,
    /// Species in row order.
    pub species: Vec<String>,
    /// Smoothed occurrence, one row per species.
    pub occurrence: Vec<Vec<f64>>,
}

/// One matrix cell, for tabular output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonalRow {
    /// Species common name.
    pub species: String,
    /// Calendar day.
    pub day: NaiveDate,
    /// Smoothed, scaled occurrence.
    pub occurrence: f64,
}

impl SeasonalMatrix {
    /// Expand into one row per species and day.
    pub fn rows(&self) -> Vec<SeasonalRow> {
        self.species
            .iter()
            .zip(&self.occurrence)
            .flat_map(|(species, row)| {
                self.days.iter().zip(row).map(|(&day, &occurrence)| SeasonalRow {
                    species: species.clone(),
                    day,
                    occurrence,
                })
            })
            .collect()
    }
}

/// Centred moving sum of width `window`, same length as the input.
///
/// Matches a "same"-mode convolution with a box kernel: for odd widths the
/// window is symmetric, for even widths it reaches one further back.
pub fn box_smooth(values: &[f64], window: usize) -> Vec<f64> {
    if window == 0 {
        return vec![0.0; values.len()];
    }
    let back = window / 2;
    let ahead = window - 1 - back;
    (0..values.len())
        .map(|i| {
            let lo = i.saturating_sub(back);
            let hi = (i + ahead).min(values.len() - 1);
            values[lo..=hi].iter().sum()
        })
        .collect()
}

/// Binary occurrence of each species on each observed day, smoothed over
/// `window` days and divided by the largest smoothed value.
pub fn seasonal_occurrence(
    detections: &[ValidDetection],
    species: &[&str],
    window: usize,
) -> SeasonalMatrix {
    let wanted: BTreeSet<&str> = species.iter().copied().collect();
    let mut seen: BTreeMap<&str, BTreeSet<NaiveDate>> = BTreeMap::new();
    let mut days: BTreeSet<NaiveDate> = BTreeSet::new();

    for detection in detections {
        let name = detection.common_name.as_str();
        if wanted.contains(name) {
            let day = detection.detected_at.date();
            days.insert(day);
            seen.entry(name).or_default().insert(day);
        }
    }

    let days: Vec<NaiveDate> = days.into_iter().collect();
    let smoothed: Vec<Vec<f64>> = species
        .iter()
        .map(|name| {
            let present = seen.get(name);
            let row: Vec<f64> = days
                .iter()
                .map(|day| {
                    if present.is_some_and(|set| set.contains(day)) { 1.0 } else { 0.0 }
                })
                .collect();
            box_smooth(&row, window)
        })
        .collect();

    let max = smoothed.iter().flatten().copied().fold(0.0_f64, f64::max);
    let occurrence = if max > 0.0 {
        smoothed
            .into_iter()
            .map(|row| row.into_iter().map(|v| v / max).collect())
            .collect()
    } else {
        smoothed
    };

    SeasonalMatrix {
        days,
        species: species.iter().map(|s| (*s).to_string()).collect(),
        occurrence,
    }
}
