//! Per-dataset summary and cross-dataset totals.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::percentage;
use crate::calibration::Calibration;
use crate::constants::report::EPOCH_YEAR;
use crate::detections::{FileDetectionRecord, Gate, filter};

/// How recording hours are derived for a dataset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationMode {
    /// Nominal minutes per file times the number of files, rounded to whole hours.
    #[default]
    Nominal,
    /// Sum of each file's own duration.
    PerFile,
}

/// Thresholds applied while summarising.
#[derive(Debug, Clone, Copy)]
pub struct SummaryOptions {
    /// Global confidence gate for raw counts.
    pub global_confidence: f64,
    /// Detections a species needs to count as well sampled.
    pub min_detections: usize,
    /// Medium calibrated precision cutoff.
    pub medium_precision: f64,
    /// High calibrated precision cutoff.
    pub high_precision: f64,
    /// Nominal file length in minutes.
    pub minutes_per_file: f64,
    /// How recording hours are computed.
    pub duration: DurationMode,
}

/// Headline numbers for one dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    /// Dataset short name.
    pub dataset: String,
    /// Number of audio files.
    pub files: usize,
    /// Number of distinct sites.
    pub sites: usize,
    /// Recording hours.
    pub hours: f64,
    /// Earliest file start date with a set clock.
    pub first_day: Option<NaiveDate>,
    /// Latest file start date with a set clock.
    pub last_day: Option<NaiveDate>,
    /// Distinct species at the global gate.
    pub species: usize,
    /// Detections at the global gate.
    pub detections: usize,
    /// Species with at least the minimum number of detections.
    pub well_sampled_species: usize,
    /// Detections belonging to well-sampled species.
    pub well_sampled_detections: usize,
    /// Species calibrated at or above medium precision.
    pub medium_precision_species: usize,
    /// Species calibrated at or above high precision.
    pub high_precision_species: usize,
    /// Detections of high-precision species.
    pub high_precision_detections: usize,
    /// Share of detections belonging to high-precision species, in whole percent.
    pub high_precision_percent: f64,
    #[serde(skip)]
    species_names: BTreeSet<String>,
    #[serde(skip)]
    well_sampled_names: BTreeSet<String>,
    #[serde(skip)]
    medium_names: BTreeSet<String>,
    #[serde(skip)]
    high_names: BTreeSet<String>,
}

/// Summarise one dataset's corpus and calibration.
pub fn summarize_dataset(
    dataset: &str,
    corpus: &[FileDetectionRecord],
    calibration: &Calibration,
    options: &SummaryOptions,
) -> DatasetSummary {
    let valid = filter(corpus, &Gate::Global(options.global_confidence));

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for detection in &valid {
        *counts.entry(detection.common_name.as_str()).or_default() += 1;
    }

    let well_sampled_names: BTreeSet<String> = counts
        .iter()
        .filter(|&(_, &n)| n >= options.min_detections)
        .map(|(name, _)| (*name).to_string())
        .collect();
    let well_sampled_detections = counts
        .iter()
        .filter(|&(_, &n)| n >= options.min_detections)
        .map(|(_, n)| n)
        .sum();

    let medium_names: BTreeSet<String> = calibration
        .allowed_species(options.medium_precision)
        .into_iter()
        .map(str::to_string)
        .collect();
    let high_names: BTreeSet<String> = calibration
        .allowed_species(options.high_precision)
        .into_iter()
        .map(str::to_string)
        .collect();
    let high_precision_detections = valid
        .iter()
        .filter(|d| high_names.contains(&d.common_name))
        .count();

    let clocked_days: Vec<NaiveDate> = corpus
        .iter()
        .map(|f| f.start.date())
        .filter(|day| day.year() > EPOCH_YEAR)
        .collect();

    DatasetSummary {
        dataset: dataset.to_string(),
        files: corpus.len(),
        sites: corpus.iter().map(|f| f.site.as_str()).collect::<BTreeSet<_>>().len(),
        hours: recording_hours(corpus, options),
        first_day: clocked_days.iter().min().copied(),
        last_day: clocked_days.iter().max().copied(),
        species: counts.len(),
        detections: valid.len(),
        well_sampled_species: well_sampled_names.len(),
        well_sampled_detections,
        medium_precision_species: medium_names.len(),
        high_precision_species: high_names.len(),
        high_precision_detections,
        high_precision_percent: percentage(high_precision_detections, valid.len()),
        species_names: counts.keys().map(|name| (*name).to_string()).collect(),
        well_sampled_names,
        medium_names,
        high_names,
    }
}

#[allow(clippy::cast_precision_loss)]
fn recording_hours(corpus: &[FileDetectionRecord], options: &SummaryOptions) -> f64 {
    match options.duration {
        DurationMode::Nominal => (options.minutes_per_file * corpus.len() as f64 / 60.0).round(),
        DurationMode::PerFile => corpus.iter().map(|f| f.duration_minutes).sum::<f64>() / 60.0,
    }
}

/// Running totals folded over dataset summaries.
#[derive(Debug, Clone, Default)]
pub struct SummaryTotals {
    datasets: usize,
    hours: f64,
    sites: usize,
    detections: usize,
    well_sampled_detections: usize,
    high_precision_detections: usize,
    species: BTreeMap<String, usize>,
    well_sampled: BTreeMap<String, usize>,
    medium: BTreeMap<String, usize>,
    high: BTreeMap<String, usize>,
}

/// Flattened totals for reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TotalsRow {
    /// Datasets folded in.
    pub datasets: usize,
    /// Recording hours.
    pub hours: f64,
    /// Sites, summed per dataset.
    pub sites: usize,
    /// Distinct species across datasets.
    pub species: usize,
    /// Distinct well-sampled species across datasets.
    pub well_sampled_species: usize,
    /// Detections at the global gate.
    pub detections: usize,
    /// Detections of well-sampled species.
    pub well_sampled_detections: usize,
    /// Distinct medium-precision species across datasets.
    pub medium_precision_species: usize,
    /// Distinct high-precision species across datasets.
    pub high_precision_species: usize,
    /// Detections of high-precision species.
    pub high_precision_detections: usize,
}

/// A species found in more than one dataset within a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SharedSpeciesRow {
    /// `well_sampled`, `medium_precision` or `high_precision`.
    pub category: &'static str,
    /// Species common name.
    pub species: String,
    /// Number of datasets it appears in.
    pub datasets: usize,
}

impl SummaryTotals {
    /// Fold one dataset into the totals.
    #[must_use]
    pub fn add(mut self, summary: &DatasetSummary) -> Self {
        fn tally(into: &mut BTreeMap<String, usize>, names: &BTreeSet<String>) {
            for name in names {
                *into.entry(name.clone()).or_default() += 1;
            }
        }

        self.datasets += 1;
        self.hours += summary.hours;
        self.sites += summary.sites;
        self.detections += summary.detections;
        self.well_sampled_detections += summary.well_sampled_detections;
        self.high_precision_detections += summary.high_precision_detections;
        tally(&mut self.species, &summary.species_names);
        tally(&mut self.well_sampled, &summary.well_sampled_names);
        tally(&mut self.medium, &summary.medium_names);
        tally(&mut self.high, &summary.high_names);
        self
    }

    /// Totals as a single report row.
    pub fn row(&self) -> TotalsRow {
        TotalsRow {
            datasets: self.datasets,
            hours: self.hours,
            sites: self.sites,
            species: self.species.len(),
            well_sampled_species: self.well_sampled.len(),
            detections: self.detections,
            well_sampled_detections: self.well_sampled_detections,
            medium_precision_species: self.medium.len(),
            high_precision_species: self.high.len(),
            high_precision_detections: self.high_precision_detections,
        }
    }

    /// Species seen in more than one dataset, per category.
    pub fn shared_species(&self) -> Vec<SharedSpeciesRow> {
        [
            ("well_sampled", &self.well_sampled),
            ("medium_precision", &self.medium),
            ("high_precision", &self.high),
        ]
        .into_iter()
        .flat_map(|(category, counts)| {
            counts
                .iter()
                .filter(|&(_, &n)| n > 1)
                .map(move |(species, &datasets)| SharedSpeciesRow {
                    category,
                    species: species.clone(),
                    datasets,
                })
        })
        .collect()
    }
}

impl<'a> FromIterator<&'a DatasetSummary> for SummaryTotals {
    fn from_iter<I: IntoIterator<Item = &'a DatasetSummary>>(iter: I) -> Self {
        iter.into_iter().fold(Self::default(), Self::add)
    }
}
