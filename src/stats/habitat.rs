//! Richness and activity by habitat.
//!
//! Files are attached to habitats through the site join; files from sites
//! without habitat data are left out.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::Serialize;

use super::{mean, median};
use crate::detections::{FileDetectionRecord, Gate};
use crate::sites::SiteJoin;

/// Habitat label as reported. "Grassland" sites are pastures.
pub fn display_habitat(label: &str) -> &str {
    if label == "Grassland" { "Pasture" } else { label }
}

/// Gated detections and richness for one habitat on one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HabitatDay {
    /// Habitat label.
    pub habitat: String,
    /// Calendar day of the file start times.
    pub day: NaiveDate,
    /// Files recorded that day.
    pub files: usize,
    /// Gated detections divided by files.
    pub detections_per_file: f64,
    /// Distinct gated species divided by files.
    pub richness_per_file: f64,
}

/// Richness statistics for one habitat.
#[derive(Debug, Clone, PartialEq)]
pub struct HabitatRichness {
    /// Habitat label.
    pub habitat: String,
    /// Sites in this habitat.
    pub sites: usize,
    /// Per-day figures in date order.
    pub days: Vec<HabitatDay>,
    /// Gated detections in each file.
    pub file_detections: Vec<usize>,
    /// Distinct gated species in each file.
    pub file_richness: Vec<usize>,
}

/// Headline row for one habitat.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HabitatRow {
    /// Habitat label.
    pub habitat: String,
    /// Sites in this habitat.
    pub sites: usize,
    /// Files recorded.
    pub files: usize,
    /// Days with recordings.
    pub days: usize,
    /// Median over days of distinct species per file.
    pub median_daily_richness: f64,
    /// Median over days of detections per file.
    pub median_daily_detections: f64,
    /// Mean detections per file.
    pub mean_file_detections: f64,
    /// Mean distinct species per file.
    pub mean_file_richness: f64,
}

impl HabitatRichness {
    /// Median over days of distinct species per file.
    pub fn median_daily_richness(&self) -> f64 {
        let values: Vec<f64> = self.days.iter().map(|d| d.richness_per_file).collect();
        median(&values).unwrap_or_default()
    }

    /// Headline figures.
    #[allow(clippy::cast_precision_loss)]
    pub fn row(&self) -> HabitatRow {
        let detections: Vec<f64> = self.days.iter().map(|d| d.detections_per_file).collect();
        let file_detections: Vec<f64> = self.file_detections.iter().map(|&n| n as f64).collect();
        let file_richness: Vec<f64> = self.file_richness.iter().map(|&n| n as f64).collect();
        HabitatRow {
            habitat: self.habitat.clone(),
            sites: self.sites,
            files: self.file_detections.len(),
            days: self.days.len(),
            median_daily_richness: self.median_daily_richness(),
            median_daily_detections: median(&detections).unwrap_or_default(),
            mean_file_detections: mean(&file_detections).unwrap_or_default(),
            mean_file_richness: mean(&file_richness).unwrap_or_default(),
        }
    }
}

/// Files grouped by habitat label, with the number of sites per habitat.
fn files_by_habitat<'a>(
    corpus: &'a [FileDetectionRecord],
    join: &SiteJoin,
) -> BTreeMap<String, (usize, Vec<&'a FileDetectionRecord>)> {
    let mut groups: BTreeMap<String, (usize, Vec<&FileDetectionRecord>)> = BTreeMap::new();
    for info in join.sites().values() {
        groups
            .entry(display_habitat(&info.habitat).to_string())
            .or_default()
            .0 += 1;
    }
    for file in corpus {
        if let Some(habitat) = join.habitat_of(&file.site) {
            groups
                .entry(display_habitat(habitat).to_string())
                .or_default()
                .1
                .push(file);
        }
    }
    groups
}

/// Per-habitat richness of gated detections, ordered by median daily richness.
#[allow(clippy::cast_precision_loss)]
pub fn habitat_richness(
    corpus: &[FileDetectionRecord],
    join: &SiteJoin,
    gate: &Gate,
) -> Vec<HabitatRichness> {
    let mut habitats: Vec<HabitatRichness> = files_by_habitat(corpus, join)
        .into_iter()
        .map(|(habitat, (sites, files))| {
            let mut by_day: BTreeMap<NaiveDate, Vec<&FileDetectionRecord>> = BTreeMap::new();
            for file in files {
                by_day.entry(file.start.date()).or_default().push(file);
            }

            let mut days = Vec::with_capacity(by_day.len());
            let mut file_detections = Vec::new();
            let mut file_richness = Vec::new();

            for (day, day_files) in by_day {
                let mut day_species = BTreeSet::new();
                let mut day_detections = 0;
                for file in &day_files {
                    let gated: Vec<&str> = file
                        .detections
                        .iter()
                        .filter(|d| gate.admits(&d.common_name, d.confidence))
                        .map(|d| d.common_name.as_str())
                        .collect();
                    let distinct: BTreeSet<&str> = gated.iter().copied().collect();
                    file_detections.push(gated.len());
                    file_richness.push(distinct.len());
                    day_detections += gated.len();
                    day_species.extend(distinct);
                }
                let n = day_files.len() as f64;
                days.push(HabitatDay {
                    habitat: habitat.clone(),
                    day,
                    files: day_files.len(),
                    detections_per_file: day_detections as f64 / n,
                    richness_per_file: day_species.len() as f64 / n,
                });
            }

            HabitatRichness {
                habitat,
                sites,
                days,
                file_detections,
                file_richness,
            }
        })
        .collect();

    habitats.sort_by(|a, b| a.median_daily_richness().total_cmp(&b.median_daily_richness()));
    habitats
}

/// Detection rates of one species in one habitat.
#[derive(Debug, Clone, PartialEq)]
pub struct HabitatActivity {
    /// Habitat label.
    pub habitat: String,
    /// Sites in this habitat.
    pub sites: usize,
    /// Detections per recorded minute for every site-day.
    pub rates: Vec<f64>,
}

/// Headline activity row for one habitat.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HabitatActivityRow {
    /// Habitat label.
    pub habitat: String,
    /// Sites in this habitat.
    pub sites: usize,
    /// Site-days with recordings.
    pub site_days: usize,
    /// Mean detections per minute over site-days.
    pub mean_rate: f64,
    /// Median detections per minute over site-days.
    pub median_rate: f64,
}

impl HabitatActivity {
    /// Mean rate over site-days.
    pub fn mean_rate(&self) -> f64 {
        mean(&self.rates).unwrap_or_default()
    }

    /// Headline figures.
    pub fn row(&self) -> HabitatActivityRow {
        HabitatActivityRow {
            habitat: self.habitat.clone(),
            sites: self.sites,
            site_days: self.rates.len(),
            mean_rate: self.mean_rate(),
            median_rate: median(&self.rates).unwrap_or_default(),
        }
    }
}

/// Per-habitat site-day detection rates of `species`, ordered by mean rate.
///
/// A site-day's rate is its gated detections of `species` divided by
/// `files × minutes_per_file`.
#[allow(clippy::cast_precision_loss)]
pub fn habitat_activity(
    corpus: &[FileDetectionRecord],
    join: &SiteJoin,
    species: &str,
    gate: &Gate,
    minutes_per_file: f64,
) -> Vec<HabitatActivity> {
    let mut habitats: Vec<HabitatActivity> = files_by_habitat(corpus, join)
        .into_iter()
        .map(|(habitat, (sites, files))| {
            let mut site_days: BTreeMap<(&str, NaiveDate), (usize, usize)> = BTreeMap::new();
            for file in files {
                let hits = file
                    .detections
                    .iter()
                    .filter(|d| d.common_name == species && gate.admits(species, d.confidence))
                    .count();
                let entry = site_days
                    .entry((file.site.as_str(), file.start.date()))
                    .or_default();
                entry.0 += 1;
                entry.1 += hits;
            }

            let rates = site_days
                .values()
                .map(|&(files, hits)| hits as f64 / (files as f64 * minutes_per_file))
                .collect();

            HabitatActivity {
                habitat,
                sites,
                rates,
            }
        })
        .collect();

    habitats.sort_by(|a, b| a.mean_rate().total_cmp(&b.mean_rate()));
    habitats
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::detections::RawDetection;
    use crate::sites::{SiteMetadata, join_sites};

    fn file(site: &str, day: u32, hour: u32, species: &[(&str, f64)]) -> FileDetectionRecord {
        FileDetectionRecord {
            site: site.to_string(),
            start: NaiveDate::from_ymd_opt(2019, 3, day)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
            lat: None,
            lon: None,
            duration_minutes: 1.0,
            detections: species
                .iter()
                .map(|&(name, confidence)| RawDetection {
                    common_name: name.to_string(),
                    confidence,
                    offset_seconds: 0.0,
                })
                .collect(),
        }
    }

    fn metadata(key: &str, habitat: &str) -> SiteMetadata {
        SiteMetadata {
            key: key.to_string(),
            habitat: habitat.to_string(),
            lat: None,
            lon: None,
        }
    }

    fn fixture() -> (Vec<FileDetectionRecord>, SiteJoin) {
        let corpus = vec![
            file("Osa_A-1", 1, 5, &[("Toucan", 0.9), ("Toucan", 0.95), ("Wren", 0.9)]),
            file("Osa_A-1", 1, 6, &[("Toucan", 0.5)]),
            file("Osa_A-1", 2, 5, &[]),
            file("Finca_B-2", 1, 5, &[("Wren", 0.9)]),
            file("Nowhere_C-3", 1, 5, &[("Toucan", 0.99)]),
        ];
        let join = join_sites(
            &corpus,
            &[metadata("osa1", "Forest"), metadata("finca2", "Grassland")],
        );
        (corpus, join)
    }

    #[test]
    fn test_display_habitat() {
        assert_eq!(display_habitat("Grassland"), "Pasture");
        assert_eq!(display_habitat("Forest"), "Forest");
    }

    #[test]
    fn test_habitat_richness() {
        let (corpus, join) = fixture();
        let gate = Gate::Global(0.8);

        let habitats = habitat_richness(&corpus, &join, &gate);
        assert_eq!(habitats.len(), 2);

        let forest = habitats.iter().find(|h| h.habitat == "Forest").unwrap();
        assert_eq!(forest.sites, 1);
        assert_eq!(forest.file_detections, vec![3, 0, 0]);
        assert_eq!(forest.file_richness, vec![2, 0, 0]);
        assert_eq!(forest.days.len(), 2);
        assert!((forest.days[0].detections_per_file - 1.5).abs() < 1e-12);
        assert!((forest.days[0].richness_per_file - 1.0).abs() < 1e-12);
        assert!((forest.median_daily_richness() - 0.5).abs() < 1e-12);

        let pasture = &habitats[1];
        assert_eq!(pasture.habitat, "Pasture");
        assert_eq!(pasture.row().files, 1);
        assert!((pasture.median_daily_richness() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_habitat_activity() {
        let (corpus, join) = fixture();
        let gate = Gate::PerSpecies(BTreeMap::from([("Toucan".to_string(), 0.92)]));

        let habitats = habitat_activity(&corpus, &join, "Toucan", &gate, 1.0);
        assert_eq!(habitats[0].habitat, "Pasture");
        assert_eq!(habitats[0].rates, vec![0.0]);

        let forest = &habitats[1];
        // day 1: one gated toucan over two files; day 2: none
        assert_eq!(forest.rates, vec![0.5, 0.0]);
        let row = forest.row();
        assert_eq!(row.site_days, 2);
        assert!((row.mean_rate - 0.25).abs() < 1e-12);
    }
}
