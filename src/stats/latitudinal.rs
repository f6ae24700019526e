//! Day-by-region activity of one species across a latitude gradient.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use super::normalise_by_max;
use crate::detections::ValidDetection;

/// Region name of a site id: its second whitespace token, or the whole id.
pub fn region_of(site: &str) -> &str {
    site.split_whitespace().nth(1).unwrap_or(site)
}

/// Daily detection counts for one region.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionRow {
    /// Region name.
    pub region: String,
    /// Latitude of the region's first detection, if known.
    pub lat: Option<f64>,
    /// Detections per day across the window.
    pub counts: Vec<usize>,
    /// Counts divided by the region's busiest day.
    pub normalised: Vec<f64>,
}

/// Region by day matrix, regions ordered north to south.
#[derive(Debug, Clone, PartialEq)]
pub struct LatitudinalMatrix {
    /// Species the matrix was built for.
    pub species: String,
    /// Every day in the window, inclusive.
    pub days: Vec<NaiveDate>,
    /// Regions with at least one detection in the window.
    pub regions: Vec<RegionRow>,
}

/// One matrix cell, for tabular output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatitudinalRow {
    /// Region name.
    pub region: String,
    /// Region latitude.
    pub lat: Option<f64>,
    /// Calendar day.
    pub day: NaiveDate,
    /// Detections that day.
    pub detections: usize,
    /// Detections divided by the region's busiest day.
    pub normalised: f64,
}

impl LatitudinalMatrix {
    /// Expand into one row per region and day.
    pub fn rows(&self) -> Vec<LatitudinalRow> {
        self.regions
            .iter()
            .flat_map(|region| {
                self.days
                    .iter()
                    .zip(region.counts.iter().zip(&region.normalised))
                    .map(|(&day, (&detections, &normalised))| LatitudinalRow {
                        region: region.region.clone(),
                        lat: region.lat,
                        day,
                        detections,
                        normalised,
                    })
            })
            .collect()
    }
}

/// Count detections of `species` per region and day between `start` and `end`.
///
/// Regions with no known latitude sort after the rest; equal latitudes sort
/// by region name.
#[allow(clippy::cast_precision_loss)]
pub fn latitudinal_arrival(
    detections: &[ValidDetection],
    species: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> LatitudinalMatrix {
    let days: Vec<NaiveDate> = start.iter_days().take_while(|day| *day <= end).collect();

    let mut regions: BTreeMap<&str, RegionRow> = BTreeMap::new();
    for detection in detections.iter().filter(|d| d.common_name == species) {
        let day = detection.detected_at.date();
        if day < start || day > end {
            continue;
        }
        let region = region_of(&detection.site);
        let row = regions.entry(region).or_insert_with(|| RegionRow {
            region: region.to_string(),
            lat: detection.lat,
            counts: vec![0; days.len()],
            normalised: Vec::new(),
        });
        if let Ok(idx) = usize::try_from((day - start).num_days()) {
            row.counts[idx] += 1;
        }
    }

    let mut regions: Vec<RegionRow> = regions
        .into_values()
        .map(|mut row| {
            let counts: Vec<f64> = row.counts.iter().map(|&c| c as f64).collect();
            row.normalised = normalise_by_max(&counts);
            row
        })
        .collect();

    regions.sort_by(|a, b| match (a.lat, b.lat) {
        (Some(x), Some(y)) => y.total_cmp(&x).then_with(|| a.region.cmp(&b.region)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.region.cmp(&b.region),
    });

    LatitudinalMatrix {
        species: species.to_string(),
        days,
        regions,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 5, d).unwrap()
    }

    fn detection(site: &str, lat: Option<f64>, on: NaiveDate) -> ValidDetection {
        let at = on.and_hms_opt(4, 30, 0).unwrap();
        ValidDetection {
            common_name: "Willow Warbler".to_string(),
            confidence: 0.9,
            offset_seconds: 0.0,
            detected_at: at,
            site: site.to_string(),
            file_start: at,
            lat,
            lon: None,
        }
    }

    #[test]
    fn test_region_of() {
        assert_eq!(region_of("NO Tromso 3"), "Tromso");
        assert_eq!(region_of("Bergen"), "Bergen");
    }

    #[test]
    fn test_matrix_orders_north_first_and_normalises_rows() {
        let detections = vec![
            detection("NO Oslo 1", Some(59.9), day(2)),
            detection("NO Oslo 2", Some(59.9), day(2)),
            detection("NO Oslo 1", Some(59.9), day(3)),
            detection("NO Tromso 1", Some(69.6), day(4)),
            detection("NO Tromso 1", Some(69.6), day(20)),
        ];

        let matrix = latitudinal_arrival(&detections, "Willow Warbler", day(1), day(4));
        assert_eq!(matrix.days.len(), 4);
        assert_eq!(matrix.regions.len(), 2);

        let tromso = &matrix.regions[0];
        assert_eq!(tromso.region, "Tromso");
        assert_eq!(tromso.counts, vec![0, 0, 0, 1]);

        let oslo = &matrix.regions[1];
        assert_eq!(oslo.counts, vec![0, 2, 1, 0]);
        assert_eq!(oslo.normalised, vec![0.0, 1.0, 0.5, 0.0]);

        assert_eq!(matrix.rows().len(), 8);
    }

    #[test]
    fn test_other_species_and_empty_window() {
        let mut other = detection("NO Oslo 1", Some(59.9), day(2));
        other.common_name = "Robin".to_string();

        let matrix = latitudinal_arrival(&[other], "Willow Warbler", day(1), day(4));
        assert!(matrix.regions.is_empty());

        let inverted = latitudinal_arrival(&[], "Willow Warbler", day(4), day(1));
        assert!(inverted.days.is_empty());
    }
}
