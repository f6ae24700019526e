//! Hour-of-day activity profiles.

use chrono::{FixedOffset, Timelike};
use serde::Serialize;

use super::normalise_by_max;
use crate::constants::report::HOURS_PER_DAY;
use crate::detections::ValidDetection;

/// Normalised hourly activity for one species.
#[derive(Debug, Clone, PartialEq)]
pub struct DiurnalProfile {
    /// Species common name.
    pub species: String,
    /// Detections counted.
    pub detections: usize,
    /// Local hour with the most detections (earliest on ties).
    pub peak_hour: usize,
    /// Detections per local hour divided by the busiest hour.
    pub activity: Vec<f64>,
}

/// One hour of one profile, for tabular output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiurnalRow {
    /// Species common name.
    pub species: String,
    /// Local hour of day.
    pub hour: usize,
    /// Normalised activity.
    pub activity: f64,
    /// Peak hour of the species.
    pub peak_hour: usize,
}

impl DiurnalProfile {
    /// Expand into one row per hour.
    pub fn rows(&self) -> impl Iterator<Item = DiurnalRow> + '_ {
        self.activity.iter().enumerate().map(|(hour, &activity)| DiurnalRow {
            species: self.species.clone(),
            hour,
            activity,
            peak_hour: self.peak_hour,
        })
    }
}

/// Hourly histograms of `detections` for each of `species`.
///
/// Detection times are recorder clock times taken as UTC and shifted by
/// `offset`. Profiles are ordered by peak hour, latest first.
#[allow(clippy::cast_precision_loss)]
pub fn diurnal_profiles(
    detections: &[ValidDetection],
    species: &[&str],
    offset: FixedOffset,
) -> Vec<DiurnalProfile> {
    let mut profiles: Vec<DiurnalProfile> = species
        .iter()
        .map(|&name| {
            let mut histogram = vec![0_usize; HOURS_PER_DAY];
            for detection in detections.iter().filter(|d| d.common_name == name) {
                let local = detection.detected_at.and_utc().with_timezone(&offset);
                histogram[local.hour() as usize] += 1;
            }

            let peak_hour = histogram
                .iter()
                .enumerate()
                .fold((0, 0), |best, (hour, &count)| {
                    if count > best.1 { (hour, count) } else { best }
                })
                .0;
            let counts: Vec<f64> = histogram.iter().map(|&c| c as f64).collect();

            DiurnalProfile {
                species: name.to_string(),
                detections: histogram.iter().sum(),
                peak_hour,
                activity: normalise_by_max(&counts),
            }
        })
        .collect();

    profiles.sort_by(|a, b| {
        b.peak_hour
            .cmp(&a.peak_hour)
            .then_with(|| a.species.cmp(&b.species))
    });
    profiles
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn detection(species: &str, hour: u32) -> ValidDetection {
        let at = NaiveDate::from_ymd_opt(2021, 8, 10)
            .unwrap()
            .and_hms_opt(hour, 15, 0)
            .unwrap();
        ValidDetection {
            common_name: species.to_string(),
            confidence: 0.9,
            offset_seconds: 0.0,
            detected_at: at,
            site: "BR 1".to_string(),
            file_start: at,
            lat: None,
            lon: None,
        }
    }

    #[test]
    fn test_profile_is_shifted_and_normalised() {
        let detections = vec![
            detection("Thrush", 9),
            detection("Thrush", 9),
            detection("Thrush", 12),
            detection("Owl", 2),
        ];
        let offset = FixedOffset::west_opt(3 * 3600).unwrap();

        let profiles = diurnal_profiles(&detections, &["Thrush", "Owl"], offset);
        assert_eq!(profiles.len(), 2);

        // 02:00 UTC is 23:00 the previous day, so the owl peaks latest
        let owl = &profiles[0];
        assert_eq!(owl.species, "Owl");
        assert_eq!(owl.peak_hour, 23);
        assert_eq!(owl.rows().count(), 24);

        let thrush = &profiles[1];
        assert_eq!(thrush.species, "Thrush");
        assert_eq!(thrush.peak_hour, 6);
        assert_eq!(thrush.detections, 3);
        assert!((thrush.activity[6] - 1.0).abs() < 1e-12);
        assert!((thrush.activity[9] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_species_without_detections_is_all_zero() {
        let offset = FixedOffset::east_opt(0).unwrap();
        let profiles = diurnal_profiles(&[], &["Ghost"], offset);
        assert_eq!(profiles[0].detections, 0);
        assert_eq!(profiles[0].peak_hour, 0);
        assert!(profiles[0].activity.iter().all(|&a| a.abs() < f64::EPSILON));
    }
}
