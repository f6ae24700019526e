//! Confidence gating of raw detections.

use std::collections::BTreeMap;

use super::{FileDetectionRecord, ValidDetection};

/// Confidence cutoff rule applied to raw detections.
#[derive(Debug, Clone, PartialEq)]
pub enum Gate {
    /// One cutoff for every species.
    Global(f64),
    /// Per-species cutoffs; species without an entry are dropped.
    PerSpecies(BTreeMap<String, f64>),
}

impl Gate {
    /// Threshold that applies to `species`, or `None` when the species is gated out.
    pub fn threshold_for(&self, species: &str) -> Option<f64> {
        match self {
            Self::Global(threshold) => Some(*threshold),
            Self::PerSpecies(thresholds) => thresholds.get(species).copied(),
        }
    }

    /// Whether a detection of `species` at `confidence` passes the gate.
    pub fn admits(&self, species: &str, confidence: f64) -> bool {
        self.threshold_for(species)
            .is_some_and(|threshold| confidence >= threshold)
    }
}

/// Flatten a corpus into the detections that pass `gate`.
///
/// Output keeps corpus order: files in input order, detections in file order.
/// Detections whose offset gives no representable time are skipped; corpora
/// loaded through [`crate::corpus::load_corpus`] never contain them.
pub fn filter(corpus: &[FileDetectionRecord], gate: &Gate) -> Vec<ValidDetection> {
    corpus
        .iter()
        .flat_map(|file| {
            file.detections
                .iter()
                .filter(|raw| gate.admits(&raw.common_name, raw.confidence))
                .filter_map(move |raw| ValidDetection::from_raw(file, raw))
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::detections::RawDetection;
    use chrono::NaiveDate;

    fn raw(species: &str, confidence: f64, offset: f64) -> RawDetection {
        RawDetection {
            common_name: species.to_string(),
            confidence,
            offset_seconds: offset,
        }
    }

    fn file(site: &str, detections: Vec<RawDetection>) -> FileDetectionRecord {
        FileDetectionRecord {
            site: site.to_string(),
            start: NaiveDate::from_ymd_opt(2022, 5, 1)
                .unwrap()
                .and_hms_opt(6, 0, 0)
                .unwrap(),
            lat: None,
            lon: None,
            duration_minutes: 1.0,
            detections,
        }
    }

    #[test]
    fn test_per_species_gate_drops_ungated_species() {
        let corpus = vec![file(
            "A",
            vec![
                raw("Sparrow", 0.80, 0.0),
                raw("Sparrow", 0.90, 3.0),
                raw("Robin", 0.99, 6.0),
            ],
        )];
        let gate = Gate::PerSpecies(BTreeMap::from([("Sparrow".to_string(), 0.85)]));

        let valid = filter(&corpus, &gate);
        assert_eq!(valid.len(), 1);
        assert_eq!(valid[0].common_name, "Sparrow");
        assert!((valid[0].confidence - 0.90).abs() < f64::EPSILON);
    }

    #[test]
    fn test_global_gate_is_inclusive() {
        let corpus = vec![file(
            "A",
            vec![raw("Robin", 0.8, 0.0), raw("Robin", 0.79, 3.0)],
        )];

        let valid = filter(&corpus, &Gate::Global(0.8));
        assert_eq!(valid.len(), 1);
        assert!((valid[0].confidence - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn test_output_order_is_stable() {
        let corpus = vec![
            file("A", vec![raw("Robin", 0.9, 9.0), raw("Wren", 0.9, 3.0)]),
            file("B", vec![raw("Jay", 0.95, 0.0)]),
        ];

        let valid = filter(&corpus, &Gate::Global(0.5));
        let order: Vec<(&str, &str)> = valid
            .iter()
            .map(|d| (d.site.as_str(), d.common_name.as_str()))
            .collect();
        assert_eq!(order, vec![("A", "Robin"), ("A", "Wren"), ("B", "Jay")]);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let corpus = vec![file(
            "A",
            vec![raw("Robin", 0.9, 1.0), raw("Wren", 0.4, 2.0)],
        )];
        let gate = Gate::Global(0.5);

        let first = filter(&corpus, &gate);
        let second = filter(&corpus, &gate);
        assert_eq!(first, second);
    }

    #[test]
    fn test_out_of_range_offset_is_skipped() {
        let corpus = vec![file(
            "A",
            vec![
                raw("Robin", 0.9, 1e15),
                raw("Robin", 0.9, f64::NAN),
                raw("Wren", 0.9, 4.0),
            ],
        )];

        let valid = filter(&corpus, &Gate::Global(0.5));
        assert_eq!(valid.len(), 1);
        assert_eq!(valid[0].common_name, "Wren");
    }

    #[test]
    fn test_empty_corpus_yields_nothing() {
        assert!(filter(&[], &Gate::Global(0.0)).is_empty());
    }
}
