//! Per-species empirical precision from the annotated sample.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::annotations::{AnnotatedInstance, Verdict};

/// Verdict proportions for one species at one threshold.
///
/// `precision + unsure_rate + incorrect_rate == 1` over the `total`
/// recognised instances. Unrecognised verdicts are counted separately and do
/// not enter the denominator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PrecisionEstimate {
    /// Proportion judged correct.
    pub precision: f64,
    /// Proportion judged unsure.
    pub unsure_rate: f64,
    /// Proportion judged incorrect.
    pub incorrect_rate: f64,
    /// Number of instances with a recognised verdict.
    pub total: usize,
    /// Number of instances whose verdict was not recognised.
    pub unrecognized: usize,
}

#[derive(Debug, Default)]
struct Tally {
    correct: usize,
    unsure: usize,
    incorrect: usize,
    unrecognized: usize,
}

impl Tally {
    fn add(&mut self, verdict: &Verdict) {
        match verdict {
            Verdict::Correct => self.correct += 1,
            Verdict::Unsure => self.unsure += 1,
            Verdict::Incorrect => self.incorrect += 1,
            Verdict::Unrecognized(_) => self.unrecognized += 1,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn into_estimate(self) -> Option<PrecisionEstimate> {
        let total = self.correct + self.unsure + self.incorrect;
        if total == 0 {
            return None;
        }
        let denominator = total as f64;
        Some(PrecisionEstimate {
            precision: self.correct as f64 / denominator,
            unsure_rate: self.unsure as f64 / denominator,
            incorrect_rate: self.incorrect as f64 / denominator,
            total,
            unrecognized: self.unrecognized,
        })
    }
}

/// Estimate per-species precision from annotations with `confidence >= threshold`.
///
/// Species with no recognised verdict at this threshold get no entry.
pub fn estimate(
    annotations: &[AnnotatedInstance],
    threshold: f64,
) -> BTreeMap<String, PrecisionEstimate> {
    let mut tallies: BTreeMap<&str, Tally> = BTreeMap::new();

    for annotation in annotations.iter().filter(|a| a.confidence >= threshold) {
        tallies
            .entry(annotation.common_name.as_str())
            .or_default()
            .add(&annotation.verdict);
    }

    tallies
        .into_iter()
        .filter_map(|(species, tally)| {
            tally
                .into_estimate()
                .map(|estimate| (species.to_string(), estimate))
        })
        .collect()
}

/// Verdict proportions over every annotated instance, regardless of confidence.
pub fn verdict_breakdown(annotations: &[AnnotatedInstance]) -> BTreeMap<String, PrecisionEstimate> {
    estimate(annotations, f64::NEG_INFINITY)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ann(species: &str, confidence: f64, verdict: &str) -> AnnotatedInstance {
        AnnotatedInstance::new(species, confidence, verdict)
    }

    #[test]
    fn test_estimate_proportions() {
        let annotations = vec![
            ann("Robin", 0.9, "yes"),
            ann("Robin", 0.9, "yes"),
            ann("Robin", 0.9, "maybe"),
            ann("Robin", 0.9, "no"),
        ];

        let estimates = estimate(&annotations, 0.8);
        let robin = estimates["Robin"];
        assert!((robin.precision - 0.5).abs() < 1e-12);
        assert!((robin.unsure_rate - 0.25).abs() < 1e-12);
        assert!((robin.incorrect_rate - 0.25).abs() < 1e-12);
        assert_eq!(robin.total, 4);
    }

    #[test]
    fn test_threshold_is_inclusive_and_drops_absent_species() {
        let annotations = vec![ann("Robin", 0.85, "yes"), ann("Wren", 0.84, "yes")];

        let estimates = estimate(&annotations, 0.85);
        assert!(estimates.contains_key("Robin"));
        assert!(!estimates.contains_key("Wren"));
    }

    #[test]
    fn test_empty_subset_yields_no_entries() {
        let annotations = vec![ann("Robin", 0.5, "yes")];
        assert!(estimate(&annotations, 0.9).is_empty());
        assert!(estimate(&[], 0.0).is_empty());
    }

    #[test]
    fn test_unrecognized_verdicts_leave_denominator() {
        let annotations = vec![
            ann("Robin", 0.9, "yes"),
            ann("Robin", 0.9, "no"),
            ann("Robin", 0.9, "unclear"),
        ];

        let robin = estimate(&annotations, 0.0)["Robin"];
        assert_eq!(robin.total, 2);
        assert_eq!(robin.unrecognized, 1);
        assert!((robin.precision - 0.5).abs() < 1e-12);
        let sum = robin.precision + robin.unsure_rate + robin.incorrect_rate;
        assert!((sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_only_unrecognized_yields_no_entry() {
        let annotations = vec![ann("Robin", 0.9, ""), ann("Robin", 0.95, "?")];
        assert!(estimate(&annotations, 0.0).is_empty());
    }

    #[test]
    fn test_verdict_breakdown_uses_every_row() {
        let annotations = vec![ann("Robin", 0.1, "yes"), ann("Robin", 0.99, "no")];
        let robin = verdict_breakdown(&annotations)["Robin"];
        assert_eq!(robin.total, 2);
    }
}
