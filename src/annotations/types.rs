//! Annotation type definitions.

use serde::Serialize;

/// Human verdict on a single detection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// Reviewer confirmed the species identification ("yes").
    Correct,
    /// Reviewer could not decide ("maybe").
    Unsure,
    /// Reviewer rejected the identification ("no").
    Incorrect,
    /// Free text outside the recognised vocabulary, kept verbatim.
    Unrecognized(String),
}

impl Verdict {
    /// Normalise a verdict cell: trimmed, case-insensitive `yes`/`maybe`/`no`.
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();
        match trimmed.to_lowercase().as_str() {
            "yes" => Self::Correct,
            "maybe" => Self::Unsure,
            "no" => Self::Incorrect,
            _ => Self::Unrecognized(trimmed.to_string()),
        }
    }

    /// Whether the verdict is one of the three recognised buckets.
    pub const fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Correct => write!(f, "yes"),
            Self::Unsure => write!(f, "maybe"),
            Self::Incorrect => write!(f, "no"),
            Self::Unrecognized(text) => write!(f, "{text}"),
        }
    }
}

/// One row of human review.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedInstance {
    /// Species common name.
    pub common_name: String,
    /// Classifier confidence when the clip was annotated.
    pub confidence: f64,
    /// Reviewer verdict.
    pub verdict: Verdict,
}

impl AnnotatedInstance {
    /// Create an annotated instance from a raw verdict string.
    pub fn new(common_name: impl Into<String>, confidence: f64, verdict: &str) -> Self {
        Self {
            common_name: common_name.into(),
            confidence,
            verdict: Verdict::parse(verdict),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_parse_is_case_insensitive_and_trimmed() {
        assert_eq!(Verdict::parse("Yes"), Verdict::Correct);
        assert_eq!(Verdict::parse("  MAYBE "), Verdict::Unsure);
        assert_eq!(Verdict::parse("no\n"), Verdict::Incorrect);
    }

    #[test]
    fn test_verdict_parse_keeps_unknown_text() {
        assert_eq!(
            Verdict::parse(" probably "),
            Verdict::Unrecognized("probably".to_string())
        );
        assert_eq!(Verdict::parse(""), Verdict::Unrecognized(String::new()));
        assert!(!Verdict::parse("n/a").is_recognized());
    }

    #[test]
    fn test_verdict_display_round_trips_vocabulary() {
        for text in ["yes", "maybe", "no"] {
            assert_eq!(Verdict::parse(text).to_string(), text);
        }
    }
}
