//! Output type definitions.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// File format for tabular reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Comma-separated values with a header row.
    #[default]
    Csv,
    /// Pretty-printed JSON array of row objects.
    Json,
}

impl ReportFormat {
    /// File extension for this format.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_extension() {
        assert_eq!(ReportFormat::Csv.extension(), "csv");
        assert_eq!(ReportFormat::Json.extension(), "json");
    }

    #[test]
    fn test_parses_from_toml_value() {
        #[derive(Deserialize)]
        struct Wrapper {
            format: ReportFormat,
        }
        let parsed: Wrapper = toml::from_str("format = \"json\"").unwrap();
        assert_eq!(parsed.format, ReportFormat::Json);
    }
}
