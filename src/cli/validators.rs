//! Value parsers for clap arguments.

use chrono::NaiveDate;

use crate::constants::confidence::{MAX, MIN};

/// Classifier confidence gate in 0.0-1.0.
pub fn parse_confidence(s: &str) -> Result<f64, String> {
    parse_bounded_float(s, MIN, MAX, "confidence")
}

/// Calibrated precision in 0.0-1.0.
pub fn parse_precision(s: &str) -> Result<f64, String> {
    parse_bounded_float(s, MIN, MAX, "precision")
}

/// Float within `min..=max`; `name` labels the error message.
pub fn parse_bounded_float(s: &str, min: f64, max: f64, name: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;

    if !(min..=max).contains(&value) {
        return Err(format!(
            "{name} must be between {min} and {max}, got {value}"
        ));
    }

    Ok(value)
}

/// Parse a calendar date in `YYYY-MM-DD` form.
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| format!("'{s}' is not a valid date (expected YYYY-MM-DD): {e}"))
}
