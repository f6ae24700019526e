//! Detection record types.

use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};

/// One classifier output inside an audio file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    /// Species common name.
    pub common_name: String,
    /// Classifier confidence (0.0-1.0).
    pub confidence: f64,
    /// Offset in seconds from the start of the file.
    pub offset_seconds: f64,
}

/// One audio file's worth of raw classifier output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileDetectionRecord {
    /// Site identifier.
    pub site: String,
    /// Recording start time (local clock of the recorder).
    pub start: NaiveDateTime,
    /// Recorder latitude, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    /// Recorder longitude, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    /// File duration in minutes.
    pub duration_minutes: f64,
    /// Detections in file order.
    #[serde(default)]
    pub detections: Vec<RawDetection>,
}

/// A raw detection that passed a confidence gate, stamped with its file's context.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidDetection {
    /// Species common name.
    pub common_name: String,
    /// Classifier confidence (0.0-1.0).
    pub confidence: f64,
    /// Offset in seconds from the start of the file.
    pub offset_seconds: f64,
    /// Absolute detection time (file start + offset).
    pub detected_at: NaiveDateTime,
    /// Site identifier of the parent file.
    pub site: String,
    /// Start time of the parent file.
    pub file_start: NaiveDateTime,
    /// Latitude of the parent file, if known.
    pub lat: Option<f64>,
    /// Longitude of the parent file, if known.
    pub lon: Option<f64>,
}

impl ValidDetection {
    /// Build a valid detection from a raw detection and its parent file.
    ///
    /// Returns `None` when the offset does not give a representable time
    /// (see [`detection_time`]).
    pub fn from_raw(file: &FileDetectionRecord, raw: &RawDetection) -> Option<Self> {
        Some(Self {
            common_name: raw.common_name.clone(),
            confidence: raw.confidence,
            offset_seconds: raw.offset_seconds,
            detected_at: detection_time(file.start, raw.offset_seconds)?,
            site: file.site.clone(),
            file_start: file.start,
            lat: file.lat,
            lon: file.lon,
        })
    }
}

/// Absolute time `offset_seconds` into a file starting at `start`, to the millisecond.
///
/// `None` for negative or non-finite offsets and for times outside chrono's range.
#[allow(clippy::cast_possible_truncation)]
pub fn detection_time(start: NaiveDateTime, offset_seconds: f64) -> Option<NaiveDateTime> {
    if !offset_seconds.is_finite() || offset_seconds < 0.0 {
        return None;
    }
    // float to int casts saturate, so huge offsets fail in the checked steps below
    let delta = TimeDelta::try_milliseconds((offset_seconds * 1000.0).round() as i64)?;
    start.checked_add_signed(delta)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn file_at(start: NaiveDateTime) -> FileDetectionRecord {
        FileDetectionRecord {
            site: "NO 05".to_string(),
            start,
            lat: Some(60.39),
            lon: Some(5.32),
            duration_minutes: 5.0,
            detections: vec![],
        }
    }

    #[test]
    fn test_detected_at_adds_offset() {
        let start = NaiveDate::from_ymd_opt(2022, 5, 1)
            .unwrap()
            .and_hms_opt(6, 0, 0)
            .unwrap();
        let file = file_at(start);
        let raw = RawDetection {
            common_name: "Willow Warbler".to_string(),
            confidence: 0.91,
            offset_seconds: 125.0,
        };

        let valid = ValidDetection::from_raw(&file, &raw).unwrap();
        let expected = NaiveDate::from_ymd_opt(2022, 5, 1)
            .unwrap()
            .and_hms_opt(6, 2, 5)
            .unwrap();
        assert_eq!(valid.detected_at, expected);
        assert_eq!(valid.file_start, start);
        assert_eq!(valid.site, "NO 05");
        assert_eq!(valid.lat, Some(60.39));
    }

    #[test]
    fn test_fractional_offset_keeps_milliseconds() {
        let start = NaiveDate::from_ymd_opt(2023, 1, 10)
            .unwrap()
            .and_hms_opt(23, 59, 59)
            .unwrap();
        let file = file_at(start);
        let raw = RawDetection {
            common_name: "Barn Owl".to_string(),
            confidence: 0.85,
            offset_seconds: 1.5,
        };

        let valid = ValidDetection::from_raw(&file, &raw).unwrap();
        assert_eq!(
            valid.detected_at.to_string(),
            "2023-01-11 00:00:00.500"
        );
    }

    #[test]
    fn test_unrepresentable_offsets_have_no_time() {
        let start = NaiveDate::from_ymd_opt(2022, 5, 1)
            .unwrap()
            .and_hms_opt(6, 0, 0)
            .unwrap();
        assert!(detection_time(start, 1e15).is_none());
        assert!(detection_time(start, f64::MAX).is_none());
        assert!(detection_time(start, f64::NAN).is_none());
        assert!(detection_time(start, f64::INFINITY).is_none());
        assert!(detection_time(start, -1.0).is_none());
        assert_eq!(detection_time(start, 0.0), Some(start));

        let raw = RawDetection {
            common_name: "Barn Owl".to_string(),
            confidence: 0.85,
            offset_seconds: 1e15,
        };
        assert!(ValidDetection::from_raw(&file_at(start), &raw).is_none());
    }

    #[test]
    fn test_file_record_deserializes_without_optional_fields() {
        let json = r#"{
            "site": "CR_LaPalma-3",
            "start": "2021-03-04T05:30:00",
            "duration_minutes": 1.0
        }"#;
        let file: FileDetectionRecord = serde_json::from_str(json).unwrap();
        assert!(file.lat.is_none());
        assert!(file.detections.is_empty());
    }
}
