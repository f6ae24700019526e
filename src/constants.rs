//! Application-wide constants.
//!
//! All magic numbers and strings are defined here to ensure consistency
//! and make changes easy to track.

/// Application name used for config directories and user-facing messages.
pub const APP_NAME: &str = "birdstats";

/// Confidence value bounds.
pub mod confidence {
    /// Minimum valid confidence value.
    pub const MIN: f64 = 0.0;
    /// Maximum valid confidence value.
    pub const MAX: f64 = 1.0;
}

/// Threshold sweep defaults.
pub mod calibration {
    /// Lowest candidate threshold in the default grid.
    pub const GRID_MIN: f64 = 0.8;

    /// Highest candidate threshold in the default grid (inclusive).
    pub const GRID_MAX: f64 = 0.99;

    /// Number of evenly spaced candidate thresholds.
    pub const GRID_POINTS: usize = 20;

    /// Selected thresholds are rounded to this many decimal places.
    pub const THRESHOLD_DECIMALS: i32 = 3;
}

/// Report defaults.
pub mod report {
    /// Global confidence gate used for raw, uncalibrated statistics.
    pub const GLOBAL_CONFIDENCE: f64 = 0.8;

    /// Species need at least this many detections to count as well sampled.
    pub const MIN_DETECTIONS: usize = 50;

    /// Precision at or above which a species is "medium precision".
    pub const MEDIUM_PRECISION: f64 = 0.8;

    /// Precision at or above which a species is "high precision".
    pub const HIGH_PRECISION: f64 = 1.0;

    /// Calibrated precision a species needs to be shown in activity figures.
    pub const SPECIES_PRECISION: f64 = 1.0;

    /// Width in days of the seasonal smoothing window.
    pub const SEASONAL_WINDOW_DAYS: usize = 7;

    /// File start times at or before this year are treated as unset clocks.
    pub const EPOCH_YEAR: i32 = 1970;

    /// Hours in a day, for diurnal histograms.
    pub const HOURS_PER_DAY: usize = 24;

    /// Default directory for report files, relative to the working directory.
    pub const OUTPUT_DIR: &str = "reports";

    /// Largest accepted UTC offset magnitude in hours.
    pub const MAX_UTC_OFFSET_HOURS: f64 = 14.0;
}

/// Site metadata table column indices (zero based).
pub mod site_info_columns {
    /// Location and site string, e.g. `La Palma_3`.
    pub const LOCATION_SITE: usize = 1;
    /// Habitat label.
    pub const HABITAT: usize = 2;
    /// Latitude.
    pub const LATITUDE: usize = 8;
    /// Longitude.
    pub const LONGITUDE: usize = 9;
}

/// Report file names, without extension.
pub mod report_names {
    /// Per-species calibration table.
    pub const CALIBRATION: &str = "calibration";
    /// Species by threshold precision grid.
    pub const PRECISION_GRID: &str = "precision_grid";
    /// Per-species verdict breakdown.
    pub const PRECISIONS: &str = "verdict_breakdown";
    /// Per-dataset summary table.
    pub const SUMMARY: &str = "summary";
    /// Cross-dataset totals.
    pub const SUMMARY_TOTALS: &str = "summary_totals";
    /// Species shared between datasets.
    pub const SHARED_SPECIES: &str = "shared_species";
    /// Valid detection export.
    pub const DETECTIONS: &str = "valid_detections";
    /// Hourly activity profiles.
    pub const DIURNAL: &str = "diurnal";
    /// Habitat richness statistics.
    pub const HABITAT: &str = "habitat_richness";
    /// Habitat richness per day.
    pub const HABITAT_DAILY: &str = "habitat_richness_daily";
    /// Habitat activity for one species.
    pub const HABITAT_ACTIVITY: &str = "habitat_activity";
    /// Latitudinal arrival matrix.
    pub const LATITUDINAL: &str = "latitudinal";
    /// Seasonal occurrence matrix.
    pub const SEASONAL: &str = "seasonal";
}

/// UTF-8 Byte Order Mark, optionally written at the start of CSV reports.
pub const UTF8_BOM: &str = "\u{feff}";
