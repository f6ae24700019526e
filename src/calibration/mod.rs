//! Precision estimation and per-species threshold calibration.

mod calibrator;
mod grid;
mod precision;

pub use calibrator::{Calibration, SpeciesCalibration, TargetReport, calibrate};
pub use grid::ThresholdGrid;
pub use precision::{PrecisionEstimate, estimate, verdict_breakdown};
