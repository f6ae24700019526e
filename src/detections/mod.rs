//! Detection records and the confidence gate that turns raw detections into
//! valid ones.

mod filter;
mod types;

pub use filter::{Gate, filter};
pub use types::{FileDetectionRecord, RawDetection, ValidDetection, detection_time};
