//! Candidate threshold grid.

use crate::constants::calibration::{GRID_MAX, GRID_MIN, GRID_POINTS};
use crate::constants::confidence;
use crate::error::{Error, Result};

/// Strictly ascending set of candidate confidence thresholds within 0.0-1.0.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdGrid {
    thresholds: Vec<f64>,
}

impl ThresholdGrid {
    /// Build a grid from explicit thresholds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidThresholdGrid`] if the list is empty, contains a
    /// value outside 0.0-1.0 or is not strictly ascending.
    pub fn new(thresholds: Vec<f64>) -> Result<Self> {
        if thresholds.is_empty() {
            return Err(Error::InvalidThresholdGrid {
                message: "grid must contain at least one threshold".to_string(),
            });
        }

        if let Some(bad) = thresholds
            .iter()
            .find(|t| !(confidence::MIN..=confidence::MAX).contains(*t))
        {
            return Err(Error::InvalidThresholdGrid {
                message: format!(
                    "threshold {bad} is outside {}-{}",
                    confidence::MIN,
                    confidence::MAX
                ),
            });
        }

        if thresholds.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(Error::InvalidThresholdGrid {
                message: "thresholds must be strictly ascending".to_string(),
            });
        }

        Ok(Self { thresholds })
    }

    /// `points` thresholds evenly spaced over `[min, max]`, both ends included.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidThresholdGrid`] if `points` is zero, `min > max`,
    /// or more than one point is requested over an empty range.
    pub fn linspace(min: f64, max: f64, points: usize) -> Result<Self> {
        if points == 0 {
            return Err(Error::InvalidThresholdGrid {
                message: "grid needs at least one point".to_string(),
            });
        }
        if min > max {
            return Err(Error::InvalidThresholdGrid {
                message: format!("grid minimum {min} is above maximum {max}"),
            });
        }
        if points == 1 {
            return Self::new(vec![min]);
        }

        #[allow(clippy::cast_precision_loss)]
        let step = (max - min) / (points - 1) as f64;
        #[allow(clippy::cast_precision_loss)]
        let thresholds = (0..points)
            .map(|i| if i == points - 1 { max } else { (i as f64).mul_add(step, min) })
            .collect();

        Self::new(thresholds)
    }

    /// Thresholds in ascending order.
    pub fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }

    /// The most permissive threshold.
    pub fn lowest(&self) -> f64 {
        self.thresholds[0]
    }

    /// Number of thresholds.
    pub fn len(&self) -> usize {
        self.thresholds.len()
    }

    /// Always false; a grid holds at least one threshold.
    pub fn is_empty(&self) -> bool {
        self.thresholds.is_empty()
    }
}

impl Default for ThresholdGrid {
    /// Twenty thresholds from 0.80 to 0.99.
    fn default() -> Self {
        #[allow(clippy::cast_precision_loss)]
        let step = (GRID_MAX - GRID_MIN) / (GRID_POINTS - 1) as f64;
        #[allow(clippy::cast_precision_loss)]
        let thresholds = (0..GRID_POINTS)
            .map(|i| {
                if i == GRID_POINTS - 1 {
                    GRID_MAX
                } else {
                    (i as f64).mul_add(step, GRID_MIN)
                }
            })
            .collect();
        Self { thresholds }
    }
}
