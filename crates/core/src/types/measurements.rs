//! Body measurements used for sizing recommendations.
//!
//! Lengths are centimetres, weight is kilograms. Every field is optional;
//! customers fill in only what they know.

use serde::{Deserialize, Serialize};

/// Errors that can occur when validating [`BodyMeasurements`].
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum MeasurementError {
    /// A value is NaN, infinite, zero, or negative.
    #[error("{field} must be a positive number")]
    NotPositive {
        /// Name of the offending field.
        field: &'static str,
    },
    /// A value is implausibly large.
    #[error("{field} must be at most {max}")]
    OutOfRange {
        /// Name of the offending field.
        field: &'static str,
        /// Upper bound.
        max: f64,
    },
}

/// A set of optional body measurements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BodyMeasurements {
    pub bust: Option<f64>,
    pub chest: Option<f64>,
    pub waist: Option<f64>,
    pub hip: Option<f64>,
    pub shoulder_width: Option<f64>,
    pub arm_length: Option<f64>,
    pub inseam: Option<f64>,
    pub outseam: Option<f64>,
    pub thigh: Option<f64>,
    pub neck: Option<f64>,
    pub wrist: Option<f64>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
}

impl BodyMeasurements {
    /// Upper bound for any single value.
    pub const MAX_VALUE: f64 = 500.0;

    fn fields(&self) -> [(&'static str, Option<f64>); 13] {
        [
            ("bust", self.bust),
            ("chest", self.chest),
            ("waist", self.waist),
            ("hip", self.hip),
            ("shoulder_width", self.shoulder_width),
            ("arm_length", self.arm_length),
            ("inseam", self.inseam),
            ("outseam", self.outseam),
            ("thigh", self.thigh),
            ("neck", self.neck),
            ("wrist", self.wrist),
            ("height", self.height),
            ("weight", self.weight),
        ]
    }

    /// Check that every present value is finite, positive, and in range.
    ///
    /// # Errors
    ///
    /// Returns the first offending field.
    pub fn validate(&self) -> Result<(), MeasurementError> {
        for (field, value) in self.fields() {
            let Some(value) = value else { continue };
            if !value.is_finite() || value <= 0.0 {
                return Err(MeasurementError::NotPositive { field });
            }
            if value > Self::MAX_VALUE {
                return Err(MeasurementError::OutOfRange {
                    field,
                    max: Self::MAX_VALUE,
                });
            }
        }
        Ok(())
    }

    #[must_use]
    pub const fn has_upper_body(&self) -> bool {
        self.bust.is_some()
            || self.chest.is_some()
            || self.waist.is_some()
            || self.hip.is_some()
            || self.shoulder_width.is_some()
            || self.arm_length.is_some()
    }

    #[must_use]
    pub const fn has_lower_body(&self) -> bool {
        self.inseam.is_some() || self.outseam.is_some() || self.thigh.is_some()
    }

    /// Bust, waist, hip, and height are all present.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.bust.is_some() && self.waist.is_some() && self.hip.is_some() && self.height.is_some()
    }

    /// Body mass index from height (cm) and weight (kg).
    #[must_use]
    pub fn bmi(&self) -> Option<f64> {
        let height_m = self.height? / 100.0;
        Some(self.weight? / (height_m * height_m))
    }

    /// Waist divided by hip.
    #[must_use]
    pub fn waist_to_hip_ratio(&self) -> Option<f64> {
        Some(self.waist? / self.hip?)
    }
}
