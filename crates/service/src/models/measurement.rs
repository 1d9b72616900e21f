//! Body measurement set domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use niaga_customer_core::{BodyMeasurements, CustomerId, MeasurementId, SizingGender};

use super::{Defaultable, ValidationError, optional_text};

const MAX_NAME: usize = 100;
const MAX_NOTES: usize = 1000;

/// A named set of body measurements, e.g. "My baju kurung size".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Measurement {
    pub id: MeasurementId,
    pub customer_id: CustomerId,
    pub name: Option<String>,
    pub gender: SizingGender,
    #[serde(flatten)]
    pub values: BodyMeasurements,
    pub notes: Option<String>,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Measurement {
    /// Derived values included in API responses.
    #[must_use]
    pub fn summary(&self) -> MeasurementSummary {
        MeasurementSummary {
            bmi: self.values.bmi(),
            is_complete: self.values.is_complete(),
            has_upper_body: self.values.has_upper_body(),
            has_lower_body: self.values.has_lower_body(),
        }
    }
}

/// Read-only values computed from a measurement set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MeasurementSummary {
    pub bmi: Option<f64>,
    pub is_complete: bool,
    pub has_upper_body: bool,
    pub has_lower_body: bool,
}

impl Defaultable for Measurement {
    type Id = MeasurementId;

    const COLLECTION: &'static str = "measurements";
    const ITEM: &'static str = "measurement";

    fn id(&self) -> MeasurementId {
        self.id
    }

    fn owner(&self) -> CustomerId {
        self.customer_id
    }

    fn is_default(&self) -> bool {
        self.is_default
    }

    fn set_default(&mut self, is_default: bool) {
        self.is_default = is_default;
    }
}

/// Request body for creating a measurement set.
#[derive(Debug, Clone, Deserialize)]
pub struct MeasurementInput {
    #[serde(default)]
    pub name: Option<String>,
    pub gender: SizingGender,
    #[serde(flatten)]
    pub values: BodyMeasurements,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

impl MeasurementInput {
    /// Validate into a new, non-default measurement set owned by `owner`.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if a value is not positive or a text field
    /// is too long.
    pub fn into_measurement(self, owner: CustomerId) -> Result<Measurement, ValidationError> {
        self.values.validate()?;
        let now = Utc::now();
        Ok(Measurement {
            id: MeasurementId::generate(),
            customer_id: owner,
            name: optional_text("name", self.name.as_deref(), MAX_NAME)?,
            gender: self.gender,
            values: self.values,
            notes: optional_text("notes", self.notes.as_deref(), MAX_NOTES)?,
            is_default: false,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Request body for a measurement update.
///
/// Text fields and gender are optional; measurement values replace the
/// stored set as a whole when present, since clearing a single value must
/// be expressible.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MeasurementPatch {
    pub name: Option<String>,
    pub gender: Option<SizingGender>,
    pub values: Option<BodyMeasurements>,
    pub notes: Option<String>,
    pub is_default: Option<bool>,
}

impl MeasurementPatch {
    /// Apply the patch, returning the updated set. The default flag is not
    /// touched here.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if a provided field is invalid.
    pub fn apply(&self, measurement: &Measurement) -> Result<Measurement, ValidationError> {
        let mut next = measurement.clone();
        if let Some(name) = &self.name {
            next.name = optional_text("name", Some(name), MAX_NAME)?;
        }
        if let Some(gender) = self.gender {
            next.gender = gender;
        }
        if let Some(values) = self.values {
            values.validate()?;
            next.values = values;
        }
        if let Some(notes) = &self.notes {
            next.notes = optional_text("notes", Some(notes), MAX_NOTES)?;
        }
        next.updated_at = Utc::now();
        Ok(next)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_input_deserializes_flat_values() {
        let input: MeasurementInput = serde_json::from_str(
            r#"{"name":"Kurung","gender":"women","bust":88,"waist":70,"hip":96,"height":160}"#,
        )
        .unwrap();
        assert_eq!(input.values.bust, Some(88.0));
        assert!(!input.is_default);

        let measurement = input.into_measurement(CustomerId::generate()).unwrap();
        assert!(measurement.summary().is_complete);
        assert_eq!(measurement.name.as_deref(), Some("Kurung"));
    }

    #[test]
    fn test_input_rejects_negative_value() {
        let input: MeasurementInput =
            serde_json::from_str(r#"{"gender":"men","chest":-3}"#).unwrap();
        assert!(matches!(
            input.into_measurement(CustomerId::generate()),
            Err(ValidationError::Measurement(_))
        ));
    }

    #[test]
    fn test_input_requires_gender() {
        let result: Result<MeasurementInput, _> = serde_json::from_str(r#"{"chest":90}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_patch_replaces_values() {
        let input: MeasurementInput =
            serde_json::from_str(r#"{"gender":"men","chest":100,"waist":90}"#).unwrap();
        let measurement = input.into_measurement(CustomerId::generate()).unwrap();

        let patch = MeasurementPatch {
            values: Some(BodyMeasurements {
                chest: Some(98.0),
                ..BodyMeasurements::default()
            }),
            ..MeasurementPatch::default()
        };
        let next = patch.apply(&measurement).unwrap();
        assert_eq!(next.values.chest, Some(98.0));
        assert_eq!(next.values.waist, None);
        assert_eq!(next.gender, SizingGender::Men);
    }
}
