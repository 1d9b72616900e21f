//! Customer profile domain types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use niaga_customer_core::{CustomerId, CustomerStatus, Email, PersonName, Phone};

use super::{ValidationError, optional_text};

const MAX_GENDER: usize = 20;
const MAX_PICTURE_URL: usize = 500;

/// A customer's profile. The ID is the identity-provider subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Profile {
    pub id: CustomerId,
    pub full_name: Option<String>,
    pub email: Option<Email>,
    pub phone: Option<Phone>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub profile_picture: Option<String>,
    pub status: CustomerStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// An empty active profile, returned before the customer saves anything.
    #[must_use]
    pub fn empty(id: CustomerId) -> Self {
        let now = Utc::now();
        Self {
            id,
            full_name: None,
            email: None,
            phone: None,
            date_of_birth: None,
            gender: None,
            profile_picture: None,
            status: CustomerStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Customer counts per status for the admin dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CustomerStats {
    pub total_customers: i64,
    pub active: i64,
    pub inactive: i64,
    pub suspended: i64,
    pub blocked: i64,
}

/// Request body for creating or updating a profile.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileInput {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub profile_picture: Option<String>,
}

impl ProfileInput {
    /// Validate and merge into `current`. Absent fields are unchanged; blank
    /// strings clear the field. Status is never changed here.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the name, email, phone, or date of birth
    /// is invalid.
    pub fn apply(&self, current: &Profile) -> Result<Profile, ValidationError> {
        let mut next = current.clone();

        if let Some(full_name) = self.full_name.as_deref() {
            next.full_name = if full_name.trim().is_empty() {
                None
            } else {
                Some(PersonName::from_full_name(full_name)?.full_name())
            };
        }
        if let Some(email) = self.email.as_deref() {
            next.email = blank_or(email, Email::parse)?;
        }
        if let Some(phone) = self.phone.as_deref() {
            next.phone = blank_or(phone, Phone::parse)?;
        }
        if let Some(date_of_birth) = self.date_of_birth {
            if date_of_birth > Utc::now().date_naive() {
                return Err(ValidationError::Invalid(
                    "date_of_birth cannot be in the future".to_owned(),
                ));
            }
            next.date_of_birth = Some(date_of_birth);
        }
        if let Some(gender) = self.gender.as_deref() {
            next.gender = optional_text("gender", Some(gender), MAX_GENDER)?;
        }
        if let Some(picture) = self.profile_picture.as_deref() {
            next.profile_picture = optional_text("profile_picture", Some(picture), MAX_PICTURE_URL)?;
        }

        next.updated_at = Utc::now();
        Ok(next)
    }
}

fn blank_or<T, E>(value: &str, parse: impl Fn(&str) -> Result<T, E>) -> Result<Option<T>, E> {
    if value.trim().is_empty() {
        Ok(None)
    } else {
        parse(value).map(Some)
    }
}
