//! Domain models for the customer service.
//!
//! These types represent validated domain objects separate from database row
//! types. Request payloads (`*Input`, `*Patch`) are validated into domain
//! values before they reach a repository.

pub mod address;
pub mod measurement;
pub mod profile;
pub mod subscription;
pub mod wishlist;

use thiserror::Error;

use niaga_customer_core::{
    CustomerId, EmailError, IdError, MeasurementError, NameError, PhoneError, StatusError,
};

pub use address::{Address, AddressInput, AddressPatch};
pub use measurement::{Measurement, MeasurementInput, MeasurementPatch};
pub use profile::{CustomerStats, Profile, ProfileInput};
pub use subscription::{
    BackInStockStats, BackInStockSubscription, PendingSubscription, SubscribeInput,
};
pub use wishlist::{WishlistAddInput, WishlistItem};

/// An item in a per-customer collection where at most one item is the default.
///
/// Addresses and measurement sets implement this; the
/// [`ExactlyOneDefault`](crate::services::defaults::ExactlyOneDefault) rule is
/// the only code that flips `is_default`.
pub trait Defaultable: Clone + Send + Sync + 'static {
    /// Identifier type of the item.
    type Id: Copy
        + Eq
        + std::hash::Hash
        + std::fmt::Display
        + Into<uuid::Uuid>
        + Send
        + Sync
        + 'static;

    /// Human-readable collection name, used in logs and lock keys.
    const COLLECTION: &'static str;

    /// Singular noun for error messages.
    const ITEM: &'static str;

    fn id(&self) -> Self::Id;
    fn owner(&self) -> CustomerId;
    fn is_default(&self) -> bool;
    fn set_default(&mut self, is_default: bool);
}

/// A request payload failed validation.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or blank.
    #[error("{0} is required")]
    Required(&'static str),

    /// A text field exceeds its maximum length.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("invalid email: {0}")]
    Email(#[from] EmailError),

    #[error("invalid phone: {0}")]
    Phone(#[from] PhoneError),

    #[error("invalid name: {0}")]
    Name(#[from] NameError),

    #[error("invalid measurement: {0}")]
    Measurement(#[from] MeasurementError),

    #[error("invalid {field}: {source}")]
    Id {
        field: &'static str,
        source: IdError,
    },

    #[error("{0}")]
    Status(#[from] StatusError),

    /// Any other rule violation.
    #[error("{0}")]
    Invalid(String),
}

/// Trim a required text field and enforce its maximum length.
pub(crate) fn required_text(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required(field));
    }
    if trimmed.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(trimmed.to_owned())
}

/// Trim an optional text field; blank becomes `None`.
pub(crate) fn optional_text(
    field: &'static str,
    value: Option<&str>,
    max: usize,
) -> Result<Option<String>, ValidationError> {
    match value.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) if s.chars().count() > max => Err(ValidationError::TooLong { field, max }),
        Some(s) => Ok(Some(s.to_owned())),
        None => Ok(None),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_required_text() {
        assert_eq!(required_text("city", "  Shah Alam ", 50).unwrap(), "Shah Alam");
        assert!(matches!(
            required_text("city", "   ", 50),
            Err(ValidationError::Required("city"))
        ));
        assert!(matches!(
            required_text("city", "abcdef", 5),
            Err(ValidationError::TooLong { field: "city", max: 5 })
        ));
    }

    #[test]
    fn test_optional_text() {
        assert_eq!(optional_text("notes", None, 10).unwrap(), None);
        assert_eq!(optional_text("notes", Some("  "), 10).unwrap(), None);
        assert_eq!(
            optional_text("notes", Some(" hi "), 10).unwrap(),
            Some("hi".to_owned())
        );
        assert!(optional_text("notes", Some("too long text"), 5).is_err());
    }
}
