//! Person name type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`PersonName`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    /// The first name is empty after trimming.
    #[error("first name cannot be empty")]
    EmptyFirstName,
    /// The name is too long.
    #[error("name must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
}

/// A customer's name: a required first name and an optional last name.
///
/// ```
/// use niaga_customer_core::PersonName;
///
/// let name = PersonName::from_full_name("Nur Aisyah binti Ahmad").unwrap();
/// assert_eq!(name.first_name(), "Nur");
/// assert_eq!(name.last_name(), Some("Aisyah binti Ahmad"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct PersonName {
    first_name: String,
    last_name: Option<String>,
}

impl PersonName {
    /// Maximum length of the full name.
    pub const MAX_LENGTH: usize = 255;

    /// Create a name from its parts. A blank last name is treated as absent.
    ///
    /// # Errors
    ///
    /// Returns `NameError::EmptyFirstName` if the first name is blank and
    /// `NameError::TooLong` if the full name exceeds [`PersonName::MAX_LENGTH`].
    pub fn new(first_name: &str, last_name: Option<&str>) -> Result<Self, NameError> {
        let first_name = first_name.trim();
        if first_name.is_empty() {
            return Err(NameError::EmptyFirstName);
        }
        let last_name = last_name
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned);

        let name = Self {
            first_name: first_name.to_owned(),
            last_name,
        };
        if name.full_name().chars().count() > Self::MAX_LENGTH {
            return Err(NameError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        Ok(name)
    }

    /// Split a single "full name" field on the first whitespace run.
    ///
    /// # Errors
    ///
    /// Same as [`PersonName::new`].
    pub fn from_full_name(full_name: &str) -> Result<Self, NameError> {
        let trimmed = full_name.trim();
        match trimmed.split_once(char::is_whitespace) {
            Some((first, rest)) => Self::new(first, Some(rest)),
            None => Self::new(trimmed, None),
        }
    }

    #[must_use]
    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    #[must_use]
    pub fn last_name(&self) -> Option<&str> {
        self.last_name.as_deref()
    }

    /// First and last name joined by a space.
    #[must_use]
    pub fn full_name(&self) -> String {
        match &self.last_name {
            Some(last) => format!("{} {last}", self.first_name),
            None => self.first_name.clone(),
        }
    }
}

impl fmt::Display for PersonName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_name())
    }
}
