//! Status and classification enums for customer-owned entities.

use serde::{Deserialize, Serialize};

/// Errors for status parsing and transitions.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StatusError {
    /// The input is not a known value.
    #[error("invalid {kind}: {value}")]
    Invalid {
        /// Which enum was being parsed.
        kind: &'static str,
        /// The rejected input.
        value: String,
    },
    /// The requested status change is not allowed.
    #[error("cannot change customer status from {from} to {to}")]
    InvalidTransition {
        from: CustomerStatus,
        to: CustomerStatus,
    },
}

/// Account status of a customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "customer.customer_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum CustomerStatus {
    #[default]
    Active,
    Inactive,
    Suspended,
    Blocked,
}

impl CustomerStatus {
    /// Only active customers may sign in.
    #[must_use]
    pub const fn can_login(self) -> bool {
        matches!(self, Self::Active)
    }

    /// Only active customers may place orders.
    #[must_use]
    pub const fn can_purchase(self) -> bool {
        matches!(self, Self::Active)
    }

    #[must_use]
    pub const fn can_be_activated(self) -> bool {
        matches!(self, Self::Inactive | Self::Suspended)
    }

    #[must_use]
    pub const fn can_be_deactivated(self) -> bool {
        matches!(self, Self::Active)
    }

    #[must_use]
    pub const fn can_be_suspended(self) -> bool {
        matches!(self, Self::Active)
    }

    #[must_use]
    pub const fn can_be_blocked(self) -> bool {
        !matches!(self, Self::Blocked)
    }

    /// Validate a change to `target`, returning the new status.
    ///
    /// # Errors
    ///
    /// Returns `StatusError::InvalidTransition` if the change is not allowed
    /// from the current status.
    pub fn transition_to(self, target: Self) -> Result<Self, StatusError> {
        let allowed = match target {
            Self::Active => self.can_be_activated(),
            Self::Inactive => self.can_be_deactivated(),
            Self::Suspended => self.can_be_suspended(),
            Self::Blocked => self.can_be_blocked(),
        };
        if allowed {
            Ok(target)
        } else {
            Err(StatusError::InvalidTransition {
                from: self,
                to: target,
            })
        }
    }
}

impl std::fmt::Display for CustomerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Inactive => write!(f, "inactive"),
            Self::Suspended => write!(f, "suspended"),
            Self::Blocked => write!(f, "blocked"),
        }
    }
}

impl std::str::FromStr for CustomerStatus {
    type Err = StatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "suspended" => Ok(Self::Suspended),
            "blocked" => Ok(Self::Blocked),
            _ => Err(StatusError::Invalid {
                kind: "customer status",
                value: s.to_owned(),
            }),
        }
    }
}

/// Label shown next to a saved address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "customer.address_label", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum AddressLabel {
    #[default]
    Home,
    Office,
    Other,
}

/// Sizing category of a measurement set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "customer.sizing_gender", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum SizingGender {
    Men,
    Women,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_status_roundtrip_str() {
        for status in [
            CustomerStatus::Active,
            CustomerStatus::Inactive,
            CustomerStatus::Suspended,
            CustomerStatus::Blocked,
        ] {
            assert_eq!(status.to_string().parse::<CustomerStatus>().unwrap(), status);
        }
        assert!("banned".parse::<CustomerStatus>().is_err());
    }

    #[test]
    fn test_only_active_can_login_or_purchase() {
        assert!(CustomerStatus::Active.can_login());
        assert!(CustomerStatus::Active.can_purchase());
        assert!(!CustomerStatus::Suspended.can_login());
        assert!(!CustomerStatus::Blocked.can_purchase());
    }

    #[test]
    fn test_allowed_transitions() {
        use CustomerStatus::{Active, Blocked, Inactive, Suspended};

        assert_eq!(Suspended.transition_to(Active), Ok(Active));
        assert_eq!(Inactive.transition_to(Active), Ok(Active));
        assert_eq!(Active.transition_to(Suspended), Ok(Suspended));
        assert_eq!(Active.transition_to(Inactive), Ok(Inactive));
        assert_eq!(Suspended.transition_to(Blocked), Ok(Blocked));
    }

    #[test]
    fn test_rejected_transitions() {
        use CustomerStatus::{Active, Blocked, Inactive, Suspended};

        assert!(Active.transition_to(Active).is_err());
        assert!(Blocked.transition_to(Active).is_err());
        assert!(Blocked.transition_to(Blocked).is_err());
        assert!(Inactive.transition_to(Suspended).is_err());
        assert_eq!(
            Blocked.transition_to(Suspended),
            Err(StatusError::InvalidTransition {
                from: Blocked,
                to: Suspended
            })
        );
    }

    #[test]
    fn test_serde_snake_case() {
        assert_eq!(
            serde_json::to_string(&AddressLabel::Office).unwrap(),
            "\"office\""
        );
        let gender: SizingGender = serde_json::from_str("\"women\"").unwrap();
        assert_eq!(gender, SizingGender::Women);
        assert!(serde_json::from_str::<SizingGender>("\"unisex\"").is_err());
    }
}
