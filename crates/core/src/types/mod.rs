//! Core types for the customer service.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod measurements;
pub mod name;
pub mod phone;
pub mod price;
pub mod status;
pub mod wishlist_key;

pub use email::{Email, EmailError};
pub use id::*;
pub use measurements::{BodyMeasurements, MeasurementError};
pub use name::{NameError, PersonName};
pub use phone::{Phone, PhoneError};
pub use price::{CurrencyCode, Price};
pub use status::*;
pub use wishlist_key::WishlistKey;
