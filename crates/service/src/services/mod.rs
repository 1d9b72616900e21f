//! Business logic services for the customer service.
//!
//! # Services
//!
//! - `defaults` - The single-default rule for addresses and measurement sets
//! - `wishlist` - Variant-aware wishlist with idempotent add
//! - `back_in_stock` - Back-in-stock subscription registry
//! - `restock` - Restock event fan-out to pending subscribers
//! - `notifications` - Delivery of back-in-stock notifications
//!
//! Services hold their storage behind trait objects from [`crate::db`] and
//! are built once in `main`, then shared through `AppState`.

pub mod back_in_stock;
pub mod defaults;
mod error;
pub mod notifications;
pub mod restock;
pub mod wishlist;

pub use back_in_stock::BackInStockRegistry;
pub use defaults::ExactlyOneDefault;
pub use error::ServiceError;
pub use notifications::{
    BackInStockNotification, HttpNotificationClient, LogNotificationSender, NotificationError,
    NotificationSender,
};
pub use restock::{RestockEvent, RestockNotifier, RestockOutcome};
pub use wishlist::Wishlist;
