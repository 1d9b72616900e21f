//! Niaga Customer Core - Shared domain types.
//!
//! This crate provides the types used across the customer service components:
//! - `service` - HTTP API, repositories, and the restock notifier
//! - `cli` - Command-line tools for migrations and maintenance
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no database access,
//! no HTTP clients. Every value object validates on construction, so an invalid
//! email, phone number, or identifier cannot exist once parsed.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, value objects, body measurements, and the wishlist key

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
