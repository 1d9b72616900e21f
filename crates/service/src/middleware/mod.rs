//! HTTP middleware and extractors for the customer service.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. CORS
//! 5. Timeout
//!
//! Authentication is per-route through the [`RequireCustomer`] and
//! [`RequireAdmin`] extractors. Internal event deliveries are checked with
//! [`signature::verify`].

pub mod auth;
pub mod request_id;
pub mod signature;

pub use auth::{AuthRejection, Claims, RequireAdmin, RequireCustomer};
pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};
