//! HTTP route handlers for the customer service.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness
//! GET  /health/ready           - Readiness (storage ping)
//!
//! # Customer (Bearer token, /api/v1/customer)
//! GET|PUT         /profile
//! GET|POST        /addresses
//! PUT|DELETE      /addresses/{id}
//! PUT             /addresses/{id}/default
//! GET|POST        /wishlist
//! GET             /wishlist/count
//! GET             /wishlist/check/{product_id}?variant_id=
//! DELETE          /wishlist/{product_id}?variant_id=&all_variants=
//! DELETE|PATCH    /wishlist/items/{item_id}
//! GET|POST        /measurements
//! GET|PUT|DELETE  /measurements/{id}
//! PUT             /measurements/{id}/set-default
//! GET|POST        /back-in-stock
//! GET             /back-in-stock/check/{product_id}?variantId=
//! DELETE          /back-in-stock/{product_id}?variantId=
//! DELETE          /back-in-stock/subscriptions/{id}
//!
//! # Admin (admin role, /api/v1/admin)
//! GET                 /customers/stats
//! GET|POST|PUT|DELETE /customers/{id}
//! PUT                 /customers/{id}/status
//! GET                 /back-in-stock/stats
//! GET                 /back-in-stock/subscriptions?pending_only=
//! GET                 /back-in-stock/products/{product_id}/subscriptions
//! POST                /back-in-stock/mark-notified
//! DELETE              /back-in-stock/cleanup?older_than_days=30
//! GET                 /wishlist/products/{product_id}/sale-watchers
//!
//! # Events (signed)
//! POST    /internal/events/{subject}
//! ```

pub mod addresses;
pub mod admin;
pub mod back_in_stock;
pub mod events;
pub mod extract;
pub mod health;
pub mod measurements;
pub mod profile;
pub mod wishlist;

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::state::AppState;

/// Customer routes, nested under `/api/v1/customer`.
pub fn customer_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/profile",
            get(profile::get_profile).put(profile::update_profile),
        )
        // Addresses
        .route(
            "/addresses",
            get(addresses::list_addresses).post(addresses::create_address),
        )
        .route(
            "/addresses/{id}",
            put(addresses::update_address).delete(addresses::delete_address),
        )
        .route("/addresses/{id}/default", put(addresses::set_default_address))
        // Wishlist
        .route(
            "/wishlist",
            get(wishlist::list_wishlist).post(wishlist::add_to_wishlist),
        )
        .route("/wishlist/count", get(wishlist::count_wishlist))
        .route("/wishlist/check/{product_id}", get(wishlist::check_wishlist))
        .route(
            "/wishlist/items/{item_id}",
            delete(wishlist::remove_wishlist_item).patch(wishlist::update_wishlist_item),
        )
        .route(
            "/wishlist/{product_id}",
            delete(wishlist::remove_from_wishlist),
        )
        // Measurements
        .route(
            "/measurements",
            get(measurements::list_measurements).post(measurements::create_measurement),
        )
        .route(
            "/measurements/{id}",
            get(measurements::get_measurement)
                .put(measurements::update_measurement)
                .delete(measurements::delete_measurement),
        )
        .route(
            "/measurements/{id}/set-default",
            put(measurements::set_default_measurement),
        )
        // Back in stock
        .route(
            "/back-in-stock",
            get(back_in_stock::list_subscriptions).post(back_in_stock::subscribe),
        )
        .route(
            "/back-in-stock/check/{product_id}",
            get(back_in_stock::check_subscription),
        )
        .route(
            "/back-in-stock/subscriptions/{id}",
            delete(back_in_stock::unsubscribe_by_id),
        )
        .route(
            "/back-in-stock/{product_id}",
            delete(back_in_stock::unsubscribe),
        )
}

/// Admin routes, nested under `/api/v1/admin`.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/customers/stats", get(admin::customer_stats))
        .route(
            "/customers/{id}",
            get(admin::get_customer)
                .post(admin::create_customer)
                .put(admin::update_customer)
                .delete(admin::delete_customer),
        )
        .route(
            "/customers/{id}/status",
            put(admin::update_customer_status),
        )
        .route("/back-in-stock/stats", get(admin::back_in_stock_stats))
        .route(
            "/back-in-stock/subscriptions",
            get(admin::list_subscriptions),
        )
        .route(
            "/back-in-stock/products/{product_id}/subscriptions",
            get(admin::product_subscriptions),
        )
        .route("/back-in-stock/mark-notified", post(admin::mark_notified))
        .route("/back-in-stock/cleanup", delete(admin::cleanup_notified))
        .route(
            "/wishlist/products/{product_id}/sale-watchers",
            get(admin::sale_watchers),
        )
}

/// Build the full application router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api/v1/customer", customer_routes())
        .nest("/api/v1/admin", admin_routes())
        .route("/internal/events/{subject}", post(events::receive_event))
}
