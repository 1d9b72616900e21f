//! Admin routes. Every handler requires an admin role.

use axum::extract::State;
use axum::response::Response;
use serde::{Deserialize, Serialize};

use niaga_customer_core::{CustomerId, CustomerStatus, ProductId, SubscriptionId};

use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{
    BackInStockStats, BackInStockSubscription, CustomerStats, PendingSubscription, Profile,
    ProfileInput, ValidationError, WishlistItem,
};
use crate::routes::back_in_stock::VariantQuery;
use crate::routes::extract::{ApiJson, ApiPath, ApiQuery, ApiResponse};
use crate::services::back_in_stock::DEFAULT_CLEANUP_DAYS;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StatusInput {
    pub status: CustomerStatus,
}

#[derive(Debug, Deserialize)]
pub struct MarkNotifiedInput {
    pub subscription_ids: Vec<SubscriptionId>,
}

#[derive(Debug, Deserialize)]
pub struct SubscriptionListQuery {
    #[serde(default)]
    pub pending_only: bool,
}

#[derive(Debug, Deserialize)]
pub struct CleanupQuery {
    #[serde(default = "default_cleanup_days")]
    pub older_than_days: u32,
}

const fn default_cleanup_days() -> u32 {
    DEFAULT_CLEANUP_DAYS
}

#[derive(Debug, Serialize)]
pub struct Affected {
    pub count: u64,
}

/// GET /admin/customers/stats
pub async fn customer_stats(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> Result<ApiResponse<CustomerStats>> {
    Ok(ApiResponse::ok(state.profiles().stats().await?))
}

/// GET /admin/customers/{id}
pub async fn get_customer(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    ApiPath(customer_id): ApiPath<CustomerId>,
) -> Result<ApiResponse<Profile>> {
    let profile = state
        .profiles()
        .get(customer_id)
        .await?
        .ok_or_else(customer_not_found)?;
    Ok(ApiResponse::ok(profile))
}

/// POST /admin/customers/{id}
///
/// Creates the profile for an identity-provider subject that has none yet.
pub async fn create_customer(
    State(state): State<AppState>,
    RequireAdmin(admin_id): RequireAdmin,
    ApiPath(customer_id): ApiPath<CustomerId>,
    ApiJson(input): ApiJson<ProfileInput>,
) -> Result<Response> {
    let profile = input.apply(&Profile::empty(customer_id))?;
    let created = state
        .profiles()
        .create(&profile)
        .await?
        .ok_or_else(|| AppError::Conflict("customer already exists".to_owned()))?;

    tracing::info!(admin_id = %admin_id, customer_id = %customer_id, "Customer created");
    Ok(ApiResponse::ok(created)
        .with_message("Customer created")
        .created())
}

/// PUT /admin/customers/{id}
pub async fn update_customer(
    State(state): State<AppState>,
    RequireAdmin(admin_id): RequireAdmin,
    ApiPath(customer_id): ApiPath<CustomerId>,
    ApiJson(input): ApiJson<ProfileInput>,
) -> Result<ApiResponse<Profile>> {
    let current = state
        .profiles()
        .get(customer_id)
        .await?
        .ok_or_else(customer_not_found)?;

    let next = input.apply(&current)?;
    let updated = state
        .profiles()
        .update(&next)
        .await?
        .ok_or_else(customer_not_found)?;

    tracing::info!(admin_id = %admin_id, customer_id = %customer_id, "Customer updated");
    Ok(ApiResponse::ok(updated).with_message("Customer updated"))
}

/// DELETE /admin/customers/{id}
///
/// Removes the profile with the customer's addresses, measurements,
/// wishlist, and subscriptions.
pub async fn delete_customer(
    State(state): State<AppState>,
    RequireAdmin(admin_id): RequireAdmin,
    ApiPath(customer_id): ApiPath<CustomerId>,
) -> Result<ApiResponse<()>> {
    if !state.profiles().delete(customer_id).await? {
        return Err(customer_not_found());
    }
    tracing::info!(admin_id = %admin_id, customer_id = %customer_id, "Customer deleted");
    Ok(ApiResponse::message("Customer deleted"))
}

/// PUT /admin/customers/{id}/status
///
/// The transition is checked against the status read here and applied only
/// if the stored status still matches it.
pub async fn update_customer_status(
    State(state): State<AppState>,
    RequireAdmin(admin_id): RequireAdmin,
    ApiPath(customer_id): ApiPath<CustomerId>,
    ApiJson(input): ApiJson<StatusInput>,
) -> Result<ApiResponse<Profile>> {
    let profile = state
        .profiles()
        .get(customer_id)
        .await?
        .ok_or_else(customer_not_found)?;

    let next = profile
        .status
        .transition_to(input.status)
        .map_err(ValidationError::from)?;

    let updated = state
        .profiles()
        .set_status(customer_id, profile.status, next)
        .await?
        .ok_or_else(|| {
            AppError::Conflict("customer status changed concurrently".to_owned())
        })?;

    tracing::info!(
        admin_id = %admin_id,
        customer_id = %customer_id,
        from = ?profile.status,
        status = ?next,
        "Customer status changed"
    );
    Ok(ApiResponse::ok(updated).with_message("Customer status updated"))
}

fn customer_not_found() -> AppError {
    AppError::NotFound("customer not found".to_owned())
}

/// GET /admin/back-in-stock/stats
pub async fn back_in_stock_stats(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> Result<ApiResponse<BackInStockStats>> {
    Ok(ApiResponse::ok(state.back_in_stock().stats().await?))
}

/// GET /admin/back-in-stock/subscriptions?pending_only=true
pub async fn list_subscriptions(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    ApiQuery(query): ApiQuery<SubscriptionListQuery>,
) -> Result<ApiResponse<Vec<BackInStockSubscription>>> {
    Ok(ApiResponse::ok(
        state.back_in_stock().list_all(query.pending_only).await?,
    ))
}

/// GET /admin/back-in-stock/products/{product_id}/subscriptions?variantId=
pub async fn product_subscriptions(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    ApiPath(product_id): ApiPath<ProductId>,
    ApiQuery(query): ApiQuery<VariantQuery>,
) -> Result<ApiResponse<Vec<PendingSubscription>>> {
    let pending = state
        .back_in_stock()
        .pending_for_product(product_id, query.variant_id)
        .await?;
    Ok(ApiResponse::ok(pending))
}

/// POST /admin/back-in-stock/mark-notified
pub async fn mark_notified(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    ApiJson(input): ApiJson<MarkNotifiedInput>,
) -> Result<ApiResponse<Affected>> {
    let count = state
        .back_in_stock()
        .mark_notified(&input.subscription_ids)
        .await?;
    Ok(ApiResponse::ok(Affected { count }).with_message("Subscriptions marked as notified"))
}

/// DELETE /admin/back-in-stock/cleanup?older_than_days=30
pub async fn cleanup_notified(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    ApiQuery(query): ApiQuery<CleanupQuery>,
) -> Result<ApiResponse<Affected>> {
    let count = state
        .back_in_stock()
        .delete_old_notified(query.older_than_days)
        .await?;
    Ok(ApiResponse::ok(Affected { count }).with_message("Old notified subscriptions deleted"))
}

/// GET /admin/wishlist/products/{product_id}/sale-watchers
pub async fn sale_watchers(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    ApiPath(product_id): ApiPath<ProductId>,
) -> Result<ApiResponse<Vec<WishlistItem>>> {
    Ok(ApiResponse::ok(
        state.wishlist().sale_watchers(product_id).await?,
    ))
}
