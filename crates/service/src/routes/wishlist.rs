//! Wishlist routes.
//!
//! Items are keyed by product and optional variant; adding the same key
//! twice is not an error.

use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use niaga_customer_core::{ProductId, VariantId, WishlistItemId};

use crate::db::InsertOutcome;
use crate::error::Result;
use crate::middleware::RequireCustomer;
use crate::models::{WishlistAddInput, WishlistItem};
use crate::routes::extract::{ApiJson, ApiPath, ApiQuery, ApiResponse, blank_as_none};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct VariantQuery {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub variant_id: Option<VariantId>,
}

#[derive(Debug, Deserialize)]
pub struct RemoveQuery {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub variant_id: Option<VariantId>,
    /// Remove every variant of the product instead of one key.
    #[serde(default)]
    pub all_variants: bool,
}

#[derive(Debug, Deserialize)]
pub struct NotifyOnSaleInput {
    pub notify_on_sale: bool,
}

#[derive(Debug, Serialize)]
pub struct WishlistCount {
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct WishlistCheck {
    pub in_wishlist: bool,
}

/// GET /customer/wishlist
pub async fn list_wishlist(
    State(state): State<AppState>,
    RequireCustomer(customer_id): RequireCustomer,
) -> Result<ApiResponse<Vec<WishlistItem>>> {
    let items = state.wishlist().list(customer_id).await?;
    Ok(ApiResponse::ok(items))
}

/// GET /customer/wishlist/count
pub async fn count_wishlist(
    State(state): State<AppState>,
    RequireCustomer(customer_id): RequireCustomer,
) -> Result<ApiResponse<WishlistCount>> {
    let count = state.wishlist().count(customer_id).await?;
    Ok(ApiResponse::ok(WishlistCount { count }))
}

/// GET /customer/wishlist/check/{product_id}?variant_id=
pub async fn check_wishlist(
    State(state): State<AppState>,
    RequireCustomer(customer_id): RequireCustomer,
    ApiPath(product_id): ApiPath<ProductId>,
    ApiQuery(query): ApiQuery<VariantQuery>,
) -> Result<ApiResponse<WishlistCheck>> {
    let in_wishlist = state
        .wishlist()
        .exists(customer_id, product_id, query.variant_id)
        .await?;
    Ok(ApiResponse::ok(WishlistCheck { in_wishlist }))
}

/// POST /customer/wishlist
///
/// 201 with the new item, or 200 with the existing one.
pub async fn add_to_wishlist(
    State(state): State<AppState>,
    RequireCustomer(customer_id): RequireCustomer,
    ApiJson(input): ApiJson<WishlistAddInput>,
) -> Result<Response> {
    let item = input.into_item(customer_id)?;

    Ok(match state.wishlist().add(item).await? {
        InsertOutcome::Inserted(item) => ApiResponse::ok(item)
            .with_message("Added to wishlist")
            .created(),
        InsertOutcome::Existing(item) => ApiResponse::ok(item)
            .with_message("Already in wishlist")
            .into_response(),
    })
}

/// DELETE /customer/wishlist/{product_id}?variant_id=&all_variants=
pub async fn remove_from_wishlist(
    State(state): State<AppState>,
    RequireCustomer(customer_id): RequireCustomer,
    ApiPath(product_id): ApiPath<ProductId>,
    ApiQuery(query): ApiQuery<RemoveQuery>,
) -> Result<ApiResponse<()>> {
    if query.all_variants {
        let removed = state
            .wishlist()
            .remove_all_variants_of_product(customer_id, product_id)
            .await?;
        return Ok(ApiResponse::message(format!(
            "Removed {removed} item(s) from wishlist"
        )));
    }

    state
        .wishlist()
        .remove(customer_id, product_id, query.variant_id)
        .await?;
    Ok(ApiResponse::message("Removed from wishlist"))
}

/// DELETE /customer/wishlist/items/{item_id}
pub async fn remove_wishlist_item(
    State(state): State<AppState>,
    RequireCustomer(customer_id): RequireCustomer,
    ApiPath(item_id): ApiPath<WishlistItemId>,
) -> Result<ApiResponse<()>> {
    state.wishlist().remove_by_id(customer_id, item_id).await?;
    Ok(ApiResponse::message("Removed from wishlist"))
}

/// PATCH /customer/wishlist/items/{item_id}
pub async fn update_wishlist_item(
    State(state): State<AppState>,
    RequireCustomer(customer_id): RequireCustomer,
    ApiPath(item_id): ApiPath<WishlistItemId>,
    ApiJson(input): ApiJson<NotifyOnSaleInput>,
) -> Result<ApiResponse<WishlistItem>> {
    let item = state
        .wishlist()
        .update_notify_on_sale(customer_id, item_id, input.notify_on_sale)
        .await?;
    Ok(ApiResponse::ok(item).with_message("Wishlist item updated"))
}
