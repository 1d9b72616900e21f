//! Customer back-in-stock subscription routes.
//!
//! Bodies and responses on these routes are camelCase.

use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use niaga_customer_core::{ProductId, SubscriptionId, VariantId};

use crate::db::InsertOutcome;
use crate::error::Result;
use crate::middleware::RequireCustomer;
use crate::models::{BackInStockSubscription, SubscribeInput};
use crate::routes::extract::{ApiJson, ApiPath, ApiQuery, ApiResponse, blank_as_none};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantQuery {
    #[serde(default, alias = "variant_id", deserialize_with = "blank_as_none")]
    pub variant_id: Option<VariantId>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionCheck {
    pub is_subscribed: bool,
    pub subscription: Option<BackInStockSubscription>,
}

/// GET /customer/back-in-stock
pub async fn list_subscriptions(
    State(state): State<AppState>,
    RequireCustomer(customer_id): RequireCustomer,
) -> Result<ApiResponse<Vec<BackInStockSubscription>>> {
    let subscriptions = state.back_in_stock().list_for_customer(customer_id).await?;
    Ok(ApiResponse::ok(subscriptions))
}

/// POST /customer/back-in-stock
///
/// 201 with the new subscription, or 200 with the existing one.
pub async fn subscribe(
    State(state): State<AppState>,
    RequireCustomer(customer_id): RequireCustomer,
    ApiJson(input): ApiJson<SubscribeInput>,
) -> Result<Response> {
    let subscription = input.into_subscription(customer_id)?;

    Ok(match state.back_in_stock().subscribe(subscription).await? {
        InsertOutcome::Inserted(sub) => ApiResponse::ok(sub)
            .with_message("Subscribed to back-in-stock notifications")
            .created(),
        InsertOutcome::Existing(sub) => ApiResponse::ok(sub)
            .with_message("Already subscribed")
            .into_response(),
    })
}

/// GET /customer/back-in-stock/check/{product_id}?variantId=
pub async fn check_subscription(
    State(state): State<AppState>,
    RequireCustomer(customer_id): RequireCustomer,
    ApiPath(product_id): ApiPath<ProductId>,
    ApiQuery(query): ApiQuery<VariantQuery>,
) -> Result<ApiResponse<SubscriptionCheck>> {
    let subscription = state
        .back_in_stock()
        .is_subscribed(customer_id, product_id, query.variant_id)
        .await?;

    Ok(ApiResponse::ok(SubscriptionCheck {
        is_subscribed: subscription.is_some(),
        subscription,
    }))
}

/// DELETE /customer/back-in-stock/{product_id}?variantId=
pub async fn unsubscribe(
    State(state): State<AppState>,
    RequireCustomer(customer_id): RequireCustomer,
    ApiPath(product_id): ApiPath<ProductId>,
    ApiQuery(query): ApiQuery<VariantQuery>,
) -> Result<ApiResponse<()>> {
    state
        .back_in_stock()
        .unsubscribe(customer_id, product_id, query.variant_id)
        .await?;
    Ok(ApiResponse::message("Unsubscribed"))
}

/// DELETE /customer/back-in-stock/subscriptions/{id}
pub async fn unsubscribe_by_id(
    State(state): State<AppState>,
    RequireCustomer(customer_id): RequireCustomer,
    ApiPath(id): ApiPath<SubscriptionId>,
) -> Result<ApiResponse<()>> {
    state
        .back_in_stock()
        .unsubscribe_by_id(customer_id, id)
        .await?;
    Ok(ApiResponse::message("Unsubscribed"))
}
