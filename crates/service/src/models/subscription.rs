//! Back-in-stock subscription domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use niaga_customer_core::{CustomerId, Email, ProductId, SubscriptionId, VariantId, WishlistKey};

use super::{ValidationError, optional_text};

/// A customer's request to be told when a product (or variant) is restocked.
///
/// Pending while `is_notified` is false; flips to notified exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackInStockSubscription {
    pub id: SubscriptionId,
    pub customer_id: CustomerId,
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
    pub product_name: String,
    pub product_slug: String,
    pub product_image: Option<String>,
    pub variant_sku: Option<String>,
    pub variant_name: Option<String>,
    pub is_notified: bool,
    pub notified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BackInStockSubscription {
    /// Identity within the customer's subscriptions.
    #[must_use]
    pub const fn key(&self) -> WishlistKey {
        WishlistKey::new(self.product_id, self.variant_id)
    }

    #[must_use]
    pub const fn is_pending(&self) -> bool {
        !self.is_notified
    }

    /// Whether a restock of `product_id` (and `variant_id`, if given) should
    /// notify this subscription.
    #[must_use]
    pub fn matches_restock(&self, product_id: ProductId, variant_id: Option<VariantId>) -> bool {
        self.product_id == product_id && variant_id.is_none_or(|v| self.variant_id == Some(v))
    }
}

/// A pending subscription joined with the subscriber's contact details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingSubscription {
    #[serde(flatten)]
    pub subscription: BackInStockSubscription,
    pub customer_email: Option<Email>,
    pub customer_name: Option<String>,
}

/// Request body for subscribing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeInput {
    pub product_id: ProductId,
    #[serde(default)]
    pub variant_id: Option<VariantId>,
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub product_slug: String,
    #[serde(default)]
    pub product_image: Option<String>,
    #[serde(default)]
    pub variant_sku: Option<String>,
    #[serde(default)]
    pub variant_name: Option<String>,
}

impl SubscribeInput {
    /// Validate into a new pending subscription owned by `owner`.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if a text field is too long.
    pub fn into_subscription(
        self,
        owner: CustomerId,
    ) -> Result<BackInStockSubscription, ValidationError> {
        let now = Utc::now();
        Ok(BackInStockSubscription {
            id: SubscriptionId::generate(),
            customer_id: owner,
            product_id: self.product_id,
            variant_id: self.variant_id,
            product_name: optional_text("productName", Some(&self.product_name), 255)?
                .unwrap_or_default(),
            product_slug: optional_text("productSlug", Some(&self.product_slug), 255)?
                .unwrap_or_default(),
            product_image: optional_text("productImage", self.product_image.as_deref(), 500)?,
            variant_sku: optional_text("variantSku", self.variant_sku.as_deref(), 100)?,
            variant_name: optional_text("variantName", self.variant_name.as_deref(), 255)?,
            is_notified: false,
            notified_at: None,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Aggregate counts for the admin dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BackInStockStats {
    pub total_subscriptions: i64,
    pub pending_notifications: i64,
    pub sent_notifications: i64,
    pub unique_products: i64,
    pub unique_customers: i64,
}
