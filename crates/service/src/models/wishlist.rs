//! Wishlist domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use niaga_customer_core::{
    CurrencyCode, CustomerId, Price, ProductId, VariantId, WishlistItemId, WishlistKey,
};

use super::{ValidationError, optional_text};

/// A product (optionally a specific variant) saved by a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WishlistItem {
    pub id: WishlistItemId,
    pub customer_id: CustomerId,
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
    pub variant_sku: Option<String>,
    pub variant_name: Option<String>,
    pub price_at_add: Price,
    pub notify_on_sale: bool,
    pub product_name: Option<String>,
    pub product_slug: Option<String>,
    pub product_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WishlistItem {
    #[must_use]
    pub const fn key(&self) -> WishlistKey {
        WishlistKey::new(self.product_id, self.variant_id)
    }
}

/// Request body for adding to the wishlist.
#[derive(Debug, Clone, Deserialize)]
pub struct WishlistAddInput {
    pub product_id: ProductId,
    #[serde(default)]
    pub variant_id: Option<VariantId>,
    #[serde(default)]
    pub variant_sku: Option<String>,
    #[serde(default)]
    pub variant_name: Option<String>,
    #[serde(default)]
    pub price_at_add: Option<Decimal>,
    #[serde(default)]
    pub currency_code: Option<CurrencyCode>,
    #[serde(default)]
    pub notify_on_sale: bool,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub product_slug: Option<String>,
    #[serde(default)]
    pub product_image: Option<String>,
}

impl WishlistAddInput {
    /// Validate into a new wishlist item owned by `owner`.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the price is negative or a text field is
    /// too long.
    pub fn into_item(self, owner: CustomerId) -> Result<WishlistItem, ValidationError> {
        let price = Price::new(
            self.price_at_add.unwrap_or_default(),
            self.currency_code.unwrap_or_default(),
        );
        if !price.is_valid() {
            return Err(ValidationError::Invalid(
                "price_at_add cannot be negative".to_owned(),
            ));
        }

        let now = Utc::now();
        Ok(WishlistItem {
            id: WishlistItemId::generate(),
            customer_id: owner,
            product_id: self.product_id,
            variant_id: self.variant_id,
            variant_sku: optional_text("variant_sku", self.variant_sku.as_deref(), 50)?,
            variant_name: optional_text("variant_name", self.variant_name.as_deref(), 100)?,
            price_at_add: price,
            notify_on_sale: self.notify_on_sale,
            product_name: optional_text("product_name", self.product_name.as_deref(), 255)?,
            product_slug: optional_text("product_slug", self.product_slug.as_deref(), 255)?,
            product_image: optional_text("product_image", self.product_image.as_deref(), 500)?,
            created_at: now,
            updated_at: now,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_input() {
        let product = ProductId::generate();
        let input: WishlistAddInput =
            serde_json::from_str(&format!(r#"{{"product_id":"{product}"}}"#)).unwrap();

        let item = input.into_item(CustomerId::generate()).unwrap();
        assert_eq!(item.key(), WishlistKey::new(product, None));
        assert_eq!(item.price_at_add.amount, Decimal::ZERO);
        assert_eq!(item.price_at_add.currency_code, CurrencyCode::MYR);
        assert!(!item.notify_on_sale);
    }

    #[test]
    fn test_rejects_nil_variant() {
        let product = ProductId::generate();
        let result: Result<WishlistAddInput, _> = serde_json::from_str(&format!(
            r#"{{"product_id":"{product}","variant_id":"00000000-0000-0000-0000-000000000000"}}"#
        ));
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_negative_price() {
        let product = ProductId::generate();
        let input: WishlistAddInput = serde_json::from_str(&format!(
            r#"{{"product_id":"{product}","price_at_add":"-1.00"}}"#
        ))
        .unwrap();
        assert!(matches!(
            input.into_item(CustomerId::generate()),
            Err(ValidationError::Invalid(_))
        ));
    }
}
