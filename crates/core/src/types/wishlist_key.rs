//! Identity of a wishlist entry within one customer's wishlist.

use core::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::id::{ProductId, VariantId};

/// Product plus optional variant.
///
/// Two keys are equal only when both the product and the variant slot match,
/// so "product X, no variant" and "product X, variant V" are distinct entries.
/// The no-variant slot is stored as the nil UUID, which no [`VariantId`] can
/// hold.
///
/// ```
/// use niaga_customer_core::{ProductId, VariantId, WishlistKey};
///
/// let product = ProductId::generate();
/// let bare = WishlistKey::new(product, None);
/// let sized = WishlistKey::new(product, Some(VariantId::generate()));
///
/// assert_ne!(bare, sized);
/// assert!(bare.variant_slot().is_nil());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WishlistKey {
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
}

impl WishlistKey {
    #[must_use]
    pub const fn new(product_id: ProductId, variant_id: Option<VariantId>) -> Self {
        Self {
            product_id,
            variant_id,
        }
    }

    /// Value stored in the `variant_key` column: the variant UUID or nil.
    #[must_use]
    pub fn variant_slot(&self) -> Uuid {
        self.variant_id.map_or_else(Uuid::nil, |v| v.as_uuid())
    }
}

impl fmt::Display for WishlistKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.variant_id {
            Some(variant) => write!(f, "{}-{variant}", self.product_id),
            None => write!(f, "{}-nil", self.product_id),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_distinguishes_keys() {
        let product = ProductId::generate();
        let v1 = VariantId::generate();
        let v2 = VariantId::generate();

        assert_eq!(
            WishlistKey::new(product, Some(v1)),
            WishlistKey::new(product, Some(v1))
        );
        assert_ne!(
            WishlistKey::new(product, Some(v1)),
            WishlistKey::new(product, Some(v2))
        );
        assert_ne!(
            WishlistKey::new(product, None),
            WishlistKey::new(product, Some(v1))
        );
    }

    #[test]
    fn test_variant_slot() {
        let product = ProductId::generate();
        let variant = VariantId::generate();
        assert!(WishlistKey::new(product, None).variant_slot().is_nil());
        assert_eq!(
            WishlistKey::new(product, Some(variant)).variant_slot(),
            variant.as_uuid()
        );
    }

    #[test]
    fn test_display() {
        let product = ProductId::parse("6f1c2a3e-0b4d-4a8e-9f10-2b3c4d5e6f70").unwrap();
        assert_eq!(
            WishlistKey::new(product, None).to_string(),
            "6f1c2a3e-0b4d-4a8e-9f10-2b3c4d5e6f70-nil"
        );
    }
}
