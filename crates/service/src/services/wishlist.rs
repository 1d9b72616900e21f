//! Wishlist operations keyed by [`WishlistKey`].

use std::sync::Arc;

use niaga_customer_core::{CustomerId, ProductId, VariantId, WishlistItemId, WishlistKey};

use super::ServiceError;
use crate::db::{InsertOutcome, WishlistRepository};
use crate::models::WishlistItem;

/// A customer's saved products.
#[derive(Clone)]
pub struct Wishlist {
    repo: Arc<dyn WishlistRepository>,
}

impl Wishlist {
    #[must_use]
    pub fn new(repo: Arc<dyn WishlistRepository>) -> Self {
        Self { repo }
    }

    /// Add an item. Adding a key that is already present returns the stored
    /// item unchanged.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn add(
        &self,
        item: WishlistItem,
    ) -> Result<InsertOutcome<WishlistItem>, ServiceError> {
        let outcome = self.repo.add(&item).await?;
        if outcome.is_inserted() {
            tracing::info!(
                customer_id = %item.customer_id,
                key = %item.key(),
                "Added to wishlist"
            );
        } else {
            tracing::debug!(customer_id = %item.customer_id, key = %item.key(), "Already in wishlist");
        }
        Ok(outcome)
    }

    /// Remove the entry with exactly this key. `None` means the
    /// product-level entry only.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if no entry has this key.
    pub async fn remove(
        &self,
        owner: CustomerId,
        product_id: ProductId,
        variant_id: Option<VariantId>,
    ) -> Result<(), ServiceError> {
        let key = WishlistKey::new(product_id, variant_id);
        if !self.repo.remove(owner, key).await? {
            return Err(ServiceError::NotFound("wishlist item"));
        }
        tracing::info!(customer_id = %owner, %key, "Removed from wishlist");
        Ok(())
    }

    /// Remove every entry of a product. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the product was not in the wishlist.
    pub async fn remove_all_variants_of_product(
        &self,
        owner: CustomerId,
        product_id: ProductId,
    ) -> Result<u64, ServiceError> {
        let removed = self.repo.remove_product(owner, product_id).await?;
        if removed == 0 {
            return Err(ServiceError::NotFound("wishlist item"));
        }
        tracing::info!(customer_id = %owner, %product_id, removed, "Removed product from wishlist");
        Ok(removed)
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the owner has no such item.
    pub async fn remove_by_id(
        &self,
        owner: CustomerId,
        id: WishlistItemId,
    ) -> Result<(), ServiceError> {
        if !self.repo.remove_by_id(owner, id).await? {
            return Err(ServiceError::NotFound("wishlist item"));
        }
        Ok(())
    }

    /// Whether an entry with exactly this key exists.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn exists(
        &self,
        owner: CustomerId,
        product_id: ProductId,
        variant_id: Option<VariantId>,
    ) -> Result<bool, ServiceError> {
        Ok(self
            .repo
            .find(owner, WishlistKey::new(product_id, variant_id))
            .await?
            .is_some())
    }

    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn list(&self, owner: CustomerId) -> Result<Vec<WishlistItem>, ServiceError> {
        Ok(self.repo.list(owner).await?)
    }

    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn count(&self, owner: CustomerId) -> Result<i64, ServiceError> {
        Ok(self.repo.count(owner).await?)
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the owner has no such item.
    pub async fn update_notify_on_sale(
        &self,
        owner: CustomerId,
        id: WishlistItemId,
        notify: bool,
    ) -> Result<WishlistItem, ServiceError> {
        self.repo
            .set_notify_on_sale(owner, id, notify)
            .await?
            .ok_or(ServiceError::NotFound("wishlist item"))
    }

    /// Entries of a product whose owners want price-drop alerts.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn sale_watchers(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<WishlistItem>, ServiceError> {
        Ok(self.repo.sale_watchers(product_id).await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::db::MemoryStore;
    use crate::models::WishlistAddInput;

    fn wishlist() -> Wishlist {
        Wishlist::new(Arc::new(MemoryStore::new()))
    }

    fn item(owner: CustomerId, product: ProductId, variant: Option<VariantId>) -> WishlistItem {
        WishlistAddInput {
            product_id: product,
            variant_id: variant,
            variant_sku: None,
            variant_name: None,
            price_at_add: Some(Decimal::new(12900, 2)),
            currency_code: None,
            notify_on_sale: false,
            product_name: Some("Kebaya Nyonya".to_owned()),
            product_slug: Some("kebaya-nyonya".to_owned()),
            product_image: None,
        }
        .into_item(owner)
        .unwrap()
    }

    #[tokio::test]
    async fn test_add_twice_keeps_one_entry() {
        let wishlist = wishlist();
        let owner = CustomerId::generate();
        let product = ProductId::generate();

        let first = wishlist.add(item(owner, product, None)).await.unwrap();
        let second = wishlist.add(item(owner, product, None)).await.unwrap();

        assert!(first.is_inserted());
        assert!(!second.is_inserted());
        assert_eq!(first.into_inner().id, second.into_inner().id);
        assert_eq!(wishlist.count(owner).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_variants_are_distinct_entries() {
        let wishlist = wishlist();
        let owner = CustomerId::generate();
        let product = ProductId::generate();

        wishlist.add(item(owner, product, None)).await.unwrap();
        wishlist
            .add(item(owner, product, Some(VariantId::generate())))
            .await
            .unwrap();

        assert_eq!(wishlist.list(owner).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_add_then_remove_without_variant() {
        let wishlist = wishlist();
        let owner = CustomerId::generate();
        let product = ProductId::generate();
        let other_variant = Some(VariantId::generate());

        wishlist.add(item(owner, product, None)).await.unwrap();
        assert!(!wishlist.exists(owner, product, other_variant).await.unwrap());

        wishlist.remove(owner, product, None).await.unwrap();

        assert!(!wishlist.exists(owner, product, None).await.unwrap());
        assert!(!wishlist.exists(owner, product, other_variant).await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_missing_key_is_not_found() {
        let wishlist = wishlist();
        let owner = CustomerId::generate();
        let product = ProductId::generate();
        wishlist
            .add(item(owner, product, Some(VariantId::generate())))
            .await
            .unwrap();

        let err = wishlist.remove(owner, product, None).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_remove_all_variants_of_product() {
        let wishlist = wishlist();
        let owner = CustomerId::generate();
        let product = ProductId::generate();
        wishlist.add(item(owner, product, None)).await.unwrap();
        wishlist
            .add(item(owner, product, Some(VariantId::generate())))
            .await
            .unwrap();
        wishlist
            .add(item(owner, ProductId::generate(), None))
            .await
            .unwrap();

        let removed = wishlist
            .remove_all_variants_of_product(owner, product)
            .await
            .unwrap();

        assert_eq!(removed, 2);
        assert_eq!(wishlist.count(owner).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_wishlists_are_per_owner() {
        let wishlist = wishlist();
        let product = ProductId::generate();
        let alice = CustomerId::generate();
        let bob = CustomerId::generate();

        let added = wishlist
            .add(item(alice, product, None))
            .await
            .unwrap()
            .into_inner();

        assert!(!wishlist.exists(bob, product, None).await.unwrap());
        assert!(wishlist.remove_by_id(bob, added.id).await.is_err());
    }

    #[tokio::test]
    async fn test_sale_watchers() {
        let wishlist = wishlist();
        let owner = CustomerId::generate();
        let product = ProductId::generate();
        let added = wishlist
            .add(item(owner, product, None))
            .await
            .unwrap()
            .into_inner();

        assert!(wishlist.sale_watchers(product).await.unwrap().is_empty());

        let updated = wishlist
            .update_notify_on_sale(owner, added.id, true)
            .await
            .unwrap();
        assert!(updated.notify_on_sale);
        assert_eq!(wishlist.sale_watchers(product).await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_adds_of_one_key_keep_one_entry() {
        let wishlist = wishlist();
        let owner = CustomerId::generate();
        let product = ProductId::generate();
        let variant = Some(VariantId::generate());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let wishlist = wishlist.clone();
                tokio::spawn(async move { wishlist.add(item(owner, product, variant)).await })
            })
            .collect();
        let mut outcomes = Vec::new();
        for handle in handles {
            outcomes.push(handle.await.unwrap().unwrap());
        }

        assert_eq!(outcomes.iter().filter(|o| o.is_inserted()).count(), 1);
        let ids: std::collections::HashSet<_> =
            outcomes.into_iter().map(|o| o.into_inner().id).collect();
        assert_eq!(ids.len(), 1);
        assert_eq!(wishlist.count(owner).await.unwrap(), 1);
    }
}
