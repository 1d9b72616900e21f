//! Back-in-stock subscription registry.

use std::sync::Arc;

use chrono::{Duration, Utc};

use niaga_customer_core::{CustomerId, ProductId, SubscriptionId, VariantId, WishlistKey};

use super::ServiceError;
use crate::db::{InsertOutcome, SubscriptionRepository};
use crate::models::{BackInStockStats, BackInStockSubscription, PendingSubscription};

/// Default age for [`BackInStockRegistry::delete_old_notified`].
pub const DEFAULT_CLEANUP_DAYS: u32 = 30;

/// Pending and notified subscriptions, keyed by (customer, product, variant).
#[derive(Clone)]
pub struct BackInStockRegistry {
    repo: Arc<dyn SubscriptionRepository>,
}

impl BackInStockRegistry {
    #[must_use]
    pub fn new(repo: Arc<dyn SubscriptionRepository>) -> Self {
        Self { repo }
    }

    /// Subscribe. An existing subscription with the same key is returned
    /// unchanged, notified or not.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn subscribe(
        &self,
        subscription: BackInStockSubscription,
    ) -> Result<InsertOutcome<BackInStockSubscription>, ServiceError> {
        let outcome = self.repo.insert_if_absent(&subscription).await?;
        if outcome.is_inserted() {
            tracing::info!(
                customer_id = %subscription.customer_id,
                key = %subscription.key(),
                "Subscribed to back-in-stock"
            );
        }
        Ok(outcome)
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the customer has no subscription
    /// with this key.
    pub async fn unsubscribe(
        &self,
        customer: CustomerId,
        product_id: ProductId,
        variant_id: Option<VariantId>,
    ) -> Result<(), ServiceError> {
        let key = WishlistKey::new(product_id, variant_id);
        if !self.repo.delete_by_key(customer, key).await? {
            return Err(ServiceError::NotFound("subscription"));
        }
        tracing::info!(customer_id = %customer, %key, "Unsubscribed from back-in-stock");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the customer has no such
    /// subscription.
    pub async fn unsubscribe_by_id(
        &self,
        customer: CustomerId,
        id: SubscriptionId,
    ) -> Result<(), ServiceError> {
        if !self.repo.delete_by_id(customer, id).await? {
            return Err(ServiceError::NotFound("subscription"));
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn list_for_customer(
        &self,
        customer: CustomerId,
    ) -> Result<Vec<BackInStockSubscription>, ServiceError> {
        Ok(self.repo.list_for_customer(customer).await?)
    }

    /// The customer's subscription with exactly this key, if any.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn is_subscribed(
        &self,
        customer: CustomerId,
        product_id: ProductId,
        variant_id: Option<VariantId>,
    ) -> Result<Option<BackInStockSubscription>, ServiceError> {
        Ok(self
            .repo
            .find(customer, WishlistKey::new(product_id, variant_id))
            .await?)
    }

    /// Every subscription for the admin listing, newest first.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn list_all(
        &self,
        pending_only: bool,
    ) -> Result<Vec<BackInStockSubscription>, ServiceError> {
        Ok(self.repo.list_all(pending_only).await?)
    }

    /// Pending subscriptions to notify for a restock. Without a variant,
    /// every pending subscription of the product matches.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn pending_for_product(
        &self,
        product_id: ProductId,
        variant_id: Option<VariantId>,
    ) -> Result<Vec<PendingSubscription>, ServiceError> {
        Ok(self.repo.pending_for_product(product_id, variant_id).await?)
    }

    /// Mark exactly `ids` notified in one statement. Already-notified IDs are
    /// left alone. Returns how many changed.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn mark_notified(&self, ids: &[SubscriptionId]) -> Result<u64, ServiceError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let marked = self.repo.mark_notified(ids).await?;
        tracing::info!(requested = ids.len(), marked, "Marked subscriptions notified");
        Ok(marked)
    }

    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn stats(&self) -> Result<BackInStockStats, ServiceError> {
        Ok(self.repo.stats().await?)
    }

    /// Delete subscriptions notified more than `older_than_days` ago.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn delete_old_notified(&self, older_than_days: u32) -> Result<u64, ServiceError> {
        let cutoff = Utc::now() - Duration::days(i64::from(older_than_days));
        let deleted = self.repo.delete_notified_before(cutoff).await?;
        tracing::info!(older_than_days, deleted, "Cleaned up notified subscriptions");
        Ok(deleted)
    }
}
