//! The single-default rule for per-customer collections.
//!
//! Every mutation runs in one storage transaction that first takes the
//! owner's lock, so operations on one customer's collection are linearizable
//! while different customers proceed in parallel. Any failure drops the
//! transaction, which rolls back the clear step together with the write.

use std::sync::Arc;

use niaga_customer_core::CustomerId;

use super::ServiceError;
use crate::db::DefaultStore;
use crate::models::{Defaultable, ValidationError};

/// Maintains "at most one default item per owner" for one collection.
pub struct ExactlyOneDefault<T: Defaultable> {
    store: Arc<dyn DefaultStore<T>>,
}

impl<T: Defaultable> Clone for ExactlyOneDefault<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<T: Defaultable> ExactlyOneDefault<T> {
    #[must_use]
    pub fn new(store: Arc<dyn DefaultStore<T>>) -> Self {
        Self { store }
    }

    /// Insert `item` for `owner`. When `make_default` is set, the owner's
    /// other items lose their default flag in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` if `item` belongs to someone else,
    /// `Conflict` if the storage backstop fires, or `Repository` on storage
    /// failure. Nothing is committed on error.
    pub async fn create(
        &self,
        owner: CustomerId,
        mut item: T,
        make_default: bool,
    ) -> Result<T, ServiceError> {
        if item.owner() != owner {
            return Err(ValidationError::Invalid(format!("{} owner mismatch", T::ITEM)).into());
        }

        let mut tx = self.store.begin().await?;
        tx.lock_owner(owner).await?;

        if make_default {
            let cleared = tx.clear_defaults(owner, None).await?;
            tracing::debug!(customer_id = %owner, collection = T::COLLECTION, cleared, "Cleared defaults");
        }
        item.set_default(make_default);
        let created = tx.insert(&item).await?;
        tx.commit().await?;

        tracing::info!(
            customer_id = %owner,
            collection = T::COLLECTION,
            id = %created.id(),
            is_default = make_default,
            "Created item"
        );
        Ok(created)
    }

    /// Rewrite an existing item via `apply`. `make_default` of `None` keeps
    /// the stored flag; `Some(true)` clears every sibling first.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the owner has no such item,
    /// `Validation` if `apply` rejects the change, or a storage error.
    pub async fn update<F>(
        &self,
        owner: CustomerId,
        id: T::Id,
        make_default: Option<bool>,
        apply: F,
    ) -> Result<T, ServiceError>
    where
        F: FnOnce(&T) -> Result<T, ValidationError> + Send,
    {
        let mut tx = self.store.begin().await?;
        tx.lock_owner(owner).await?;

        let current = tx
            .find(owner, id)
            .await?
            .ok_or(ServiceError::NotFound(T::ITEM))?;
        let mut next = apply(&current)?;

        let is_default = make_default.unwrap_or_else(|| current.is_default());
        if make_default == Some(true) {
            tx.clear_defaults(owner, Some(id)).await?;
        }
        next.set_default(is_default);

        let updated = tx.save(&next).await?;
        tx.commit().await?;

        tracing::info!(customer_id = %owner, collection = T::COLLECTION, %id, "Updated item");
        Ok(updated)
    }

    /// Make `id` the owner's only default.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the owner has no such item, or a
    /// storage error.
    pub async fn set_default(&self, owner: CustomerId, id: T::Id) -> Result<T, ServiceError> {
        let mut tx = self.store.begin().await?;
        tx.lock_owner(owner).await?;

        let mut item = tx
            .find(owner, id)
            .await?
            .ok_or(ServiceError::NotFound(T::ITEM))?;

        tx.clear_defaults(owner, Some(id)).await?;
        item.set_default(true);
        let saved = tx.save(&item).await?;
        tx.commit().await?;

        tracing::info!(customer_id = %owner, collection = T::COLLECTION, %id, "Set default");
        Ok(saved)
    }

    /// Remove an item. Deleting the default leaves the owner without one.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the owner has no such item, or a
    /// storage error.
    pub async fn delete(&self, owner: CustomerId, id: T::Id) -> Result<(), ServiceError> {
        let mut tx = self.store.begin().await?;
        tx.lock_owner(owner).await?;

        if !tx.delete(owner, id).await? {
            return Err(ServiceError::NotFound(T::ITEM));
        }
        tx.commit().await?;

        tracing::info!(customer_id = %owner, collection = T::COLLECTION, %id, "Deleted item");
        Ok(())
    }

    /// Default first, then newest first.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn list(&self, owner: CustomerId) -> Result<Vec<T>, ServiceError> {
        Ok(self.store.list(owner).await?)
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the owner has no such item.
    pub async fn get(&self, owner: CustomerId, id: T::Id) -> Result<T, ServiceError> {
        self.store
            .get(owner, id)
            .await?
            .ok_or(ServiceError::NotFound(T::ITEM))
    }

    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn get_default(&self, owner: CustomerId) -> Result<Option<T>, ServiceError> {
        Ok(self.store.get_default(owner).await?)
    }
}
