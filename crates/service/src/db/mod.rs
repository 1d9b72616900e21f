//! Storage for the customer service.
//!
//! # Database: `niaga_customer`, schema `customer`
//!
//! ## Tables
//!
//! - `profiles` - One row per customer, keyed by the identity-provider subject
//! - `addresses` - Shipping addresses (at most one default per customer)
//! - `measurements` - Body measurement sets (at most one default per customer)
//! - `wishlist_items` - Unique per (customer, product, variant slot)
//! - `back_in_stock_subscriptions` - Unique per (customer, product, variant slot)
//!
//! # Backends
//!
//! The traits in this module are the only storage seam. [`PgStore`] is the
//! production backend; [`MemoryStore`] keeps the same transactional
//! semantics in process and backs the test suites.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/service/migrations/` and run via:
//! ```bash
//! cargo run -p niaga-customer-cli -- migrate
//! ```

pub mod addresses;
pub mod measurements;
pub mod memory;
pub mod pg_defaults;
pub mod profiles;
pub mod subscriptions;
pub mod wishlist;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use niaga_customer_core::{
    CustomerId, CustomerStatus, ProductId, SubscriptionId, VariantId, WishlistItemId, WishlistKey,
};

use crate::models::{
    BackInStockStats, BackInStockSubscription, CustomerStats, Defaultable, PendingSubscription,
    Profile, WishlistItem,
};

pub use memory::MemoryStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., a second default address).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Map a unique-constraint violation to `Conflict`, anything else to `Database`.
pub(crate) fn map_unique_violation(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(what.to_owned());
    }
    RepositoryError::Database(e)
}

/// Result of an idempotent insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome<T> {
    /// A new row was written.
    Inserted(T),
    /// A row with the same identity key already existed; it is returned unchanged.
    Existing(T),
}

impl<T> InsertOutcome<T> {
    #[must_use]
    pub const fn is_inserted(&self) -> bool {
        matches!(self, Self::Inserted(_))
    }

    #[must_use]
    pub fn into_inner(self) -> T {
        match self {
            Self::Inserted(value) | Self::Existing(value) => value,
        }
    }
}

/// Rounds of insert-then-find before an idempotent insert gives up.
const INSERT_ATTEMPTS: usize = 2;

/// Insert a row, or return the one already holding its unique key.
///
/// `insert` yields `None` when the key is taken. If the holder is deleted
/// before `find` sees it, the insert is tried again.
pub(crate) async fn insert_or_find<T, I, IFut, F, FFut>(
    mut insert: I,
    mut find: F,
    what: &str,
) -> Result<InsertOutcome<T>, RepositoryError>
where
    I: FnMut() -> IFut,
    IFut: Future<Output = Result<Option<T>, RepositoryError>>,
    F: FnMut() -> FFut,
    FFut: Future<Output = Result<Option<T>, RepositoryError>>,
{
    for _ in 0..INSERT_ATTEMPTS {
        if let Some(row) = insert().await? {
            return Ok(InsertOutcome::Inserted(row));
        }
        if let Some(existing) = find().await? {
            return Ok(InsertOutcome::Existing(existing));
        }
    }
    Err(RepositoryError::Conflict(format!("{what} changed concurrently")))
}

// =============================================================================
// Default-item collections (addresses, measurements)
// =============================================================================

/// One storage transaction over a default-item collection.
///
/// Dropping the transaction without calling [`DefaultTx::commit`] rolls
/// back every write made through it.
#[async_trait]
pub trait DefaultTx<T: Defaultable>: Send {
    /// Serialize with every other transaction touching `owner`'s collection.
    async fn lock_owner(&mut self, owner: CustomerId) -> Result<(), RepositoryError>;

    /// Load an item if it exists and belongs to `owner`.
    async fn find(&mut self, owner: CustomerId, id: T::Id) -> Result<Option<T>, RepositoryError>;

    /// Clear `is_default` on all of `owner`'s items, optionally sparing one.
    /// Returns the number of items changed.
    async fn clear_defaults(
        &mut self,
        owner: CustomerId,
        except: Option<T::Id>,
    ) -> Result<u64, RepositoryError>;

    /// Insert a new item. `Conflict` if the ID or a constraint collides.
    async fn insert(&mut self, item: &T) -> Result<T, RepositoryError>;

    /// Overwrite an existing item. `NotFound` if it does not exist.
    async fn save(&mut self, item: &T) -> Result<T, RepositoryError>;

    /// Delete an item. Returns whether a row was removed.
    async fn delete(&mut self, owner: CustomerId, id: T::Id) -> Result<bool, RepositoryError>;

    /// Make every write visible atomically.
    async fn commit(self: Box<Self>) -> Result<(), RepositoryError>;
}

/// Storage for a default-item collection.
#[async_trait]
pub trait DefaultStore<T: Defaultable>: Send + Sync {
    /// Start a transaction.
    async fn begin(&self) -> Result<Box<dyn DefaultTx<T>>, RepositoryError>;

    /// All of `owner`'s items, default first, then newest first.
    async fn list(&self, owner: CustomerId) -> Result<Vec<T>, RepositoryError>;

    async fn get(&self, owner: CustomerId, id: T::Id) -> Result<Option<T>, RepositoryError>;

    async fn get_default(&self, owner: CustomerId) -> Result<Option<T>, RepositoryError>;
}

// =============================================================================
// Wishlist
// =============================================================================

/// Storage for wishlist items.
#[async_trait]
pub trait WishlistRepository: Send + Sync {
    /// Insert unless an item with the same key exists for the owner.
    async fn add(&self, item: &WishlistItem)
    -> Result<InsertOutcome<WishlistItem>, RepositoryError>;

    /// Exact-key lookup.
    async fn find(
        &self,
        owner: CustomerId,
        key: WishlistKey,
    ) -> Result<Option<WishlistItem>, RepositoryError>;

    /// Remove the item with exactly this key. Returns whether one was removed.
    async fn remove(&self, owner: CustomerId, key: WishlistKey) -> Result<bool, RepositoryError>;

    /// Remove every item of a product, whatever its variant.
    async fn remove_product(
        &self,
        owner: CustomerId,
        product_id: ProductId,
    ) -> Result<u64, RepositoryError>;

    async fn remove_by_id(
        &self,
        owner: CustomerId,
        id: WishlistItemId,
    ) -> Result<bool, RepositoryError>;

    /// Newest first.
    async fn list(&self, owner: CustomerId) -> Result<Vec<WishlistItem>, RepositoryError>;

    async fn count(&self, owner: CustomerId) -> Result<i64, RepositoryError>;

    /// Returns the updated item, or `None` if the owner has no such item.
    async fn set_notify_on_sale(
        &self,
        owner: CustomerId,
        id: WishlistItemId,
        notify: bool,
    ) -> Result<Option<WishlistItem>, RepositoryError>;

    /// Items of a product whose owners asked to hear about price drops.
    async fn sale_watchers(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<WishlistItem>, RepositoryError>;
}

// =============================================================================
// Back-in-stock subscriptions
// =============================================================================

/// Storage for back-in-stock subscriptions.
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Insert unless a subscription with the same key exists for the customer.
    async fn insert_if_absent(
        &self,
        subscription: &BackInStockSubscription,
    ) -> Result<InsertOutcome<BackInStockSubscription>, RepositoryError>;

    async fn find(
        &self,
        owner: CustomerId,
        key: WishlistKey,
    ) -> Result<Option<BackInStockSubscription>, RepositoryError>;

    async fn delete_by_key(
        &self,
        owner: CustomerId,
        key: WishlistKey,
    ) -> Result<bool, RepositoryError>;

    async fn delete_by_id(
        &self,
        owner: CustomerId,
        id: SubscriptionId,
    ) -> Result<bool, RepositoryError>;

    /// Newest first.
    async fn list_for_customer(
        &self,
        owner: CustomerId,
    ) -> Result<Vec<BackInStockSubscription>, RepositoryError>;

    /// Every subscription, newest first, optionally only the pending ones.
    async fn list_all(
        &self,
        pending_only: bool,
    ) -> Result<Vec<BackInStockSubscription>, RepositoryError>;

    /// Pending subscriptions for a product, oldest first. With a variant,
    /// only subscriptions for exactly that variant; without, all of them.
    async fn pending_for_product(
        &self,
        product_id: ProductId,
        variant_id: Option<VariantId>,
    ) -> Result<Vec<PendingSubscription>, RepositoryError>;

    /// Mark the given pending subscriptions notified in one statement.
    /// Already-notified IDs are skipped. Returns the number changed.
    async fn mark_notified(&self, ids: &[SubscriptionId]) -> Result<u64, RepositoryError>;

    async fn stats(&self) -> Result<BackInStockStats, RepositoryError>;

    /// Delete notified subscriptions whose notification predates `cutoff`.
    async fn delete_notified_before(&self, cutoff: DateTime<Utc>)
    -> Result<u64, RepositoryError>;
}

// =============================================================================
// Profiles
// =============================================================================

/// Storage for customer profiles.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn get(&self, id: CustomerId) -> Result<Option<Profile>, RepositoryError>;

    /// Insert or overwrite the editable fields. Status and `created_at` of an
    /// existing row are kept.
    async fn upsert(&self, profile: &Profile) -> Result<Profile, RepositoryError>;

    /// Insert a new profile. `None` if the customer already has one.
    async fn create(&self, profile: &Profile) -> Result<Option<Profile>, RepositoryError>;

    /// Overwrite the editable fields of an existing profile. `None` if there
    /// is no such customer.
    async fn update(&self, profile: &Profile) -> Result<Option<Profile>, RepositoryError>;

    /// Move the status from `from` to `to` in one step. `None` if there is no
    /// such customer or its status is no longer `from`.
    async fn set_status(
        &self,
        id: CustomerId,
        from: CustomerStatus,
        to: CustomerStatus,
    ) -> Result<Option<Profile>, RepositoryError>;

    /// Delete the profile together with everything the customer owns.
    /// Nothing is deleted if there is no profile; returns whether there was.
    async fn delete(&self, id: CustomerId) -> Result<bool, RepositoryError>;

    async fn stats(&self) -> Result<CustomerStats, RepositoryError>;
}

/// Backend liveness check used by readiness.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn ping(&self) -> Result<(), RepositoryError>;
}

// =============================================================================
// PostgreSQL backend
// =============================================================================

/// `PostgreSQL` implementation of every storage trait.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl HealthCheck for PgStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn test_insert_outcome() {
        let inserted = InsertOutcome::Inserted(1);
        assert!(inserted.is_inserted());
        assert_eq!(inserted.into_inner(), 1);

        let existing = InsertOutcome::Existing(2);
        assert!(!existing.is_inserted());
        assert_eq!(existing.into_inner(), 2);
    }

    #[test]
    fn test_repository_error_display() {
        assert_eq!(RepositoryError::NotFound.to_string(), "not found");
        assert_eq!(
            RepositoryError::Conflict("duplicate default".to_owned()).to_string(),
            "constraint violation: duplicate default"
        );
    }

    #[tokio::test]
    async fn test_insert_or_find_returns_existing() {
        let outcome = insert_or_find(
            || async { Ok(None::<u32>) },
            || async { Ok(Some(7)) },
            "item",
        )
        .await
        .unwrap();
        assert_eq!(outcome, InsertOutcome::Existing(7));
    }

    #[tokio::test]
    async fn test_insert_retried_when_holder_vanishes() {
        // The first insert loses to a row that is deleted before the lookup.
        let inserts = AtomicUsize::new(0);
        let outcome = insert_or_find(
            || {
                let attempt = inserts.fetch_add(1, Ordering::SeqCst);
                async move { Ok((attempt > 0).then_some(1_u32)) }
            },
            || async { Ok(None) },
            "item",
        )
        .await
        .unwrap();

        assert_eq!(outcome, InsertOutcome::Inserted(1));
        assert_eq!(inserts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_insert_gives_up_with_conflict() {
        let inserts = AtomicUsize::new(0);
        let err = insert_or_find(
            || {
                inserts.fetch_add(1, Ordering::SeqCst);
                async { Ok(None::<u32>) }
            },
            || async { Ok(None) },
            "subscription",
        )
        .await
        .unwrap_err();

        assert!(matches!(err, RepositoryError::Conflict(ref m) if m == "subscription changed concurrently"));
        assert_eq!(inserts.load(Ordering::SeqCst), INSERT_ATTEMPTS);
    }
}
