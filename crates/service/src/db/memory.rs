//! In-process storage backend.
//!
//! Each collection sits behind its own `tokio` mutex. A default-item
//! transaction holds the collection lock for its whole lifetime and works on
//! a staged copy: commit swaps the copy in, dropping the transaction throws
//! it away. Writes that would leave an owner with two defaults fail with
//! `Conflict`, as the partial unique index does in `PostgreSQL`.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};

use niaga_customer_core::{
    CustomerId, CustomerStatus, ProductId, SubscriptionId, VariantId, WishlistItemId, WishlistKey,
};

use super::{
    DefaultStore, DefaultTx, HealthCheck, InsertOutcome, ProfileRepository, RepositoryError,
    SubscriptionRepository, WishlistRepository,
};
use crate::models::{
    Address, BackInStockStats, BackInStockSubscription, CustomerStats, Defaultable, Measurement,
    PendingSubscription, Profile, WishlistItem,
};

type Table<T> = Arc<Mutex<HashMap<<T as Defaultable>::Id, T>>>;

/// In-memory implementation of every storage trait.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    addresses: Table<Address>,
    measurements: Table<Measurement>,
    wishlist: Mutex<Vec<WishlistItem>>,
    subscriptions: Mutex<Vec<BackInStockSubscription>>,
    profiles: Mutex<HashMap<CustomerId, Profile>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Maps a default-item type to its table in [`MemoryStore`].
pub trait MemoryCollection: Defaultable {
    fn table(store: &MemoryStore) -> Table<Self>;
    fn created_at(&self) -> DateTime<Utc>;
}

impl MemoryCollection for Address {
    fn table(store: &MemoryStore) -> Table<Self> {
        Arc::clone(&store.inner.addresses)
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl MemoryCollection for Measurement {
    fn table(store: &MemoryStore) -> Table<Self> {
        Arc::clone(&store.inner.measurements)
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Transaction over one in-memory default-item table.
pub struct MemoryDefaultTx<T: Defaultable> {
    guard: OwnedMutexGuard<HashMap<T::Id, T>>,
    staged: HashMap<T::Id, T>,
}

impl<T: Defaultable> MemoryDefaultTx<T> {
    fn other_default(&self, item: &T) -> bool {
        item.is_default()
            && self
                .staged
                .values()
                .any(|o| o.owner() == item.owner() && o.id() != item.id() && o.is_default())
    }
}

#[async_trait]
impl<T: Defaultable> DefaultTx<T> for MemoryDefaultTx<T> {
    async fn lock_owner(&mut self, _owner: CustomerId) -> Result<(), RepositoryError> {
        // The collection lock taken in `begin` already covers every owner.
        Ok(())
    }

    async fn find(&mut self, owner: CustomerId, id: T::Id) -> Result<Option<T>, RepositoryError> {
        Ok(self.staged.get(&id).filter(|i| i.owner() == owner).cloned())
    }

    async fn clear_defaults(
        &mut self,
        owner: CustomerId,
        except: Option<T::Id>,
    ) -> Result<u64, RepositoryError> {
        let mut changed = 0;
        for item in self.staged.values_mut() {
            if item.owner() == owner && item.is_default() && Some(item.id()) != except {
                item.set_default(false);
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn insert(&mut self, item: &T) -> Result<T, RepositoryError> {
        if self.staged.contains_key(&item.id()) || self.other_default(item) {
            return Err(RepositoryError::Conflict(T::COLLECTION.to_owned()));
        }
        self.staged.insert(item.id(), item.clone());
        Ok(item.clone())
    }

    async fn save(&mut self, item: &T) -> Result<T, RepositoryError> {
        match self.staged.get(&item.id()) {
            Some(existing) if existing.owner() == item.owner() => {}
            _ => return Err(RepositoryError::NotFound),
        }
        if self.other_default(item) {
            return Err(RepositoryError::Conflict(T::COLLECTION.to_owned()));
        }
        self.staged.insert(item.id(), item.clone());
        Ok(item.clone())
    }

    async fn delete(&mut self, owner: CustomerId, id: T::Id) -> Result<bool, RepositoryError> {
        if self.staged.get(&id).is_some_and(|i| i.owner() == owner) {
            self.staged.remove(&id);
            return Ok(true);
        }
        Ok(false)
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        let Self { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }
}

#[async_trait]
impl<T: MemoryCollection> DefaultStore<T> for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn DefaultTx<T>>, RepositoryError> {
        let guard = T::table(self).lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(MemoryDefaultTx { guard, staged }))
    }

    async fn list(&self, owner: CustomerId) -> Result<Vec<T>, RepositoryError> {
        let table = T::table(self);
        let mut items: Vec<T> = table
            .lock()
            .await
            .values()
            .filter(|i| i.owner() == owner)
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            b.is_default()
                .cmp(&a.is_default())
                .then_with(|| b.created_at().cmp(&a.created_at()))
        });
        Ok(items)
    }

    async fn get(&self, owner: CustomerId, id: T::Id) -> Result<Option<T>, RepositoryError> {
        let table = T::table(self);
        let guard = table.lock().await;
        Ok(guard.get(&id).filter(|i| i.owner() == owner).cloned())
    }

    async fn get_default(&self, owner: CustomerId) -> Result<Option<T>, RepositoryError> {
        let table = T::table(self);
        let guard = table.lock().await;
        Ok(guard
            .values()
            .find(|i| i.owner() == owner && i.is_default())
            .cloned())
    }
}

#[async_trait]
impl WishlistRepository for MemoryStore {
    async fn add(
        &self,
        item: &WishlistItem,
    ) -> Result<InsertOutcome<WishlistItem>, RepositoryError> {
        let mut items = self.inner.wishlist.lock().await;
        if let Some(existing) = items
            .iter()
            .find(|i| i.customer_id == item.customer_id && i.key() == item.key())
        {
            return Ok(InsertOutcome::Existing(existing.clone()));
        }
        items.push(item.clone());
        Ok(InsertOutcome::Inserted(item.clone()))
    }

    async fn find(
        &self,
        owner: CustomerId,
        key: WishlistKey,
    ) -> Result<Option<WishlistItem>, RepositoryError> {
        let items = self.inner.wishlist.lock().await;
        Ok(items
            .iter()
            .find(|i| i.customer_id == owner && i.key() == key)
            .cloned())
    }

    async fn remove(&self, owner: CustomerId, key: WishlistKey) -> Result<bool, RepositoryError> {
        let mut items = self.inner.wishlist.lock().await;
        let before = items.len();
        items.retain(|i| !(i.customer_id == owner && i.key() == key));
        Ok(items.len() < before)
    }

    async fn remove_product(
        &self,
        owner: CustomerId,
        product_id: ProductId,
    ) -> Result<u64, RepositoryError> {
        let mut items = self.inner.wishlist.lock().await;
        let before = items.len();
        items.retain(|i| !(i.customer_id == owner && i.product_id == product_id));
        Ok((before - items.len()) as u64)
    }

    async fn remove_by_id(
        &self,
        owner: CustomerId,
        id: WishlistItemId,
    ) -> Result<bool, RepositoryError> {
        let mut items = self.inner.wishlist.lock().await;
        let before = items.len();
        items.retain(|i| !(i.customer_id == owner && i.id == id));
        Ok(items.len() < before)
    }

    async fn list(&self, owner: CustomerId) -> Result<Vec<WishlistItem>, RepositoryError> {
        let items = self.inner.wishlist.lock().await;
        let mut found: Vec<_> = items
            .iter()
            .filter(|i| i.customer_id == owner)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn count(&self, owner: CustomerId) -> Result<i64, RepositoryError> {
        let items = self.inner.wishlist.lock().await;
        let count = items.iter().filter(|i| i.customer_id == owner).count();
        i64::try_from(count).map_err(|e| RepositoryError::DataCorruption(e.to_string()))
    }

    async fn set_notify_on_sale(
        &self,
        owner: CustomerId,
        id: WishlistItemId,
        notify: bool,
    ) -> Result<Option<WishlistItem>, RepositoryError> {
        let mut items = self.inner.wishlist.lock().await;
        Ok(items
            .iter_mut()
            .find(|i| i.customer_id == owner && i.id == id)
            .map(|item| {
                item.notify_on_sale = notify;
                item.updated_at = Utc::now();
                item.clone()
            }))
    }

    async fn sale_watchers(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<WishlistItem>, RepositoryError> {
        let items = self.inner.wishlist.lock().await;
        let mut found: Vec<_> = items
            .iter()
            .filter(|i| i.product_id == product_id && i.notify_on_sale)
            .cloned()
            .collect();
        found.sort_by_key(|i| i.created_at);
        Ok(found)
    }
}

#[async_trait]
impl SubscriptionRepository for MemoryStore {
    async fn insert_if_absent(
        &self,
        subscription: &BackInStockSubscription,
    ) -> Result<InsertOutcome<BackInStockSubscription>, RepositoryError> {
        let mut subs = self.inner.subscriptions.lock().await;
        if let Some(existing) = subs
            .iter()
            .find(|s| s.customer_id == subscription.customer_id && s.key() == subscription.key())
        {
            return Ok(InsertOutcome::Existing(existing.clone()));
        }
        subs.push(subscription.clone());
        Ok(InsertOutcome::Inserted(subscription.clone()))
    }

    async fn find(
        &self,
        owner: CustomerId,
        key: WishlistKey,
    ) -> Result<Option<BackInStockSubscription>, RepositoryError> {
        let subs = self.inner.subscriptions.lock().await;
        Ok(subs
            .iter()
            .find(|s| s.customer_id == owner && s.key() == key)
            .cloned())
    }

    async fn delete_by_key(
        &self,
        owner: CustomerId,
        key: WishlistKey,
    ) -> Result<bool, RepositoryError> {
        let mut subs = self.inner.subscriptions.lock().await;
        let before = subs.len();
        subs.retain(|s| !(s.customer_id == owner && s.key() == key));
        Ok(subs.len() < before)
    }

    async fn delete_by_id(
        &self,
        owner: CustomerId,
        id: SubscriptionId,
    ) -> Result<bool, RepositoryError> {
        let mut subs = self.inner.subscriptions.lock().await;
        let before = subs.len();
        subs.retain(|s| !(s.customer_id == owner && s.id == id));
        Ok(subs.len() < before)
    }

    async fn list_for_customer(
        &self,
        owner: CustomerId,
    ) -> Result<Vec<BackInStockSubscription>, RepositoryError> {
        let subs = self.inner.subscriptions.lock().await;
        let mut found: Vec<_> = subs
            .iter()
            .filter(|s| s.customer_id == owner)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn list_all(
        &self,
        pending_only: bool,
    ) -> Result<Vec<BackInStockSubscription>, RepositoryError> {
        let subs = self.inner.subscriptions.lock().await;
        let mut found: Vec<_> = subs
            .iter()
            .filter(|s| !pending_only || s.is_pending())
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn pending_for_product(
        &self,
        product_id: ProductId,
        variant_id: Option<VariantId>,
    ) -> Result<Vec<PendingSubscription>, RepositoryError> {
        let mut pending: Vec<_> = {
            let subs = self.inner.subscriptions.lock().await;
            subs.iter()
                .filter(|s| s.is_pending() && s.matches_restock(product_id, variant_id))
                .cloned()
                .collect()
        };
        pending.sort_by_key(|s| s.created_at);

        let profiles = self.inner.profiles.lock().await;
        Ok(pending
            .into_iter()
            .map(|subscription| {
                let profile = profiles.get(&subscription.customer_id);
                PendingSubscription {
                    customer_email: profile.and_then(|p| p.email.clone()),
                    customer_name: profile.and_then(|p| p.full_name.clone()),
                    subscription,
                }
            })
            .collect())
    }

    async fn mark_notified(&self, ids: &[SubscriptionId]) -> Result<u64, RepositoryError> {
        let now = Utc::now();
        let mut subs = self.inner.subscriptions.lock().await;
        let mut changed = 0;
        for sub in subs
            .iter_mut()
            .filter(|s| s.is_pending() && ids.contains(&s.id))
        {
            sub.is_notified = true;
            sub.notified_at = Some(now);
            sub.updated_at = now;
            changed += 1;
        }
        Ok(changed)
    }

    async fn stats(&self) -> Result<BackInStockStats, RepositoryError> {
        let subs = self.inner.subscriptions.lock().await;
        let count = |n: usize| {
            i64::try_from(n).map_err(|e| RepositoryError::DataCorruption(e.to_string()))
        };
        let pending = subs.iter().filter(|s| s.is_pending()).count();
        let products: HashSet<_> = subs.iter().map(|s| s.product_id).collect();
        let customers: HashSet<_> = subs.iter().map(|s| s.customer_id).collect();

        Ok(BackInStockStats {
            total_subscriptions: count(subs.len())?,
            pending_notifications: count(pending)?,
            sent_notifications: count(subs.len() - pending)?,
            unique_products: count(products.len())?,
            unique_customers: count(customers.len())?,
        })
    }

    async fn delete_notified_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let mut subs = self.inner.subscriptions.lock().await;
        let before = subs.len();
        subs.retain(|s| !(s.is_notified && s.notified_at.is_some_and(|at| at < cutoff)));
        Ok((before - subs.len()) as u64)
    }
}

#[async_trait]
impl ProfileRepository for MemoryStore {
    async fn get(&self, id: CustomerId) -> Result<Option<Profile>, RepositoryError> {
        Ok(self.inner.profiles.lock().await.get(&id).cloned())
    }

    async fn upsert(&self, profile: &Profile) -> Result<Profile, RepositoryError> {
        let mut profiles = self.inner.profiles.lock().await;
        check_email_free(&profiles, profile)?;

        let now = Utc::now();
        let mut stored = profile.clone();
        stored.updated_at = now;
        match profiles.get(&profile.id) {
            Some(existing) => {
                stored.status = existing.status;
                stored.created_at = existing.created_at;
            }
            None => stored.created_at = now,
        }
        profiles.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn create(&self, profile: &Profile) -> Result<Option<Profile>, RepositoryError> {
        let mut profiles = self.inner.profiles.lock().await;
        if profiles.contains_key(&profile.id) {
            return Ok(None);
        }
        check_email_free(&profiles, profile)?;

        let now = Utc::now();
        let mut stored = profile.clone();
        stored.created_at = now;
        stored.updated_at = now;
        profiles.insert(stored.id, stored.clone());
        Ok(Some(stored))
    }

    async fn update(&self, profile: &Profile) -> Result<Option<Profile>, RepositoryError> {
        let mut profiles = self.inner.profiles.lock().await;
        check_email_free(&profiles, profile)?;
        Ok(profiles.get_mut(&profile.id).map(|existing| {
            *existing = Profile {
                status: existing.status,
                created_at: existing.created_at,
                updated_at: Utc::now(),
                ..profile.clone()
            };
            existing.clone()
        }))
    }

    async fn set_status(
        &self,
        id: CustomerId,
        from: CustomerStatus,
        to: CustomerStatus,
    ) -> Result<Option<Profile>, RepositoryError> {
        let mut profiles = self.inner.profiles.lock().await;
        Ok(profiles
            .get_mut(&id)
            .filter(|p| p.status == from)
            .map(|p| {
                p.status = to;
                p.updated_at = Utc::now();
                p.clone()
            }))
    }

    async fn delete(&self, id: CustomerId) -> Result<bool, RepositoryError> {
        let mut profiles = self.inner.profiles.lock().await;
        if profiles.remove(&id).is_none() {
            return Ok(false);
        }
        self.inner
            .addresses
            .lock()
            .await
            .retain(|_, a| a.customer_id != id);
        self.inner
            .measurements
            .lock()
            .await
            .retain(|_, m| m.customer_id != id);
        self.inner
            .wishlist
            .lock()
            .await
            .retain(|i| i.customer_id != id);
        self.inner
            .subscriptions
            .lock()
            .await
            .retain(|s| s.customer_id != id);
        Ok(true)
    }

    async fn stats(&self) -> Result<CustomerStats, RepositoryError> {
        let profiles = self.inner.profiles.lock().await;
        let count = |status: Option<CustomerStatus>| {
            let n = profiles
                .values()
                .filter(|p| status.is_none_or(|s| p.status == s))
                .count();
            i64::try_from(n).map_err(|e| RepositoryError::DataCorruption(e.to_string()))
        };
        Ok(CustomerStats {
            total_customers: count(None)?,
            active: count(Some(CustomerStatus::Active))?,
            inactive: count(Some(CustomerStatus::Inactive))?,
            suspended: count(Some(CustomerStatus::Suspended))?,
            blocked: count(Some(CustomerStatus::Blocked))?,
        })
    }
}

/// The unique email index: no other customer may hold `profile`'s email.
fn check_email_free(
    profiles: &HashMap<CustomerId, Profile>,
    profile: &Profile,
) -> Result<(), RepositoryError> {
    if let Some(email) = &profile.email
        && profiles
            .values()
            .any(|p| p.id != profile.id && p.email.as_ref() == Some(email))
    {
        return Err(RepositoryError::Conflict("email already in use".to_owned()));
    }
    Ok(())
}

#[async_trait]
impl HealthCheck for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}
