//! Application state shared across handlers.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::config::ServiceConfig;
use crate::db::{
    DefaultStore, HealthCheck, ProfileRepository, SubscriptionRepository, WishlistRepository,
};
use crate::models::{Address, Measurement};
use crate::services::{BackInStockRegistry, ExactlyOneDefault, Wishlist};

/// Every storage trait the service needs, implemented by one backend.
pub trait Store:
    DefaultStore<Address>
    + DefaultStore<Measurement>
    + WishlistRepository
    + SubscriptionRepository
    + ProfileRepository
    + HealthCheck
    + 'static
{
}

impl<T> Store for T where
    T: DefaultStore<Address>
        + DefaultStore<Measurement>
        + WishlistRepository
        + SubscriptionRepository
        + ProfileRepository
        + HealthCheck
        + 'static
{
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// services, the configuration, and the restock event queue.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServiceConfig,
    profiles: Arc<dyn ProfileRepository>,
    addresses: ExactlyOneDefault<Address>,
    measurements: ExactlyOneDefault<Measurement>,
    wishlist: Wishlist,
    back_in_stock: BackInStockRegistry,
    health: Arc<dyn HealthCheck>,
    restock_tx: mpsc::Sender<Vec<u8>>,
}

impl AppState {
    /// Create the application state over a storage backend.
    ///
    /// # Arguments
    ///
    /// * `config` - Service configuration
    /// * `store` - Storage backend (`PgStore` in production)
    /// * `restock_tx` - Queue feeding the restock subscriber
    pub fn new<S: Store>(config: ServiceConfig, store: S, restock_tx: mpsc::Sender<Vec<u8>>) -> Self {
        let store = Arc::new(store);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                profiles: store.clone(),
                addresses: ExactlyOneDefault::new(store.clone()),
                measurements: ExactlyOneDefault::new(store.clone()),
                wishlist: Wishlist::new(store.clone()),
                back_in_stock: BackInStockRegistry::new(store.clone()),
                health: store,
                restock_tx,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ServiceConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn profiles(&self) -> &dyn ProfileRepository {
        self.inner.profiles.as_ref()
    }

    #[must_use]
    pub fn addresses(&self) -> &ExactlyOneDefault<Address> {
        &self.inner.addresses
    }

    #[must_use]
    pub fn measurements(&self) -> &ExactlyOneDefault<Measurement> {
        &self.inner.measurements
    }

    #[must_use]
    pub fn wishlist(&self) -> &Wishlist {
        &self.inner.wishlist
    }

    /// The back-in-stock subscription registry.
    #[must_use]
    pub fn back_in_stock(&self) -> &BackInStockRegistry {
        &self.inner.back_in_stock
    }

    #[must_use]
    pub fn health(&self) -> &dyn HealthCheck {
        self.inner.health.as_ref()
    }

    /// Sender half of the restock event queue.
    #[must_use]
    pub fn restock_queue(&self) -> &mpsc::Sender<Vec<u8>> {
        &self.inner.restock_tx
    }
}
