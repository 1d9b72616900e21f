//! Restock event handling.
//!
//! One event runs `received -> subscriptions resolved -> notifications
//! attempted -> notified subset committed`. A delivery failure is isolated to
//! its subscription; only the successfully notified IDs are marked, in one
//! batch after every send has been attempted. If that batch fails the
//! subscriptions stay pending and may be notified again by a later restock.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::{FutureExt, Stream, StreamExt};
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::mpsc;

use niaga_customer_core::{Email, IdError, ProductId, VariantId};

use super::ServiceError;
use super::back_in_stock::BackInStockRegistry;
use super::notifications::{BackInStockNotification, NotificationSender};
use crate::models::PendingSubscription;

/// Subject carrying restock events from the inventory service.
pub const RESTOCK_SUBJECT: &str = "inventory.product.restocked";

/// Default bound on processing one event.
pub const DEFAULT_RESTOCK_TIMEOUT: Duration = Duration::from_secs(30);

/// A restock event payload could not be used.
#[derive(Debug, Error)]
pub enum RestockEventError {
    #[error("malformed payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid product_id: {0}")]
    ProductId(IdError),

    #[error("invalid variant_id: {0}")]
    VariantId(IdError),
}

#[derive(Debug, Deserialize)]
struct RawRestockEvent {
    product_id: String,
    #[serde(default)]
    variant_id: Option<String>,
    #[serde(default)]
    warehouse_id: String,
    #[serde(default)]
    quantity: f64,
    #[serde(default)]
    product_name: Option<String>,
    #[serde(default)]
    product_slug: Option<String>,
}

/// A product (or one variant) came back in stock.
#[derive(Debug, Clone, PartialEq)]
pub struct RestockEvent {
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
    pub warehouse_id: String,
    pub quantity: f64,
    pub product_name: Option<String>,
    pub product_slug: Option<String>,
}

impl RestockEvent {
    /// Parse a JSON payload. A blank `variant_id` means no variant.
    ///
    /// # Errors
    ///
    /// Returns `RestockEventError` if the payload is not JSON of the expected
    /// shape or an identifier does not parse.
    pub fn parse(payload: &[u8]) -> Result<Self, RestockEventError> {
        let raw: RawRestockEvent = serde_json::from_slice(payload)?;

        let product_id = ProductId::parse(&raw.product_id).map_err(RestockEventError::ProductId)?;
        let variant_id = raw
            .variant_id
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(VariantId::parse)
            .transpose()
            .map_err(RestockEventError::VariantId)?;

        Ok(Self {
            product_id,
            variant_id,
            warehouse_id: raw.warehouse_id,
            quantity: raw.quantity,
            product_name: raw.product_name,
            product_slug: raw.product_slug,
        })
    }

    /// Restocked quantity in whole units.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn whole_units(&self) -> i64 {
        if self.quantity.is_finite() {
            self.quantity.trunc() as i64
        } else {
            0
        }
    }
}

/// What happened to one restock event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestockOutcome {
    /// Pending subscriptions matching the event.
    pub matched: usize,
    /// Deliveries that succeeded.
    pub notified: usize,
    /// Deliveries that failed.
    pub failed: usize,
    /// Subscriptions moved to notified.
    pub marked: u64,
}

/// Notifies pending subscribers when a product is restocked.
#[derive(Clone)]
pub struct RestockNotifier {
    registry: BackInStockRegistry,
    sender: Arc<dyn NotificationSender>,
    timeout: Duration,
}

impl RestockNotifier {
    #[must_use]
    pub fn new(
        registry: BackInStockRegistry,
        sender: Arc<dyn NotificationSender>,
        timeout: Duration,
    ) -> Self {
        Self {
            registry,
            sender,
            timeout,
        }
    }

    /// Parse and process one raw payload. Malformed payloads and processing
    /// failures are logged and dropped.
    pub async fn handle_payload(&self, payload: &[u8]) -> Option<RestockOutcome> {
        let event = match RestockEvent::parse(payload) {
            Ok(event) => event,
            Err(e) => {
                tracing::error!(error = %e, "Dropping restock event");
                return None;
            }
        };

        match self.process(&event).await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                tracing::error!(
                    product_id = %event.product_id,
                    variant_id = ?event.variant_id,
                    error = %e,
                    "Failed to process restock event"
                );
                None
            }
        }
    }

    /// Notify every matching pending subscription and mark the delivered ones.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Timeout` if the cycle exceeds the configured
    /// bound, or a storage error from resolving or marking. Deliveries that
    /// already happened are not rolled back.
    pub async fn process(&self, event: &RestockEvent) -> Result<RestockOutcome, ServiceError> {
        tokio::time::timeout(self.timeout, self.run(event))
            .await
            .map_err(|_| ServiceError::Timeout)?
    }

    async fn run(&self, event: &RestockEvent) -> Result<RestockOutcome, ServiceError> {
        tracing::info!(
            product_id = %event.product_id,
            variant_id = ?event.variant_id,
            warehouse_id = %event.warehouse_id,
            quantity = event.quantity,
            "Processing restock event"
        );

        let pending = self
            .registry
            .pending_for_product(event.product_id, event.variant_id)
            .await?;

        let mut outcome = RestockOutcome {
            matched: pending.len(),
            ..RestockOutcome::default()
        };
        if pending.is_empty() {
            tracing::debug!(product_id = %event.product_id, "No pending subscriptions");
            return Ok(outcome);
        }

        let mut delivered = Vec::with_capacity(pending.len());
        for subscription in pending {
            let id = subscription.subscription.id;
            let notification = build_notification(subscription, event);
            match self.sender.send_back_in_stock(&notification).await {
                Ok(()) => delivered.push(id),
                Err(e) => {
                    outcome.failed += 1;
                    tracing::error!(subscription_id = %id, error = %e, "Failed to send back-in-stock notification");
                }
            }
        }
        outcome.notified = delivered.len();

        outcome.marked = self.registry.mark_notified(&delivered).await?;

        tracing::info!(
            product_id = %event.product_id,
            matched = outcome.matched,
            notified = outcome.notified,
            failed = outcome.failed,
            marked = outcome.marked,
            "Restock event processed"
        );
        Ok(outcome)
    }
}

fn build_notification(pending: PendingSubscription, event: &RestockEvent) -> BackInStockNotification {
    let PendingSubscription {
        subscription: s,
        customer_email,
        customer_name,
    } = pending;

    BackInStockNotification {
        subscription_id: s.id,
        customer_id: s.customer_id,
        customer_email: customer_email.map(Email::into_inner).unwrap_or_default(),
        customer_name: customer_name.unwrap_or_default(),
        product_id: s.product_id,
        product_name: s.product_name,
        product_slug: s.product_slug,
        product_image: s.product_image,
        variant_id: s.variant_id,
        variant_sku: s.variant_sku,
        variant_name: s.variant_name,
        stock_quantity: event.whole_units(),
    }
}

/// Adapt the receiving half of the restock queue into a payload stream.
pub fn queue_stream(rx: mpsc::Receiver<Vec<u8>>) -> impl Stream<Item = Vec<u8>> + Unpin {
    Box::pin(futures::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|payload| (payload, rx))
    }))
}

/// Drive `notifier` from a stream of raw payloads, one event at a time,
/// until the stream ends or `shutdown` resolves. Payloads already queued
/// when `shutdown` resolves are still handled; the subscriber stops at the
/// first one that is not ready. Returns the number of payloads handled.
pub async fn run_subscriber<S, F>(mut payloads: S, notifier: RestockNotifier, shutdown: F) -> usize
where
    S: Stream<Item = Vec<u8>> + Unpin,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    tracing::info!(subject = RESTOCK_SUBJECT, "Restock subscriber started");

    let mut handled = 0;
    loop {
        tokio::select! {
            () = &mut shutdown => {
                while let Some(Some(payload)) = payloads.next().now_or_never() {
                    notifier.handle_payload(&payload).await;
                    handled += 1;
                }
                tracing::info!(handled, "Restock subscriber shutting down");
                break;
            }
            next = payloads.next() => {
                let Some(payload) = next else {
                    tracing::info!(handled, "Restock event stream closed");
                    break;
                };
                notifier.handle_payload(&payload).await;
                handled += 1;
            }
        }
    }
    handled
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;

    use async_trait::async_trait;
    use niaga_customer_core::{CustomerId, SubscriptionId};
    use tokio::sync::Mutex;

    use chrono::{DateTime, Utc};
    use niaga_customer_core::WishlistKey;

    use super::*;
    use crate::db::{
        InsertOutcome, MemoryStore, ProfileRepository, RepositoryError, SubscriptionRepository,
    };
    use crate::models::{BackInStockStats, BackInStockSubscription, Profile, SubscribeInput};
    use crate::services::notifications::NotificationError;

    /// Records deliveries and fails for the given subscriptions.
    #[derive(Default)]
    struct FakeSender {
        sent: Mutex<Vec<BackInStockNotification>>,
        fail_for: HashSet<SubscriptionId>,
        delay: Option<Duration>,
    }

    #[async_trait]
    impl NotificationSender for FakeSender {
        async fn send_back_in_stock(
            &self,
            notification: &BackInStockNotification,
        ) -> Result<(), NotificationError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail_for.contains(&notification.subscription_id) {
                return Err(NotificationError::Api {
                    status: 503,
                    message: "unavailable".to_owned(),
                });
            }
            self.sent.lock().await.push(notification.clone());
            Ok(())
        }
    }

    /// Memory-backed subscriptions whose batch mark always fails.
    struct MarkFails(MemoryStore);

    #[async_trait]
    impl SubscriptionRepository for MarkFails {
        async fn insert_if_absent(
            &self,
            subscription: &BackInStockSubscription,
        ) -> Result<InsertOutcome<BackInStockSubscription>, RepositoryError> {
            self.0.insert_if_absent(subscription).await
        }

        async fn find(
            &self,
            owner: CustomerId,
            key: WishlistKey,
        ) -> Result<Option<BackInStockSubscription>, RepositoryError> {
            SubscriptionRepository::find(&self.0, owner, key).await
        }

        async fn delete_by_key(
            &self,
            owner: CustomerId,
            key: WishlistKey,
        ) -> Result<bool, RepositoryError> {
            self.0.delete_by_key(owner, key).await
        }

        async fn delete_by_id(
            &self,
            owner: CustomerId,
            id: SubscriptionId,
        ) -> Result<bool, RepositoryError> {
            self.0.delete_by_id(owner, id).await
        }

        async fn list_for_customer(
            &self,
            owner: CustomerId,
        ) -> Result<Vec<BackInStockSubscription>, RepositoryError> {
            self.0.list_for_customer(owner).await
        }

        async fn list_all(
            &self,
            pending_only: bool,
        ) -> Result<Vec<BackInStockSubscription>, RepositoryError> {
            self.0.list_all(pending_only).await
        }

        async fn pending_for_product(
            &self,
            product_id: ProductId,
            variant_id: Option<VariantId>,
        ) -> Result<Vec<PendingSubscription>, RepositoryError> {
            self.0.pending_for_product(product_id, variant_id).await
        }

        async fn mark_notified(&self, _ids: &[SubscriptionId]) -> Result<u64, RepositoryError> {
            Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
        }

        async fn stats(&self) -> Result<BackInStockStats, RepositoryError> {
            SubscriptionRepository::stats(&self.0).await
        }

        async fn delete_notified_before(
            &self,
            cutoff: DateTime<Utc>,
        ) -> Result<u64, RepositoryError> {
            self.0.delete_notified_before(cutoff).await
        }
    }

    struct Fixture {
        store: MemoryStore,
        registry: BackInStockRegistry,
    }

    impl Fixture {
        fn new() -> Self {
            let store = MemoryStore::new();
            let registry = BackInStockRegistry::new(Arc::new(store.clone()));
            Self { store, registry }
        }

        async fn subscribe(
            &self,
            product: ProductId,
            variant: Option<VariantId>,
        ) -> BackInStockSubscription {
            let subscription = SubscribeInput {
                product_id: product,
                variant_id: variant,
                product_name: "Songket Sampin".to_owned(),
                product_slug: "songket-sampin".to_owned(),
                product_image: None,
                variant_sku: None,
                variant_name: None,
            }
            .into_subscription(CustomerId::generate())
            .unwrap();
            self.registry
                .subscribe(subscription)
                .await
                .unwrap()
                .into_inner()
        }

        fn notifier(&self, sender: Arc<FakeSender>) -> RestockNotifier {
            RestockNotifier::new(self.registry.clone(), sender, DEFAULT_RESTOCK_TIMEOUT)
        }

        async fn is_notified(&self, s: &BackInStockSubscription) -> bool {
            self.registry
                .is_subscribed(s.customer_id, s.product_id, s.variant_id)
                .await
                .unwrap()
                .unwrap()
                .is_notified
        }
    }

    fn event(product: ProductId, variant: Option<VariantId>) -> RestockEvent {
        RestockEvent {
            product_id: product,
            variant_id: variant,
            warehouse_id: "wh-shah-alam".to_owned(),
            quantity: 8.0,
            product_name: None,
            product_slug: None,
        }
    }

    #[tokio::test]
    async fn test_fan_out_notifies_matching_variant_only() {
        let fx = Fixture::new();
        let product = ProductId::generate();
        let v1 = VariantId::generate();
        let a = fx.subscribe(product, Some(v1)).await;
        let b = fx.subscribe(product, Some(v1)).await;
        let c = fx.subscribe(product, Some(VariantId::generate())).await;

        let sender = Arc::new(FakeSender::default());
        let outcome = fx
            .notifier(Arc::clone(&sender))
            .process(&event(product, Some(v1)))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            RestockOutcome {
                matched: 2,
                notified: 2,
                failed: 0,
                marked: 2
            }
        );
        assert_eq!(sender.sent.lock().await.len(), 2);
        assert!(fx.is_notified(&a).await);
        assert!(fx.is_notified(&b).await);
        assert!(!fx.is_notified(&c).await);
    }

    #[tokio::test]
    async fn test_partial_failure_marks_only_delivered() {
        let fx = Fixture::new();
        let product = ProductId::generate();
        let first = fx.subscribe(product, None).await;
        let second = fx.subscribe(product, None).await;

        let sender = Arc::new(FakeSender {
            fail_for: HashSet::from([first.id]),
            ..FakeSender::default()
        });
        let outcome = fx
            .notifier(sender)
            .process(&event(product, None))
            .await
            .unwrap();

        assert_eq!(outcome.failed, 1);
        assert_eq!(outcome.marked, 1);
        assert!(!fx.is_notified(&first).await);
        assert!(fx.is_notified(&second).await);
    }

    #[tokio::test]
    async fn test_second_restock_skips_notified() {
        let fx = Fixture::new();
        let product = ProductId::generate();
        fx.subscribe(product, None).await;

        let sender = Arc::new(FakeSender::default());
        let notifier = fx.notifier(Arc::clone(&sender));
        notifier.process(&event(product, None)).await.unwrap();
        let again = notifier.process(&event(product, None)).await.unwrap();

        assert_eq!(again, RestockOutcome::default());
        assert_eq!(sender.sent.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_notification_carries_contact_and_quantity() {
        let fx = Fixture::new();
        let product = ProductId::generate();
        let sub = fx.subscribe(product, None).await;

        let mut profile = Profile::empty(sub.customer_id);
        profile.full_name = Some("Hana Yusof".to_owned());
        profile.email = Some("hana@example.my".parse().unwrap());
        fx.store.upsert(&profile).await.unwrap();

        let sender = Arc::new(FakeSender::default());
        fx.notifier(Arc::clone(&sender))
            .process(&event(product, None))
            .await
            .unwrap();

        let sent = sender.sent.lock().await;
        assert_eq!(sent[0].customer_email, "hana@example.my");
        assert_eq!(sent[0].customer_name, "Hana Yusof");
        assert_eq!(sent[0].stock_quantity, 8);
        assert_eq!(sent[0].product_slug, "songket-sampin");
    }

    #[tokio::test]
    async fn test_timeout_commits_nothing() {
        let fx = Fixture::new();
        let product = ProductId::generate();
        let sub = fx.subscribe(product, None).await;

        let sender = Arc::new(FakeSender {
            delay: Some(Duration::from_secs(5)),
            ..FakeSender::default()
        });
        let notifier =
            RestockNotifier::new(fx.registry.clone(), sender, Duration::from_millis(50));

        let err = notifier.process(&event(product, None)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Timeout));
        assert!(!fx.is_notified(&sub).await);
    }

    #[tokio::test]
    async fn test_failed_mark_leaves_subscriptions_pending() {
        let fx = Fixture::new();
        let product = ProductId::generate();
        let first = fx.subscribe(product, None).await;
        let second = fx.subscribe(product, None).await;

        let sender = Arc::new(FakeSender::default());
        let notifier = RestockNotifier::new(
            BackInStockRegistry::new(Arc::new(MarkFails(fx.store.clone()))),
            Arc::clone(&sender) as Arc<dyn NotificationSender>,
            DEFAULT_RESTOCK_TIMEOUT,
        );

        let err = notifier.process(&event(product, None)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Repository(_)));
        // Both sends went out before the mark failed.
        assert_eq!(sender.sent.lock().await.len(), 2);

        let pending: HashSet<_> = fx
            .registry
            .pending_for_product(product, None)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.subscription.id)
            .collect();
        assert_eq!(pending, HashSet::from([first.id, second.id]));

        // The subscriber path logs the failure and drops the event.
        let payload = format!(r#"{{"product_id":"{product}","quantity":1}}"#);
        assert!(notifier.handle_payload(payload.as_bytes()).await.is_none());
        assert!(!fx.is_notified(&first).await);
        assert!(!fx.is_notified(&second).await);
    }

    #[tokio::test]
    async fn test_malformed_payloads_are_dropped() {
        let fx = Fixture::new();
        let sender = Arc::new(FakeSender::default());
        let notifier = fx.notifier(Arc::clone(&sender));

        assert!(notifier.handle_payload(b"not json").await.is_none());
        assert!(
            notifier
                .handle_payload(br#"{"product_id":"nope","quantity":1}"#)
                .await
                .is_none()
        );
        let product = ProductId::generate();
        let bad_variant = format!(r#"{{"product_id":"{product}","variant_id":"x"}}"#);
        assert!(notifier.handle_payload(bad_variant.as_bytes()).await.is_none());
        assert!(sender.sent.lock().await.is_empty());
    }

    #[test]
    fn test_parse_event() {
        let product = ProductId::generate();
        let payload = format!(
            r#"{{"product_id":"{product}","variant_id":"","warehouse_id":"wh-1","quantity":3.5,"product_slug":"kain-batik"}}"#
        );
        let event = RestockEvent::parse(payload.as_bytes()).unwrap();
        assert_eq!(event.product_id, product);
        assert_eq!(event.variant_id, None);
        assert_eq!(event.whole_units(), 3);
        assert_eq!(event.product_slug.as_deref(), Some("kain-batik"));
    }

    #[tokio::test]
    async fn test_subscriber_processes_until_stream_ends() {
        let fx = Fixture::new();
        let product = ProductId::generate();
        let sub = fx.subscribe(product, None).await;

        let payloads = vec![
            b"garbage".to_vec(),
            format!(r#"{{"product_id":"{product}","warehouse_id":"wh-1","quantity":2}}"#)
                .into_bytes(),
        ];
        let handled = run_subscriber(
            futures::stream::iter(payloads),
            fx.notifier(Arc::new(FakeSender::default())),
            std::future::pending(),
        )
        .await;

        assert_eq!(handled, 2);
        assert!(fx.is_notified(&sub).await);
    }

    #[tokio::test]
    async fn test_subscriber_drains_queue() {
        let fx = Fixture::new();
        let product = ProductId::generate();
        let sub = fx.subscribe(product, None).await;

        let (tx, rx) = mpsc::channel(4);
        tx.send(format!(r#"{{"product_id":"{product}","quantity":5}}"#).into_bytes())
            .await
            .unwrap();
        drop(tx);

        let handled = run_subscriber(
            queue_stream(rx),
            fx.notifier(Arc::new(FakeSender::default())),
            std::future::pending(),
        )
        .await;

        assert_eq!(handled, 1);
        assert!(fx.is_notified(&sub).await);
    }

    #[tokio::test]
    async fn test_subscriber_stops_on_shutdown() {
        let fx = Fixture::new();
        let handled = run_subscriber(
            futures::stream::pending::<Vec<u8>>(),
            fx.notifier(Arc::new(FakeSender::default())),
            std::future::ready(()),
        )
        .await;
        assert_eq!(handled, 0);
    }

    #[tokio::test]
    async fn test_shutdown_handles_queued_events() {
        let fx = Fixture::new();
        let mut subs = Vec::new();
        let (tx, rx) = mpsc::channel(8);
        for _ in 0..3 {
            let product = ProductId::generate();
            subs.push(fx.subscribe(product, None).await);
            tx.send(format!(r#"{{"product_id":"{product}","quantity":1}}"#).into_bytes())
                .await
                .unwrap();
        }

        // The sender stays open, so only shutdown ends the loop.
        let handled = run_subscriber(
            queue_stream(rx),
            fx.notifier(Arc::new(FakeSender::default())),
            std::future::ready(()),
        )
        .await;

        assert_eq!(handled, 3);
        for sub in &subs {
            assert!(fx.is_notified(sub).await);
        }
        drop(tx);
    }
}
