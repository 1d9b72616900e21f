//! Back-in-stock subscription repository for database operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use niaga_customer_core::{CustomerId, Email, ProductId, SubscriptionId, VariantId, WishlistKey};

use super::{InsertOutcome, PgStore, RepositoryError, SubscriptionRepository, insert_or_find};
use crate::models::{BackInStockStats, BackInStockSubscription, PendingSubscription};

const SUBSCRIPTION_COLUMNS: &str = "id, customer_id, product_id, variant_id, product_name, \
    product_slug, product_image, variant_sku, variant_name, is_notified, notified_at, \
    created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    id: SubscriptionId,
    customer_id: CustomerId,
    product_id: ProductId,
    variant_id: Option<VariantId>,
    product_name: String,
    product_slug: String,
    product_image: Option<String>,
    variant_sku: Option<String>,
    variant_name: Option<String>,
    is_notified: bool,
    notified_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<SubscriptionRow> for BackInStockSubscription {
    fn from(r: SubscriptionRow) -> Self {
        Self {
            id: r.id,
            customer_id: r.customer_id,
            product_id: r.product_id,
            variant_id: r.variant_id,
            product_name: r.product_name,
            product_slug: r.product_slug,
            product_image: r.product_image,
            variant_sku: r.variant_sku,
            variant_name: r.variant_name,
            is_notified: r.is_notified,
            notified_at: r.notified_at,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PendingRow {
    #[sqlx(flatten)]
    subscription: SubscriptionRow,
    customer_email: Option<String>,
    customer_name: Option<String>,
}

impl From<PendingRow> for PendingSubscription {
    fn from(r: PendingRow) -> Self {
        // Unparseable stored emails are treated as absent.
        let customer_email = r.customer_email.as_deref().and_then(|e| {
            Email::parse(e)
                .inspect_err(|err| {
                    tracing::warn!(subscription_id = %r.subscription.id, error = %err, "Ignoring invalid subscriber email");
                })
                .ok()
        });
        Self {
            subscription: r.subscription.into(),
            customer_email,
            customer_name: r.customer_name,
        }
    }
}

impl PgStore {
    /// `None` if the customer already holds the subscription's key.
    async fn try_insert_subscription(
        &self,
        s: &BackInStockSubscription,
    ) -> Result<Option<BackInStockSubscription>, RepositoryError> {
        let sql = format!(
            r"
            INSERT INTO customer.back_in_stock_subscriptions (
                id, customer_id, product_id, variant_id, product_name, product_slug,
                product_image, variant_sku, variant_name, is_notified, notified_at,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (customer_id, product_id, variant_key) DO NOTHING
            RETURNING {SUBSCRIPTION_COLUMNS}
            "
        );
        let inserted = sqlx::query_as::<_, SubscriptionRow>(&sql)
            .bind(s.id)
            .bind(s.customer_id)
            .bind(s.product_id)
            .bind(s.variant_id)
            .bind(s.product_name.as_str())
            .bind(s.product_slug.as_str())
            .bind(s.product_image.as_deref())
            .bind(s.variant_sku.as_deref())
            .bind(s.variant_name.as_deref())
            .bind(s.is_notified)
            .bind(s.notified_at)
            .bind(s.created_at)
            .bind(s.updated_at)
            .fetch_optional(self.pool())
            .await?;
        Ok(inserted.map(Into::into))
    }
}

#[async_trait]
impl SubscriptionRepository for PgStore {
    async fn insert_if_absent(
        &self,
        s: &BackInStockSubscription,
    ) -> Result<InsertOutcome<BackInStockSubscription>, RepositoryError> {
        insert_or_find(
            || self.try_insert_subscription(s),
            || self.find(s.customer_id, s.key()),
            "subscription",
        )
        .await
    }

    async fn find(
        &self,
        owner: CustomerId,
        key: WishlistKey,
    ) -> Result<Option<BackInStockSubscription>, RepositoryError> {
        let sql = format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM customer.back_in_stock_subscriptions \
             WHERE customer_id = $1 AND product_id = $2 AND variant_key = $3"
        );
        let row = sqlx::query_as::<_, SubscriptionRow>(&sql)
            .bind(owner)
            .bind(key.product_id)
            .bind(key.variant_slot())
            .fetch_optional(self.pool())
            .await?;
        Ok(row.map(Into::into))
    }

    async fn delete_by_key(
        &self,
        owner: CustomerId,
        key: WishlistKey,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "DELETE FROM customer.back_in_stock_subscriptions \
             WHERE customer_id = $1 AND product_id = $2 AND variant_key = $3",
        )
        .bind(owner)
        .bind(key.product_id)
        .bind(key.variant_slot())
        .execute(self.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_by_id(
        &self,
        owner: CustomerId,
        id: SubscriptionId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "DELETE FROM customer.back_in_stock_subscriptions WHERE id = $1 AND customer_id = $2",
        )
        .bind(id)
        .bind(owner)
        .execute(self.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_for_customer(
        &self,
        owner: CustomerId,
    ) -> Result<Vec<BackInStockSubscription>, RepositoryError> {
        let sql = format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM customer.back_in_stock_subscriptions \
             WHERE customer_id = $1 ORDER BY created_at DESC"
        );
        let rows = sqlx::query_as::<_, SubscriptionRow>(&sql)
            .bind(owner)
            .fetch_all(self.pool())
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_all(
        &self,
        pending_only: bool,
    ) -> Result<Vec<BackInStockSubscription>, RepositoryError> {
        let sql = format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM customer.back_in_stock_subscriptions \
             WHERE NOT ($1 AND is_notified) ORDER BY created_at DESC"
        );
        let rows = sqlx::query_as::<_, SubscriptionRow>(&sql)
            .bind(pending_only)
            .fetch_all(self.pool())
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn pending_for_product(
        &self,
        product_id: ProductId,
        variant_id: Option<VariantId>,
    ) -> Result<Vec<PendingSubscription>, RepositoryError> {
        let rows = sqlx::query_as::<_, PendingRow>(
            r"
            SELECT s.id, s.customer_id, s.product_id, s.variant_id, s.product_name,
                   s.product_slug, s.product_image, s.variant_sku, s.variant_name,
                   s.is_notified, s.notified_at, s.created_at, s.updated_at,
                   p.email AS customer_email, p.full_name AS customer_name
            FROM customer.back_in_stock_subscriptions s
            LEFT JOIN customer.profiles p ON p.id = s.customer_id
            WHERE s.product_id = $1
              AND NOT s.is_notified
              AND ($2::uuid IS NULL OR s.variant_id = $2)
            ORDER BY s.created_at
            ",
        )
        .bind(product_id)
        .bind(variant_id)
        .fetch_all(self.pool())
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn mark_notified(&self, ids: &[SubscriptionId]) -> Result<u64, RepositoryError> {
        let ids: Vec<Uuid> = ids.iter().map(|id| id.as_uuid()).collect();
        let result = sqlx::query(
            r"
            UPDATE customer.back_in_stock_subscriptions
            SET is_notified = TRUE, notified_at = NOW(), updated_at = NOW()
            WHERE id = ANY($1) AND NOT is_notified
            ",
        )
        .bind(&ids)
        .execute(self.pool())
        .await?;
        Ok(result.rows_affected())
    }

    async fn stats(&self) -> Result<BackInStockStats, RepositoryError> {
        let stats = sqlx::query_as::<_, BackInStockStats>(
            r"
            SELECT
                COUNT(*) AS total_subscriptions,
                COUNT(*) FILTER (WHERE NOT is_notified) AS pending_notifications,
                COUNT(*) FILTER (WHERE is_notified) AS sent_notifications,
                COUNT(DISTINCT product_id) AS unique_products,
                COUNT(DISTINCT customer_id) AS unique_customers
            FROM customer.back_in_stock_subscriptions
            ",
        )
        .fetch_one(self.pool())
        .await?;
        Ok(stats)
    }

    async fn delete_notified_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "DELETE FROM customer.back_in_stock_subscriptions \
             WHERE is_notified AND notified_at < $1",
        )
        .bind(cutoff)
        .execute(self.pool())
        .await?;
        Ok(result.rows_affected())
    }
}
