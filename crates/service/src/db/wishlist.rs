//! Wishlist repository for database operations.
//!
//! `variant_key` is a generated column (`COALESCE(variant_id, nil)`) so the
//! unique index on `(customer_id, product_id, variant_key)` treats the
//! no-variant slot as a value rather than a NULL.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use niaga_customer_core::{
    CurrencyCode, CustomerId, Price, ProductId, VariantId, WishlistItemId, WishlistKey,
};

use super::{InsertOutcome, PgStore, RepositoryError, WishlistRepository, insert_or_find};
use crate::models::WishlistItem;

const WISHLIST_COLUMNS: &str = "id, customer_id, product_id, variant_id, variant_sku, \
    variant_name, price_at_add, currency_code, notify_on_sale, product_name, product_slug, \
    product_image, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct WishlistRow {
    id: WishlistItemId,
    customer_id: CustomerId,
    product_id: ProductId,
    variant_id: Option<VariantId>,
    variant_sku: Option<String>,
    variant_name: Option<String>,
    price_at_add: Decimal,
    currency_code: String,
    notify_on_sale: bool,
    product_name: Option<String>,
    product_slug: Option<String>,
    product_image: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<WishlistRow> for WishlistItem {
    type Error = RepositoryError;

    fn try_from(r: WishlistRow) -> Result<Self, Self::Error> {
        let currency: CurrencyCode = r
            .currency_code
            .parse()
            .map_err(RepositoryError::DataCorruption)?;

        Ok(Self {
            id: r.id,
            customer_id: r.customer_id,
            product_id: r.product_id,
            variant_id: r.variant_id,
            variant_sku: r.variant_sku,
            variant_name: r.variant_name,
            price_at_add: Price::new(r.price_at_add, currency),
            notify_on_sale: r.notify_on_sale,
            product_name: r.product_name,
            product_slug: r.product_slug,
            product_image: r.product_image,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

fn into_items(rows: Vec<WishlistRow>) -> Result<Vec<WishlistItem>, RepositoryError> {
    rows.into_iter().map(WishlistItem::try_from).collect()
}

impl PgStore {
    /// `None` if the owner already has an item with this key.
    async fn try_insert_wishlist_item(
        &self,
        item: &WishlistItem,
    ) -> Result<Option<WishlistItem>, RepositoryError> {
        let sql = format!(
            r"
            INSERT INTO customer.wishlist_items (
                id, customer_id, product_id, variant_id, variant_sku, variant_name,
                price_at_add, currency_code, notify_on_sale, product_name,
                product_slug, product_image, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT (customer_id, product_id, variant_key) DO NOTHING
            RETURNING {WISHLIST_COLUMNS}
            "
        );
        let inserted = sqlx::query_as::<_, WishlistRow>(&sql)
            .bind(item.id)
            .bind(item.customer_id)
            .bind(item.product_id)
            .bind(item.variant_id)
            .bind(item.variant_sku.as_deref())
            .bind(item.variant_name.as_deref())
            .bind(item.price_at_add.amount)
            .bind(item.price_at_add.currency_code.to_string())
            .bind(item.notify_on_sale)
            .bind(item.product_name.as_deref())
            .bind(item.product_slug.as_deref())
            .bind(item.product_image.as_deref())
            .bind(item.created_at)
            .bind(item.updated_at)
            .fetch_optional(self.pool())
            .await?;
        inserted.map(WishlistItem::try_from).transpose()
    }
}

#[async_trait]
impl WishlistRepository for PgStore {
    async fn add(
        &self,
        item: &WishlistItem,
    ) -> Result<InsertOutcome<WishlistItem>, RepositoryError> {
        // A lost race returns the concurrent insert's row.
        insert_or_find(
            || self.try_insert_wishlist_item(item),
            || self.find(item.customer_id, item.key()),
            "wishlist item",
        )
        .await
    }

    async fn find(
        &self,
        owner: CustomerId,
        key: WishlistKey,
    ) -> Result<Option<WishlistItem>, RepositoryError> {
        let sql = format!(
            "SELECT {WISHLIST_COLUMNS} FROM customer.wishlist_items \
             WHERE customer_id = $1 AND product_id = $2 AND variant_key = $3"
        );
        let row = sqlx::query_as::<_, WishlistRow>(&sql)
            .bind(owner)
            .bind(key.product_id)
            .bind(key.variant_slot())
            .fetch_optional(self.pool())
            .await?;
        row.map(WishlistItem::try_from).transpose()
    }

    async fn remove(&self, owner: CustomerId, key: WishlistKey) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "DELETE FROM customer.wishlist_items \
             WHERE customer_id = $1 AND product_id = $2 AND variant_key = $3",
        )
        .bind(owner)
        .bind(key.product_id)
        .bind(key.variant_slot())
        .execute(self.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn remove_product(
        &self,
        owner: CustomerId,
        product_id: ProductId,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "DELETE FROM customer.wishlist_items WHERE customer_id = $1 AND product_id = $2",
        )
        .bind(owner)
        .bind(product_id)
        .execute(self.pool())
        .await?;
        Ok(result.rows_affected())
    }

    async fn remove_by_id(
        &self,
        owner: CustomerId,
        id: WishlistItemId,
    ) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM customer.wishlist_items WHERE id = $1 AND customer_id = $2")
                .bind(id)
                .bind(owner)
                .execute(self.pool())
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, owner: CustomerId) -> Result<Vec<WishlistItem>, RepositoryError> {
        let sql = format!(
            "SELECT {WISHLIST_COLUMNS} FROM customer.wishlist_items \
             WHERE customer_id = $1 ORDER BY created_at DESC"
        );
        let rows = sqlx::query_as::<_, WishlistRow>(&sql)
            .bind(owner)
            .fetch_all(self.pool())
            .await?;
        into_items(rows)
    }

    async fn count(&self, owner: CustomerId) -> Result<i64, RepositoryError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM customer.wishlist_items WHERE customer_id = $1")
                .bind(owner)
                .fetch_one(self.pool())
                .await?;
        Ok(count)
    }

    async fn set_notify_on_sale(
        &self,
        owner: CustomerId,
        id: WishlistItemId,
        notify: bool,
    ) -> Result<Option<WishlistItem>, RepositoryError> {
        let sql = format!(
            "UPDATE customer.wishlist_items SET notify_on_sale = $3, updated_at = NOW() \
             WHERE id = $1 AND customer_id = $2 RETURNING {WISHLIST_COLUMNS}"
        );
        let row = sqlx::query_as::<_, WishlistRow>(&sql)
            .bind(id)
            .bind(owner)
            .bind(notify)
            .fetch_optional(self.pool())
            .await?;
        row.map(WishlistItem::try_from).transpose()
    }

    async fn sale_watchers(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<WishlistItem>, RepositoryError> {
        let sql = format!(
            "SELECT {WISHLIST_COLUMNS} FROM customer.wishlist_items \
             WHERE product_id = $1 AND notify_on_sale ORDER BY created_at"
        );
        let rows = sqlx::query_as::<_, WishlistRow>(&sql)
            .bind(product_id)
            .fetch_all(self.pool())
            .await?;
        into_items(rows)
    }
}
