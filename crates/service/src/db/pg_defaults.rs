//! `PostgreSQL` backend for default-item collections.
//!
//! One generic transaction type serves every collection; each entity
//! supplies its table, columns, row type, and insert/update statements via
//! [`PgDefaultRecord`].
//!
//! Per-owner serialization uses `pg_advisory_xact_lock`, keyed by the
//! collection and owner, so it is released on commit or rollback. The
//! partial unique index `(customer_id) WHERE is_default` on each table
//! rejects any second default that slips past the lock.

use std::marker::PhantomData;

use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::QueryAs;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use niaga_customer_core::CustomerId;

use super::{DefaultStore, DefaultTx, PgStore, RepositoryError, map_unique_violation};
use crate::models::Defaultable;

/// SQL mapping for an entity stored in a default-item table.
pub trait PgDefaultRecord: Defaultable {
    /// Schema-qualified table name.
    const TABLE: &'static str;

    /// Column list matching `Row`.
    const COLUMNS: &'static str;

    type Row: for<'r> sqlx::FromRow<'r, PgRow> + Send + Unpin;

    /// Convert a fetched row into the domain type.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if the row holds invalid data.
    fn from_row(row: Self::Row) -> Result<Self, RepositoryError>;

    /// `INSERT ... RETURNING <COLUMNS>` for this item.
    fn insert_query(&self) -> QueryAs<'_, Postgres, Self::Row, PgArguments>;

    /// `UPDATE ... WHERE id AND customer_id ... RETURNING <COLUMNS>` for this item.
    fn update_query(&self) -> QueryAs<'_, Postgres, Self::Row, PgArguments>;
}

/// A transaction over one default-item table.
pub struct PgDefaultTx<T> {
    tx: Transaction<'static, Postgres>,
    _collection: PhantomData<fn() -> T>,
}

#[async_trait]
impl<T: PgDefaultRecord> DefaultTx<T> for PgDefaultTx<T> {
    async fn lock_owner(&mut self, owner: CustomerId) -> Result<(), RepositoryError> {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(format!("{}:{owner}", T::COLLECTION))
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn find(&mut self, owner: CustomerId, id: T::Id) -> Result<Option<T>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = $1 AND customer_id = $2 FOR UPDATE",
            T::COLUMNS,
            T::TABLE
        );
        let row = sqlx::query_as::<_, T::Row>(&sql)
            .bind(Into::<Uuid>::into(id))
            .bind(owner)
            .fetch_optional(&mut *self.tx)
            .await?;
        row.map(T::from_row).transpose()
    }

    async fn clear_defaults(
        &mut self,
        owner: CustomerId,
        except: Option<T::Id>,
    ) -> Result<u64, RepositoryError> {
        let sql = format!(
            "UPDATE {} SET is_default = FALSE, updated_at = NOW() \
             WHERE customer_id = $1 AND is_default AND id IS DISTINCT FROM $2",
            T::TABLE
        );
        let result = sqlx::query(&sql)
            .bind(owner)
            .bind(except.map(Into::<Uuid>::into))
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn insert(&mut self, item: &T) -> Result<T, RepositoryError> {
        let row = item
            .insert_query()
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| map_unique_violation(e, T::COLLECTION))?;
        T::from_row(row)
    }

    async fn save(&mut self, item: &T) -> Result<T, RepositoryError> {
        let row = item
            .update_query()
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_unique_violation(e, T::COLLECTION))?
            .ok_or(RepositoryError::NotFound)?;
        T::from_row(row)
    }

    async fn delete(&mut self, owner: CustomerId, id: T::Id) -> Result<bool, RepositoryError> {
        let sql = format!(
            "DELETE FROM {} WHERE id = $1 AND customer_id = $2",
            T::TABLE
        );
        let result = sqlx::query(&sql)
            .bind(Into::<Uuid>::into(id))
            .bind(owner)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        self.tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl<T: PgDefaultRecord> DefaultStore<T> for PgStore {
    async fn begin(&self) -> Result<Box<dyn DefaultTx<T>>, RepositoryError> {
        let tx = self.pool().begin().await?;
        Ok(Box::new(PgDefaultTx::<T> {
            tx,
            _collection: PhantomData,
        }))
    }

    async fn list(&self, owner: CustomerId) -> Result<Vec<T>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE customer_id = $1 ORDER BY is_default DESC, created_at DESC",
            T::COLUMNS,
            T::TABLE
        );
        let rows = sqlx::query_as::<_, T::Row>(&sql)
            .bind(owner)
            .fetch_all(self.pool())
            .await?;
        rows.into_iter().map(T::from_row).collect()
    }

    async fn get(&self, owner: CustomerId, id: T::Id) -> Result<Option<T>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = $1 AND customer_id = $2",
            T::COLUMNS,
            T::TABLE
        );
        let row = sqlx::query_as::<_, T::Row>(&sql)
            .bind(Into::<Uuid>::into(id))
            .bind(owner)
            .fetch_optional(self.pool())
            .await?;
        row.map(T::from_row).transpose()
    }

    async fn get_default(&self, owner: CustomerId) -> Result<Option<T>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE customer_id = $1 AND is_default",
            T::COLUMNS,
            T::TABLE
        );
        let row = sqlx::query_as::<_, T::Row>(&sql)
            .bind(owner)
            .fetch_optional(self.pool())
            .await?;
        row.map(T::from_row).transpose()
    }
}
