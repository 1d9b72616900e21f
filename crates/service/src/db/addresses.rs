//! Address persistence mapping.

use chrono::{DateTime, Utc};
use sqlx::Postgres;
use sqlx::postgres::PgArguments;
use sqlx::query::QueryAs;

use niaga_customer_core::{AddressId, AddressLabel, CustomerId, Phone};

use super::RepositoryError;
use super::pg_defaults::PgDefaultRecord;
use crate::models::Address;

/// Database row for `customer.addresses`.
#[derive(Debug, sqlx::FromRow)]
pub struct AddressRow {
    id: AddressId,
    customer_id: CustomerId,
    label: AddressLabel,
    recipient_name: String,
    phone: String,
    address_line1: String,
    address_line2: Option<String>,
    city: String,
    state: String,
    postcode: String,
    country: String,
    is_default: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AddressRow> for Address {
    type Error = RepositoryError;

    fn try_from(r: AddressRow) -> Result<Self, Self::Error> {
        let phone = Phone::parse(&r.phone).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid phone in database: {e}"))
        })?;

        Ok(Self {
            id: r.id,
            customer_id: r.customer_id,
            label: r.label,
            recipient_name: r.recipient_name,
            phone,
            address_line1: r.address_line1,
            address_line2: r.address_line2,
            city: r.city,
            state: r.state,
            postcode: r.postcode,
            country: r.country,
            is_default: r.is_default,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

impl PgDefaultRecord for Address {
    const TABLE: &'static str = "customer.addresses";

    const COLUMNS: &'static str = "id, customer_id, label, recipient_name, phone, \
        address_line1, address_line2, city, state, postcode, country, is_default, \
        created_at, updated_at";

    type Row = AddressRow;

    fn from_row(row: AddressRow) -> Result<Self, RepositoryError> {
        Self::try_from(row)
    }

    fn insert_query(&self) -> QueryAs<'_, Postgres, AddressRow, PgArguments> {
        sqlx::query_as(
            r"
            INSERT INTO customer.addresses (
                id, customer_id, label, recipient_name, phone, address_line1,
                address_line2, city, state, postcode, country, is_default,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING id, customer_id, label, recipient_name, phone, address_line1,
                      address_line2, city, state, postcode, country, is_default,
                      created_at, updated_at
            ",
        )
        .bind(self.id)
        .bind(self.customer_id)
        .bind(self.label)
        .bind(self.recipient_name.as_str())
        .bind(self.phone.as_str())
        .bind(self.address_line1.as_str())
        .bind(self.address_line2.as_deref())
        .bind(self.city.as_str())
        .bind(self.state.as_str())
        .bind(self.postcode.as_str())
        .bind(self.country.as_str())
        .bind(self.is_default)
        .bind(self.created_at)
        .bind(self.updated_at)
    }

    fn update_query(&self) -> QueryAs<'_, Postgres, AddressRow, PgArguments> {
        sqlx::query_as(
            r"
            UPDATE customer.addresses
            SET label = $3, recipient_name = $4, phone = $5, address_line1 = $6,
                address_line2 = $7, city = $8, state = $9, postcode = $10,
                country = $11, is_default = $12, updated_at = NOW()
            WHERE id = $1 AND customer_id = $2
            RETURNING id, customer_id, label, recipient_name, phone, address_line1,
                      address_line2, city, state, postcode, country, is_default,
                      created_at, updated_at
            ",
        )
        .bind(self.id)
        .bind(self.customer_id)
        .bind(self.label)
        .bind(self.recipient_name.as_str())
        .bind(self.phone.as_str())
        .bind(self.address_line1.as_str())
        .bind(self.address_line2.as_deref())
        .bind(self.city.as_str())
        .bind(self.state.as_str())
        .bind(self.postcode.as_str())
        .bind(self.country.as_str())
        .bind(self.is_default)
    }
}
