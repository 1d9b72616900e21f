//! Profile repository for database operations.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use niaga_customer_core::{CustomerId, CustomerStatus, Email, Phone};

use super::{PgStore, ProfileRepository, RepositoryError, map_unique_violation};
use crate::models::{CustomerStats, Profile};

const PROFILE_COLUMNS: &str = "id, full_name, email, phone, date_of_birth, gender, \
    profile_picture, status, created_at, updated_at";

/// Tables holding rows keyed by `customer_id`.
const OWNED_TABLES: [&str; 4] = [
    "addresses",
    "measurements",
    "wishlist_items",
    "back_in_stock_subscriptions",
];

/// Database row for `customer.profiles`.
#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
    id: CustomerId,
    full_name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    date_of_birth: Option<NaiveDate>,
    gender: Option<String>,
    profile_picture: Option<String>,
    status: CustomerStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = RepositoryError;

    fn try_from(r: ProfileRow) -> Result<Self, Self::Error> {
        let email = r
            .email
            .as_deref()
            .map(Email::parse)
            .transpose()
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid email in database: {e}")))?;
        let phone = r
            .phone
            .as_deref()
            .map(Phone::parse)
            .transpose()
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid phone in database: {e}")))?;

        Ok(Self {
            id: r.id,
            full_name: r.full_name,
            email,
            phone,
            date_of_birth: r.date_of_birth,
            gender: r.gender,
            profile_picture: r.profile_picture,
            status: r.status,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[async_trait]
impl ProfileRepository for PgStore {
    async fn get(&self, id: CustomerId) -> Result<Option<Profile>, RepositoryError> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM customer.profiles WHERE id = $1");
        let row = sqlx::query_as::<_, ProfileRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        row.map(Profile::try_from).transpose()
    }

    async fn upsert(&self, profile: &Profile) -> Result<Profile, RepositoryError> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r"
            INSERT INTO customer.profiles (
                id, full_name, email, phone, date_of_birth, gender,
                profile_picture, status, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW(), NOW())
            ON CONFLICT (id) DO UPDATE SET
                full_name = EXCLUDED.full_name,
                email = EXCLUDED.email,
                phone = EXCLUDED.phone,
                date_of_birth = EXCLUDED.date_of_birth,
                gender = EXCLUDED.gender,
                profile_picture = EXCLUDED.profile_picture,
                updated_at = NOW()
            RETURNING id, full_name, email, phone, date_of_birth, gender,
                      profile_picture, status, created_at, updated_at
            ",
        )
        .bind(profile.id)
        .bind(profile.full_name.as_deref())
        .bind(profile.email.as_ref().map(Email::as_str))
        .bind(profile.phone.as_ref().map(Phone::as_str))
        .bind(profile.date_of_birth)
        .bind(profile.gender.as_deref())
        .bind(profile.profile_picture.as_deref())
        .bind(profile.status)
        .fetch_one(self.pool())
        .await
        .map_err(|e| map_unique_violation(e, "email already in use"))?;

        Profile::try_from(row)
    }

    async fn create(&self, profile: &Profile) -> Result<Option<Profile>, RepositoryError> {
        let sql = format!(
            r"
            INSERT INTO customer.profiles (
                id, full_name, email, phone, date_of_birth, gender,
                profile_picture, status, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW(), NOW())
            ON CONFLICT (id) DO NOTHING
            RETURNING {PROFILE_COLUMNS}
            "
        );
        let row = sqlx::query_as::<_, ProfileRow>(&sql)
            .bind(profile.id)
            .bind(profile.full_name.as_deref())
            .bind(profile.email.as_ref().map(Email::as_str))
            .bind(profile.phone.as_ref().map(Phone::as_str))
            .bind(profile.date_of_birth)
            .bind(profile.gender.as_deref())
            .bind(profile.profile_picture.as_deref())
            .bind(profile.status)
            .fetch_optional(self.pool())
            .await
            .map_err(|e| map_unique_violation(e, "email already in use"))?;
        row.map(Profile::try_from).transpose()
    }

    async fn update(&self, profile: &Profile) -> Result<Option<Profile>, RepositoryError> {
        let sql = format!(
            r"
            UPDATE customer.profiles SET
                full_name = $2, email = $3, phone = $4, date_of_birth = $5,
                gender = $6, profile_picture = $7, updated_at = NOW()
            WHERE id = $1
            RETURNING {PROFILE_COLUMNS}
            "
        );
        let row = sqlx::query_as::<_, ProfileRow>(&sql)
            .bind(profile.id)
            .bind(profile.full_name.as_deref())
            .bind(profile.email.as_ref().map(Email::as_str))
            .bind(profile.phone.as_ref().map(Phone::as_str))
            .bind(profile.date_of_birth)
            .bind(profile.gender.as_deref())
            .bind(profile.profile_picture.as_deref())
            .fetch_optional(self.pool())
            .await
            .map_err(|e| map_unique_violation(e, "email already in use"))?;
        row.map(Profile::try_from).transpose()
    }

    async fn set_status(
        &self,
        id: CustomerId,
        from: CustomerStatus,
        to: CustomerStatus,
    ) -> Result<Option<Profile>, RepositoryError> {
        let sql = format!(
            "UPDATE customer.profiles SET status = $3, updated_at = NOW() \
             WHERE id = $1 AND status = $2 RETURNING {PROFILE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ProfileRow>(&sql)
            .bind(id)
            .bind(from)
            .bind(to)
            .fetch_optional(self.pool())
            .await?;
        row.map(Profile::try_from).transpose()
    }

    async fn delete(&self, id: CustomerId) -> Result<bool, RepositoryError> {
        let mut tx = self.pool().begin().await?;

        let removed = sqlx::query("DELETE FROM customer.profiles WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if removed == 0 {
            return Ok(false);
        }

        for table in OWNED_TABLES {
            sqlx::query(&format!("DELETE FROM customer.{table} WHERE customer_id = $1"))
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(true)
    }

    async fn stats(&self) -> Result<CustomerStats, RepositoryError> {
        let stats = sqlx::query_as::<_, CustomerStats>(
            r"
            SELECT
                COUNT(*) AS total_customers,
                COUNT(*) FILTER (WHERE status = 'active') AS active,
                COUNT(*) FILTER (WHERE status = 'inactive') AS inactive,
                COUNT(*) FILTER (WHERE status = 'suspended') AS suspended,
                COUNT(*) FILTER (WHERE status = 'blocked') AS blocked
            FROM customer.profiles
            ",
        )
        .fetch_one(self.pool())
        .await?;
        Ok(stats)
    }
}
