//! Measurement set persistence mapping.

use chrono::{DateTime, Utc};
use sqlx::Postgres;
use sqlx::postgres::PgArguments;
use sqlx::query::QueryAs;

use niaga_customer_core::{BodyMeasurements, CustomerId, MeasurementId, SizingGender};

use super::RepositoryError;
use super::pg_defaults::PgDefaultRecord;
use crate::models::Measurement;

/// Database row for `customer.measurements`.
#[derive(Debug, sqlx::FromRow)]
pub struct MeasurementRow {
    id: MeasurementId,
    customer_id: CustomerId,
    name: Option<String>,
    gender: SizingGender,
    bust: Option<f64>,
    chest: Option<f64>,
    waist: Option<f64>,
    hip: Option<f64>,
    shoulder_width: Option<f64>,
    arm_length: Option<f64>,
    inseam: Option<f64>,
    outseam: Option<f64>,
    thigh: Option<f64>,
    neck: Option<f64>,
    wrist: Option<f64>,
    height: Option<f64>,
    weight: Option<f64>,
    notes: Option<String>,
    is_default: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<MeasurementRow> for Measurement {
    fn from(r: MeasurementRow) -> Self {
        Self {
            id: r.id,
            customer_id: r.customer_id,
            name: r.name,
            gender: r.gender,
            values: BodyMeasurements {
                bust: r.bust,
                chest: r.chest,
                waist: r.waist,
                hip: r.hip,
                shoulder_width: r.shoulder_width,
                arm_length: r.arm_length,
                inseam: r.inseam,
                outseam: r.outseam,
                thigh: r.thigh,
                neck: r.neck,
                wrist: r.wrist,
                height: r.height,
                weight: r.weight,
            },
            notes: r.notes,
            is_default: r.is_default,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

impl PgDefaultRecord for Measurement {
    const TABLE: &'static str = "customer.measurements";

    const COLUMNS: &'static str = "id, customer_id, name, gender, bust, chest, waist, hip, \
        shoulder_width, arm_length, inseam, outseam, thigh, neck, wrist, height, weight, \
        notes, is_default, created_at, updated_at";

    type Row = MeasurementRow;

    fn from_row(row: MeasurementRow) -> Result<Self, RepositoryError> {
        Ok(row.into())
    }

    fn insert_query(&self) -> QueryAs<'_, Postgres, MeasurementRow, PgArguments> {
        let v = &self.values;
        sqlx::query_as(
            r"
            INSERT INTO customer.measurements (
                id, customer_id, name, gender, bust, chest, waist, hip,
                shoulder_width, arm_length, inseam, outseam, thigh, neck, wrist,
                height, weight, notes, is_default, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                    $15, $16, $17, $18, $19, $20, $21)
            RETURNING id, customer_id, name, gender, bust, chest, waist, hip,
                      shoulder_width, arm_length, inseam, outseam, thigh, neck, wrist,
                      height, weight, notes, is_default, created_at, updated_at
            ",
        )
        .bind(self.id)
        .bind(self.customer_id)
        .bind(self.name.as_deref())
        .bind(self.gender)
        .bind(v.bust)
        .bind(v.chest)
        .bind(v.waist)
        .bind(v.hip)
        .bind(v.shoulder_width)
        .bind(v.arm_length)
        .bind(v.inseam)
        .bind(v.outseam)
        .bind(v.thigh)
        .bind(v.neck)
        .bind(v.wrist)
        .bind(v.height)
        .bind(v.weight)
        .bind(self.notes.as_deref())
        .bind(self.is_default)
        .bind(self.created_at)
        .bind(self.updated_at)
    }

    fn update_query(&self) -> QueryAs<'_, Postgres, MeasurementRow, PgArguments> {
        let v = &self.values;
        sqlx::query_as(
            r"
            UPDATE customer.measurements
            SET name = $3, gender = $4, bust = $5, chest = $6, waist = $7, hip = $8,
                shoulder_width = $9, arm_length = $10, inseam = $11, outseam = $12,
                thigh = $13, neck = $14, wrist = $15, height = $16, weight = $17,
                notes = $18, is_default = $19, updated_at = NOW()
            WHERE id = $1 AND customer_id = $2
            RETURNING id, customer_id, name, gender, bust, chest, waist, hip,
                      shoulder_width, arm_length, inseam, outseam, thigh, neck, wrist,
                      height, weight, notes, is_default, created_at, updated_at
            ",
        )
        .bind(self.id)
        .bind(self.customer_id)
        .bind(self.name.as_deref())
        .bind(self.gender)
        .bind(v.bust)
        .bind(v.chest)
        .bind(v.waist)
        .bind(v.hip)
        .bind(v.shoulder_width)
        .bind(v.arm_length)
        .bind(v.inseam)
        .bind(v.outseam)
        .bind(v.thigh)
        .bind(v.neck)
        .bind(v.wrist)
        .bind(v.height)
        .bind(v.weight)
        .bind(self.notes.as_deref())
        .bind(self.is_default)
    }
}
