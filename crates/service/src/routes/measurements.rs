//! Body measurement routes.

use axum::{extract::State, response::Response};
use serde::Serialize;

use niaga_customer_core::MeasurementId;

use crate::error::Result;
use crate::middleware::RequireCustomer;
use crate::models::{Measurement, MeasurementInput, MeasurementPatch, measurement::MeasurementSummary};
use crate::routes::extract::{ApiJson, ApiPath, ApiResponse};
use crate::state::AppState;

/// A measurement set with its derived values.
#[derive(Debug, Serialize)]
pub struct MeasurementView {
    #[serde(flatten)]
    pub measurement: Measurement,
    pub summary: MeasurementSummary,
}

impl From<Measurement> for MeasurementView {
    fn from(measurement: Measurement) -> Self {
        let summary = measurement.summary();
        Self {
            measurement,
            summary,
        }
    }
}

/// GET /customer/measurements
pub async fn list_measurements(
    State(state): State<AppState>,
    RequireCustomer(customer_id): RequireCustomer,
) -> Result<ApiResponse<Vec<MeasurementView>>> {
    let measurements = state.measurements().list(customer_id).await?;
    Ok(ApiResponse::ok(
        measurements.into_iter().map(MeasurementView::from).collect(),
    ))
}

/// GET /customer/measurements/{id}
pub async fn get_measurement(
    State(state): State<AppState>,
    RequireCustomer(customer_id): RequireCustomer,
    ApiPath(id): ApiPath<MeasurementId>,
) -> Result<ApiResponse<MeasurementView>> {
    let measurement = state.measurements().get(customer_id, id).await?;
    Ok(ApiResponse::ok(measurement.into()))
}

/// POST /customer/measurements
pub async fn create_measurement(
    State(state): State<AppState>,
    RequireCustomer(customer_id): RequireCustomer,
    ApiJson(input): ApiJson<MeasurementInput>,
) -> Result<Response> {
    let make_default = input.is_default;
    let measurement = input.into_measurement(customer_id)?;
    let created = state
        .measurements()
        .create(customer_id, measurement, make_default)
        .await?;

    Ok(ApiResponse::ok(MeasurementView::from(created))
        .with_message("Measurement created")
        .created())
}

/// PUT /customer/measurements/{id}
pub async fn update_measurement(
    State(state): State<AppState>,
    RequireCustomer(customer_id): RequireCustomer,
    ApiPath(id): ApiPath<MeasurementId>,
    ApiJson(patch): ApiJson<MeasurementPatch>,
) -> Result<ApiResponse<MeasurementView>> {
    let updated = state
        .measurements()
        .update(customer_id, id, patch.is_default, |current| {
            patch.apply(current)
        })
        .await?;

    Ok(ApiResponse::ok(updated.into()).with_message("Measurement updated"))
}

/// DELETE /customer/measurements/{id}
pub async fn delete_measurement(
    State(state): State<AppState>,
    RequireCustomer(customer_id): RequireCustomer,
    ApiPath(id): ApiPath<MeasurementId>,
) -> Result<ApiResponse<()>> {
    state.measurements().delete(customer_id, id).await?;
    Ok(ApiResponse::message("Measurement deleted"))
}

/// PUT /customer/measurements/{id}/set-default
pub async fn set_default_measurement(
    State(state): State<AppState>,
    RequireCustomer(customer_id): RequireCustomer,
    ApiPath(id): ApiPath<MeasurementId>,
) -> Result<ApiResponse<MeasurementView>> {
    let measurement = state.measurements().set_default(customer_id, id).await?;
    Ok(ApiResponse::ok(measurement.into()).with_message("Default measurement updated"))
}
