//! Shipping address routes.
//!
//! Every change to the default flag goes through the `ExactlyOneDefault`
//! rule held in `AppState`.

use axum::{extract::State, response::Response};

use niaga_customer_core::AddressId;

use crate::error::Result;
use crate::middleware::RequireCustomer;
use crate::models::{Address, AddressInput, AddressPatch};
use crate::routes::extract::{ApiJson, ApiPath, ApiResponse};
use crate::state::AppState;

/// GET /customer/addresses
pub async fn list_addresses(
    State(state): State<AppState>,
    RequireCustomer(customer_id): RequireCustomer,
) -> Result<ApiResponse<Vec<Address>>> {
    let addresses = state.addresses().list(customer_id).await?;
    Ok(ApiResponse::ok(addresses))
}

/// POST /customer/addresses
pub async fn create_address(
    State(state): State<AppState>,
    RequireCustomer(customer_id): RequireCustomer,
    ApiJson(input): ApiJson<AddressInput>,
) -> Result<Response> {
    let make_default = input.is_default;
    let address = input.into_address(customer_id)?;
    let created = state
        .addresses()
        .create(customer_id, address, make_default)
        .await?;

    Ok(ApiResponse::ok(created)
        .with_message("Address created")
        .created())
}

/// PUT /customer/addresses/{id}
pub async fn update_address(
    State(state): State<AppState>,
    RequireCustomer(customer_id): RequireCustomer,
    ApiPath(id): ApiPath<AddressId>,
    ApiJson(patch): ApiJson<AddressPatch>,
) -> Result<ApiResponse<Address>> {
    let updated = state
        .addresses()
        .update(customer_id, id, patch.is_default, |current| {
            patch.apply(current)
        })
        .await?;

    Ok(ApiResponse::ok(updated).with_message("Address updated"))
}

/// DELETE /customer/addresses/{id}
pub async fn delete_address(
    State(state): State<AppState>,
    RequireCustomer(customer_id): RequireCustomer,
    ApiPath(id): ApiPath<AddressId>,
) -> Result<ApiResponse<()>> {
    state.addresses().delete(customer_id, id).await?;
    Ok(ApiResponse::message("Address deleted"))
}

/// PUT /customer/addresses/{id}/default
pub async fn set_default_address(
    State(state): State<AppState>,
    RequireCustomer(customer_id): RequireCustomer,
    ApiPath(id): ApiPath<AddressId>,
) -> Result<ApiResponse<Address>> {
    let address = state.addresses().set_default(customer_id, id).await?;
    Ok(ApiResponse::ok(address).with_message("Default address updated"))
}
