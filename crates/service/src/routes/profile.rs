//! Customer profile routes.

use axum::extract::State;

use crate::error::Result;
use crate::middleware::RequireCustomer;
use crate::models::{Profile, ProfileInput};
use crate::routes::extract::{ApiJson, ApiResponse};
use crate::state::AppState;

/// GET /customer/profile
///
/// A customer who has never saved a profile gets an empty active one.
pub async fn get_profile(
    State(state): State<AppState>,
    RequireCustomer(customer_id): RequireCustomer,
) -> Result<ApiResponse<Profile>> {
    let profile = state
        .profiles()
        .get(customer_id)
        .await?
        .unwrap_or_else(|| Profile::empty(customer_id));
    Ok(ApiResponse::ok(profile))
}

/// PUT /customer/profile
pub async fn update_profile(
    State(state): State<AppState>,
    RequireCustomer(customer_id): RequireCustomer,
    ApiJson(input): ApiJson<ProfileInput>,
) -> Result<ApiResponse<Profile>> {
    let current = state
        .profiles()
        .get(customer_id)
        .await?
        .unwrap_or_else(|| Profile::empty(customer_id));

    let next = input.apply(&current)?;
    let saved = state.profiles().upsert(&next).await?;

    tracing::info!(customer_id = %customer_id, "Profile updated");
    Ok(ApiResponse::ok(saved).with_message("Profile updated"))
}
