//! Authentication extractors.
//!
//! Callers present an HS256 access token as `Authorization: Bearer <token>`.
//! The `sub` claim is the customer ID; the `role` claim gates admin routes.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, errors::ErrorKind};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::json;

use niaga_customer_core::CustomerId;

use crate::error::set_sentry_user;
use crate::state::AppState;

/// Roles allowed on `/api/v1/admin` routes.
pub const ADMIN_ROLES: &[&str] = &["admin", "super_admin", "manager"];

/// Claims read from an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Customer ID.
    pub sub: String,
    /// Expiry, seconds since the epoch.
    pub exp: u64,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl Claims {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role
            .as_deref()
            .is_some_and(|role| ADMIN_ROLES.contains(&role))
    }
}

/// Error returned when a request is not authenticated or not allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    MissingToken,
    InvalidToken,
    ExpiredToken,
    Forbidden,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::MissingToken => (StatusCode::UNAUTHORIZED, "Missing bearer token"),
            Self::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid token"),
            Self::ExpiredToken => (StatusCode::UNAUTHORIZED, "Token expired"),
            Self::Forbidden => (StatusCode::FORBIDDEN, "Admin role required"),
        };
        (status, Json(json!({ "success": false, "error": message }))).into_response()
    }
}

/// Verify an HS256 token and return its claims.
///
/// # Errors
///
/// Returns `AuthRejection::ExpiredToken` for an expired token and
/// `AuthRejection::InvalidToken` for anything else that fails validation.
pub fn verify_token(token: &str, secret: &[u8]) -> Result<Claims, AuthRejection> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "sub"]);

    decode::<Claims>(token, &DecodingKey::from_secret(secret), &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthRejection::ExpiredToken,
            _ => {
                tracing::debug!(error = %e, "Rejected access token");
                AuthRejection::InvalidToken
            }
        })
}

fn bearer_claims(parts: &Parts, state: &AppState) -> Result<Claims, AuthRejection> {
    let token = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthRejection::MissingToken)?;

    verify_token(token, state.config().jwt_secret.expose_secret().as_bytes())
}

fn customer_id(claims: &Claims) -> Result<CustomerId, AuthRejection> {
    CustomerId::parse(&claims.sub).map_err(|_| AuthRejection::InvalidToken)
}

/// Extractor that requires an authenticated customer.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireCustomer(customer_id): RequireCustomer) -> impl IntoResponse {
///     customer_id.to_string()
/// }
/// ```
pub struct RequireCustomer(pub CustomerId);

impl FromRequestParts<AppState> for RequireCustomer {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let claims = bearer_claims(parts, state)?;
        let id = customer_id(&claims)?;
        set_sentry_user(&id);
        Ok(Self(id))
    }
}

/// Extractor that requires a caller with an admin role.
pub struct RequireAdmin(pub CustomerId);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let claims = bearer_claims(parts, state)?;
        let id = customer_id(&claims)?;
        if !claims.is_admin() {
            tracing::warn!(customer_id = %id, role = ?claims.role, "Admin route denied");
            return Err(AuthRejection::Forbidden);
        }
        set_sentry_user(&id);
        Ok(Self(id))
    }
}
