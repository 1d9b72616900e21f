//! Extractors whose rejections use the API error envelope.

use axum::{
    Json,
    extract::{
        FromRequest, FromRequestParts,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Deserializer, Serialize, de};

use crate::error::AppError;

/// `Json` extractor that rejects with a 400 `AppError`.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// `Path` extractor that rejects with a 400 `AppError`.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

/// `Query` extractor that rejects with a 400 `AppError`.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Deserialize an optional query value, treating a blank value as absent.
///
/// # Errors
///
/// Returns the parse error of `T` for a non-blank value.
pub fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match Option::<String>::deserialize(deserializer)?
        .as_deref()
        .map(str::trim)
    {
        None | Some("") => Ok(None),
        Some(raw) => raw.parse().map(Some).map_err(de::Error::custom),
    }
}

/// Success envelope: `{"success": true, "data": ..., "message": ...}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    #[must_use]
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Respond with 201 Created.
    pub fn created(self) -> Response {
        (StatusCode::CREATED, Json(self)).into_response()
    }
}

impl ApiResponse<()> {
    /// A body with only a message.
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shapes() {
        let body = serde_json::to_value(ApiResponse::ok(3).with_message("Counted")).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"success": true, "data": 3, "message": "Counted"})
        );

        let body = serde_json::to_value(ApiResponse::message("Removed")).unwrap();
        assert_eq!(body, serde_json::json!({"success": true, "message": "Removed"}));
    }

    #[derive(Debug, Deserialize)]
    struct VariantQuery {
        #[serde(default, deserialize_with = "blank_as_none")]
        variant_id: Option<niaga_customer_core::VariantId>,
    }

    #[test]
    fn test_blank_query_value_is_none() {
        let q: VariantQuery = serde_json::from_str(r#"{"variant_id":""}"#).unwrap();
        assert!(q.variant_id.is_none());
        let q: VariantQuery = serde_json::from_str("{}").unwrap();
        assert!(q.variant_id.is_none());

        let id = niaga_customer_core::VariantId::generate();
        let q: VariantQuery =
            serde_json::from_str(&format!(r#"{{"variant_id":"{id}"}}"#)).unwrap();
        assert_eq!(q.variant_id, Some(id));

        assert!(serde_json::from_str::<VariantQuery>(r#"{"variant_id":"nope"}"#).is_err());
    }

    #[test]
    fn test_created_status() {
        assert_eq!(
            ApiResponse::ok("x").created().status(),
            StatusCode::CREATED
        );
    }
}
