//! Inbound event deliveries from the event bus bridge.
//!
//! Deliveries are signature-checked and queued for the restock subscriber;
//! processing happens off the request path.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use secrecy::ExposeSecret;
use tokio::sync::mpsc::error::TrySendError;

use crate::error::{AppError, Result};
use crate::middleware::signature::{self, SIGNATURE_HEADER, SignatureError, TIMESTAMP_HEADER};
use crate::routes::extract::{ApiPath, ApiResponse};
use crate::services::restock::RESTOCK_SUBJECT;
use crate::state::AppState;

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// POST /internal/events/{subject}
///
/// 202 once queued; 503 if the queue is full or the subscriber has stopped.
pub async fn receive_event(
    State(state): State<AppState>,
    ApiPath(subject): ApiPath<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let (Some(timestamp), Some(sig)) = (
        header(&headers, TIMESTAMP_HEADER),
        header(&headers, SIGNATURE_HEADER),
    ) else {
        return Err(AppError::Unauthorized(SignatureError::Missing.to_string()));
    };

    let secret = state.config().event_secret.expose_secret().as_bytes();
    if let Err(e) = signature::verify(secret, timestamp, sig, &body, chrono::Utc::now().timestamp())
    {
        tracing::warn!(%subject, error = %e, "Rejected event delivery");
        return Err(AppError::Unauthorized(e.to_string()));
    }

    if subject != RESTOCK_SUBJECT {
        return Err(AppError::NotFound(format!("no handler for subject {subject}")));
    }

    match state.restock_queue().try_send(body.to_vec()) {
        Ok(()) => {
            tracing::debug!(%subject, bytes = body.len(), "Event queued");
            Ok((StatusCode::ACCEPTED, ApiResponse::message("Event queued")).into_response())
        }
        Err(TrySendError::Full(_)) => {
            tracing::warn!(%subject, "Restock queue full");
            Err(AppError::ServiceUnavailable("Event queue full".to_owned()))
        }
        Err(TrySendError::Closed(_)) => {
            tracing::error!(%subject, "Restock subscriber is not running");
            Err(AppError::ServiceUnavailable("Event subscriber stopped".to_owned()))
        }
    }
}
