//! Integration tests for the Niaga customer service.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p niaga-customer-integration-tests
//! ```
//!
//! The tests drive the full router, middleware included, in process with
//! `tower::ServiceExt::oneshot`. Storage is the in-memory backend, so no
//! database is needed.
//!
//! # Test Categories
//!
//! - `customer_api` - Profile, addresses, measurements, wishlist
//! - `back_in_stock_api` - Subscriptions and admin endpoints
//! - `restock_flow` - Signed events through the queue to notifications

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::HashMap;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;

use niaga_customer_core::CustomerId;
use niaga_customer_service::{
    app,
    config::ServiceConfig,
    db::MemoryStore,
    middleware::{
        Claims,
        signature::{SIGNATURE_HEADER, TIMESTAMP_HEADER, sign},
    },
    state::AppState,
};

pub const JWT_SECRET: &str = "kR7#vQ2!mZ9@pL4$wX8^nB3&tY6*hD1%";
pub const EVENT_SECRET: &str = "Gf5!Jq8@Ls2#Pw7$Zc4^Hm9&Rt1*Vb6%";

/// Configuration with test secrets and defaults for everything else.
#[must_use]
pub fn test_config() -> ServiceConfig {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("CUSTOMER_DATABASE_URL", "postgres://localhost/niaga_customer_test"),
        ("CUSTOMER_JWT_SECRET", JWT_SECRET),
        ("CUSTOMER_EVENT_SECRET", EVENT_SECRET),
    ]);
    ServiceConfig::from_lookup(|key| vars.get(key).map(|v| (*v).to_owned())).unwrap()
}

/// Sign a bearer token for `customer` with an optional role.
#[must_use]
pub fn token(customer: CustomerId, role: Option<&str>) -> String {
    let claims = Claims {
        sub: customer.to_string(),
        exp: u64::try_from(chrono::Utc::now().timestamp() + 3600).unwrap(),
        role: role.map(String::from),
        email: None,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

/// The router over a fresh in-memory store.
pub struct TestApp {
    pub router: Router,
    pub store: MemoryStore,
    restock_rx: Option<mpsc::Receiver<Vec<u8>>>,
}

impl TestApp {
    #[must_use]
    pub fn new() -> Self {
        Self::with_queue_capacity(8)
    }

    #[must_use]
    pub fn with_queue_capacity(capacity: usize) -> Self {
        let store = MemoryStore::new();
        let (tx, rx) = mpsc::channel(capacity);
        let state = AppState::new(test_config(), store.clone(), tx);

        Self {
            router: app(state),
            store,
            restock_rx: Some(rx),
        }
    }

    /// Take the receiving end of the restock queue. Dropping it closes the
    /// queue for the events route.
    pub fn take_restock_queue(&mut self) -> mpsc::Receiver<Vec<u8>> {
        self.restock_rx.take().unwrap()
    }

    /// Send one request. Non-JSON bodies come back as a JSON string.
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, body)
    }

    /// Authenticated JSON request.
    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"));

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        };
        self.send(request.unwrap()).await
    }

    /// Deliver a signed event.
    pub async fn deliver_event(&self, subject: &str, payload: &[u8]) -> (StatusCode, Value) {
        let timestamp = chrono::Utc::now().timestamp();
        let request = Request::builder()
            .method(Method::POST)
            .uri(format!("/internal/events/{subject}"))
            .header(TIMESTAMP_HEADER, timestamp.to_string())
            .header(
                SIGNATURE_HEADER,
                sign(EVENT_SECRET.as_bytes(), timestamp, payload),
            )
            .body(Body::from(payload.to_vec()))
            .unwrap();
        self.send(request).await
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// A logged-in customer for API calls.
pub struct Customer {
    pub id: CustomerId,
    pub token: String,
}

impl Customer {
    #[must_use]
    pub fn new() -> Self {
        let id = CustomerId::generate();
        Self {
            id,
            token: token(id, None),
        }
    }

    #[must_use]
    pub fn admin(role: &str) -> Self {
        let id = CustomerId::generate();
        Self {
            id,
            token: token(id, Some(role)),
        }
    }
}

impl Default for Customer {
    fn default() -> Self {
        Self::new()
    }
}
