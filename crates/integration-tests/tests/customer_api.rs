//! Customer API tests: auth, profile, addresses, measurements, wishlist.

#![allow(clippy::unwrap_used)]

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use serde_json::{Value, json};

use niaga_customer_core::{ProductId, VariantId};
use niaga_customer_integration_tests::{Customer, TestApp};

fn address(name: &str, is_default: bool) -> Value {
    json!({
        "label": "home",
        "recipient_name": name,
        "phone": "012-345 6789",
        "address_line1": "12 Jalan Mawar",
        "city": "Shah Alam",
        "state": "Selangor",
        "postcode": "40000",
        "is_default": is_default,
    })
}

fn defaults(list: &Value) -> Vec<String> {
    list["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|a| a["is_default"] == true)
        .map(|a| a["id"].as_str().unwrap().to_owned())
        .collect()
}

// ============================================================================
// Auth & Health
// ============================================================================

#[tokio::test]
async fn test_health_endpoints() {
    let app = TestApp::new();

    let (status, body) = app
        .send(Request::get("/health").body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");

    let (status, _) = app
        .send(Request::get("/health/ready").body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_missing_and_invalid_tokens_are_rejected() {
    let app = TestApp::new();

    let (status, body) = app
        .send(
            Request::get("/api/v1/customer/addresses")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = app
        .call(Method::GET, "/api/v1/customer/addresses", "not.a.token", None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_routes_require_admin_role() {
    let app = TestApp::new();
    let customer = Customer::new();

    let (status, _) = app
        .call(
            Method::GET,
            "/api/v1/admin/back-in-stock/stats",
            &customer.token,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let manager = Customer::admin("manager");
    let (status, _) = app
        .call(
            Method::GET,
            "/api/v1/admin/back-in-stock/stats",
            &manager.token,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_request_id_is_returned() {
    let app = TestApp::new();
    let response = tower::ServiceExt::oneshot(
        app.router.clone(),
        Request::get("/health").body(Body::empty()).unwrap(),
    )
    .await
    .unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}

// ============================================================================
// Profile
// ============================================================================

#[tokio::test]
async fn test_profile_get_and_update() {
    let app = TestApp::new();
    let customer = Customer::new();

    let (status, body) = app
        .call(Method::GET, "/api/v1/customer/profile", &customer.token, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], customer.id.to_string());
    assert_eq!(body["data"]["status"], "active");

    let (status, body) = app
        .call(
            Method::PUT,
            "/api/v1/customer/profile",
            &customer.token,
            Some(json!({"full_name": "Nurul Izzah", "email": "Nurul@Example.com"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["full_name"], "Nurul Izzah");
    assert_eq!(body["data"]["email"], "nurul@example.com");

    let (status, body) = app
        .call(
            Method::PUT,
            "/api/v1/customer/profile",
            &customer.token,
            Some(json!({"email": "not-an-email"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_profile_email_must_be_unique() {
    let app = TestApp::new();
    let first = Customer::new();
    let second = Customer::new();
    let body = Some(json!({"email": "shared@example.com"}));

    let (status, _) = app
        .call(Method::PUT, "/api/v1/customer/profile", &first.token, body.clone())
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .call(Method::PUT, "/api/v1/customer/profile", &second.token, body)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

// ============================================================================
// Addresses
// ============================================================================

#[tokio::test]
async fn test_new_default_address_replaces_previous() {
    let app = TestApp::new();
    let customer = Customer::new();

    let (status, a1) = app
        .call(
            Method::POST,
            "/api/v1/customer/addresses",
            &customer.token,
            Some(address("Siti", true)),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(a1["data"]["is_default"], true);

    let (status, a2) = app
        .call(
            Method::POST,
            "/api/v1/customer/addresses",
            &customer.token,
            Some(address("Ahmad", true)),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, list) = app
        .call(Method::GET, "/api/v1/customer/addresses", &customer.token, None)
        .await;
    assert_eq!(list["data"].as_array().unwrap().len(), 2);
    assert_eq!(
        defaults(&list),
        vec![a2["data"]["id"].as_str().unwrap().to_owned()]
    );
}

#[tokio::test]
async fn test_set_default_and_delete_address() {
    let app = TestApp::new();
    let customer = Customer::new();

    let (_, a1) = app
        .call(
            Method::POST,
            "/api/v1/customer/addresses",
            &customer.token,
            Some(address("Siti", true)),
        )
        .await;
    let (_, a2) = app
        .call(
            Method::POST,
            "/api/v1/customer/addresses",
            &customer.token,
            Some(address("Ahmad", false)),
        )
        .await;
    let a1_id = a1["data"]["id"].as_str().unwrap();
    let a2_id = a2["data"]["id"].as_str().unwrap();

    let (status, body) = app
        .call(
            Method::PUT,
            &format!("/api/v1/customer/addresses/{a2_id}/default"),
            &customer.token,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_default"], true);

    let (_, list) = app
        .call(Method::GET, "/api/v1/customer/addresses", &customer.token, None)
        .await;
    assert_eq!(defaults(&list), vec![a2_id.to_owned()]);

    // Deleting the default leaves the customer with no default.
    let (status, _) = app
        .call(
            Method::DELETE,
            &format!("/api/v1/customer/addresses/{a2_id}"),
            &customer.token,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, list) = app
        .call(Method::GET, "/api/v1/customer/addresses", &customer.token, None)
        .await;
    assert!(defaults(&list).is_empty());
    assert_eq!(list["data"][0]["id"], a1_id);
}

#[tokio::test]
async fn test_address_of_another_customer_is_not_found() {
    let app = TestApp::new();
    let owner = Customer::new();
    let intruder = Customer::new();

    let (_, created) = app
        .call(
            Method::POST,
            "/api/v1/customer/addresses",
            &owner.token,
            Some(address("Siti", false)),
        )
        .await;
    let id = created["data"]["id"].as_str().unwrap();

    for (method, uri) in [
        (Method::PUT, format!("/api/v1/customer/addresses/{id}/default")),
        (Method::DELETE, format!("/api/v1/customer/addresses/{id}")),
    ] {
        let (status, body) = app.call(method, &uri, &intruder.token, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "address not found");
    }
}

#[tokio::test]
async fn test_address_update_validation_and_malformed_id() {
    let app = TestApp::new();
    let customer = Customer::new();

    let (_, created) = app
        .call(
            Method::POST,
            "/api/v1/customer/addresses",
            &customer.token,
            Some(address("Siti", false)),
        )
        .await;
    let id = created["data"]["id"].as_str().unwrap();

    let (status, body) = app
        .call(
            Method::PUT,
            &format!("/api/v1/customer/addresses/{id}"),
            &customer.token,
            Some(json!({"city": "Petaling Jaya", "is_default": true})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["city"], "Petaling Jaya");
    assert_eq!(body["data"]["is_default"], true);

    let (status, _) = app
        .call(
            Method::PUT,
            &format!("/api/v1/customer/addresses/{id}"),
            &customer.token,
            Some(json!({"postcode": "  "})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .call(
            Method::DELETE,
            "/api/v1/customer/addresses/not-a-uuid",
            &customer.token,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

// ============================================================================
// Measurements
// ============================================================================

#[tokio::test]
async fn test_measurement_lifecycle() {
    let app = TestApp::new();
    let customer = Customer::new();

    let (status, m1) = app
        .call(
            Method::POST,
            "/api/v1/customer/measurements",
            &customer.token,
            Some(json!({
                "name": "Baju kurung",
                "gender": "women",
                "bust": 88.0,
                "waist": 70.0,
                "hip": 94.0,
                "height": 160.0,
                "weight": 55.0,
                "is_default": true,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(m1["data"]["is_default"], true);
    assert!(m1["data"]["summary"]["bmi"].is_number());

    let (_, m2) = app
        .call(
            Method::POST,
            "/api/v1/customer/measurements",
            &customer.token,
            Some(json!({"gender": "women", "waist": 72.0})),
        )
        .await;
    let m2_id = m2["data"]["id"].as_str().unwrap();

    let (status, _) = app
        .call(
            Method::PUT,
            &format!("/api/v1/customer/measurements/{m2_id}/set-default"),
            &customer.token,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, list) = app
        .call(Method::GET, "/api/v1/customer/measurements", &customer.token, None)
        .await;
    assert_eq!(defaults(&list), vec![m2_id.to_owned()]);

    let (status, body) = app
        .call(
            Method::GET,
            &format!("/api/v1/customer/measurements/{m2_id}"),
            &customer.token,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["waist"], 72.0);

    let (status, _) = app
        .call(
            Method::POST,
            "/api/v1/customer/measurements",
            &customer.token,
            Some(json!({"gender": "men", "chest": -5.0})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_address_and_measurement_defaults_are_independent() {
    let app = TestApp::new();
    let customer = Customer::new();

    app.call(
        Method::POST,
        "/api/v1/customer/addresses",
        &customer.token,
        Some(address("Siti", true)),
    )
    .await;
    app.call(
        Method::POST,
        "/api/v1/customer/measurements",
        &customer.token,
        Some(json!({"gender": "men", "chest": 100.0, "is_default": true})),
    )
    .await;

    let (_, addresses) = app
        .call(Method::GET, "/api/v1/customer/addresses", &customer.token, None)
        .await;
    let (_, measurements) = app
        .call(Method::GET, "/api/v1/customer/measurements", &customer.token, None)
        .await;
    assert_eq!(defaults(&addresses).len(), 1);
    assert_eq!(defaults(&measurements).len(), 1);
}

// ============================================================================
// Wishlist
// ============================================================================

#[tokio::test]
async fn test_wishlist_add_is_idempotent() {
    let app = TestApp::new();
    let customer = Customer::new();
    let product = ProductId::generate();
    let item = json!({"product_id": product, "price_at_add": "129.90", "product_name": "Kurta"});

    let (status, first) = app
        .call(Method::POST, "/api/v1/customer/wishlist", &customer.token, Some(item.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, second) = app
        .call(Method::POST, "/api/v1/customer/wishlist", &customer.token, Some(item))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["data"]["id"], second["data"]["id"]);

    let (_, count) = app
        .call(Method::GET, "/api/v1/customer/wishlist/count", &customer.token, None)
        .await;
    assert_eq!(count["data"]["count"], 1);
}

#[tokio::test]
async fn test_wishlist_variant_keys_are_distinct() {
    let app = TestApp::new();
    let customer = Customer::new();
    let product = ProductId::generate();
    let variant = VariantId::generate();

    for body in [
        json!({"product_id": product}),
        json!({"product_id": product, "variant_id": variant}),
    ] {
        let (status, _) = app
            .call(Method::POST, "/api/v1/customer/wishlist", &customer.token, Some(body))
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    // Removing the product-level entry leaves the variant entry.
    let (status, _) = app
        .call(
            Method::DELETE,
            &format!("/api/v1/customer/wishlist/{product}"),
            &customer.token,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, check) = app
        .call(
            Method::GET,
            &format!("/api/v1/customer/wishlist/check/{product}"),
            &customer.token,
            None,
        )
        .await;
    assert_eq!(check["data"]["in_wishlist"], false);

    let (_, check) = app
        .call(
            Method::GET,
            &format!("/api/v1/customer/wishlist/check/{product}?variant_id={variant}"),
            &customer.token,
            None,
        )
        .await;
    assert_eq!(check["data"]["in_wishlist"], true);

    let (status, _) = app
        .call(
            Method::DELETE,
            &format!("/api/v1/customer/wishlist/{product}"),
            &customer.token,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .call(
            Method::DELETE,
            &format!("/api/v1/customer/wishlist/{product}?all_variants=true"),
            &customer.token,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, count) = app
        .call(Method::GET, "/api/v1/customer/wishlist/count", &customer.token, None)
        .await;
    assert_eq!(count["data"]["count"], 0);
}

#[tokio::test]
async fn test_wishlist_notify_on_sale_and_sale_watchers() {
    let app = TestApp::new();
    let customer = Customer::new();
    let admin = Customer::admin("admin");
    let product = ProductId::generate();

    let (_, added) = app
        .call(
            Method::POST,
            "/api/v1/customer/wishlist",
            &customer.token,
            Some(json!({"product_id": product})),
        )
        .await;
    let item_id = added["data"]["id"].as_str().unwrap();

    let (status, body) = app
        .call(
            Method::PATCH,
            &format!("/api/v1/customer/wishlist/items/{item_id}"),
            &customer.token,
            Some(json!({"notify_on_sale": true})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["notify_on_sale"], true);

    let (status, watchers) = app
        .call(
            Method::GET,
            &format!("/api/v1/admin/wishlist/products/{product}/sale-watchers"),
            &admin.token,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(watchers["data"].as_array().unwrap().len(), 1);

    let (status, _) = app
        .call(
            Method::DELETE,
            &format!("/api/v1/customer/wishlist/items/{item_id}"),
            &customer.token,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}
