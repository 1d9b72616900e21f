//! Admin customer management endpoint tests.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use serde_json::json;

use niaga_customer_core::ProductId;
use niaga_customer_integration_tests::{Customer, TestApp};

fn customer_uri(customer: &Customer) -> String {
    format!("/api/v1/admin/customers/{}", customer.id)
}

#[tokio::test]
async fn test_admin_creates_then_reads_customer() {
    let app = TestApp::new();
    let admin = Customer::admin("admin");
    let customer = Customer::new();
    let uri = customer_uri(&customer);

    let (status, _) = app.call(Method::GET, &uri, &admin.token, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, created) = app
        .call(
            Method::POST,
            &uri,
            &admin.token,
            Some(json!({"full_name": "Zulaikha Omar", "phone": "+60 13-222 1111"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["data"]["status"], "active");

    let (status, again) = app
        .call(Method::POST, &uri, &admin.token, Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(again["error"], "customer already exists");

    let (status, fetched) = app.call(Method::GET, &uri, &admin.token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["data"]["full_name"], "Zulaikha Omar");

    // The customer sees the profile the admin created.
    let (_, own) = app
        .call(
            Method::GET,
            "/api/v1/customer/profile",
            &customer.token,
            None,
        )
        .await;
    assert_eq!(own["data"]["full_name"], "Zulaikha Omar");
}

#[tokio::test]
async fn test_admin_update_validates_and_keeps_status() {
    let app = TestApp::new();
    let admin = Customer::admin("manager");
    let customer = Customer::new();
    let uri = customer_uri(&customer);

    let (status, _) = app
        .call(Method::PUT, &uri, &admin.token, Some(json!({"gender": "female"})))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    app.call(Method::POST, &uri, &admin.token, Some(json!({"full_name": "Mei Ling"})))
        .await;
    app.call(
        Method::PUT,
        &format!("{uri}/status"),
        &admin.token,
        Some(json!({"status": "suspended"})),
    )
    .await;

    let (status, updated) = app
        .call(
            Method::PUT,
            &uri,
            &admin.token,
            Some(json!({"email": "Mei.Ling@Example.com"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["data"]["email"], "mei.ling@example.com");
    assert_eq!(updated["data"]["full_name"], "Mei Ling");
    assert_eq!(updated["data"]["status"], "suspended");

    let (status, _) = app
        .call(
            Method::PUT,
            &uri,
            &admin.token,
            Some(json!({"phone": "+60 12-345 6789 01234"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_delete_removes_customer_data() {
    let app = TestApp::new();
    let admin = Customer::admin("super_admin");
    let customer = Customer::new();
    let uri = customer_uri(&customer);

    app.call(
        Method::PUT,
        "/api/v1/customer/profile",
        &customer.token,
        Some(json!({"full_name": "Kavitha Raj"})),
    )
    .await;
    let (status, _) = app
        .call(
            Method::POST,
            "/api/v1/customer/wishlist",
            &customer.token,
            Some(json!({"product_id": ProductId::generate()})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app.call(Method::DELETE, &uri, &admin.token, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.call(Method::GET, &uri, &admin.token, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, count) = app
        .call(
            Method::GET,
            "/api/v1/customer/wishlist/count",
            &customer.token,
            None,
        )
        .await;
    assert_eq!(count["data"]["count"], 0);

    let (status, _) = app.call(Method::DELETE, &uri, &admin.token, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_customer_stats_by_status() {
    let app = TestApp::new();
    let admin = Customer::admin("admin");

    for name in ["Amir", "Chong", "Devi"] {
        let customer = Customer::new();
        app.call(
            Method::PUT,
            "/api/v1/customer/profile",
            &customer.token,
            Some(json!({"full_name": name})),
        )
        .await;
        if name == "Devi" {
            app.call(
                Method::PUT,
                &format!("{}/status", customer_uri(&customer)),
                &admin.token,
                Some(json!({"status": "blocked"})),
            )
            .await;
        }
    }

    let (status, stats) = app
        .call(
            Method::GET,
            "/api/v1/admin/customers/stats",
            &admin.token,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["data"]["totalCustomers"], 3);
    assert_eq!(stats["data"]["active"], 2);
    assert_eq!(stats["data"]["blocked"], 1);
    assert_eq!(stats["data"]["suspended"], 0);
}

#[tokio::test]
async fn test_customer_cannot_manage_customers() {
    let app = TestApp::new();
    let customer = Customer::new();

    let (status, _) = app
        .call(Method::GET, &customer_uri(&customer), &customer.token, None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app
        .call(
            Method::GET,
            "/api/v1/admin/customers/stats",
            &customer.token,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
