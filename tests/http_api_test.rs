mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use serde_json::json;

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn health_endpoint_reports_database_status() {
    let app = TestApp::new().await;

    let (status, body) = app.request(Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "ok");
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn order_routes_answer_with_placeholders() {
    let app = TestApp::new().await;

    let (status, body) = app.request(Method::GET, "/api/v1/orders", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Order listing is under development");

    let (status, body) = app
        .request(Method::POST, "/api/v1/orders/checkout", Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Checkout is under development");
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn missing_product_detail_is_a_json_404() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(Method::GET, "/api/v1/products/no-such-product", None)
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not Found");
    assert!(body["message"]
        .as_str()
        .is_some_and(|m| m.contains("no-such-product")));
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn add_to_cart_rejects_zero_quantity_at_the_edge() {
    let app = TestApp::new().await;

    let (status, cart) = app
        .request(Method::POST, "/api/v1/carts", Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let cart_id = cart["id"].as_str().expect("cart id").to_string();

    let (status, body) = app
        .request(
            Method::POST,
            &format!("/api/v1/carts/{}/items", cart_id),
            Some(json!({
                "product_id": "550e8400-e29b-41d4-a716-446655440000",
                "quantity": 0
            })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Bad Request");
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn register_and_login_over_http() {
    let app = TestApp::new().await;

    let (status, user) = app
        .request(
            Method::POST,
            "/api/v1/accounts/register",
            Some(json!({
                "email": "ana@example.com",
                "username": "ana",
                "first_name": "Ana",
                "last_name": "Souza",
                "password": "correct horse battery staple"
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["email"], "ana@example.com");
    assert!(user.get("password_hash").is_none());

    let (status, login) = app
        .request(
            Method::POST,
            "/api/v1/accounts/login",
            Some(json!({
                "email": "ana@example.com",
                "password": "correct horse battery staple"
            })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(login["token_type"], "Bearer");
    assert!(login["access_token"].as_str().is_some_and(|t| !t.is_empty()));

    // Wrong credentials come back as 401 with the shared error envelope.
    let (status, err) = app
        .request(
            Method::POST,
            "/api/v1/accounts/login",
            Some(json!({
                "email": "ana@example.com",
                "password": "wrong password"
            })),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(err["error"], "Unauthorized");
}
