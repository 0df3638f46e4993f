//! Cart endpoints: add, remove and session gating.

use axum::http::StatusCode;
use serde_json::json;

use shopfloor_integration_tests::TestApp;

const SIGN_UP_PROMPT: &str = "Please Create an account to add product to cart";

async fn app_with_product() -> (TestApp, String, i64) {
    let app = TestApp::new();
    let cookie = app.signup("shopper@example.com").await;
    let created = app
        .post(
            "/api/products",
            &json!({ "name": "Widget", "price": 10 }),
            Some(&cookie),
        )
        .await;
    let id = created.body["id"].as_i64().unwrap();
    (app, cookie, id)
}

#[tokio::test]
async fn test_add_twice_yields_amount_two() {
    let (app, cookie, id) = app_with_product().await;

    for _ in 0..2 {
        let response = app
            .get(&format!("/api/products/addtocart/{id}"), Some(&cookie))
            .await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body, json!({ "message": "Product added to cart" }));
    }

    let cart = app.get("/api/products/cart", Some(&cookie)).await;
    let entries = cart.body.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["product_id"], id);
    assert_eq!(entries[0]["amount"], 2);
}

#[tokio::test]
async fn test_remove_steps_down_then_deletes() {
    let (app, cookie, id) = app_with_product().await;
    app.get(&format!("/api/products/addtocart/{id}"), Some(&cookie)).await;
    app.get(&format!("/api/products/addtocart/{id}"), Some(&cookie)).await;

    let first = app
        .get(&format!("/api/products/removecart/{id}"), Some(&cookie))
        .await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body, json!({ "message": "Product removed from cart" }));
    let cart = app.get("/api/products/cart", Some(&cookie)).await;
    assert_eq!(cart.body[0]["amount"], 1);

    let second = app
        .get(&format!("/api/products/removecart/{id}"), Some(&cookie))
        .await;
    assert_eq!(second.status, StatusCode::OK);
    let cart = app.get("/api/products/cart", Some(&cookie)).await;
    assert_eq!(cart.body, json!([]));
}

#[tokio::test]
async fn test_remove_without_entry_is_not_found() {
    let (app, cookie, id) = app_with_product().await;

    let response = app
        .get(&format!("/api/products/removecart/{id}"), Some(&cookie))
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert!(response.body["message"].is_string());
}

#[tokio::test]
async fn test_anonymous_cart_requests_get_sign_up_prompt() {
    let (app, cookie, id) = app_with_product().await;

    for path in [
        format!("/api/products/addtocart/{id}"),
        format!("/api/products/removecart/{id}"),
        "/api/products/cart".to_owned(),
    ] {
        let response = app.get(&path, None).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{path}");
        assert_eq!(response.body["message"], SIGN_UP_PROMPT);
    }

    let cart = app.get("/api/products/cart", Some(&cookie)).await;
    assert_eq!(cart.body, json!([]));
}

#[tokio::test]
async fn test_add_unknown_product_is_not_found() {
    let (app, cookie, _) = app_with_product().await;

    let response = app.get("/api/products/addtocart/999", Some(&cookie)).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_carts_are_per_user() {
    let (app, first, id) = app_with_product().await;
    let second = app.signup("other@example.com").await;

    app.get(&format!("/api/products/addtocart/{id}"), Some(&first)).await;

    let theirs = app.get("/api/products/cart", Some(&second)).await;
    assert_eq!(theirs.body, json!([]));
    let removal = app
        .get(&format!("/api/products/removecart/{id}"), Some(&second))
        .await;
    assert_eq!(removal.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_logout_ends_cart_access() {
    let (app, cookie, id) = app_with_product().await;

    let logout = app
        .post("/api/users/logout", &json!({}), Some(&cookie))
        .await;
    assert_eq!(logout.status, StatusCode::OK);

    let response = app
        .get(&format!("/api/products/addtocart/{id}"), Some(&cookie))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["message"], SIGN_UP_PROMPT);
}
