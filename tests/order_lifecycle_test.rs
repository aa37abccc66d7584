mod common;

use axum::http::StatusCode;
use regex::Regex;
use serde_json::json;
use uuid::Uuid;

use common::{d, dec, uuid, TestApp};

async fn stock(app: &TestApp, token: &str, product_id: Uuid) -> i64 {
    let (_, body) = app
        .get(&format!("/api/v1/seller/products/{product_id}"), Some(token))
        .await;
    body["data"]["stock"].as_i64().expect("stock")
}

#[tokio::test]
async fn placing_an_order_snapshots_prices_and_takes_stock() {
    let app = TestApp::new().await;
    let seller = app.seller("orders-seller@example.com", "Orders Shop").await;
    let teapot = uuid(&app.product(&seller, "Teapot", "19.99", 5).await["id"]);
    let cups = uuid(&app.product(&seller, "Cups", "4.50", 12).await["id"]);
    let (buyer, buyer_id) = app.register("orders-buyer@example.com").await;

    let (status, body) = app
        .place_order(&buyer, &[(teapot, 1), (cups, 4)], json!({}))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let order = &body["data"];
    assert_eq!(order["status"], "pending");
    assert_eq!(uuid(&order["user_id"]), buyer_id);
    assert_eq!(uuid(&order["store_id"]), seller.store_id);
    assert_eq!(dec(&order["subtotal"]), d("37.99"));
    assert_eq!(dec(&order["shipping_total"]), d("0"));
    assert_eq!(dec(&order["total"]), d("37.99"));
    assert_eq!(order["currency"], "USD");
    assert_eq!(order["items"].as_array().unwrap().len(), 2);

    let number = order["order_number"].as_str().unwrap();
    assert!(Regex::new(r"^ORD-\d{8}-[0-9A-F]{8}$").unwrap().is_match(number), "{number}");

    assert_eq!(stock(&app, &seller.token, teapot).await, 4);
    assert_eq!(stock(&app, &seller.token, cups).await, 8);

    // A later price change leaves the order untouched.
    app.put(
        &format!("/api/v1/seller/products/{teapot}"),
        json!({ "price": "25.00" }),
        Some(&seller.token),
    )
    .await;
    let order_id = uuid(&order["id"]);
    let (_, body) = app
        .get(&format!("/api/v1/account/orders/{order_id}"), Some(&buyer))
        .await;
    let teapot_line = body["data"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .find(|i| i["product_name"] == "Teapot")
        .cloned()
        .unwrap();
    assert_eq!(dec(&teapot_line["unit_price"]), d("19.99"));

    // Sold products are archived, not deleted.
    assert_eq!(
        app.delete(&format!("/api/v1/seller/products/{teapot}"), Some(&seller.token)).await,
        StatusCode::CONFLICT
    );
}

#[tokio::test]
async fn insufficient_stock_rolls_back_every_line() {
    let app = TestApp::new().await;
    let seller = app.seller("stock-seller@example.com", "Stock Shop").await;
    let plenty = uuid(&app.product(&seller, "Plenty", "2.00", 50).await["id"]);
    let scarce = uuid(&app.product(&seller, "Scarce", "9.00", 1).await["id"]);
    let (buyer, _) = app.register("stock-buyer@example.com").await;

    let (status, body) = app
        .place_order(&buyer, &[(plenty, 10), (scarce, 2)], json!({}))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["message"].as_str().unwrap().contains("Scarce"));

    assert_eq!(stock(&app, &seller.token, plenty).await, 50);
    let (_, body) = app.get("/api/v1/account/orders", Some(&buyer)).await;
    assert_eq!(body["data"]["total"], 0);
}

#[tokio::test]
async fn malformed_carts_are_rejected() {
    let app = TestApp::new().await;
    let first = app.seller("cart-a@example.com", "Cart A").await;
    let second = app.seller("cart-b@example.com", "Cart B").await;
    let a = uuid(&app.product(&first, "Item A", "5.00", 5).await["id"]);
    let b = uuid(&app.product(&second, "Item B", "5.00", 5).await["id"]);
    let (buyer, _) = app.register("cart-buyer@example.com").await;

    // Mixed stores
    let (status, _) = app.place_order(&buyer, &[(a, 1), (b, 1)], json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    // Duplicate lines
    let (status, _) = app.place_order(&buyer, &[(a, 1), (a, 2)], json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    // Zero quantity
    let (status, _) = app.place_order(&buyer, &[(a, 0)], json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    // Empty cart
    let (status, _) = app.place_order(&buyer, &[], json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    // Unknown product
    let (status, _) = app
        .place_order(&buyer, &[(Uuid::new_v4(), 1)], json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Suspended stores stop selling.
    app.put(
        &format!("/api/v1/admin/stores/{}/status", first.store_id),
        json!({ "status": "suspended" }),
        Some(app.admin_token()),
    )
    .await;
    let (status, _) = app.place_order(&buyer, &[(a, 1)], json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn status_transitions_and_cancellation() {
    let app = TestApp::new().await;
    let seller = app.seller("flow-seller@example.com", "Flow Shop").await;
    let product = uuid(&app.product(&seller, "Widget", "10.00", 10).await["id"]);
    let (buyer, _) = app.register("flow-buyer@example.com").await;

    let (_, body) = app.place_order(&buyer, &[(product, 3)], json!({})).await;
    let order_id = uuid(&body["data"]["id"]);
    let status_uri = format!("/api/v1/seller/orders/{order_id}/status");

    let (status, _) = app
        .put(&status_uri, json!({ "status": "shipped" }), Some(&seller.token))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    for next in ["paid", "processing"] {
        let (status, body) = app
            .put(&status_uri, json!({ "status": next }), Some(&seller.token))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], next);
    }

    // Fulfilment has started, so the buyer can no longer cancel.
    let cancel_uri = format!("/api/v1/account/orders/{order_id}/cancel");
    let (status, _) = app.post(&cancel_uri, json!({}), Some(&buyer)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // The seller still can, and stock comes back.
    assert_eq!(stock(&app, &seller.token, product).await, 7);
    let (status, body) = app
        .put(&status_uri, json!({ "status": "cancelled" }), Some(&seller.token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "cancelled");
    assert_eq!(stock(&app, &seller.token, product).await, 10);

    let (status, _) = app
        .put(&status_uri, json!({ "status": "paid" }), Some(&seller.token))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn buyers_cancel_pending_orders() {
    let app = TestApp::new().await;
    let seller = app.seller("cancel-seller@example.com", "Cancel Shop").await;
    let product = uuid(&app.product(&seller, "Gadget", "15.00", 4).await["id"]);
    let (buyer, _) = app.register("cancel-buyer@example.com").await;

    let (_, body) = app.place_order(&buyer, &[(product, 4)], json!({})).await;
    let order_id = uuid(&body["data"]["id"]);
    assert_eq!(stock(&app, &seller.token, product).await, 0);

    let (status, body) = app
        .post(&format!("/api/v1/account/orders/{order_id}/cancel"), json!({}), Some(&buyer))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "cancelled");
    assert_eq!(stock(&app, &seller.token, product).await, 4);

    // Cancelling twice is refused.
    let (status, _) = app
        .post(&format!("/api/v1/account/orders/{order_id}/cancel"), json!({}), Some(&buyer))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn orders_are_private_to_buyer_store_and_admin() {
    let app = TestApp::new().await;
    let seller = app.seller("private-seller@example.com", "Private Shop").await;
    let other_seller = app.seller("nosy-seller@example.com", "Nosy Shop").await;
    let product = uuid(&app.product(&seller, "Secret", "8.00", 3).await["id"]);
    let (buyer, _) = app.register("private-buyer@example.com").await;
    let (stranger, _) = app.register("stranger@example.com").await;

    let (_, body) = app.place_order(&buyer, &[(product, 1)], json!({})).await;
    let order_id = uuid(&body["data"]["id"]);

    let (status, _) = app
        .get(&format!("/api/v1/account/orders/{order_id}"), Some(&stranger))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app
        .get(&format!("/api/v1/seller/orders/{order_id}"), Some(&other_seller.token))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .get(&format!("/api/v1/seller/orders/{order_id}"), Some(&seller.token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["items"][0]["quantity"], 1);

    let (_, body) = app.get("/api/v1/seller/orders", Some(&seller.token)).await;
    assert_eq!(body["data"]["total"], 1);

    let (status, body) = app
        .get(
            &format!("/api/v1/admin/orders?store_id={}", seller.store_id),
            Some(app.admin_token()),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);
    let (_, body) = app
        .get("/api/v1/admin/orders?status=cancelled", Some(app.admin_token()))
        .await;
    assert_eq!(body["data"]["total"], 0);
}
