mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use common::{d, dec, uuid, Seller, TestApp};

fn live_window() -> Value {
    let now = Utc::now();
    json!({
        "starts_at": (now - Duration::hours(1)).to_rfc3339(),
        "ends_at": (now + Duration::hours(1)).to_rfc3339(),
    })
}

async fn live_sale(app: &TestApp, seller: &Seller, name: &str) -> Uuid {
    let mut payload = live_window();
    payload["name"] = json!(name);
    let (status, body) = app
        .post("/api/v1/seller/flash-sales", payload, Some(&seller.token))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    uuid(&body["data"]["id"])
}

#[tokio::test]
async fn item_pricing_and_storefront_listing() {
    let app = TestApp::new().await;
    let seller = app.seller("flash@example.com", "Flash Shop").await;
    let product = app.product(&seller, "Headphones", "80.00", 10).await;
    let product_id = uuid(&product["id"]);
    let sale_id = live_sale(&app, &seller, "Midnight Madness").await;

    let items_uri = format!("/api/v1/seller/flash-sales/{sale_id}/items");
    let (status, body) = app
        .post(
            &items_uri,
            json!({
                "product_id": product_id,
                "discount_percent": "25",
                "quantity": 5,
                "per_user_limit": 2
            }),
            Some(&seller.token),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(dec(&body["data"]["sale_price"]), d("60.00"));
    assert_eq!(body["data"]["remaining"], 5);
    let item_id = uuid(&body["data"]["id"]);

    // One entry per product, and never more than the product stock.
    let (status, _) = app
        .post(
            &items_uri,
            json!({ "product_id": product_id, "sale_price": "70", "quantity": 1 }),
            Some(&seller.token),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    let other = app.product(&seller, "Cable", "10.00", 2).await;
    let (status, _) = app
        .post(
            &items_uri,
            json!({ "product_id": other["id"], "sale_price": "5", "quantity": 3 }),
            Some(&seller.token),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.get("/api/v1/store/flash-sales", None).await;
    assert_eq!(status, StatusCode::OK);
    let sales = body["data"].as_array().unwrap();
    assert_eq!(sales.len(), 1);
    assert_eq!(sales[0]["phase"], "live");
    assert_eq!(sales[0]["items"][0]["product_name"], "Headphones");

    // Price changes are picked up by recalculation at the same percent.
    app.put(
        &format!("/api/v1/seller/products/{product_id}"),
        json!({ "price": "100.00" }),
        Some(&seller.token),
    )
    .await;
    let (status, body) = app
        .post(
            &format!("/api/v1/seller/flash-sales/{sale_id}/items/{item_id}/recalculate"),
            json!({}),
            Some(&seller.token),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dec(&body["data"]["original_price"]), d("100.00"));
    assert_eq!(dec(&body["data"]["sale_price"]), d("75.00"));
}

#[tokio::test]
async fn flash_purchases_respect_limits_and_release_on_cancel() {
    let app = TestApp::new().await;
    let seller = app.seller("pool@example.com", "Pool Shop").await;
    let product = app.product(&seller, "Sneakers", "50.00", 10).await;
    let product_id = uuid(&product["id"]);
    let sale_id = live_sale(&app, &seller, "Sneaker Drop").await;

    let (_, body) = app
        .post(
            &format!("/api/v1/seller/flash-sales/{sale_id}/items"),
            json!({
                "product_id": product_id,
                "sale_price": "40",
                "quantity": 3,
                "per_user_limit": 2
            }),
            Some(&seller.token),
        )
        .await;
    let item_id = uuid(&body["data"]["id"]);
    let (buyer, _) = app.register("sneaker-fan@example.com").await;

    let line = |qty: i32| {
        json!({
            "items": [{ "product_id": product_id, "quantity": qty, "flash_sale_item_id": item_id }],
            "shipping_address": common::shipping_address(),
        })
    };

    let (status, _) = app.post("/api/v1/account/orders", line(3), Some(&buyer)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.post("/api/v1/account/orders", line(2), Some(&buyer)).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(dec(&body["data"]["items"][0]["unit_price"]), d("40.00"));
    assert_eq!(dec(&body["data"]["total"]), d("80.00"));
    let order_id = uuid(&body["data"]["id"]);

    let (status, _) = app.post("/api/v1/account/orders", line(1), Some(&buyer)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Another buyer takes the last unit, then the pool is empty.
    let (rival, _) = app.register("rival@example.com").await;
    let (status, _) = app.post("/api/v1/account/orders", line(1), Some(&rival)).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = app.post("/api/v1/account/orders", line(1), Some(&rival)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = app
        .post(&format!("/api/v1/account/orders/{order_id}/cancel"), json!({}), Some(&buyer))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.get(&format!("/api/v1/store/flash-sales/{sale_id}"), None).await;
    assert_eq!(body["data"]["items"][0]["sold"], 1);
    assert_eq!(body["data"]["items"][0]["remaining"], 2);

    // Sold items and their sale can no longer be removed.
    assert_eq!(
        app.delete(
            &format!("/api/v1/seller/flash-sales/{sale_id}/items/{item_id}"),
            Some(&seller.token)
        )
        .await,
        StatusCode::CONFLICT
    );
    assert_eq!(
        app.delete(&format!("/api/v1/seller/flash-sales/{sale_id}"), Some(&seller.token))
            .await,
        StatusCode::CONFLICT
    );
}

#[tokio::test]
async fn upcoming_sales_do_not_sell() {
    let app = TestApp::new().await;
    let seller = app.seller("soon@example.com", "Soon Shop").await;
    let product = app.product(&seller, "Kettle", "30.00", 5).await;
    let product_id = uuid(&product["id"]);

    let now = Utc::now();
    let (status, body) = app
        .post(
            "/api/v1/admin/flash-sales",
            json!({
                "name": "Tomorrow",
                "starts_at": (now + Duration::days(1)).to_rfc3339(),
                "ends_at": (now + Duration::days(2)).to_rfc3339(),
            }),
            Some(app.admin_token()),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let sale_id = uuid(&body["data"]["id"]);

    // Platform sales may feature any store's product.
    let (status, body) = app
        .post(
            &format!("/api/v1/admin/flash-sales/{sale_id}/items"),
            json!({ "product_id": product_id, "discount_percent": "10", "quantity": 2 }),
            Some(app.admin_token()),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let item_id = uuid(&body["data"]["id"]);

    let (_, body) = app.get("/api/v1/store/flash-sales", None).await;
    assert_eq!(body["data"][0]["phase"], "upcoming");

    let (buyer, _) = app.register("early@example.com").await;
    let (status, _) = app
        .post(
            "/api/v1/account/orders",
            json!({
                "items": [{
                    "product_id": product_id,
                    "quantity": 1,
                    "flash_sale_item_id": item_id
                }],
                "shipping_address": common::shipping_address(),
            }),
            Some(&buyer),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // The seller does not manage the platform sale.
    let (status, _) = app
        .get(&format!("/api/v1/seller/flash-sales/{sale_id}"), Some(&seller.token))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .post(
            "/api/v1/admin/flash-sales",
            json!({
                "name": "Backwards",
                "starts_at": now.to_rfc3339(),
                "ends_at": (now - Duration::hours(1)).to_rfc3339(),
            }),
            Some(app.admin_token()),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn item_updates_respect_sold_units() {
    let app = TestApp::new().await;
    let seller = app.seller("restock@example.com", "Restock Shop").await;
    let product = app.product(&seller, "Jacket", "50.00", 20).await;
    let product_id = uuid(&product["id"]);
    let sale_id = live_sale(&app, &seller, "Winter Clearance").await;

    let (status, body) = app
        .post(
            &format!("/api/v1/seller/flash-sales/{sale_id}/items"),
            json!({
                "product_id": product_id,
                "sale_price": "40",
                "quantity": 5,
                "per_user_limit": 2
            }),
            Some(&seller.token),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let item_id = uuid(&body["data"]["id"]);
    let item_uri = format!("/api/v1/seller/flash-sales/{sale_id}/items/{item_id}");

    let line = |qty: i32| {
        json!({
            "items": [{ "product_id": product_id, "quantity": qty, "flash_sale_item_id": item_id }],
            "shipping_address": common::shipping_address(),
        })
    };
    let (buyer, _) = app.register("jacket-buyer@example.com").await;
    let (status, _) = app.post("/api/v1/account/orders", line(2), Some(&buyer)).await;
    assert_eq!(status, StatusCode::CREATED);
    let (other, _) = app.register("jacket-other@example.com").await;
    let (status, _) = app.post("/api/v1/account/orders", line(1), Some(&other)).await;
    assert_eq!(status, StatusCode::CREATED);

    // Three units are sold, so the pool cannot shrink below that.
    let (status, body) = app
        .put(&item_uri, json!({ "quantity": 2 }), Some(&seller.token))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("already sold"));

    let (status, body) = app
        .put(&item_uri, json!({ "quantity": 3 }), Some(&seller.token))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["sold"], 3);
    assert_eq!(body["data"]["remaining"], 0);
    assert_eq!(body["data"]["sold_out"], true);

    // Repricing recomputes the other half of the pair.
    let (_, body) = app
        .put(&item_uri, json!({ "sale_price": "35" }), Some(&seller.token))
        .await;
    assert_eq!(dec(&body["data"]["sale_price"]), d("35.00"));
    assert_eq!(dec(&body["data"]["discount_percent"]), d("30.00"));

    let (_, body) = app
        .put(&item_uri, json!({ "discount_percent": "10" }), Some(&seller.token))
        .await;
    assert_eq!(dec(&body["data"]["sale_price"]), d("45.00"));
    assert_eq!(dec(&body["data"]["discount_percent"]), d("10.00"));

    let (status, _) = app
        .put(
            &item_uri,
            json!({ "sale_price": "30", "discount_percent": "20" }),
            Some(&seller.token),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Clearing the per-user limit lets the first buyer come back for more.
    let (status, body) = app
        .put(
            &item_uri,
            json!({ "quantity": 6, "per_user_limit": null }),
            Some(&seller.token),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["per_user_limit"].is_null());
    assert_eq!(body["data"]["remaining"], 3);

    let (status, body) = app.post("/api/v1/account/orders", line(3), Some(&buyer)).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(dec(&body["data"]["items"][0]["unit_price"]), d("45.00"));
}
