mod common;

use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use common::{d, dec, uuid, TestApp};

/// Creates a provider with a domestic and a worldwide rate.
///
/// Returns `(provider, domestic, worldwide)`.
async fn seed_rates(app: &TestApp) -> (Uuid, Uuid, Uuid) {
    let admin = Some(app.admin_token());
    let (status, body) = app
        .post(
            "/api/v1/admin/shipping/providers",
            json!({
                "name": "Speedy Parcel",
                "code": "speedy",
                "tracking_url_template": "https://track.example.com/{tracking_number}"
            }),
            admin,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["code"], "SPEEDY");
    let provider = uuid(&body["data"]["id"]);

    let (status, body) = app
        .post(
            "/api/v1/admin/shipping/rates",
            json!({
                "provider_id": provider,
                "name": "Domestic",
                "country": "us",
                "base_price": "5.00",
                "per_kg_price": "2.00",
                "max_weight_kg": "20",
                "free_shipping_threshold": "100",
                "estimated_days_min": 2,
                "estimated_days_max": 4
            }),
            admin,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let domestic = uuid(&body["data"]["id"]);

    let (_, body) = app
        .post(
            "/api/v1/admin/shipping/rates",
            json!({
                "provider_id": provider,
                "name": "Worldwide",
                "base_price": "25.00",
                "estimated_days_min": 7,
                "estimated_days_max": 14
            }),
            admin,
        )
        .await;
    let worldwide = uuid(&body["data"]["id"]);

    (provider, domestic, worldwide)
}

#[tokio::test]
async fn quotes_are_priced_and_sorted() {
    let app = TestApp::new().await;
    let (_, domestic, worldwide) = seed_rates(&app).await;

    let (status, body) = app
        .post(
            "/api/v1/store/shipping/quote",
            json!({ "country": "US", "weight_kg": "1.5", "subtotal": "40" }),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let quotes = body["data"].as_array().unwrap();
    assert_eq!(quotes.len(), 2);
    assert_eq!(uuid(&quotes[0]["rate_id"]), domestic);
    assert_eq!(dec(&quotes[0]["price"]), d("8.00"));
    assert_eq!(quotes[0]["provider_code"], "SPEEDY");

    // Free above the threshold.
    let (_, body) = app
        .post(
            "/api/v1/store/shipping/quote",
            json!({ "country": "US", "weight_kg": "1.5", "subtotal": "150" }),
            None,
        )
        .await;
    assert_eq!(dec(&body["data"][0]["price"]), d("0"));

    // Only the worldwide rate reaches France or heavy parcels.
    for payload in [
        json!({ "country": "FR", "weight_kg": "1" }),
        json!({ "country": "US", "weight_kg": "30" }),
    ] {
        let (_, body) = app.post("/api/v1/store/shipping/quote", payload, None).await;
        let quotes = body["data"].as_array().unwrap();
        assert_eq!(quotes.len(), 1);
        assert_eq!(uuid(&quotes[0]["rate_id"]), worldwide);
    }

    let (status, _) = app
        .post(
            "/api/v1/store/shipping/quote",
            json!({ "country": "USA", "weight_kg": "1" }),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn oversized_quote_inputs_are_rejected() {
    let app = TestApp::new().await;
    let (provider, _, _) = seed_rates(&app).await;

    for payload in [
        json!({ "country": "US", "weight_kg": "79228162514264337593543950335" }),
        json!({ "country": "US", "weight_kg": "100001" }),
        json!({ "country": "US", "weight_kg": "1", "subtotal": "79228162514264337593543950335" }),
    ] {
        let (status, body) = app.post("/api/v1/store/shipping/quote", payload, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert!(body["message"].as_str().unwrap().contains("must be between 0 and"));
    }

    let (status, _) = app
        .post(
            "/api/v1/admin/shipping/rates",
            json!({
                "provider_id": provider,
                "name": "Gold plated",
                "base_price": "5.00",
                "per_kg_price": "79228162514264337593543950335",
                "estimated_days_min": 1,
                "estimated_days_max": 2
            }),
            Some(app.admin_token()),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn provider_rules() {
    let app = TestApp::new().await;
    let admin = Some(app.admin_token());
    let (provider, _, _) = seed_rates(&app).await;

    let (status, _) = app
        .post(
            "/api/v1/admin/shipping/providers",
            json!({ "name": "Copy", "code": "SPEEDY" }),
            admin,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .post(
            "/api/v1/admin/shipping/providers",
            json!({
                "name": "No Placeholder",
                "code": "NOPH",
                "tracking_url_template": "https://x.example.com/"
            }),
            admin,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post(
            "/api/v1/admin/shipping/rates",
            json!({
                "provider_id": provider,
                "name": "Inverted",
                "base_price": "1",
                "estimated_days_min": 5,
                "estimated_days_max": 2
            }),
            admin,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = app
        .get(&format!("/api/v1/admin/shipping/rates?provider_id={provider}"), admin)
        .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    // Deleting an unused provider takes its rates along.
    assert_eq!(
        app.delete(&format!("/api/v1/admin/shipping/providers/{provider}"), admin).await,
        StatusCode::NO_CONTENT
    );
    let (_, body) = app.get("/api/v1/admin/shipping/rates", admin).await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn shipment_lifecycle_drives_the_order() {
    let app = TestApp::new().await;
    let (provider, domestic, _) = seed_rates(&app).await;
    let seller = app.seller("ship-seller@example.com", "Ship Shop").await;
    let product = app.product(&seller, "Lamp", "30.00", 5).await;
    let (buyer, _) = app.register("ship-buyer@example.com").await;

    let (status, body) = app
        .place_order(
            &buyer,
            &[(uuid(&product["id"]), 2)],
            json!({ "shipping_rate_id": domestic }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    // 2 × 0.5 kg → 5 + 2 × 1
    assert_eq!(dec(&body["data"]["shipping_total"]), d("7.00"));
    assert_eq!(dec(&body["data"]["total"]), d("67.00"));
    let order_id = uuid(&body["data"]["id"]);

    // Pending orders are not shippable yet.
    let create_uri = format!("/api/v1/seller/orders/{order_id}/shipments");
    let (status, _) = app
        .post(&create_uri, json!({ "provider_id": provider }), Some(&seller.token))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .put(
            &format!("/api/v1/seller/orders/{order_id}/status"),
            json!({ "status": "paid" }),
            Some(&seller.token),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .post(&create_uri, json!({ "provider_id": provider }), Some(&seller.token))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["status"], "pending");
    assert_eq!(dec(&body["data"]["cost"]), d("7.00"));
    let shipment_id = uuid(&body["data"]["id"]);

    let status_uri = format!("/api/v1/seller/shipments/{shipment_id}/status");
    let (status, _) = app
        .put(&status_uri, json!({ "status": "shipped" }), Some(&seller.token))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "tracking number is required");

    let (status, body) = app
        .put(
            &status_uri,
            json!({ "status": "shipped", "tracking_number": "ZX123" }),
            Some(&seller.token),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["tracking_url"], "https://track.example.com/ZX123");
    assert!(body["data"]["shipped_at"].is_string());

    let (_, body) = app
        .get(&format!("/api/v1/account/orders/{order_id}"), Some(&buyer))
        .await;
    assert_eq!(body["data"]["status"], "shipped");

    let (status, _) = app
        .put(&status_uri, json!({ "status": "delivered" }), Some(&seller.token))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app
        .get(&format!("/api/v1/account/orders/{order_id}/shipments"), Some(&buyer))
        .await;
    assert_eq!(body["data"][0]["status"], "delivered");
    let (_, body) = app
        .get(&format!("/api/v1/account/orders/{order_id}"), Some(&buyer))
        .await;
    assert_eq!(body["data"]["status"], "delivered");

    // Delivered is terminal.
    let (status, _) = app
        .put(&status_uri, json!({ "status": "in_transit" }), Some(&seller.token))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = app.get("/api/v1/seller/shipments", Some(&seller.token)).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn cancelling_an_order_cancels_its_pending_shipments() {
    let app = TestApp::new().await;
    let (provider, _, _) = seed_rates(&app).await;
    let seller = app.seller("cancel-ship@example.com", "Cancel Shop").await;
    let product = app.product(&seller, "Vase", "40.00", 3).await;
    let product_id = uuid(&product["id"]);
    let (buyer, _) = app.register("cancel-buyer@example.com").await;

    let (_, body) = app.place_order(&buyer, &[(product_id, 2)], json!({})).await;
    let order_id = uuid(&body["data"]["id"]);
    let order_status_uri = format!("/api/v1/seller/orders/{order_id}/status");
    for next in ["paid", "processing"] {
        let (status, _) = app
            .put(&order_status_uri, json!({ "status": next }), Some(&seller.token))
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = app
        .post(
            &format!("/api/v1/seller/orders/{order_id}/shipments"),
            json!({ "provider_id": provider, "tracking_number": "CX1" }),
            Some(&seller.token),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let shipment_id = uuid(&body["data"]["id"]);

    let (status, body) = app
        .put(&order_status_uri, json!({ "status": "cancelled" }), Some(&seller.token))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (_, body) = app
        .get(&format!("/api/v1/account/orders/{order_id}/shipments"), Some(&buyer))
        .await;
    assert_eq!(body["data"][0]["status"], "cancelled");

    // Stock came back and nothing can ship against the cancelled order.
    let (_, body) = app
        .get(&format!("/api/v1/seller/products/{product_id}"), Some(&seller.token))
        .await;
    assert_eq!(body["data"]["stock"], 3);

    let status_uri = format!("/api/v1/seller/shipments/{shipment_id}/status");
    for next in ["shipped", "delivered"] {
        let (status, _) = app
            .put(&status_uri, json!({ "status": next }), Some(&seller.token))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    let (_, body) = app
        .get(&format!("/api/v1/account/orders/{order_id}"), Some(&buyer))
        .await;
    assert_eq!(body["data"]["status"], "cancelled");
}
