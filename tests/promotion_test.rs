mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{d, dec, uuid, TestApp};

#[tokio::test]
async fn platform_percentage_code_is_capped() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post(
            "/api/v1/admin/promotions",
            json!({
                "code": "summer-20",
                "name": "Summer",
                "promotion_type": "percentage",
                "discount_value": "20",
                "min_order_amount": "50",
                "max_discount_amount": "15"
            }),
            Some(app.admin_token()),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["code"], "SUMMER-20");
    assert!(body["data"]["store_id"].is_null());

    let (status, body) = app
        .post(
            "/api/v1/store/promotions/validate",
            json!({ "code": "Summer-20", "subtotal": "60.00" }),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dec(&body["data"]["discount"]), d("12.00"));
    assert_eq!(body["data"]["free_shipping"], false);

    let (_, body) = app
        .post(
            "/api/v1/store/promotions/validate",
            json!({ "code": "SUMMER-20", "subtotal": "200" }),
            None,
        )
        .await;
    assert_eq!(dec(&body["data"]["discount"]), d("15.00"));

    let (status, body) = app
        .post(
            "/api/v1/store/promotions/validate",
            json!({ "code": "SUMMER-20", "subtotal": "49.99" }),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("minimum order"));
}

#[tokio::test]
async fn oversized_amounts_are_rejected() {
    let app = TestApp::new().await;
    let admin = Some(app.admin_token());

    let (status, _) = app
        .post(
            "/api/v1/admin/promotions",
            json!({
                "code": "HALF",
                "name": "Half off",
                "promotion_type": "percentage",
                "discount_value": "50"
            }),
            admin,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .post(
            "/api/v1/store/promotions/validate",
            json!({ "code": "HALF", "subtotal": "79228162514264337593543950335" }),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert!(body["message"].as_str().unwrap().contains("subtotal must be between"));

    let (status, _) = app
        .post(
            "/api/v1/admin/promotions",
            json!({
                "code": "HUGE",
                "name": "Huge",
                "promotion_type": "fixed_amount",
                "discount_value": "10000000000"
            }),
            admin,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_inactive_and_expired_codes_are_refused() {
    let app = TestApp::new().await;
    let admin = Some(app.admin_token());

    app.post(
        "/api/v1/admin/promotions",
        json!({
            "code": "OFF",
            "name": "Switched off",
            "promotion_type": "fixed_amount",
            "discount_value": "5",
            "is_active": false
        }),
        admin,
    )
    .await;
    app.post(
        "/api/v1/admin/promotions",
        json!({
            "code": "LATER",
            "name": "Not yet",
            "promotion_type": "fixed_amount",
            "discount_value": "5",
            "starts_at": "2999-01-01T00:00:00Z"
        }),
        admin,
    )
    .await;

    for code in ["NOPE", "OFF", "LATER"] {
        let (status, _) = app
            .post(
                "/api/v1/store/promotions/validate",
                json!({ "code": code, "subtotal": "100" }),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "code {code}");
    }

    let (status, _) = app
        .post(
            "/api/v1/admin/promotions",
            json!({
                "code": "WAY-TOO-MUCH",
                "name": "Broken",
                "promotion_type": "percentage",
                "discount_value": "120"
            }),
            admin,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn store_codes_only_apply_to_their_store() {
    let app = TestApp::new().await;
    let seller = app.seller("promo-seller@example.com", "Promo Shop").await;
    let other = app.seller("other-seller@example.com", "Other Shop").await;

    let (status, body) = app
        .post(
            "/api/v1/seller/promotions",
            json!({
                "code": "SHOP5",
                "name": "Five off",
                "promotion_type": "fixed_amount",
                "discount_value": "5"
            }),
            Some(&seller.token),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(uuid(&body["data"]["store_id"]), seller.store_id);
    let promo_id = uuid(&body["data"]["id"]);

    let (status, _) = app
        .post(
            "/api/v1/store/promotions/validate",
            json!({ "code": "SHOP5", "subtotal": "20", "store_id": seller.store_id }),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .post(
            "/api/v1/store/promotions/validate",
            json!({ "code": "SHOP5", "subtotal": "20", "store_id": other.store_id }),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Other sellers cannot see or edit it; the admin can.
    let (status, _) = app
        .get(&format!("/api/v1/seller/promotions/{promo_id}"), Some(&other.token))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, body) = app.get("/api/v1/seller/promotions", Some(&other.token)).await;
    assert!(body["data"].as_array().unwrap().is_empty());

    let (status, body) = app
        .put(
            &format!("/api/v1/admin/promotions/{promo_id}"),
            json!({ "is_active": false }),
            Some(app.admin_token()),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_active"], false);
}

#[tokio::test]
async fn redemption_counts_and_per_user_limit() {
    let app = TestApp::new().await;
    let seller = app.seller("limit-seller@example.com", "Limit Shop").await;
    let product = app.product(&seller, "Mug", "12.00", 20).await;
    let product_id = uuid(&product["id"]);
    let (buyer, _) = app.register("limit-buyer@example.com").await;

    let (_, body) = app
        .post(
            "/api/v1/admin/promotions",
            json!({
                "code": "ONCE",
                "name": "Once per customer",
                "promotion_type": "fixed_amount",
                "discount_value": "2",
                "per_user_limit": 1
            }),
            Some(app.admin_token()),
        )
        .await;
    let promo_id = uuid(&body["data"]["id"]);

    let (status, body) = app
        .place_order(&buyer, &[(product_id, 2)], json!({ "promotion_code": "once" }))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(dec(&body["data"]["subtotal"]), d("24.00"));
    assert_eq!(dec(&body["data"]["discount_total"]), d("2.00"));
    assert_eq!(dec(&body["data"]["total"]), d("22.00"));

    // The signed-in validation reflects the used allowance.
    let (status, _) = app
        .post(
            "/api/v1/store/promotions/validate",
            json!({ "code": "ONCE", "subtotal": "24" }),
            Some(&buyer),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .place_order(&buyer, &[(product_id, 1)], json!({ "promotion_code": "ONCE" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // The failed attempt rolled back entirely.
    let (_, body) = app
        .get(&format!("/api/v1/seller/products/{product_id}"), Some(&seller.token))
        .await;
    assert_eq!(body["data"]["stock"], 18);

    let (_, body) = app
        .get(&format!("/api/v1/admin/promotions/{promo_id}"), Some(app.admin_token()))
        .await;
    assert_eq!(body["data"]["usage_count"], 1);

    assert_eq!(
        app.delete(&format!("/api/v1/admin/promotions/{promo_id}"), Some(app.admin_token()))
            .await,
        StatusCode::CONFLICT
    );
}
