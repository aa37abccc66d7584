mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{d, dec, uuid, TestApp};

#[tokio::test]
async fn health_and_status_are_public() {
    let app = TestApp::new().await;
    for uri in ["/health", "/health/ready", "/api/v1/status"] {
        let (status, _) = app.get(uri, None).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
    }

    let (status, body) = app.get("/api/v1/nowhere", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["message"].as_str().unwrap().contains("/api/v1/nowhere"));
}

#[tokio::test]
async fn protected_routes_require_a_valid_token() {
    let app = TestApp::new().await;

    for uri in ["/api/v1/account/orders", "/api/v1/seller/store", "/api/v1/admin/users"] {
        let (status, body) = app.get(uri, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert!(body["error"].is_string());

        let (status, _) = app.get(uri, Some("not-a-jwt")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
    }

    // The storefront stays open even with a bad token.
    let (status, _) = app.get("/api/v1/store/products", Some("not-a-jwt")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn roles_gate_seller_and_admin_areas() {
    let app = TestApp::new().await;
    let (customer, _) = app.register("plain@example.com").await;
    let seller = app.seller("gate-seller@example.com", "Gate Shop").await;

    for uri in ["/api/v1/seller/products", "/api/v1/seller/dashboard", "/api/v1/admin/dashboard"] {
        let (status, _) = app.get(uri, Some(&customer)).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{uri}");
    }
    for uri in ["/api/v1/admin/dashboard", "/api/v1/admin/stores", "/api/v1/admin/banners"] {
        let (status, _) = app.get(uri, Some(&seller.token)).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{uri}");
    }

    let (status, _) = app
        .send(
            Method::POST,
            "/api/v1/admin/categories",
            Some(json!({ "name": "Sneaky" })),
            Some(&seller.token),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Sellers keep their customer abilities.
    let (status, _) = app.get("/api/v1/account/orders", Some(&seller.token)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn admin_manages_accounts() {
    let app = TestApp::new().await;
    let admin = Some(app.admin_token());
    let (_, user_id) = app.register("promote-me@example.com").await;

    let (status, body) = app.get("/api/v1/admin/users?role=customer", admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);

    let (status, body) = app.get(&format!("/api/v1/admin/users/{user_id}"), admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "promote-me@example.com");
    assert_eq!(body["data"]["order_count"], 0);

    let (status, body) = app
        .put(
            &format!("/api/v1/admin/users/{user_id}/role"),
            json!({ "role": "admin" }),
            admin,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role"], "admin");

    // The new role applies from the next login.
    let token = app.login("promote-me@example.com", common::PASSWORD).await;
    let (status, _) = app.get("/api/v1/admin/dashboard", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.get("/api/v1/admin/users?search=promote", admin).await;
    assert_eq!(body["data"]["items"][0]["role"], "admin");
}

#[tokio::test]
async fn dashboards_summarise_orders() {
    let app = TestApp::new().await;
    let seller = app.seller("dash-seller@example.com", "Dash Shop").await;
    let mug = uuid(&app.product(&seller, "Mug", "12.00", 20).await["id"]);
    app.product(&seller, "Rare Print", "90.00", 2).await;
    let (buyer, _) = app.register("dash-buyer@example.com").await;

    let (_, body) = app.place_order(&buyer, &[(mug, 2)], json!({})).await;
    let kept = uuid(&body["data"]["id"]);
    let (_, body) = app.place_order(&buyer, &[(mug, 1)], json!({})).await;
    let cancelled = uuid(&body["data"]["id"]);

    app.put(
        &format!("/api/v1/seller/orders/{kept}/status"),
        json!({ "status": "paid" }),
        Some(&seller.token),
    )
    .await;
    app.post(
        &format!("/api/v1/account/orders/{cancelled}/cancel"),
        json!({}),
        Some(&buyer),
    )
    .await;

    let (status, body) = app.get("/api/v1/seller/dashboard", Some(&seller.token)).await;
    assert_eq!(status, StatusCode::OK);
    let dash = &body["data"];
    assert_eq!(uuid(&dash["store_id"]), seller.store_id);
    assert_eq!(dash["product_count"], 2);
    assert_eq!(dash["order_count"], 2);
    assert_eq!(dash["orders_by_status"]["paid"], 1);
    assert_eq!(dash["orders_by_status"]["cancelled"], 1);
    assert_eq!(dec(&dash["revenue"]), d("24.00"));
    let low_stock = dash["low_stock_products"].as_array().unwrap();
    assert_eq!(low_stock.len(), 1);
    assert_eq!(low_stock[0]["name"], "Rare Print");

    // A second applicant waits for review.
    let (pending, _) = app.register("waiting@example.com").await;
    app.post(
        "/api/v1/account/store",
        json!({ "name": "Waiting Room", "country": "US" }),
        Some(&pending),
    )
    .await;

    let (status, body) = app.get("/api/v1/admin/dashboard", Some(app.admin_token())).await;
    assert_eq!(status, StatusCode::OK);
    let dash = &body["data"];
    // admin, seller, buyer, applicant
    assert_eq!(dash["user_count"], 4);
    assert_eq!(dash["store_count"], 2);
    assert_eq!(dash["stores_pending_review"], 1);
    assert_eq!(dash["product_count"], 2);
    assert_eq!(dash["order_count"], 2);
    assert_eq!(dec(&dash["revenue"]), d("24.00"));
}
