mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{uuid, TestApp, PASSWORD};

#[tokio::test]
async fn application_approval_and_seller_access() {
    let app = TestApp::new().await;
    let (token, user_id) = app.register("grocer@example.com").await;

    let (status, body) = app
        .post(
            "/api/v1/account/store",
            json!({ "name": "Green Grocer", "country": "us" }),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["status"], "pending");
    assert_eq!(body["data"]["slug"], "green-grocer");
    assert_eq!(body["data"]["country"], "US");
    let store_id = uuid(&body["data"]["id"]);

    let (status, body) = app.get("/api/v1/account/store", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(uuid(&body["data"]["id"]), store_id);

    // Pending stores are not public and the applicant is not a seller yet.
    let (status, _) = app.get("/api/v1/store/stores/green-grocer", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.get("/api/v1/seller/store", Some(&token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .get("/api/v1/admin/stores?status=pending", Some(app.admin_token()))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);

    let (status, body) = app
        .put(
            &format!("/api/v1/admin/stores/{store_id}/status"),
            json!({ "status": "active" }),
            Some(app.admin_token()),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "active");

    let (_, body) = app
        .get(&format!("/api/v1/admin/users/{user_id}"), Some(app.admin_token()))
        .await;
    assert_eq!(body["data"]["role"], "seller");

    // Seller permissions arrive with the next token.
    let token = app.login("grocer@example.com", PASSWORD).await;
    let (status, body) = app
        .put(
            "/api/v1/seller/store",
            json!({ "description": "Fresh produce daily" }),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["description"], "Fresh produce daily");

    let (status, body) = app.get("/api/v1/store/stores/GREEN-GROCER", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(uuid(&body["data"]["id"]), store_id);
}

#[tokio::test]
async fn one_store_per_account_and_unique_slugs() {
    let app = TestApp::new().await;
    let (first, _) = app.register("first@example.com").await;
    let (second, _) = app.register("second@example.com").await;

    let (status, _) = app
        .post("/api/v1/account/store", json!({ "name": "Corner Shop" }), Some(&first))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .post("/api/v1/account/store", json!({ "name": "Another Shop" }), Some(&first))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .post("/api/v1/account/store", json!({ "name": "Corner Shop" }), Some(&second))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn store_status_transitions_are_enforced() {
    let app = TestApp::new().await;
    let seller = app.seller("suspend@example.com", "Suspend Me").await;
    let uri = format!("/api/v1/admin/stores/{}/status", seller.store_id);

    let (status, _) = app
        .put(&uri, json!({ "status": "pending" }), Some(app.admin_token()))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .put(&uri, json!({ "status": "suspended" }), Some(app.admin_token()))
        .await;
    assert_eq!(status, StatusCode::OK);

    // A suspended store locks its seller out of store-scoped routes.
    let (status, _) = app.get("/api/v1/seller/products", Some(&seller.token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .put(&uri, json!({ "status": "active" }), Some(app.admin_token()))
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.get("/api/v1/seller/products", Some(&seller.token)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn invalid_coordinates_are_rejected() {
    let app = TestApp::new().await;
    let (token, _) = app.register("geo@example.com").await;

    let (status, _) = app
        .post(
            "/api/v1/account/store",
            json!({ "name": "Far Away", "latitude": 123.0, "longitude": 10.0 }),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
