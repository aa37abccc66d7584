mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{d, dec, uuid, TestApp};

#[tokio::test]
async fn category_tree_follows_active_parents() {
    let app = TestApp::new().await;
    let admin = Some(app.admin_token());

    let (status, body) = app
        .post("/api/v1/admin/categories", json!({ "name": "Home & Garden" }), admin)
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["slug"], "home-garden");
    let home = uuid(&body["data"]["id"]);

    let (status, body) = app
        .post(
            "/api/v1/admin/categories",
            json!({ "name": "Kitchen", "parent_id": home, "sort_order": 2 }),
            admin,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let kitchen = uuid(&body["data"]["id"]);
    app.post(
        "/api/v1/admin/categories",
        json!({ "name": "Bath", "parent_id": home, "sort_order": 1 }),
        admin,
    )
    .await;

    let (status, body) = app.get("/api/v1/store/categories", None).await;
    assert_eq!(status, StatusCode::OK);
    let roots = body["data"].as_array().unwrap();
    assert_eq!(roots.len(), 1);
    let children: Vec<&str> = roots[0]["children"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(children, vec!["Bath", "Kitchen"]);

    // A category cannot become its own ancestor.
    let (status, _) = app
        .put(
            &format!("/api/v1/admin/categories/{home}"),
            json!({ "parent_id": kitchen }),
            admin,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Deactivating the root hides the whole branch.
    app.put(
        &format!("/api/v1/admin/categories/{home}"),
        json!({ "is_active": false }),
        admin,
    )
    .await;
    let (_, body) = app.get("/api/v1/store/categories", None).await;
    assert!(body["data"].as_array().unwrap().is_empty());

    assert_eq!(
        app.delete(&format!("/api/v1/admin/categories/{home}"), admin).await,
        StatusCode::CONFLICT
    );
    assert_eq!(
        app.delete(&format!("/api/v1/admin/categories/{kitchen}"), admin).await,
        StatusCode::NO_CONTENT
    );
}

#[tokio::test]
async fn featured_brands_on_the_storefront() {
    let app = TestApp::new().await;
    let admin = Some(app.admin_token());

    app.post(
        "/api/v1/admin/brands",
        json!({ "name": "Acme", "is_featured": true, "website": "https://acme.example.com" }),
        admin,
    )
    .await;
    app.post("/api/v1/admin/brands", json!({ "name": "Plain" }), admin).await;
    app.post(
        "/api/v1/admin/brands",
        json!({ "name": "Hidden", "is_featured": true, "is_active": false }),
        admin,
    )
    .await;

    let (status, body) = app.get("/api/v1/store/brands", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (_, body) = app.get("/api/v1/store/brands?featured=true", None).await;
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Acme"]);

    let (status, _) = app
        .post("/api/v1/admin/brands", json!({ "name": "acme" }), admin)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn seller_products_and_storefront_visibility() {
    let app = TestApp::new().await;
    let seller = app.seller("maker@example.com", "Maker Shop").await;

    let (status, body) = app
        .post(
            "/api/v1/seller/products",
            json!({ "name": "Oak Table", "price": "199.999", "stock": 4 }),
            Some(&seller.token),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["status"], "draft");
    assert_eq!(dec(&body["data"]["price"]), d("200.00"));
    let table = uuid(&body["data"]["id"]);

    app.product(&seller, "Pine Chair", "45.00", 10).await;

    // Drafts stay off the storefront.
    let (_, body) = app.get("/api/v1/store/products", None).await;
    assert_eq!(body["data"]["total"], 1);
    let (status, _) = app.get("/api/v1/store/products/oak-table", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .put(
            &format!("/api/v1/seller/products/{table}"),
            json!({ "status": "active", "compare_at_price": "250" }),
            Some(&seller.token),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "active");

    let (_, body) = app.get("/api/v1/store/products?min_price=100", None).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["name"], "Oak Table");

    let (_, body) = app.get("/api/v1/store/products?search=chair", None).await;
    assert_eq!(body["data"]["total"], 1);

    let (status, body) = app.get("/api/v1/store/products/oak-table", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(uuid(&body["data"]["id"]), table);

    // Archiving through moderation removes it again.
    let (status, _) = app
        .put(
            &format!("/api/v1/admin/products/{table}/status"),
            json!({ "status": "archived" }),
            Some(app.admin_token()),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = app.get("/api/v1/store/products", None).await;
    assert_eq!(body["data"]["total"], 1);
}

#[tokio::test]
async fn product_rules_are_validated() {
    let app = TestApp::new().await;
    let seller = app.seller("rules@example.com", "Rules Shop").await;

    for payload in [
        json!({ "name": "Free", "price": "0" }),
        json!({ "name": "Cheap Compare", "price": "10", "compare_at_price": "5" }),
        json!({ "name": "Negative", "price": "10", "stock": -1 }),
    ] {
        let (status, _) = app
            .post("/api/v1/seller/products", payload, Some(&seller.token))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    let (status, _) = app
        .post(
            "/api/v1/seller/products",
            json!({ "name": "Ghost", "price": "10", "category_id": uuid::Uuid::new_v4() }),
            Some(&seller.token),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn sellers_only_see_their_own_products() {
    let app = TestApp::new().await;
    let alice = app.seller("alice@example.com", "Alice Goods").await;
    let bob = app.seller("bob@example.com", "Bob Goods").await;

    let product = app.product(&alice, "Alice Lamp", "30.00", 3).await;
    let id = uuid(&product["id"]);

    let (_, body) = app.get("/api/v1/seller/products", Some(&bob.token)).await;
    assert_eq!(body["data"]["total"], 0);

    let (status, _) = app
        .get(&format!("/api/v1/seller/products/{id}"), Some(&bob.token))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        app.delete(&format!("/api/v1/seller/products/{id}"), Some(&bob.token)).await,
        StatusCode::NOT_FOUND
    );

    assert_eq!(
        app.delete(&format!("/api/v1/seller/products/{id}"), Some(&alice.token)).await,
        StatusCode::NO_CONTENT
    );
}
