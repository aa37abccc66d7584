mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::json;

use common::{uuid, TestApp};

#[tokio::test]
async fn banners_are_targeted_and_ranked() {
    let app = TestApp::new().await;
    let admin = Some(app.admin_token());

    let banner = |title: &str, extra: serde_json::Value| {
        let mut payload = json!({
            "title": title,
            "image_url": "https://cdn.example.com/banner.jpg",
            "placement": "home_hero"
        });
        if let (Some(target), serde_json::Value::Object(fields)) =
            (payload.as_object_mut(), extra)
        {
            target.extend(fields);
        }
        payload
    };

    for payload in [
        banner("Everyone", json!({ "priority": 1 })),
        banner("Top", json!({ "priority": 10 })),
        banner("Mobile only", json!({ "devices": ["Mobile"] })),
        banner("Guests", json!({ "audience": "guest" })),
        banner("First order", json!({ "audience": "new_customer" })),
        banner("Not in France", json!({ "excluded_countries": ["fr"] })),
        banner("Sidebar", json!({ "placement": "sidebar" })),
    ] {
        let (status, body) = app.post("/api/v1/admin/banners", payload, admin).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
    }

    let titles = |body: &serde_json::Value| -> Vec<String> {
        body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|b| b["title"].as_str().unwrap().to_string())
            .collect()
    };

    let (status, body) = app
        .get("/api/v1/store/banners?placement=home_hero&device=desktop&country=FR", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let seen = titles(&body);
    assert_eq!(seen[0], "Top");
    assert_eq!(seen[1], "Everyone");
    assert!(seen.contains(&"Guests".to_string()));
    assert!(!seen.contains(&"Mobile only".to_string()));
    assert!(!seen.contains(&"First order".to_string()));
    assert!(!seen.contains(&"Not in France".to_string()));
    assert!(!seen.contains(&"Sidebar".to_string()));

    // A signed-in customer without orders sees the new-customer banner instead.
    let (customer, _) = app.register("banner-viewer@example.com").await;
    let (_, body) = app
        .get("/api/v1/store/banners?placement=home_hero&device=mobile", Some(&customer))
        .await;
    let seen = titles(&body);
    assert!(seen.contains(&"First order".to_string()));
    assert!(seen.contains(&"Mobile only".to_string()));
    assert!(seen.contains(&"Not in France".to_string()));
    assert!(!seen.contains(&"Guests".to_string()));
}

#[tokio::test]
async fn banner_counters_and_validation() {
    let app = TestApp::new().await;
    let admin = Some(app.admin_token());

    let (status, body) = app
        .post(
            "/api/v1/admin/banners",
            json!({
                "title": "Counted",
                "image_url": "https://cdn.example.com/c.jpg",
                "placement": "popup"
            }),
            admin,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = uuid(&body["data"]["id"]);

    for _ in 0..2 {
        let (status, _) = app
            .post(&format!("/api/v1/store/banners/{id}/impression"), json!({}), None)
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }
    app.post(&format!("/api/v1/store/banners/{id}/click"), json!({}), None)
        .await;

    let (_, body) = app.get(&format!("/api/v1/admin/banners/{id}"), admin).await;
    assert_eq!(body["data"]["impressions"], 2);
    assert_eq!(body["data"]["clicks"], 1);

    let (status, _) = app
        .post(
            &format!("/api/v1/store/banners/{}/click", uuid::Uuid::new_v4()),
            json!({}),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    for payload in [
        json!({
            "title": "Bad image",
            "image_url": "ftp://cdn.example.com/x.jpg",
            "placement": "popup"
        }),
        json!({
            "title": "Bad device",
            "image_url": "https://cdn.example.com/x.jpg",
            "placement": "popup",
            "devices": ["watch"]
        }),
        json!({
            "title": "Bad country",
            "image_url": "https://cdn.example.com/x.jpg",
            "placement": "popup",
            "countries": ["USA"]
        }),
    ] {
        let (status, _) = app.post("/api/v1/admin/banners", payload, admin).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn campaign_status_gates_its_banners() {
    let app = TestApp::new().await;
    let admin = Some(app.admin_token());

    let (status, body) = app
        .post(
            "/api/v1/admin/campaigns",
            json!({
                "name": "Spring",
                "starts_at": (Utc::now() - Duration::days(1)).to_rfc3339()
            }),
            admin,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["status"], "draft");
    let campaign_id = uuid(&body["data"]["id"]);

    let (status, _) = app
        .post(
            "/api/v1/admin/banners",
            json!({
                "title": "Spring banner",
                "image_url": "https://cdn.example.com/spring.jpg",
                "placement": "home_secondary",
                "campaign_id": campaign_id
            }),
            admin,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = app.get("/api/v1/store/banners", None).await;
    assert!(body["data"].as_array().unwrap().is_empty());

    let (status, _) = app
        .put(
            &format!("/api/v1/admin/campaigns/{campaign_id}"),
            json!({ "status": "active" }),
            admin,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.get("/api/v1/store/banners", None).await;
    assert_eq!(body["data"][0]["title"], "Spring banner");

    let (_, body) = app.get("/api/v1/admin/campaigns?status=active", admin).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, _) = app
        .post(
            "/api/v1/admin/campaigns",
            json!({
                "name": "Backwards",
                "starts_at": Utc::now().to_rfc3339(),
                "ends_at": (Utc::now() - Duration::days(1)).to_rfc3339()
            }),
            admin,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
