#![allow(dead_code)]

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use marketplace_api::{
    app_router,
    config::AppConfig,
    db::{self, DbConfig},
    events, AppState,
};
use tower::ServiceExt;
use uuid::Uuid;

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "admin-password-1";
pub const PASSWORD: &str = "customer-password-1";

/// Helper harness for spinning up the full router backed by an in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    admin_token: String,
    _event_task: tokio::task::JoinHandle<()>,
}

/// A seller whose store has been approved.
pub struct Seller {
    pub token: String,
    pub user_id: Uuid,
    pub store_id: Uuid,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "test_secret_key_for_testing_purposes_only_32chars".to_string(),
            "127.0.0.1".to_string(),
            0,
            "test".to_string(),
        );

        let pool = db::establish_connection_with_config(&DbConfig::in_memory_sqlite())
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let (event_sender, event_rx) = events::channel(256);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let state = AppState::new(Arc::new(pool), cfg, event_sender);
        state
            .services
            .users
            .ensure_admin(ADMIN_EMAIL, "Administrator", ADMIN_PASSWORD)
            .await
            .expect("bootstrap admin");

        let router = app_router(state.clone());
        let mut app = Self {
            router,
            state,
            admin_token: String::new(),
            _event_task: event_task,
        };
        app.admin_token = app.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;
        app
    }

    pub fn admin_token(&self) -> &str {
        &self.admin_token
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Sends a request and decodes the JSON body (`Null` for empty bodies).
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let response = self.request(method, uri, body, token).await;
        let status = response.status();
        let bytes = body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read response body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("parse response body")
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None, token).await
    }

    pub async fn post(&self, uri: &str, body: Value, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body), token).await
    }

    pub async fn put(&self, uri: &str, body: Value, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, Some(body), token).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> StatusCode {
        self.request(Method::DELETE, uri, None, token).await.status()
    }

    /// Logs in and returns the access token.
    pub async fn login(&self, email: &str, password: &str) -> String {
        let (status, body) = self
            .post(
                "/api/v1/auth/login",
                json!({ "email": email, "password": password }),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["data"]["tokens"]["access_token"]
            .as_str()
            .expect("access token")
            .to_string()
    }

    /// Registers a customer and returns `(access_token, user_id)`.
    pub async fn register(&self, email: &str) -> (String, Uuid) {
        let (status, body) = self
            .post(
                "/api/v1/auth/register",
                json!({ "email": email, "password": PASSWORD, "name": "Test Customer" }),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        let token = body["data"]["tokens"]["access_token"]
            .as_str()
            .expect("access token")
            .to_string();
        (token, uuid(&body["data"]["user"]["id"]))
    }

    /// Registers a user, applies for a store and has the admin approve it.
    ///
    /// The returned token is issued after approval so it carries seller permissions.
    pub async fn seller(&self, email: &str, store_name: &str) -> Seller {
        let (token, user_id) = self.register(email).await;
        let (status, body) = self
            .post(
                "/api/v1/account/store",
                json!({ "name": store_name, "description": "Integration test store" }),
                Some(&token),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "store application failed: {body}");
        let store_id = uuid(&body["data"]["id"]);

        let (status, body) = self
            .put(
                &format!("/api/v1/admin/stores/{store_id}/status"),
                json!({ "status": "active" }),
                Some(self.admin_token()),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "store approval failed: {body}");

        Seller {
            token: self.login(email, PASSWORD).await,
            user_id,
            store_id,
        }
    }

    /// Creates an active product in the seller's store.
    pub async fn product(&self, seller: &Seller, name: &str, price: &str, stock: i32) -> Value {
        let (status, body) = self
            .post(
                "/api/v1/seller/products",
                json!({
                    "name": name,
                    "price": price,
                    "stock": stock,
                    "weight_kg": "0.5",
                    "status": "active"
                }),
                Some(&seller.token),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "product creation failed: {body}");
        body["data"].clone()
    }

    /// Places an order for `(product_id, quantity)` lines with extra fields merged in.
    pub async fn place_order(
        &self,
        token: &str,
        lines: &[(Uuid, i32)],
        extra: Value,
    ) -> (StatusCode, Value) {
        let items: Vec<Value> = lines
            .iter()
            .map(|(id, qty)| json!({ "product_id": id, "quantity": qty }))
            .collect();
        let mut payload = json!({
            "items": items,
            "shipping_address": shipping_address(),
        });
        if let (Some(target), Value::Object(fields)) = (payload.as_object_mut(), extra) {
            target.extend(fields);
        }
        self.post("/api/v1/account/orders", payload, Some(token)).await
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

pub fn shipping_address() -> Value {
    json!({
        "recipient_name": "Test Customer",
        "address_line": "1 Market Street",
        "city": "Springfield",
        "country": "US",
        "postal_code": "12345"
    })
}

pub fn uuid(value: &Value) -> Uuid {
    Uuid::parse_str(value.as_str().expect("uuid string")).expect("valid uuid")
}

/// Reads a money field whether it was serialized as a string or a number.
pub fn dec(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).expect("decimal string"),
        Value::Number(n) => Decimal::from_str(&n.to_string()).expect("decimal number"),
        other => panic!("expected a decimal, got {other}"),
    }
}

pub fn d(s: &str) -> Decimal {
    Decimal::from_str(s).expect("decimal literal")
}
