//! Marketplace API library
//!
//! Multi-tenant marketplace backend: a public storefront, a seller dashboard
//! scoped to each seller's store, and an admin back office.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod health;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod pricing;
pub mod services;
pub mod tracing;

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Uri},
    response::{IntoResponse, Json},
    routing::{get, post, put},
    Extension, Router,
};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowHeaders, AllowMethods, CorsLayer},
    timeout::TimeoutLayer,
};
use utoipa::ToSchema;

use crate::auth::consts as perm;
use crate::auth::{AuthConfig, AuthRouterExt, AuthService};
use crate::events::EventSender;
use crate::handlers::AppServices;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: Arc<EventSender>,
    pub auth: Arc<AuthService>,
    pub services: AppServices,
}

impl AppState {
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
        event_sender: EventSender,
    ) -> Self {
        let event_sender = Arc::new(event_sender);
        let auth = Arc::new(AuthService::new(
            AuthConfig::from_app_config(&config),
            db.clone(),
        ));
        let services = AppServices::new(db.clone(), event_sender.clone(), &config);
        Self {
            db,
            config,
            event_sender,
            auth,
            services,
        }
    }
}

// Common response wrappers
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Serialize, ToSchema)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            request_id: crate::tracing::current_request_id().map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

#[cfg(test)]
mod response_tests {
    use super::*;
    use chrono::DateTime;

    #[tokio::test]
    async fn success_response_includes_request_metadata() {
        let response =
            crate::tracing::scope_request_id(crate::tracing::RequestId::new("meta-123"), async {
                ApiResponse::success("ok")
            })
            .await;

        let meta = response.meta.expect("metadata expected");
        assert_eq!(meta.request_id.as_deref(), Some("meta-123"));
        DateTime::parse_from_rfc3339(&meta.timestamp).expect("timestamp should parse");
    }

    #[test]
    fn request_id_is_omitted_outside_a_request() {
        let response = ApiResponse::success(1);
        let body = serde_json::to_value(&response).unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["data"], 1);
        assert!(body["meta"].get("request_id").is_none());
    }

    #[test]
    fn envelope_carries_message_and_errors() {
        let body = serde_json::to_value(ApiResponse::success(1)).unwrap();
        let fields: Vec<&str> = body.as_object().unwrap().keys().map(String::as_str).collect();
        for key in ["success", "data", "message", "errors", "meta"] {
            assert!(fields.contains(&key), "missing {key}");
        }
        assert!(body["message"].is_null());
        assert!(body["errors"].is_null());

        let response = ApiResponse::success(()).with_message("Signed out");
        let body = serde_json::to_value(response).unwrap();
        assert_eq!(body["message"], "Signed out");
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

fn auth_routes() -> Router<AppState> {
    let public = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/refresh", post(handlers::auth::refresh));

    let session = Router::new()
        .route("/logout", post(handlers::auth::logout))
        .route("/me", get(handlers::auth::me))
        .with_auth();

    public.merge(session)
}

/// Public catalog; a valid token only personalises the response.
fn storefront_routes() -> Router<AppState> {
    use handlers::{
        banners, brands, categories, flash_sales, products, promotions, shipping, stores,
    };

    Router::new()
        .route("/categories", get(categories::category_tree))
        .route("/brands", get(brands::public_brands))
        .route("/banners", get(banners::visible_banners))
        .route("/banners/:id/impression", post(banners::record_impression))
        .route("/banners/:id/click", post(banners::record_click))
        .route("/products", get(products::catalog))
        .route("/products/:slug", get(products::catalog_product))
        .route("/stores/:slug", get(stores::get_public_store))
        .route("/flash-sales", get(flash_sales::storefront_sales))
        .route("/flash-sales/:id", get(flash_sales::storefront_sale))
        .route("/promotions/validate", post(promotions::validate_promotion))
        .route("/shipping/quote", post(shipping::quote))
        .with_optional_auth()
}

fn account_routes() -> Router<AppState> {
    use handlers::{affiliates, orders, shipments, stores, users};

    let profile = Router::new()
        .route("/profile", put(users::update_profile))
        .with_auth();

    let store = Router::new()
        .route(
            "/store",
            post(stores::apply_for_store).get(stores::get_own_application),
        )
        .with_permission(perm::STORES_APPLY);

    let affiliate = Router::new()
        .route("/affiliate", post(affiliates::apply).get(affiliates::dashboard))
        .with_permission(perm::AFFILIATES_APPLY);

    let place = Router::new()
        .route("/orders", post(orders::place_order))
        .with_permission(perm::ORDERS_CREATE);

    let read = Router::new()
        .route("/orders", get(orders::list_my_orders))
        .route("/orders/:id", get(orders::get_my_order))
        .route("/orders/:id/cancel", post(orders::cancel_my_order))
        .route("/orders/:id/shipments", get(shipments::list_order_shipments))
        .with_permission(perm::ORDERS_READ_OWN);

    profile
        .merge(store)
        .merge(affiliate)
        .merge(place)
        .merge(read)
}

/// Seller routes; each handler resolves the caller's active store.
fn seller_routes() -> Router<AppState> {
    use handlers::{dashboards, flash_sales, orders, products, promotions, shipments, stores};

    let store = Router::new()
        .route(
            "/store",
            get(stores::get_seller_store).put(stores::update_seller_store),
        )
        .route("/dashboard", get(dashboards::seller_dashboard))
        .with_permission(perm::STORE_MANAGE);

    let catalog = Router::new()
        .route(
            "/products",
            post(products::create_product).get(products::list_seller_products),
        )
        .route(
            "/products/:id",
            get(products::get_seller_product)
                .put(products::update_seller_product)
                .delete(products::delete_seller_product),
        )
        .with_permission(perm::PRODUCTS_MANAGE);

    let promos = Router::new()
        .route(
            "/promotions",
            post(promotions::seller_create_promotion).get(promotions::seller_list_promotions),
        )
        .route(
            "/promotions/:id",
            get(promotions::seller_get_promotion)
                .put(promotions::seller_update_promotion)
                .delete(promotions::seller_delete_promotion),
        )
        .with_permission(perm::PROMOTIONS_MANAGE_OWN);

    let sales = Router::new()
        .route(
            "/flash-sales",
            post(flash_sales::seller_create_sale).get(flash_sales::seller_list_sales),
        )
        .route(
            "/flash-sales/:id",
            get(flash_sales::seller_get_sale)
                .put(flash_sales::seller_update_sale)
                .delete(flash_sales::seller_delete_sale),
        )
        .route("/flash-sales/:id/items", post(flash_sales::seller_add_item))
        .route(
            "/flash-sales/:id/items/:item_id",
            put(flash_sales::seller_update_item).delete(flash_sales::seller_delete_item),
        )
        .route(
            "/flash-sales/:id/items/:item_id/recalculate",
            post(flash_sales::seller_recalculate_item),
        )
        .with_permission(perm::FLASH_SALES_MANAGE_OWN);

    let fulfilment = Router::new()
        .route("/orders", get(orders::list_store_orders))
        .route("/orders/:id", get(orders::get_store_order))
        .route("/orders/:id/status", put(orders::set_store_order_status))
        .with_permission(perm::ORDERS_FULFILL);

    let shipping = Router::new()
        .route("/orders/:id/shipments", post(shipments::create_shipment))
        .route("/shipments", get(shipments::list_store_shipments))
        .route("/shipments/:id/status", put(shipments::update_shipment_status))
        .with_permission(perm::SHIPMENTS_MANAGE);

    store
        .merge(catalog)
        .merge(promos)
        .merge(sales)
        .merge(fulfilment)
        .merge(shipping)
}

fn admin_routes() -> Router<AppState> {
    use handlers::{
        affiliates, banners, brands, campaigns, categories, dashboards, flash_sales, orders,
        products, promotions, shipping, stores, users,
    };

    Router::new()
        .route("/dashboard", get(dashboards::admin_dashboard))
        // Accounts and stores
        .route("/users", get(users::list_users))
        .route("/users/:id", get(users::get_user))
        .route("/users/:id/role", put(users::change_role))
        .route("/users/:id/status", put(users::change_status))
        .route("/stores", get(stores::list_stores))
        .route("/stores/:id", get(stores::get_store))
        .route("/stores/:id/status", put(stores::change_store_status))
        // Catalog
        .route(
            "/categories",
            post(categories::create_category).get(categories::list_categories),
        )
        .route(
            "/categories/:id",
            get(categories::get_category)
                .put(categories::update_category)
                .delete(categories::delete_category),
        )
        .route("/brands", post(brands::create_brand).get(brands::list_brands))
        .route(
            "/brands/:id",
            get(brands::get_brand)
                .put(brands::update_brand)
                .delete(brands::delete_brand),
        )
        .route("/products", get(products::list_products))
        .route("/products/:id", get(products::get_product))
        .route("/products/:id/status", put(products::set_product_status))
        // Marketing
        .route(
            "/campaigns",
            post(campaigns::create_campaign).get(campaigns::list_campaigns),
        )
        .route(
            "/campaigns/:id",
            get(campaigns::get_campaign)
                .put(campaigns::update_campaign)
                .delete(campaigns::delete_campaign),
        )
        .route("/banners", post(banners::create_banner).get(banners::list_banners))
        .route(
            "/banners/:id",
            get(banners::get_banner)
                .put(banners::update_banner)
                .delete(banners::delete_banner),
        )
        .route(
            "/promotions",
            post(promotions::admin_create_promotion).get(promotions::admin_list_promotions),
        )
        .route(
            "/promotions/:id",
            get(promotions::admin_get_promotion)
                .put(promotions::admin_update_promotion)
                .delete(promotions::admin_delete_promotion),
        )
        .route(
            "/flash-sales",
            post(flash_sales::admin_create_sale).get(flash_sales::admin_list_sales),
        )
        .route(
            "/flash-sales/:id",
            get(flash_sales::admin_get_sale)
                .put(flash_sales::admin_update_sale)
                .delete(flash_sales::admin_delete_sale),
        )
        .route("/flash-sales/:id/items", post(flash_sales::admin_add_item))
        .route(
            "/flash-sales/:id/items/:item_id",
            put(flash_sales::admin_update_item).delete(flash_sales::admin_delete_item),
        )
        .route(
            "/flash-sales/:id/items/:item_id/recalculate",
            post(flash_sales::admin_recalculate_item),
        )
        // Shipping
        .route(
            "/shipping/providers",
            post(shipping::create_provider).get(shipping::list_providers),
        )
        .route(
            "/shipping/providers/:id",
            get(shipping::get_provider)
                .put(shipping::update_provider)
                .delete(shipping::delete_provider),
        )
        .route(
            "/shipping/rates",
            post(shipping::create_rate).get(shipping::list_rates),
        )
        .route(
            "/shipping/rates/:id",
            get(shipping::get_rate)
                .put(shipping::update_rate)
                .delete(shipping::delete_rate),
        )
        // Orders and affiliates
        .route("/orders", get(orders::list_all_orders))
        .route("/affiliates", get(affiliates::list_affiliates))
        .route("/affiliates/:id", put(affiliates::update_affiliate))
        .route("/commissions", get(affiliates::list_commissions))
        .route(
            "/commissions/:id/status",
            put(affiliates::set_commission_status),
        )
        .with_role("admin")
}

/// Everything under `/api/v1`
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .route("/status", get(api_status))
        .nest("/auth", auth_routes())
        .nest("/store", storefront_routes())
        .nest("/account", account_routes())
        .nest("/seller", seller_routes())
        .nest("/admin", admin_routes())
}

async fn api_status() -> Json<ApiResponse<Value>> {
    Json(ApiResponse::success(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339(),
    })))
}

async fn not_found(uri: Uri) -> impl IntoResponse {
    errors::ApiError::NotFound(format!("No route for {}", uri.path()))
}

/// CORS from configuration: explicit origins, else permissive in development
/// or when allowed, else same-origin only.
pub fn cors_layer(cfg: &config::AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = cfg
        .cors_allowed_origins
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    if !origins.is_empty() {
        CorsLayer::new()
            .allow_origin(origins)
            // Wildcards are rejected alongside credentials, so echo the preflight instead.
            .allow_methods(AllowMethods::mirror_request())
            .allow_headers(AllowHeaders::mirror_request())
            .allow_credentials(cfg.cors_allow_credentials)
    } else if cfg.should_allow_permissive_cors() {
        CorsLayer::permissive()
    } else {
        ::tracing::warn!("No CORS origins configured; cross-origin requests will be refused");
        CorsLayer::new()
    }
}

/// The full HTTP application: health, versioned API, docs and middleware.
pub fn app_router(state: AppState) -> Router {
    let body_limit = state.config.max_body_size;
    let cors = cors_layer(&state.config);
    let auth = state.auth.clone();
    let db = state.db.clone();

    Router::new()
        .nest("/api/v1", api_v1_routes())
        .fallback(not_found)
        .with_state(state)
        .nest("/health", health::health_routes(db))
        .merge(openapi::swagger_ui())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(Extension(auth))
        .layer(crate::tracing::configure_http_tracing())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id_middleware,
        ))
}
