use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers::{
    affiliates, auth, banners, brands, campaigns, categories, dashboards, flash_sales, orders,
    products, promotions, shipments, shipping, stores, users,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Marketplace API",
        version = "1.0.0",
        description = r#"
# Marketplace API

Multi-tenant marketplace backend.

- **Storefront** (`/api/v1/store`): public catalog, banners, flash sales,
  promotion checks and shipping quotes
- **Account** (`/api/v1/account`): orders, store applications and the affiliate program
- **Seller** (`/api/v1/seller`): products, promotions, flash sales and fulfilment
  for the seller's own store
- **Admin** (`/api/v1/admin`): moderation and platform configuration

## Authentication

Obtain a token pair from `/api/v1/auth/login` and send the access token:

```
Authorization: Bearer <access-token>
```

## Pagination

Paginated lists take `page` (from 1) and `limit` (clamped to the configured maximum).
        "#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers((url = "http://localhost:8080", description = "Local development")),
    modifiers(&BearerAuth),
    tags(
        (name = "auth", description = "Registration and tokens"),
        (name = "storefront", description = "Public catalog"),
        (name = "account", description = "Signed-in shopper"),
        (name = "seller", description = "Seller dashboard, scoped to the seller's store"),
        (name = "admin", description = "Back office")
    ),
    paths(
        auth::register,
        auth::login,
        auth::refresh,
        auth::logout,
        auth::me,

        users::list_users,
        users::get_user,
        users::change_role,
        users::change_status,
        users::update_profile,

        stores::apply_for_store,
        stores::get_own_application,
        stores::get_seller_store,
        stores::update_seller_store,
        stores::list_stores,
        stores::get_store,
        stores::change_store_status,
        stores::get_public_store,

        categories::create_category,
        categories::list_categories,
        categories::get_category,
        categories::update_category,
        categories::delete_category,
        categories::category_tree,

        brands::create_brand,
        brands::list_brands,
        brands::get_brand,
        brands::update_brand,
        brands::delete_brand,
        brands::public_brands,

        campaigns::create_campaign,
        campaigns::list_campaigns,
        campaigns::get_campaign,
        campaigns::update_campaign,
        campaigns::delete_campaign,

        banners::create_banner,
        banners::list_banners,
        banners::get_banner,
        banners::update_banner,
        banners::delete_banner,
        banners::visible_banners,
        banners::record_impression,
        banners::record_click,

        products::create_product,
        products::list_seller_products,
        products::get_seller_product,
        products::update_seller_product,
        products::delete_seller_product,
        products::list_products,
        products::get_product,
        products::set_product_status,
        products::catalog,
        products::catalog_product,

        promotions::admin_create_promotion,
        promotions::admin_list_promotions,
        promotions::admin_get_promotion,
        promotions::admin_update_promotion,
        promotions::admin_delete_promotion,
        promotions::seller_create_promotion,
        promotions::seller_list_promotions,
        promotions::seller_get_promotion,
        promotions::seller_update_promotion,
        promotions::seller_delete_promotion,
        promotions::validate_promotion,

        flash_sales::admin_create_sale,
        flash_sales::admin_list_sales,
        flash_sales::admin_get_sale,
        flash_sales::admin_update_sale,
        flash_sales::admin_delete_sale,
        flash_sales::admin_add_item,
        flash_sales::admin_update_item,
        flash_sales::admin_recalculate_item,
        flash_sales::admin_delete_item,
        flash_sales::seller_create_sale,
        flash_sales::seller_list_sales,
        flash_sales::seller_get_sale,
        flash_sales::seller_update_sale,
        flash_sales::seller_delete_sale,
        flash_sales::seller_add_item,
        flash_sales::seller_update_item,
        flash_sales::seller_recalculate_item,
        flash_sales::seller_delete_item,
        flash_sales::storefront_sales,
        flash_sales::storefront_sale,

        shipping::create_provider,
        shipping::list_providers,
        shipping::get_provider,
        shipping::update_provider,
        shipping::delete_provider,
        shipping::create_rate,
        shipping::list_rates,
        shipping::get_rate,
        shipping::update_rate,
        shipping::delete_rate,
        shipping::quote,

        shipments::create_shipment,
        shipments::list_store_shipments,
        shipments::update_shipment_status,
        shipments::list_order_shipments,

        affiliates::apply,
        affiliates::dashboard,
        affiliates::list_affiliates,
        affiliates::update_affiliate,
        affiliates::list_commissions,
        affiliates::set_commission_status,

        orders::place_order,
        orders::list_my_orders,
        orders::get_my_order,
        orders::cancel_my_order,
        orders::list_store_orders,
        orders::get_store_order,
        orders::set_store_order_status,
        orders::list_all_orders,

        dashboards::seller_dashboard,
        dashboards::admin_dashboard,
    ),
    components(schemas(crate::errors::ErrorResponse))
)]
pub struct ApiDocV1;

/// Registers the `Bearer` scheme referenced by secured paths.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        let mut scheme = Http::new(HttpAuthScheme::Bearer);
        scheme.bearer_format = Some("JWT".to_string());
        components.add_security_scheme("Bearer", SecurityScheme::Http(scheme));
    }
}

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

/// The OpenAPI document as pretty-printed JSON.
pub fn openapi_json() -> Result<String, serde_json::Error> {
    ApiDocV1::openapi().to_pretty_json()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_covers_every_surface() {
        let json = openapi_json().unwrap();
        assert!(json.contains("Marketplace API"));
        assert!(json.contains("/api/v1/auth/login"));
        assert!(json.contains("/api/v1/store/products/{slug}"));
        assert!(json.contains("/api/v1/seller/flash-sales/{id}/items/{item_id}"));
        assert!(json.contains("/api/v1/admin/commissions/{id}/status"));
        assert!(json.contains("\"Bearer\""));
    }
}
