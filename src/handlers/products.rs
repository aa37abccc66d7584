use super::common::{created, page, paginated, seller_store, ValidatedJson};
use crate::{
    auth::AuthUser,
    entities::product,
    errors::ServiceError,
    services::products::{
        CatalogQuery, CreateProductRequest, ProductListQuery, ProductStatusRequest,
        UpdateProductRequest,
    },
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

#[utoipa::path(
    post,
    path = "/api/v1/seller/products",
    summary = "Create product",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Created", body = ApiResponse<product::Model>),
        (status = 400, description = "Invalid input", body = crate::errors::ErrorResponse),
        (status = 409, description = "Slug or SKU taken", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "seller"
)]
pub async fn create_product(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(request): ValidatedJson<CreateProductRequest>,
) -> Result<(StatusCode, Json<ApiResponse<product::Model>>), ServiceError> {
    let store = seller_store(&state, &user).await?;
    let product = state
        .services
        .products
        .create_product(store.id, request)
        .await?;
    Ok(created(product))
}

#[utoipa::path(
    get,
    path = "/api/v1/seller/products",
    summary = "List own products",
    params(ProductListQuery),
    responses(
        (
            status = 200,
            description = "Products",
            body = ApiResponse<PaginatedResponse<product::Model>>
        ),
    ),
    security(("Bearer" = [])),
    tag = "seller"
)]
pub async fn list_seller_products(
    State(state): State<AppState>,
    user: AuthUser,
    Query(mut query): Query<ProductListQuery>,
) -> ApiResult<PaginatedResponse<product::Model>> {
    let store = seller_store(&state, &user).await?;
    query.store_id = Some(store.id);
    let page = page(&state, query.page, query.limit);
    let (products, total) = state.services.products.list_products(&query, page).await?;
    Ok(Json(ApiResponse::success(paginated(products, total, page))))
}

#[utoipa::path(
    get,
    path = "/api/v1/seller/products/{id}",
    summary = "Get own product",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product", body = ApiResponse<product::Model>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "seller"
)]
pub async fn get_seller_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<product::Model> {
    let store = seller_store(&state, &user).await?;
    let product = state
        .services
        .products
        .get_store_product(store.id, id)
        .await?;
    Ok(Json(ApiResponse::success(product)))
}

#[utoipa::path(
    put,
    path = "/api/v1/seller/products/{id}",
    summary = "Update own product",
    params(("id" = Uuid, Path, description = "Product id")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Updated", body = ApiResponse<product::Model>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "seller"
)]
pub async fn update_seller_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateProductRequest>,
) -> ApiResult<product::Model> {
    let store = seller_store(&state, &user).await?;
    let product = state
        .services
        .products
        .update_product(store.id, id, request)
        .await?;
    Ok(Json(ApiResponse::success(product)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/seller/products/{id}",
    summary = "Delete own product",
    description = "Refused once the product has order or flash sale history",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 409, description = "Product has history", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "seller"
)]
pub async fn delete_seller_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    let store = seller_store(&state, &user).await?;
    state.services.products.delete_product(store.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/products",
    summary = "List all products",
    params(ProductListQuery),
    responses(
        (
            status = 200,
            description = "Products",
            body = ApiResponse<PaginatedResponse<product::Model>>
        ),
    ),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> ApiResult<PaginatedResponse<product::Model>> {
    let page = page(&state, query.page, query.limit);
    let (products, total) = state.services.products.list_products(&query, page).await?;
    Ok(Json(ApiResponse::success(paginated(products, total, page))))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/products/{id}",
    summary = "Get any product",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product", body = ApiResponse<product::Model>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<product::Model> {
    let product = state.services.products.get_product(id).await?;
    Ok(Json(ApiResponse::success(product)))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/products/{id}/status",
    summary = "Moderate product",
    params(("id" = Uuid, Path, description = "Product id")),
    request_body = ProductStatusRequest,
    responses((status = 200, description = "Updated", body = ApiResponse<product::Model>)),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn set_product_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ProductStatusRequest>,
) -> ApiResult<product::Model> {
    let product = state.services.products.set_status(id, request.status).await?;
    Ok(Json(ApiResponse::success(product)))
}

#[utoipa::path(
    get,
    path = "/api/v1/store/products",
    summary = "Browse catalog",
    description = "Active products of active stores",
    params(CatalogQuery),
    responses(
        (
            status = 200,
            description = "Products",
            body = ApiResponse<PaginatedResponse<product::Model>>
        ),
    ),
    tag = "storefront"
)]
pub async fn catalog(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> ApiResult<PaginatedResponse<product::Model>> {
    let page = page(&state, query.page, query.limit);
    let (products, total) = state.services.products.catalog(&query, page).await?;
    Ok(Json(ApiResponse::success(paginated(products, total, page))))
}

#[utoipa::path(
    get,
    path = "/api/v1/store/products/{slug}",
    summary = "Product page",
    params(("slug" = String, Path, description = "Product slug")),
    responses(
        (status = 200, description = "Product", body = ApiResponse<product::Model>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    tag = "storefront"
)]
pub async fn catalog_product(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<product::Model> {
    let product = state.services.products.catalog_product(&slug).await?;
    Ok(Json(ApiResponse::success(product)))
}
