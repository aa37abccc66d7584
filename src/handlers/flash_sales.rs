use super::common::{created, seller_store, ValidatedJson};
use crate::{
    auth::AuthUser,
    entities::flash_sale,
    errors::ServiceError,
    services::flash_sales::{
        AddFlashSaleItemRequest, CreateFlashSaleRequest, FlashSaleItemView, FlashSaleScope,
        FlashSaleView, UpdateFlashSaleItemRequest, UpdateFlashSaleRequest,
    },
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

async fn store_scope(state: &AppState, user: &AuthUser) -> Result<FlashSaleScope, ServiceError> {
    Ok(FlashSaleScope::Store(seller_store(state, user).await?.id))
}

// Platform flash sales

#[utoipa::path(
    post,
    path = "/api/v1/admin/flash-sales",
    summary = "Create platform flash sale",
    request_body = CreateFlashSaleRequest,
    responses(
        (status = 201, description = "Created", body = ApiResponse<flash_sale::Model>),
        (status = 400, description = "Invalid schedule", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn admin_create_sale(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateFlashSaleRequest>,
) -> Result<(StatusCode, Json<ApiResponse<flash_sale::Model>>), ServiceError> {
    let sale = state
        .services
        .flash_sales
        .create_sale(FlashSaleScope::Platform, request)
        .await?;
    Ok(created(sale))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/flash-sales",
    summary = "List all flash sales",
    responses((status = 200, description = "Flash sales", body = ApiResponse<Vec<FlashSaleView>>)),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn admin_list_sales(State(state): State<AppState>) -> ApiResult<Vec<FlashSaleView>> {
    let sales = state
        .services
        .flash_sales
        .list_sales(FlashSaleScope::Platform)
        .await?;
    Ok(Json(ApiResponse::success(sales)))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/flash-sales/{id}",
    summary = "Get flash sale",
    params(("id" = Uuid, Path, description = "Flash sale id")),
    responses(
        (status = 200, description = "Flash sale", body = ApiResponse<FlashSaleView>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn admin_get_sale(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<FlashSaleView> {
    let sale = state
        .services
        .flash_sales
        .get_sale(FlashSaleScope::Platform, id)
        .await?;
    Ok(Json(ApiResponse::success(sale)))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/flash-sales/{id}",
    summary = "Update flash sale",
    params(("id" = Uuid, Path, description = "Flash sale id")),
    request_body = UpdateFlashSaleRequest,
    responses((status = 200, description = "Updated", body = ApiResponse<flash_sale::Model>)),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn admin_update_sale(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateFlashSaleRequest>,
) -> ApiResult<flash_sale::Model> {
    let sale = state
        .services
        .flash_sales
        .update_sale(FlashSaleScope::Platform, id, request)
        .await?;
    Ok(Json(ApiResponse::success(sale)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/flash-sales/{id}",
    summary = "Delete flash sale",
    params(("id" = Uuid, Path, description = "Flash sale id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 409, description = "Items already sold", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn admin_delete_sale(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state
        .services
        .flash_sales
        .delete_sale(FlashSaleScope::Platform, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/flash-sales/{id}/items",
    summary = "Add item to flash sale",
    params(("id" = Uuid, Path, description = "Flash sale id")),
    request_body = AddFlashSaleItemRequest,
    responses(
        (status = 201, description = "Added", body = ApiResponse<FlashSaleItemView>),
        (status = 400, description = "Invalid pricing", body = crate::errors::ErrorResponse),
        (
            status = 409,
            description = "Product already in sale",
            body = crate::errors::ErrorResponse
        ),
    ),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn admin_add_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<AddFlashSaleItemRequest>,
) -> Result<(StatusCode, Json<ApiResponse<FlashSaleItemView>>), ServiceError> {
    let item = state
        .services
        .flash_sales
        .add_item(FlashSaleScope::Platform, id, request)
        .await?;
    Ok(created(item))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/flash-sales/{id}/items/{item_id}",
    summary = "Update flash sale item",
    params(
        ("id" = Uuid, Path, description = "Flash sale id"),
        ("item_id" = Uuid, Path, description = "Item id"),
    ),
    request_body = UpdateFlashSaleItemRequest,
    responses((status = 200, description = "Updated", body = ApiResponse<FlashSaleItemView>)),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn admin_update_item(
    State(state): State<AppState>,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
    ValidatedJson(request): ValidatedJson<UpdateFlashSaleItemRequest>,
) -> ApiResult<FlashSaleItemView> {
    let item = state
        .services
        .flash_sales
        .update_item(FlashSaleScope::Platform, id, item_id, request)
        .await?;
    Ok(Json(ApiResponse::success(item)))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/flash-sales/{id}/items/{item_id}/recalculate",
    summary = "Reprice item from current product price",
    params(
        ("id" = Uuid, Path, description = "Flash sale id"),
        ("item_id" = Uuid, Path, description = "Item id"),
    ),
    responses((status = 200, description = "Repriced", body = ApiResponse<FlashSaleItemView>)),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn admin_recalculate_item(
    State(state): State<AppState>,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<FlashSaleItemView> {
    let item = state
        .services
        .flash_sales
        .recalculate_item(FlashSaleScope::Platform, id, item_id)
        .await?;
    Ok(Json(ApiResponse::success(item)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/flash-sales/{id}/items/{item_id}",
    summary = "Remove flash sale item",
    params(
        ("id" = Uuid, Path, description = "Flash sale id"),
        ("item_id" = Uuid, Path, description = "Item id"),
    ),
    responses(
        (status = 204, description = "Removed"),
        (status = 409, description = "Item already sold", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn admin_delete_item(
    State(state): State<AppState>,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ServiceError> {
    state
        .services
        .flash_sales
        .delete_item(FlashSaleScope::Platform, id, item_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// Store flash sales

#[utoipa::path(
    post,
    path = "/api/v1/seller/flash-sales",
    summary = "Create store flash sale",
    request_body = CreateFlashSaleRequest,
    responses((status = 201, description = "Created", body = ApiResponse<flash_sale::Model>)),
    security(("Bearer" = [])),
    tag = "seller"
)]
pub async fn seller_create_sale(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(request): ValidatedJson<CreateFlashSaleRequest>,
) -> Result<(StatusCode, Json<ApiResponse<flash_sale::Model>>), ServiceError> {
    let scope = store_scope(&state, &user).await?;
    let sale = state.services.flash_sales.create_sale(scope, request).await?;
    Ok(created(sale))
}

#[utoipa::path(
    get,
    path = "/api/v1/seller/flash-sales",
    summary = "List store flash sales",
    responses((status = 200, description = "Flash sales", body = ApiResponse<Vec<FlashSaleView>>)),
    security(("Bearer" = [])),
    tag = "seller"
)]
pub async fn seller_list_sales(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Vec<FlashSaleView>> {
    let scope = store_scope(&state, &user).await?;
    let sales = state.services.flash_sales.list_sales(scope).await?;
    Ok(Json(ApiResponse::success(sales)))
}

#[utoipa::path(
    get,
    path = "/api/v1/seller/flash-sales/{id}",
    summary = "Get store flash sale",
    params(("id" = Uuid, Path, description = "Flash sale id")),
    responses(
        (status = 200, description = "Flash sale", body = ApiResponse<FlashSaleView>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "seller"
)]
pub async fn seller_get_sale(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<FlashSaleView> {
    let scope = store_scope(&state, &user).await?;
    let sale = state.services.flash_sales.get_sale(scope, id).await?;
    Ok(Json(ApiResponse::success(sale)))
}

#[utoipa::path(
    put,
    path = "/api/v1/seller/flash-sales/{id}",
    summary = "Update store flash sale",
    params(("id" = Uuid, Path, description = "Flash sale id")),
    request_body = UpdateFlashSaleRequest,
    responses((status = 200, description = "Updated", body = ApiResponse<flash_sale::Model>)),
    security(("Bearer" = [])),
    tag = "seller"
)]
pub async fn seller_update_sale(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateFlashSaleRequest>,
) -> ApiResult<flash_sale::Model> {
    let scope = store_scope(&state, &user).await?;
    let sale = state
        .services
        .flash_sales
        .update_sale(scope, id, request)
        .await?;
    Ok(Json(ApiResponse::success(sale)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/seller/flash-sales/{id}",
    summary = "Delete store flash sale",
    params(("id" = Uuid, Path, description = "Flash sale id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 409, description = "Items already sold", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "seller"
)]
pub async fn seller_delete_sale(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    let scope = store_scope(&state, &user).await?;
    state.services.flash_sales.delete_sale(scope, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/v1/seller/flash-sales/{id}/items",
    summary = "Add own product to flash sale",
    params(("id" = Uuid, Path, description = "Flash sale id")),
    request_body = AddFlashSaleItemRequest,
    responses(
        (status = 201, description = "Added", body = ApiResponse<FlashSaleItemView>),
        (
            status = 404,
            description = "Product not in this store",
            body = crate::errors::ErrorResponse
        ),
    ),
    security(("Bearer" = [])),
    tag = "seller"
)]
pub async fn seller_add_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<AddFlashSaleItemRequest>,
) -> Result<(StatusCode, Json<ApiResponse<FlashSaleItemView>>), ServiceError> {
    let scope = store_scope(&state, &user).await?;
    let item = state
        .services
        .flash_sales
        .add_item(scope, id, request)
        .await?;
    Ok(created(item))
}

#[utoipa::path(
    put,
    path = "/api/v1/seller/flash-sales/{id}/items/{item_id}",
    summary = "Update store flash sale item",
    params(
        ("id" = Uuid, Path, description = "Flash sale id"),
        ("item_id" = Uuid, Path, description = "Item id"),
    ),
    request_body = UpdateFlashSaleItemRequest,
    responses((status = 200, description = "Updated", body = ApiResponse<FlashSaleItemView>)),
    security(("Bearer" = [])),
    tag = "seller"
)]
pub async fn seller_update_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
    ValidatedJson(request): ValidatedJson<UpdateFlashSaleItemRequest>,
) -> ApiResult<FlashSaleItemView> {
    let scope = store_scope(&state, &user).await?;
    let item = state
        .services
        .flash_sales
        .update_item(scope, id, item_id, request)
        .await?;
    Ok(Json(ApiResponse::success(item)))
}

#[utoipa::path(
    post,
    path = "/api/v1/seller/flash-sales/{id}/items/{item_id}/recalculate",
    summary = "Reprice store flash sale item",
    params(
        ("id" = Uuid, Path, description = "Flash sale id"),
        ("item_id" = Uuid, Path, description = "Item id"),
    ),
    responses((status = 200, description = "Repriced", body = ApiResponse<FlashSaleItemView>)),
    security(("Bearer" = [])),
    tag = "seller"
)]
pub async fn seller_recalculate_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<FlashSaleItemView> {
    let scope = store_scope(&state, &user).await?;
    let item = state
        .services
        .flash_sales
        .recalculate_item(scope, id, item_id)
        .await?;
    Ok(Json(ApiResponse::success(item)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/seller/flash-sales/{id}/items/{item_id}",
    summary = "Remove store flash sale item",
    params(
        ("id" = Uuid, Path, description = "Flash sale id"),
        ("item_id" = Uuid, Path, description = "Item id"),
    ),
    responses((status = 204, description = "Removed")),
    security(("Bearer" = [])),
    tag = "seller"
)]
pub async fn seller_delete_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ServiceError> {
    let scope = store_scope(&state, &user).await?;
    state
        .services
        .flash_sales
        .delete_item(scope, id, item_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// Storefront

#[utoipa::path(
    get,
    path = "/api/v1/store/flash-sales",
    summary = "Current and upcoming flash sales",
    responses((status = 200, description = "Flash sales", body = ApiResponse<Vec<FlashSaleView>>)),
    tag = "storefront"
)]
pub async fn storefront_sales(State(state): State<AppState>) -> ApiResult<Vec<FlashSaleView>> {
    let sales = state.services.flash_sales.storefront_sales().await?;
    Ok(Json(ApiResponse::success(sales)))
}

#[utoipa::path(
    get,
    path = "/api/v1/store/flash-sales/{id}",
    summary = "Flash sale page",
    params(("id" = Uuid, Path, description = "Flash sale id")),
    responses(
        (status = 200, description = "Flash sale", body = ApiResponse<FlashSaleView>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    tag = "storefront"
)]
pub async fn storefront_sale(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<FlashSaleView> {
    let sale = state.services.flash_sales.storefront_sale(id).await?;
    Ok(Json(ApiResponse::success(sale)))
}
