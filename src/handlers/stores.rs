use super::common::{created, page, paginated, seller_store, ValidatedJson};
use crate::{
    auth::AuthUser,
    entities::store,
    errors::ServiceError,
    services::stores::{CreateStoreRequest, StoreListQuery, StoreStatusRequest, UpdateStoreRequest},
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
    path = "/api/v1/account/store",
    summary = "Apply for a store",
    description = "One store per account; it starts pending review",
    request_body = CreateStoreRequest,
    responses(
        (status = 201, description = "Application received", body = ApiResponse<store::Model>),
        (status = 400, description = "Invalid input", body = crate::errors::ErrorResponse),
        (
            status = 409,
            description = "Already applied or slug taken",
            body = crate::errors::ErrorResponse
        ),
    ),
    security(("Bearer" = [])),
    tag = "account"
)]
pub async fn apply_for_store(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(request): ValidatedJson<CreateStoreRequest>,
) -> Result<(StatusCode, Json<ApiResponse<store::Model>>), ServiceError> {
    let store = state.services.stores.apply(user.user_id, request).await?;
    Ok(created(store))
}

#[utoipa::path(
    get,
    path = "/api/v1/account/store",
    summary = "Own store application",
    description = "Shows the caller's store in any status",
    responses(
        (status = 200, description = "Store", body = ApiResponse<store::Model>),
        (status = 404, description = "No application", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "account"
)]
pub async fn get_own_application(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<store::Model> {
    let store = state.services.stores.get_own(user.user_id).await?;
    Ok(Json(ApiResponse::success(store)))
}

#[utoipa::path(
    get,
    path = "/api/v1/seller/store",
    summary = "Seller store",
    responses(
        (status = 200, description = "Store", body = ApiResponse<store::Model>),
        (status = 403, description = "No active store", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "seller"
)]
pub async fn get_seller_store(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<store::Model> {
    let store = seller_store(&state, &user).await?;
    Ok(Json(ApiResponse::success(store)))
}

#[utoipa::path(
    put,
    path = "/api/v1/seller/store",
    summary = "Edit seller store",
    request_body = UpdateStoreRequest,
    responses(
        (status = 200, description = "Updated", body = ApiResponse<store::Model>),
        (status = 400, description = "Invalid input", body = crate::errors::ErrorResponse),
        (status = 403, description = "No active store", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "seller"
)]
pub async fn update_seller_store(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(request): ValidatedJson<UpdateStoreRequest>,
) -> ApiResult<store::Model> {
    let store = seller_store(&state, &user).await?;
    let updated = state.services.stores.update_store(store, request).await?;
    Ok(Json(ApiResponse::success(updated)))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/stores",
    summary = "List stores",
    params(StoreListQuery),
    responses(
        (status = 200, description = "Stores", body = ApiResponse<PaginatedResponse<store::Model>>),
    ),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn list_stores(
    State(state): State<AppState>,
    Query(query): Query<StoreListQuery>,
) -> ApiResult<PaginatedResponse<store::Model>> {
    let page = page(&state, query.page, query.limit);
    let (stores, total) = state.services.stores.list_stores(&query, page).await?;
    Ok(Json(ApiResponse::success(paginated(stores, total, page))))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/stores/{id}",
    summary = "Get store",
    params(("id" = Uuid, Path, description = "Store id")),
    responses(
        (status = 200, description = "Store", body = ApiResponse<store::Model>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn get_store(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<store::Model> {
    let store = state.services.stores.get_store(id).await?;
    Ok(Json(ApiResponse::success(store)))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/stores/{id}/status",
    summary = "Moderate store",
    description = "Approving a store promotes its owner to seller",
    params(("id" = Uuid, Path, description = "Store id")),
    request_body = StoreStatusRequest,
    responses(
        (status = 200, description = "Updated", body = ApiResponse<store::Model>),
        (status = 400, description = "Invalid transition", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn change_store_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<StoreStatusRequest>,
) -> ApiResult<store::Model> {
    let store = state.services.stores.change_status(id, request.status).await?;
    Ok(Json(ApiResponse::success(store)))
}

#[utoipa::path(
    get,
    path = "/api/v1/store/stores/{slug}",
    summary = "Public store page",
    params(("slug" = String, Path, description = "Store slug")),
    responses(
        (status = 200, description = "Store", body = ApiResponse<store::Model>),
        (
            status = 404,
            description = "Not found or not active",
            body = crate::errors::ErrorResponse
        ),
    ),
    tag = "storefront"
)]
pub async fn get_public_store(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<store::Model> {
    let store = state.services.stores.get_public_store(&slug).await?;
    Ok(Json(ApiResponse::success(store)))
}
