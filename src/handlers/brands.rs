use super::common::{created, ValidatedJson};
use crate::{
    entities::brand,
    errors::ServiceError,
    services::brands::{BrandListQuery, CreateBrandRequest, UpdateBrandRequest},
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

#[utoipa::path(
    post,
    path = "/api/v1/admin/brands",
    summary = "Create brand",
    request_body = CreateBrandRequest,
    responses(
        (status = 201, description = "Created", body = ApiResponse<brand::Model>),
        (status = 409, description = "Slug taken", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn create_brand(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateBrandRequest>,
) -> Result<(StatusCode, Json<ApiResponse<brand::Model>>), ServiceError> {
    let brand = state.services.brands.create_brand(request).await?;
    Ok(created(brand))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/brands",
    summary = "List brands",
    responses((status = 200, description = "Brands", body = ApiResponse<Vec<brand::Model>>)),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn list_brands(State(state): State<AppState>) -> ApiResult<Vec<brand::Model>> {
    let brands = state.services.brands.list_brands().await?;
    Ok(Json(ApiResponse::success(brands)))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/brands/{id}",
    summary = "Get brand",
    params(("id" = Uuid, Path, description = "Brand id")),
    responses(
        (status = 200, description = "Brand", body = ApiResponse<brand::Model>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn get_brand(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<brand::Model> {
    let brand = state.services.brands.get_brand(id).await?;
    Ok(Json(ApiResponse::success(brand)))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/brands/{id}",
    summary = "Update brand",
    params(("id" = Uuid, Path, description = "Brand id")),
    request_body = UpdateBrandRequest,
    responses((status = 200, description = "Updated", body = ApiResponse<brand::Model>)),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn update_brand(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateBrandRequest>,
) -> ApiResult<brand::Model> {
    let brand = state.services.brands.update_brand(id, request).await?;
    Ok(Json(ApiResponse::success(brand)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/brands/{id}",
    summary = "Delete brand",
    params(("id" = Uuid, Path, description = "Brand id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 409, description = "Brand has products", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn delete_brand(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.brands.delete_brand(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/v1/store/brands",
    summary = "Public brands",
    params(BrandListQuery),
    responses((status = 200, description = "Active brands", body = ApiResponse<Vec<brand::Model>>)),
    tag = "storefront"
)]
pub async fn public_brands(
    State(state): State<AppState>,
    Query(query): Query<BrandListQuery>,
) -> ApiResult<Vec<brand::Model>> {
    let brands = state
        .services
        .brands
        .list_public_brands(query.featured)
        .await?;
    Ok(Json(ApiResponse::success(brands)))
}
