use super::common::{created, ValidatedJson};
use crate::{
    entities::category,
    errors::ServiceError,
    services::categories::{CategoryNode, CreateCategoryRequest, UpdateCategoryRequest},
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

#[utoipa::path(
    post,
    path = "/api/v1/admin/categories",
    summary = "Create category",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Created", body = ApiResponse<category::Model>),
        (status = 400, description = "Invalid input", body = crate::errors::ErrorResponse),
        (status = 409, description = "Slug taken", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn create_category(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<category::Model>>), ServiceError> {
    let category = state.services.categories.create_category(request).await?;
    Ok(created(category))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/categories",
    summary = "List categories",
    description = "Flat list in display order",
    responses((status = 200, description = "Categories", body = ApiResponse<Vec<category::Model>>)),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Vec<category::Model>> {
    let categories = state.services.categories.list_categories().await?;
    Ok(Json(ApiResponse::success(categories)))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/categories/{id}",
    summary = "Get category",
    params(("id" = Uuid, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category", body = ApiResponse<category::Model>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<category::Model> {
    let category = state.services.categories.get_category(id).await?;
    Ok(Json(ApiResponse::success(category)))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/categories/{id}",
    summary = "Update category",
    description = "Reparenting under the category itself or a descendant is rejected",
    params(("id" = Uuid, Path, description = "Category id")),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Updated", body = ApiResponse<category::Model>),
        (status = 400, description = "Invalid input or cycle", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateCategoryRequest>,
) -> ApiResult<category::Model> {
    let category = state
        .services
        .categories
        .update_category(id, request)
        .await?;
    Ok(Json(ApiResponse::success(category)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/categories/{id}",
    summary = "Delete category",
    params(("id" = Uuid, Path, description = "Category id")),
    responses(
        (status = 204, description = "Deleted"),
        (
            status = 409,
            description = "Has children or products",
            body = crate::errors::ErrorResponse
        ),
    ),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.categories.delete_category(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/v1/store/categories",
    summary = "Category tree",
    description = "Active categories nested under their parents",
    responses((status = 200, description = "Tree", body = ApiResponse<Vec<CategoryNode>>)),
    tag = "storefront"
)]
pub async fn category_tree(State(state): State<AppState>) -> ApiResult<Vec<CategoryNode>> {
    let tree = state.services.categories.category_tree().await?;
    Ok(Json(ApiResponse::success(tree)))
}
