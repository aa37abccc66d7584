use super::common::{created, ValidatedJson};
use crate::{
    auth::AuthUser,
    entities::banner,
    errors::ServiceError,
    services::banners::{
        BannerAdminQuery, BannerVisitorQuery, CreateBannerRequest, UpdateBannerRequest,
    },
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
    path = "/api/v1/admin/banners",
    summary = "Create banner",
    request_body = CreateBannerRequest,
    responses(
        (status = 201, description = "Created", body = ApiResponse<banner::Model>),
        (
            status = 400,
            description = "Invalid targeting or asset host",
            body = crate::errors::ErrorResponse
        ),
    ),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn create_banner(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateBannerRequest>,
) -> Result<(StatusCode, Json<ApiResponse<banner::Model>>), ServiceError> {
    let banner = state.services.banners.create_banner(request).await?;
    Ok(created(banner))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/banners",
    summary = "List banners",
    params(BannerAdminQuery),
    responses((status = 200, description = "Banners", body = ApiResponse<Vec<banner::Model>>)),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn list_banners(
    State(state): State<AppState>,
    Query(query): Query<BannerAdminQuery>,
) -> ApiResult<Vec<banner::Model>> {
    let banners = state.services.banners.list_banners(&query).await?;
    Ok(Json(ApiResponse::success(banners)))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/banners/{id}",
    summary = "Get banner",
    params(("id" = Uuid, Path, description = "Banner id")),
    responses(
        (status = 200, description = "Banner", body = ApiResponse<banner::Model>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn get_banner(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<banner::Model> {
    let banner = state.services.banners.get_banner(id).await?;
    Ok(Json(ApiResponse::success(banner)))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/banners/{id}",
    summary = "Update banner",
    params(("id" = Uuid, Path, description = "Banner id")),
    request_body = UpdateBannerRequest,
    responses((status = 200, description = "Updated", body = ApiResponse<banner::Model>)),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn update_banner(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateBannerRequest>,
) -> ApiResult<banner::Model> {
    let banner = state.services.banners.update_banner(id, request).await?;
    Ok(Json(ApiResponse::success(banner)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/banners/{id}",
    summary = "Delete banner",
    params(("id" = Uuid, Path, description = "Banner id")),
    responses((status = 204, description = "Deleted")),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn delete_banner(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.banners.delete_banner(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Anonymous visitors see guest-targeted banners; a valid token switches
/// the audience to the signed-in customer.
#[utoipa::path(
    get,
    path = "/api/v1/store/banners",
    summary = "Visible banners",
    params(BannerVisitorQuery),
    responses(
        (status = 200, description = "Banners by priority", body = ApiResponse<Vec<banner::Model>>),
    ),
    tag = "storefront"
)]
pub async fn visible_banners(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    Query(query): Query<BannerVisitorQuery>,
) -> ApiResult<Vec<banner::Model>> {
    let banners = state
        .services
        .banners
        .visible_banners(&query, user.map(|u| u.user_id))
        .await?;
    Ok(Json(ApiResponse::success(banners)))
}

#[utoipa::path(
    post,
    path = "/api/v1/store/banners/{id}/impression",
    summary = "Record impression",
    params(("id" = Uuid, Path, description = "Banner id")),
    responses(
        (status = 204, description = "Recorded"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    tag = "storefront"
)]
pub async fn record_impression(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.banners.record_impression(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/v1/store/banners/{id}/click",
    summary = "Record click",
    params(("id" = Uuid, Path, description = "Banner id")),
    responses(
        (status = 204, description = "Recorded"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    tag = "storefront"
)]
pub async fn record_click(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.banners.record_click(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
