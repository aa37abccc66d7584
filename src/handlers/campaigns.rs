use super::common::{created, ValidatedJson};
use crate::{
    entities::campaign,
    errors::ServiceError,
    services::campaigns::{CampaignListQuery, CreateCampaignRequest, UpdateCampaignRequest},
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
    path = "/api/v1/admin/campaigns",
    summary = "Create campaign",
    request_body = CreateCampaignRequest,
    responses(
        (status = 201, description = "Created", body = ApiResponse<campaign::Model>),
        (status = 400, description = "Invalid window", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn create_campaign(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateCampaignRequest>,
) -> Result<(StatusCode, Json<ApiResponse<campaign::Model>>), ServiceError> {
    let campaign = state.services.campaigns.create_campaign(request).await?;
    Ok(created(campaign))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/campaigns",
    summary = "List campaigns",
    params(CampaignListQuery),
    responses((status = 200, description = "Campaigns", body = ApiResponse<Vec<campaign::Model>>)),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn list_campaigns(
    State(state): State<AppState>,
    Query(query): Query<CampaignListQuery>,
) -> ApiResult<Vec<campaign::Model>> {
    let campaigns = state.services.campaigns.list_campaigns(query.status).await?;
    Ok(Json(ApiResponse::success(campaigns)))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/campaigns/{id}",
    summary = "Get campaign",
    params(("id" = Uuid, Path, description = "Campaign id")),
    responses(
        (status = 200, description = "Campaign", body = ApiResponse<campaign::Model>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn get_campaign(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<campaign::Model> {
    let campaign = state.services.campaigns.get_campaign(id).await?;
    Ok(Json(ApiResponse::success(campaign)))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/campaigns/{id}",
    summary = "Update campaign",
    params(("id" = Uuid, Path, description = "Campaign id")),
    request_body = UpdateCampaignRequest,
    responses((status = 200, description = "Updated", body = ApiResponse<campaign::Model>)),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn update_campaign(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateCampaignRequest>,
) -> ApiResult<campaign::Model> {
    let campaign = state
        .services
        .campaigns
        .update_campaign(id, request)
        .await?;
    Ok(Json(ApiResponse::success(campaign)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/campaigns/{id}",
    summary = "Delete campaign",
    description = "Banners in the campaign are detached, not deleted",
    params(("id" = Uuid, Path, description = "Campaign id")),
    responses((status = 204, description = "Deleted")),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn delete_campaign(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.campaigns.delete_campaign(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
