use super::common::{created, ValidatedJson};
use crate::{
    auth::AuthUser,
    entities::{affiliate, commission},
    errors::ServiceError,
    services::affiliates::{
        AffiliateApplicationRequest, AffiliateDashboard, AffiliateListQuery, CommissionListQuery,
        CommissionStatusRequest, UpdateAffiliateRequest,
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
    path = "/api/v1/account/affiliate",
    summary = "Join the affiliate program",
    description = "Issues a referral code; the account starts pending approval",
    request_body = AffiliateApplicationRequest,
    responses(
        (status = 201, description = "Application received", body = ApiResponse<affiliate::Model>),
        (status = 409, description = "Already applied", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "account"
)]
pub async fn apply(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(request): ValidatedJson<AffiliateApplicationRequest>,
) -> Result<(StatusCode, Json<ApiResponse<affiliate::Model>>), ServiceError> {
    let affiliate = state
        .services
        .affiliates
        .apply(user.user_id, request)
        .await?;
    Ok(created(affiliate))
}

#[utoipa::path(
    get,
    path = "/api/v1/account/affiliate",
    summary = "Affiliate dashboard",
    responses(
        (status = 200, description = "Dashboard", body = ApiResponse<AffiliateDashboard>),
        (status = 404, description = "Not an affiliate", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "account"
)]
pub async fn dashboard(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<AffiliateDashboard> {
    let dashboard = state.services.affiliates.dashboard(user.user_id).await?;
    Ok(Json(ApiResponse::success(dashboard)))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/affiliates",
    summary = "List affiliates",
    params(AffiliateListQuery),
    responses(
        (status = 200, description = "Affiliates", body = ApiResponse<Vec<affiliate::Model>>),
    ),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn list_affiliates(
    State(state): State<AppState>,
    Query(query): Query<AffiliateListQuery>,
) -> ApiResult<Vec<affiliate::Model>> {
    let affiliates = state.services.affiliates.list_affiliates(query.status).await?;
    Ok(Json(ApiResponse::success(affiliates)))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/affiliates/{id}",
    summary = "Approve, suspend or re-rate an affiliate",
    params(("id" = Uuid, Path, description = "Affiliate id")),
    request_body = UpdateAffiliateRequest,
    responses(
        (status = 200, description = "Updated", body = ApiResponse<affiliate::Model>),
        (status = 400, description = "Invalid rate", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn update_affiliate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateAffiliateRequest>,
) -> ApiResult<affiliate::Model> {
    let affiliate = state
        .services
        .affiliates
        .update_affiliate(id, request)
        .await?;
    Ok(Json(ApiResponse::success(affiliate)))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/commissions",
    summary = "List commissions",
    params(CommissionListQuery),
    responses(
        (status = 200, description = "Commissions", body = ApiResponse<Vec<commission::Model>>),
    ),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn list_commissions(
    State(state): State<AppState>,
    Query(query): Query<CommissionListQuery>,
) -> ApiResult<Vec<commission::Model>> {
    let commissions = state.services.affiliates.list_commissions(&query).await?;
    Ok(Json(ApiResponse::success(commissions)))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/commissions/{id}/status",
    summary = "Approve, pay or cancel a commission",
    params(("id" = Uuid, Path, description = "Commission id")),
    request_body = CommissionStatusRequest,
    responses(
        (status = 200, description = "Updated", body = ApiResponse<commission::Model>),
        (status = 400, description = "Invalid transition", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn set_commission_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<CommissionStatusRequest>,
) -> ApiResult<commission::Model> {
    let commission = state
        .services
        .affiliates
        .set_commission_status(id, request.status)
        .await?;
    Ok(Json(ApiResponse::success(commission)))
}
