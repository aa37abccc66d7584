use super::common::{created, seller_store, ValidatedJson};
use crate::{
    auth::AuthUser,
    entities::promotion,
    errors::ServiceError,
    services::promotions::{
        CreatePromotionRequest, PromotionListQuery, PromotionQuote, PromotionScope,
        UpdatePromotionRequest, ValidatePromotionRequest,
    },
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

type Created = Result<(StatusCode, Json<ApiResponse<promotion::Model>>), ServiceError>;

async fn store_scope(state: &AppState, user: &AuthUser) -> Result<PromotionScope, ServiceError> {
    Ok(PromotionScope::Store(seller_store(state, user).await?.id))
}

// Platform-wide promotions

#[utoipa::path(
    post,
    path = "/api/v1/admin/promotions",
    summary = "Create platform promotion",
    request_body = CreatePromotionRequest,
    responses(
        (status = 201, description = "Created", body = ApiResponse<promotion::Model>),
        (status = 400, description = "Invalid rules", body = crate::errors::ErrorResponse),
        (status = 409, description = "Code taken", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn admin_create_promotion(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreatePromotionRequest>,
) -> Created {
    let promo = state
        .services
        .promotions
        .create_promotion(PromotionScope::Platform, request)
        .await?;
    Ok(created(promo))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/promotions",
    summary = "List all promotions",
    params(PromotionListQuery),
    responses(
        (status = 200, description = "Promotions", body = ApiResponse<Vec<promotion::Model>>),
    ),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn admin_list_promotions(
    State(state): State<AppState>,
    Query(query): Query<PromotionListQuery>,
) -> ApiResult<Vec<promotion::Model>> {
    let promos = state
        .services
        .promotions
        .list_promotions(PromotionScope::Platform, &query)
        .await?;
    Ok(Json(ApiResponse::success(promos)))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/promotions/{id}",
    summary = "Get promotion",
    params(("id" = Uuid, Path, description = "Promotion id")),
    responses(
        (status = 200, description = "Promotion", body = ApiResponse<promotion::Model>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn admin_get_promotion(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<promotion::Model> {
    let promo = state
        .services
        .promotions
        .get_promotion(PromotionScope::Platform, id)
        .await?;
    Ok(Json(ApiResponse::success(promo)))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/promotions/{id}",
    summary = "Update promotion",
    params(("id" = Uuid, Path, description = "Promotion id")),
    request_body = UpdatePromotionRequest,
    responses((status = 200, description = "Updated", body = ApiResponse<promotion::Model>)),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn admin_update_promotion(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdatePromotionRequest>,
) -> ApiResult<promotion::Model> {
    let promo = state
        .services
        .promotions
        .update_promotion(PromotionScope::Platform, id, request)
        .await?;
    Ok(Json(ApiResponse::success(promo)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/promotions/{id}",
    summary = "Delete promotion",
    params(("id" = Uuid, Path, description = "Promotion id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 409, description = "Already redeemed", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn admin_delete_promotion(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state
        .services
        .promotions
        .delete_promotion(PromotionScope::Platform, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// Store promotions

#[utoipa::path(
    post,
    path = "/api/v1/seller/promotions",
    summary = "Create store promotion",
    request_body = CreatePromotionRequest,
    responses(
        (status = 201, description = "Created", body = ApiResponse<promotion::Model>),
        (status = 409, description = "Code taken", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "seller"
)]
pub async fn seller_create_promotion(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(request): ValidatedJson<CreatePromotionRequest>,
) -> Created {
    let scope = store_scope(&state, &user).await?;
    let promo = state
        .services
        .promotions
        .create_promotion(scope, request)
        .await?;
    Ok(created(promo))
}

#[utoipa::path(
    get,
    path = "/api/v1/seller/promotions",
    summary = "List store promotions",
    params(PromotionListQuery),
    responses(
        (status = 200, description = "Promotions", body = ApiResponse<Vec<promotion::Model>>),
    ),
    security(("Bearer" = [])),
    tag = "seller"
)]
pub async fn seller_list_promotions(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<PromotionListQuery>,
) -> ApiResult<Vec<promotion::Model>> {
    let scope = store_scope(&state, &user).await?;
    let promos = state
        .services
        .promotions
        .list_promotions(scope, &query)
        .await?;
    Ok(Json(ApiResponse::success(promos)))
}

#[utoipa::path(
    get,
    path = "/api/v1/seller/promotions/{id}",
    summary = "Get store promotion",
    params(("id" = Uuid, Path, description = "Promotion id")),
    responses(
        (status = 200, description = "Promotion", body = ApiResponse<promotion::Model>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "seller"
)]
pub async fn seller_get_promotion(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<promotion::Model> {
    let scope = store_scope(&state, &user).await?;
    let promo = state.services.promotions.get_promotion(scope, id).await?;
    Ok(Json(ApiResponse::success(promo)))
}

#[utoipa::path(
    put,
    path = "/api/v1/seller/promotions/{id}",
    summary = "Update store promotion",
    params(("id" = Uuid, Path, description = "Promotion id")),
    request_body = UpdatePromotionRequest,
    responses((status = 200, description = "Updated", body = ApiResponse<promotion::Model>)),
    security(("Bearer" = [])),
    tag = "seller"
)]
pub async fn seller_update_promotion(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdatePromotionRequest>,
) -> ApiResult<promotion::Model> {
    let scope = store_scope(&state, &user).await?;
    let promo = state
        .services
        .promotions
        .update_promotion(scope, id, request)
        .await?;
    Ok(Json(ApiResponse::success(promo)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/seller/promotions/{id}",
    summary = "Delete store promotion",
    params(("id" = Uuid, Path, description = "Promotion id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 409, description = "Already redeemed", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "seller"
)]
pub async fn seller_delete_promotion(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    let scope = store_scope(&state, &user).await?;
    state
        .services
        .promotions
        .delete_promotion(scope, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Signed-in shoppers also get their per-user limit checked.
#[utoipa::path(
    post,
    path = "/api/v1/store/promotions/validate",
    summary = "Check a promotion code",
    request_body = ValidatePromotionRequest,
    responses(
        (status = 200, description = "Code applies", body = ApiResponse<PromotionQuote>),
        (status = 400, description = "Code does not apply", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown code", body = crate::errors::ErrorResponse),
    ),
    tag = "storefront"
)]
pub async fn validate_promotion(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    Json(request): Json<ValidatePromotionRequest>,
) -> ApiResult<PromotionQuote> {
    let quote = state
        .services
        .promotions
        .validate_code(&request, user.map(|u| u.user_id))
        .await?;
    Ok(Json(ApiResponse::success(quote)))
}
