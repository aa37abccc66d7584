use super::common::{created, ValidatedJson};
use crate::{
    entities::{shipping_provider, shipping_rate},
    errors::ServiceError,
    services::shipping::{
        CreateProviderRequest, CreateRateRequest, RateListQuery, ShippingQuote,
        ShippingQuoteRequest, UpdateProviderRequest, UpdateRateRequest,
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
    path = "/api/v1/admin/shipping/providers",
    summary = "Create shipping provider",
    request_body = CreateProviderRequest,
    responses(
        (status = 201, description = "Created", body = ApiResponse<shipping_provider::Model>),
        (status = 409, description = "Code taken", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn create_provider(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateProviderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<shipping_provider::Model>>), ServiceError> {
    let provider = state.services.shipping.create_provider(request).await?;
    Ok(created(provider))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/shipping/providers",
    summary = "List shipping providers",
    responses(
        (
            status = 200,
            description = "Providers",
            body = ApiResponse<Vec<shipping_provider::Model>>
        ),
    ),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn list_providers(
    State(state): State<AppState>,
) -> ApiResult<Vec<shipping_provider::Model>> {
    let providers = state.services.shipping.list_providers().await?;
    Ok(Json(ApiResponse::success(providers)))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/shipping/providers/{id}",
    summary = "Get shipping provider",
    params(("id" = Uuid, Path, description = "Provider id")),
    responses(
        (status = 200, description = "Provider", body = ApiResponse<shipping_provider::Model>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn get_provider(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<shipping_provider::Model> {
    let provider = state.services.shipping.get_provider(id).await?;
    Ok(Json(ApiResponse::success(provider)))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/shipping/providers/{id}",
    summary = "Update shipping provider",
    params(("id" = Uuid, Path, description = "Provider id")),
    request_body = UpdateProviderRequest,
    responses(
        (status = 200, description = "Updated", body = ApiResponse<shipping_provider::Model>),
    ),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn update_provider(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateProviderRequest>,
) -> ApiResult<shipping_provider::Model> {
    let provider = state.services.shipping.update_provider(id, request).await?;
    Ok(Json(ApiResponse::success(provider)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/shipping/providers/{id}",
    summary = "Delete shipping provider",
    description = "Refused while shipments reference the provider; its rates go with it",
    params(("id" = Uuid, Path, description = "Provider id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 409, description = "Provider has shipments", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn delete_provider(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.shipping.delete_provider(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/shipping/rates",
    summary = "Create shipping rate",
    request_body = CreateRateRequest,
    responses(
        (status = 201, description = "Created", body = ApiResponse<shipping_rate::Model>),
        (status = 400, description = "Invalid numbers", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn create_rate(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateRateRequest>,
) -> Result<(StatusCode, Json<ApiResponse<shipping_rate::Model>>), ServiceError> {
    let rate = state.services.shipping.create_rate(request).await?;
    Ok(created(rate))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/shipping/rates",
    summary = "List shipping rates",
    params(RateListQuery),
    responses((status = 200, description = "Rates", body = ApiResponse<Vec<shipping_rate::Model>>)),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn list_rates(
    State(state): State<AppState>,
    Query(query): Query<RateListQuery>,
) -> ApiResult<Vec<shipping_rate::Model>> {
    let rates = state.services.shipping.list_rates(query.provider_id).await?;
    Ok(Json(ApiResponse::success(rates)))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/shipping/rates/{id}",
    summary = "Get shipping rate",
    params(("id" = Uuid, Path, description = "Rate id")),
    responses(
        (status = 200, description = "Rate", body = ApiResponse<shipping_rate::Model>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn get_rate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<shipping_rate::Model> {
    let rate = state.services.shipping.get_rate(id).await?;
    Ok(Json(ApiResponse::success(rate)))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/shipping/rates/{id}",
    summary = "Update shipping rate",
    params(("id" = Uuid, Path, description = "Rate id")),
    request_body = UpdateRateRequest,
    responses((status = 200, description = "Updated", body = ApiResponse<shipping_rate::Model>)),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn update_rate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateRateRequest>,
) -> ApiResult<shipping_rate::Model> {
    let rate = state.services.shipping.update_rate(id, request).await?;
    Ok(Json(ApiResponse::success(rate)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/shipping/rates/{id}",
    summary = "Delete shipping rate",
    params(("id" = Uuid, Path, description = "Rate id")),
    responses((status = 204, description = "Deleted")),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn delete_rate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.shipping.delete_rate(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/v1/store/shipping/quote",
    summary = "Quote shipping options",
    description = "Every active rate that covers the destination and weight, cheapest first",
    request_body = ShippingQuoteRequest,
    responses(
        (status = 200, description = "Options", body = ApiResponse<Vec<ShippingQuote>>),
        (
            status = 400,
            description = "Invalid destination or weight",
            body = crate::errors::ErrorResponse
        ),
    ),
    tag = "storefront"
)]
pub async fn quote(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<ShippingQuoteRequest>,
) -> ApiResult<Vec<ShippingQuote>> {
    let options = state.services.shipping.quote(&request).await?;
    Ok(Json(ApiResponse::success(options)))
}
