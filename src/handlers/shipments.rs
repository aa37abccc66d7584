use super::common::{created, seller_store, ValidatedJson};
use crate::{
    auth::AuthUser,
    errors::ServiceError,
    services::shipments::{CreateShipmentRequest, ShipmentStatusRequest, ShipmentView},
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
    path = "/api/v1/seller/orders/{id}/shipments",
    summary = "Ship an order",
    description = "Only paid or processing orders of the seller's store",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = CreateShipmentRequest,
    responses(
        (status = 201, description = "Shipment created", body = ApiResponse<ShipmentView>),
        (status = 400, description = "Order not shippable", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "seller"
)]
pub async fn create_shipment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<CreateShipmentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ShipmentView>>), ServiceError> {
    let store = seller_store(&state, &user).await?;
    let shipment = state
        .services
        .shipments
        .create_shipment(store.id, order_id, request)
        .await?;
    Ok(created(shipment))
}

#[utoipa::path(
    get,
    path = "/api/v1/seller/shipments",
    summary = "List store shipments",
    responses((status = 200, description = "Shipments", body = ApiResponse<Vec<ShipmentView>>)),
    security(("Bearer" = [])),
    tag = "seller"
)]
pub async fn list_store_shipments(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Vec<ShipmentView>> {
    let store = seller_store(&state, &user).await?;
    let shipments = state.services.shipments.list_for_store(store.id).await?;
    Ok(Json(ApiResponse::success(shipments)))
}

#[utoipa::path(
    put,
    path = "/api/v1/seller/shipments/{id}/status",
    summary = "Update shipment status",
    description = "Delivered shipments also mark the order delivered",
    params(("id" = Uuid, Path, description = "Shipment id")),
    request_body = ShipmentStatusRequest,
    responses(
        (status = 200, description = "Updated", body = ApiResponse<ShipmentView>),
        (status = 400, description = "Invalid transition", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "seller"
)]
pub async fn update_shipment_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<ShipmentStatusRequest>,
) -> ApiResult<ShipmentView> {
    let store = seller_store(&state, &user).await?;
    let shipment = state
        .services
        .shipments
        .update_status(store.id, id, request)
        .await?;
    Ok(Json(ApiResponse::success(shipment)))
}

#[utoipa::path(
    get,
    path = "/api/v1/account/orders/{id}/shipments",
    summary = "Track my order",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Shipments", body = ApiResponse<Vec<ShipmentView>>),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "account"
)]
pub async fn list_order_shipments(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<Uuid>,
) -> ApiResult<Vec<ShipmentView>> {
    let shipments = state
        .services
        .shipments
        .list_for_buyer(user.user_id, order_id)
        .await?;
    Ok(Json(ApiResponse::success(shipments)))
}
