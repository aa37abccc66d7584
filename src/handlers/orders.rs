use super::common::{created, page, paginated, seller_store, ValidatedJson};
use crate::{
    auth::AuthUser,
    entities::order,
    errors::ServiceError,
    services::orders::{OrderDetail, OrderListQuery, OrderStatusRequest, PlaceOrderRequest},
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::info;
use uuid::Uuid;

#[utoipa::path(
    post,
    path = "/api/v1/account/orders",
    summary = "Place an order",
    description = "Prices the cart against live flash sales, promotions and shipping, \
                   then reserves stock atomically",
    request_body = PlaceOrderRequest,
    responses(
        (status = 201, description = "Order placed", body = ApiResponse<OrderDetail>),
        (status = 400, description = "Invalid cart", body = crate::errors::ErrorResponse),
        (
            status = 409,
            description = "Out of stock or sold out",
            body = crate::errors::ErrorResponse
        ),
    ),
    security(("Bearer" = [])),
    tag = "account"
)]
pub async fn place_order(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(request): ValidatedJson<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<OrderDetail>>), ServiceError> {
    let detail = state
        .services
        .orders
        .place_order(user.user_id, request)
        .await?;
    info!(order_id = %detail.order.id, order_number = %detail.order.order_number, "Order placed");
    Ok(created(detail))
}

#[utoipa::path(
    get,
    path = "/api/v1/account/orders",
    summary = "My orders",
    params(OrderListQuery),
    responses(
        (status = 200, description = "Orders", body = ApiResponse<PaginatedResponse<order::Model>>),
    ),
    security(("Bearer" = [])),
    tag = "account"
)]
pub async fn list_my_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> ApiResult<PaginatedResponse<order::Model>> {
    let page = page(&state, query.page, query.limit);
    let (orders, total) = state
        .services
        .orders
        .list_for_user(user.user_id, query.status, page)
        .await?;
    Ok(Json(ApiResponse::success(paginated(orders, total, page))))
}

#[utoipa::path(
    get,
    path = "/api/v1/account/orders/{id}",
    summary = "My order",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order", body = ApiResponse<OrderDetail>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "account"
)]
pub async fn get_my_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<OrderDetail> {
    let detail = state.services.orders.get_for_user(user.user_id, id).await?;
    Ok(Json(ApiResponse::success(detail)))
}

#[utoipa::path(
    post,
    path = "/api/v1/account/orders/{id}/cancel",
    summary = "Cancel my order",
    description = "Allowed while pending or paid; restores stock and flash sale quantity",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Cancelled", body = ApiResponse<OrderDetail>),
        (status = 400, description = "No longer cancellable", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "account"
)]
pub async fn cancel_my_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<OrderDetail> {
    let detail = state
        .services
        .orders
        .cancel_for_user(user.user_id, id)
        .await?;
    Ok(Json(ApiResponse::success(detail)))
}

#[utoipa::path(
    get,
    path = "/api/v1/seller/orders",
    summary = "Store orders",
    params(OrderListQuery),
    responses(
        (status = 200, description = "Orders", body = ApiResponse<PaginatedResponse<order::Model>>),
    ),
    security(("Bearer" = [])),
    tag = "seller"
)]
pub async fn list_store_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> ApiResult<PaginatedResponse<order::Model>> {
    let store = seller_store(&state, &user).await?;
    let page = page(&state, query.page, query.limit);
    let (orders, total) = state
        .services
        .orders
        .list_for_store(store.id, query.status, page)
        .await?;
    Ok(Json(ApiResponse::success(paginated(orders, total, page))))
}

#[utoipa::path(
    get,
    path = "/api/v1/seller/orders/{id}",
    summary = "Store order",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order", body = ApiResponse<OrderDetail>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "seller"
)]
pub async fn get_store_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<OrderDetail> {
    let store = seller_store(&state, &user).await?;
    let detail = state.services.orders.get_for_store(store.id, id).await?;
    Ok(Json(ApiResponse::success(detail)))
}

#[utoipa::path(
    put,
    path = "/api/v1/seller/orders/{id}/status",
    summary = "Advance a store order",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = OrderStatusRequest,
    responses(
        (status = 200, description = "Updated", body = ApiResponse<OrderDetail>),
        (status = 400, description = "Invalid transition", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "seller"
)]
pub async fn set_store_order_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<OrderStatusRequest>,
) -> ApiResult<OrderDetail> {
    let store = seller_store(&state, &user).await?;
    let detail = state
        .services
        .orders
        .set_store_status(store.id, id, request.status)
        .await?;
    Ok(Json(ApiResponse::success(detail)))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/orders",
    summary = "All orders",
    params(OrderListQuery),
    responses(
        (status = 200, description = "Orders", body = ApiResponse<PaginatedResponse<order::Model>>),
    ),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn list_all_orders(
    State(state): State<AppState>,
    Query(query): Query<OrderListQuery>,
) -> ApiResult<PaginatedResponse<order::Model>> {
    let page = page(&state, query.page, query.limit);
    let (orders, total) = state.services.orders.list_all(&query, page).await?;
    Ok(Json(ApiResponse::success(paginated(orders, total, page))))
}
