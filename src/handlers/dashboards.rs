use super::common::seller_store;
use crate::{
    auth::AuthUser,
    services::dashboards::{AdminDashboard, SellerDashboard},
    ApiResponse, ApiResult, AppState,
};
use axum::{extract::State, Json};

#[utoipa::path(
    get,
    path = "/api/v1/seller/dashboard",
    summary = "Store dashboard",
    description = "Product count, order stats and low-stock products",
    responses((status = 200, description = "Dashboard", body = ApiResponse<SellerDashboard>)),
    security(("Bearer" = [])),
    tag = "seller"
)]
pub async fn seller_dashboard(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<SellerDashboard> {
    let store = seller_store(&state, &user).await?;
    let dashboard = state.services.dashboards.seller_dashboard(store.id).await?;
    Ok(Json(ApiResponse::success(dashboard)))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/dashboard",
    summary = "Platform dashboard",
    responses((status = 200, description = "Dashboard", body = ApiResponse<AdminDashboard>)),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn admin_dashboard(State(state): State<AppState>) -> ApiResult<AdminDashboard> {
    let dashboard = state.services.dashboards.admin_dashboard().await?;
    Ok(Json(ApiResponse::success(dashboard)))
}
