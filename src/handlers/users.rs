use super::common::{page, paginated, ValidatedJson};
use crate::{
    auth::AuthUser,
    services::users::{
        ChangeRoleRequest, ChangeStatusRequest, UpdateProfileRequest, UserListQuery, UserProfile,
    },
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// Account with its order count, for moderation
#[derive(Debug, Serialize, ToSchema)]
pub struct UserDetail {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub order_count: u64,
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/users",
    summary = "List users",
    params(UserListQuery),
    responses(
        (status = 200, description = "Users", body = ApiResponse<PaginatedResponse<UserProfile>>),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<UserListQuery>,
) -> ApiResult<PaginatedResponse<UserProfile>> {
    let page = page(&state, query.page, query.limit);
    let (users, total) = state.services.users.list_users(&query, page).await?;
    Ok(Json(ApiResponse::success(paginated(users, total, page))))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/users/{id}",
    summary = "Get user",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User", body = ApiResponse<UserDetail>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<UserDetail> {
    let profile = state.services.users.get_user(id).await?;
    let order_count = state.services.users.order_count(id).await?;
    Ok(Json(ApiResponse::success(UserDetail {
        profile,
        order_count,
    })))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/users/{id}/role",
    summary = "Change role",
    params(("id" = Uuid, Path, description = "User id")),
    request_body = ChangeRoleRequest,
    responses(
        (status = 200, description = "Updated", body = ApiResponse<UserProfile>),
        (status = 400, description = "Self-demotion", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn change_role(
    State(state): State<AppState>,
    actor: AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<ChangeRoleRequest>,
) -> ApiResult<UserProfile> {
    let profile = state
        .services
        .users
        .change_role(actor.user_id, id, request.role)
        .await?;
    Ok(Json(ApiResponse::success(profile)))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/users/{id}/status",
    summary = "Activate or deactivate",
    params(("id" = Uuid, Path, description = "User id")),
    request_body = ChangeStatusRequest,
    responses(
        (status = 200, description = "Updated", body = ApiResponse<UserProfile>),
        (status = 400, description = "Self-deactivation", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn change_status(
    State(state): State<AppState>,
    actor: AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<ChangeStatusRequest>,
) -> ApiResult<UserProfile> {
    let profile = state
        .services
        .users
        .set_active(actor.user_id, id, request.is_active)
        .await?;
    Ok(Json(ApiResponse::success(profile)))
}

#[utoipa::path(
    put,
    path = "/api/v1/account/profile",
    summary = "Update own profile",
    request_body = UpdateProfileRequest,
    responses((status = 200, description = "Updated", body = ApiResponse<UserProfile>)),
    security(("Bearer" = [])),
    tag = "account"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(request): ValidatedJson<UpdateProfileRequest>,
) -> ApiResult<UserProfile> {
    let profile = state
        .services
        .users
        .update_profile(user.user_id, request)
        .await?;
    Ok(Json(ApiResponse::success(profile)))
}
