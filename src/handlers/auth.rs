use super::common::{created, ValidatedJson};
use crate::{
    auth::{AuthResponse, AuthUser, LoginCredentials, RefreshTokenRequest, RegisterRequest},
    errors::ServiceError,
    services::users::UserProfile,
    ApiResponse, ApiResult, AppState,
};
use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};
use tracing::info;

#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    summary = "Register",
    description = "Create a customer account and return a token pair",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = ApiResponse<AuthResponse>),
        (status = 400, description = "Invalid input", body = crate::errors::ErrorResponse),
        (
            status = 409,
            description = "Email already registered",
            body = crate::errors::ErrorResponse
        ),
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AuthResponse>>), ServiceError> {
    let response = state.auth.register(request).await?;
    info!(user_id = %response.user.id, "User registered");
    Ok(created(response))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    summary = "Login",
    request_body = LoginCredentials,
    responses(
        (status = 200, description = "Authenticated", body = ApiResponse<AuthResponse>),
        (status = 401, description = "Invalid credentials", body = crate::errors::ErrorResponse),
        (status = 403, description = "Account disabled", body = crate::errors::ErrorResponse),
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(credentials): ValidatedJson<LoginCredentials>,
) -> ApiResult<AuthResponse> {
    let response = state.auth.login(credentials).await?;
    Ok(Json(ApiResponse::success(response)))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh",
    summary = "Refresh tokens",
    description = "Exchange a refresh token for a new pair; picks up role changes",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "New token pair", body = ApiResponse<AuthResponse>),
        (status = 401, description = "Invalid refresh token", body = crate::errors::ErrorResponse),
    ),
    tag = "auth"
)]
pub async fn refresh(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<RefreshTokenRequest>,
) -> ApiResult<AuthResponse> {
    let response = state.auth.refresh(&request.refresh_token).await?;
    Ok(Json(ApiResponse::success(response)))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    summary = "Logout",
    description = "Revoke the presented access token",
    responses(
        (status = 200, description = "Token revoked"),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "auth"
)]
pub async fn logout(State(state): State<AppState>, user: AuthUser) -> ApiResult<Value> {
    state.auth.revoke(&user).await;
    Ok(Json(
        ApiResponse::success(json!({ "revoked": true })).with_message("Signed out"),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    summary = "Current user",
    responses(
        (status = 200, description = "Signed-in account", body = ApiResponse<UserProfile>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "auth"
)]
pub async fn me(State(state): State<AppState>, user: AuthUser) -> ApiResult<UserProfile> {
    let profile = state.services.users.get_user(user.user_id).await?;
    Ok(Json(ApiResponse::success(profile)))
}
