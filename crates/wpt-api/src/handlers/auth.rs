//! Authentication API handlers
//!
//! HTTP surface over the session manager: register, login, token refresh
//! and logout.

use crate::auth::{
    AuthenticatedUser, LoginRequest, RefreshRequest, RegisterRequest,
};
use crate::error::{ApiJson, ApiResponse, AppError};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use std::sync::Arc;
use validator::Validate;

/// Register a new user account
///
/// Only the self-registrable roles (viewer, editor) are accepted.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = crate::auth::UserPublic),
        (status = 400, description = "Invalid input", body = crate::error::ErrorBody),
        (status = 409, description = "Username or email already registered", body = crate::error::ErrorBody),
        (status = 500, description = "Internal server error", body = crate::error::ErrorBody),
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;
    let user = state.auth.register(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new("User registered successfully", user)),
    ))
}

/// Login with username or email
///
/// Returns the user's public profile plus an access/refresh token pair.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = crate::auth::AuthResponse),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorBody),
        (status = 500, description = "Internal server error", body = crate::error::ErrorBody),
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = state.auth.login(request).await?;
    Ok(Json(ApiResponse::new("Login successful", response)))
}

/// Exchange a refresh token for a new token pair
///
/// Rotation is enforced: the presented token is revoked and can never be
/// used again, even within its validity window.
#[utoipa::path(
    post,
    path = "/api/auth/refresh-token",
    tag = "auth",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Token refreshed successfully", body = crate::auth::TokenPair),
        (status = 401, description = "Invalid or expired refresh token", body = crate::error::ErrorBody),
        (status = 500, description = "Internal server error", body = crate::error::ErrorBody),
    )
)]
pub async fn refresh_handler(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<RefreshRequest>,
) -> Result<impl IntoResponse, AppError> {
    let pair = state.auth.refresh(&request.refresh_token).await?;
    Ok(Json(ApiResponse::new("Token refreshed successfully", pair)))
}

/// Logout the current session
///
/// Revokes the stored refresh token; idempotent, a second call succeeds
/// with no effect.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "auth",
    responses(
        (status = 200, description = "Logout successful"),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorBody),
        (status = 500, description = "Internal server error", body = crate::error::ErrorBody),
    ),
    security(("bearer_auth" = []))
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<impl IntoResponse, AppError> {
    state.auth.logout(user.id).await?;
    Ok(Json(ApiResponse::new("Logout successful", ())))
}
