//! User listing handlers

use crate::auth::UserPublic;
use crate::error::{ApiResponse, AppError};
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use std::sync::Arc;

/// List all users
///
/// Returns every registered user's public profile; any authenticated role
/// may call this.
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "users",
    responses(
        (status = 200, description = "Users retrieved successfully", body = Vec<UserPublic>),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorBody),
        (status = 500, description = "Internal server error", body = crate::error::ErrorBody),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_users_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let users: Vec<UserPublic> = state
        .auth
        .store()
        .list()
        .await
        .map_err(AppError::from)?
        .iter()
        .map(UserPublic::from)
        .collect();

    Ok(Json(ApiResponse::new(
        "Users retrieved successfully",
        users,
    )))
}
