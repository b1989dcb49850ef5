//! Daily log API handlers

use crate::auth::AuthenticatedUser;
use crate::error::{ApiJson, ApiResponse, AppError};
use crate::services::daily_logs::{
    self, DailyLog, DailyLogStats,
};
use crate::services::Page;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Extension, Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

/// Create-or-update request body
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpsertDailyLogRequest {
    pub log_date: NaiveDate,
    pub is_present: bool,
    pub binning_count: Option<i32>,
    pub picking_count: Option<i32>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ListDailyLogsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub user_id: Option<i64>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct StatsQuery {
    pub user_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

fn require_paired_dates(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<(), AppError> {
    if start.is_some() != end.is_some() {
        return Err(AppError::BadRequest(
            "Both startDate and endDate must be provided for date filtering".to_string(),
        ));
    }
    Ok(())
}

/// Create or update the caller's log for a date
#[utoipa::path(
    post,
    path = "/api/daily-logs",
    tag = "daily-logs",
    request_body = UpsertDailyLogRequest,
    responses(
        (status = 200, description = "Daily log created/updated successfully", body = DailyLog),
        (status = 400, description = "Invalid input", body = crate::error::ErrorBody),
        (status = 403, description = "Insufficient permissions", body = crate::error::ErrorBody),
        (status = 500, description = "Internal server error", body = crate::error::ErrorBody),
    ),
    security(("bearer_auth" = []))
)]
pub async fn upsert_daily_log_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    ApiJson(request): ApiJson<UpsertDailyLogRequest>,
) -> Result<impl IntoResponse, AppError> {
    let log = daily_logs::upsert_daily_log(
        &state.pool,
        user.id,
        request.log_date,
        request.is_present,
        request.binning_count,
        request.picking_count,
    )
    .await?;

    Ok(Json(ApiResponse::new(
        "Daily log created/updated successfully",
        log,
    )))
}

/// Paginated listing with date and user filters
#[utoipa::path(
    get,
    path = "/api/daily-logs",
    tag = "daily-logs",
    params(ListDailyLogsQuery),
    responses(
        (status = 200, description = "Daily logs retrieved successfully"),
        (status = 400, description = "Invalid query parameters", body = crate::error::ErrorBody),
        (status = 500, description = "Internal server error", body = crate::error::ErrorBody),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_daily_logs_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListDailyLogsQuery>,
) -> Result<impl IntoResponse, AppError> {
    require_paired_dates(query.start_date, query.end_date)?;

    let logs: Page<DailyLog> = daily_logs::list_daily_logs(
        &state.pool,
        query.page.unwrap_or(1),
        query.limit.unwrap_or(10),
        query.start_date,
        query.end_date,
        query.user_id,
    )
    .await?;

    Ok(Json(ApiResponse::new(
        "Daily logs retrieved successfully",
        logs,
    )))
}

/// Attendance and throughput statistics for one user
#[utoipa::path(
    get,
    path = "/api/daily-logs/stats",
    tag = "daily-logs",
    params(StatsQuery),
    responses(
        (status = 200, description = "Stats retrieved successfully", body = DailyLogStats),
        (status = 400, description = "Invalid query parameters", body = crate::error::ErrorBody),
        (status = 404, description = "User not found", body = crate::error::ErrorBody),
        (status = 500, description = "Internal server error", body = crate::error::ErrorBody),
    ),
    security(("bearer_auth" = []))
)]
pub async fn daily_log_stats_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let stats = daily_logs::get_daily_log_stats(
        &state.pool,
        query.user_id,
        query.start_date,
        query.end_date,
    )
    .await?;

    Ok(Json(ApiResponse::new("Stats retrieved successfully", stats)))
}

/// Fetch a single log by id
#[utoipa::path(
    get,
    path = "/api/daily-logs/{id}",
    tag = "daily-logs",
    params(("id" = i64, Path, description = "Daily log id")),
    responses(
        (status = 200, description = "Daily log retrieved successfully", body = DailyLog),
        (status = 404, description = "Daily log not found", body = crate::error::ErrorBody),
        (status = 500, description = "Internal server error", body = crate::error::ErrorBody),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_daily_log_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let log = daily_logs::get_daily_log(&state.pool, id).await?;
    Ok(Json(ApiResponse::new(
        "Daily log retrieved successfully",
        log,
    )))
}

/// Delete a log (owner or admin only)
#[utoipa::path(
    delete,
    path = "/api/daily-logs/{id}",
    tag = "daily-logs",
    params(("id" = i64, Path, description = "Daily log id")),
    responses(
        (status = 200, description = "Daily log deleted successfully"),
        (status = 403, description = "Not authorized to delete this log", body = crate::error::ErrorBody),
        (status = 404, description = "Daily log not found", body = crate::error::ErrorBody),
        (status = 500, description = "Internal server error", body = crate::error::ErrorBody),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_daily_log_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    daily_logs::delete_daily_log(&state.pool, id, &user).await?;
    Ok(Json(ApiResponse::new("Daily log deleted successfully", ())))
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct UserLogsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Paginated listing scoped to one user
#[utoipa::path(
    get,
    path = "/api/daily-logs/user/{userId}",
    tag = "daily-logs",
    params(("userId" = i64, Path, description = "User id"), UserLogsQuery),
    responses(
        (status = 200, description = "Daily logs retrieved successfully"),
        (status = 404, description = "User not found", body = crate::error::ErrorBody),
        (status = 500, description = "Internal server error", body = crate::error::ErrorBody),
    ),
    security(("bearer_auth" = []))
)]
pub async fn user_daily_logs_handler(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
    Query(query): Query<UserLogsQuery>,
) -> Result<impl IntoResponse, AppError> {
    require_paired_dates(query.start_date, query.end_date)?;

    let logs = daily_logs::get_user_daily_logs(
        &state.pool,
        user_id,
        query.page.unwrap_or(1),
        query.limit.unwrap_or(10),
        query.start_date,
        query.end_date,
    )
    .await?;

    Ok(Json(ApiResponse::new(
        "Daily logs retrieved successfully",
        logs,
    )))
}
