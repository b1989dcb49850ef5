//! Activity log API handlers

use crate::error::{ApiResponse, AppError};
use crate::services::activity_logs::{self, ActivityLogFilter, ActivityStatus, DataType};
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLogsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub data_type: Option<DataType>,
    pub status: Option<ActivityStatus>,
    pub user_id: Option<i64>,
}

/// Paginated audit-trail listing with data-type, status, user and date
/// filters
#[utoipa::path(
    get,
    path = "/api/activity-logs",
    tag = "activity-logs",
    params(ActivityLogsQuery),
    responses(
        (status = 200, description = "Activity logs retrieved successfully"),
        (status = 400, description = "Invalid query parameters", body = crate::error::ErrorBody),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorBody),
        (status = 500, description = "Internal server error", body = crate::error::ErrorBody),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_activity_logs_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ActivityLogsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let filter = ActivityLogFilter {
        start_date: query.start_date,
        end_date: query.end_date,
        data_type: query.data_type,
        status: query.status,
        user_id: query.user_id,
    };

    let logs = activity_logs::list_activity_logs(
        &state.pool,
        query.page.unwrap_or(1),
        query.limit.unwrap_or(10),
        filter,
    )
    .await?;

    Ok(Json(ApiResponse::new(
        "Activity logs retrieved successfully",
        logs,
    )))
}
