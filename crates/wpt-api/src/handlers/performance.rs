//! Performance metrics API handlers

use crate::auth::AuthenticatedUser;
use crate::error::{ApiJson, ApiResponse, AppError};
use crate::services::performance::{
    self, ExportFormat, GroupBy, OperatorPerformance, ReportRequest, ReportType,
};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct MetricsQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub user_id: Option<i64>,
    #[serde(default)]
    pub group_by: GroupBy,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct RangeQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct TeamQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub group_by: GroupBy,
}

/// Period rollups of daily logs, optionally scoped to one user
#[utoipa::path(
    get,
    path = "/api/performance/metrics",
    tag = "performance",
    params(MetricsQuery),
    responses(
        (status = 200, description = "Metrics retrieved successfully"),
        (status = 400, description = "Invalid query parameters", body = crate::error::ErrorBody),
        (status = 500, description = "Internal server error", body = crate::error::ErrorBody),
    ),
    security(("bearer_auth" = []))
)]
pub async fn metrics_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MetricsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let metrics = performance::get_performance_metrics(
        &state.pool,
        query.start_date,
        query.end_date,
        query.user_id,
        query.group_by,
    )
    .await?;

    Ok(Json(ApiResponse::new(
        "Metrics retrieved successfully",
        metrics,
    )))
}

/// Single-operator rollup with daily breakdown and target achievement
#[utoipa::path(
    get,
    path = "/api/performance/operators/{userId}",
    tag = "performance",
    params(("userId" = i64, Path, description = "Operator user id"), RangeQuery),
    responses(
        (status = 200, description = "Operator performance retrieved successfully", body = OperatorPerformance),
        (status = 404, description = "No performance data found for this operator", body = crate::error::ErrorBody),
        (status = 500, description = "Internal server error", body = crate::error::ErrorBody),
    ),
    security(("bearer_auth" = []))
)]
pub async fn operator_performance_handler(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
    Query(query): Query<RangeQuery>,
) -> Result<impl IntoResponse, AppError> {
    let performance = performance::get_operator_performance(
        &state.pool,
        user_id,
        query.start_date,
        query.end_date,
    )
    .await?;

    Ok(Json(ApiResponse::new(
        "Operator performance retrieved successfully",
        performance,
    )))
}

/// Team rollup per period with per-operator breakdown
#[utoipa::path(
    get,
    path = "/api/performance/team",
    tag = "performance",
    params(TeamQuery),
    responses(
        (status = 200, description = "Team performance retrieved successfully"),
        (status = 400, description = "Invalid query parameters", body = crate::error::ErrorBody),
        (status = 500, description = "Internal server error", body = crate::error::ErrorBody),
    ),
    security(("bearer_auth" = []))
)]
pub async fn team_performance_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TeamQuery>,
) -> Result<impl IntoResponse, AppError> {
    let performance = performance::get_team_performance(
        &state.pool,
        query.start_date,
        query.end_date,
        query.group_by,
    )
    .await?;

    Ok(Json(ApiResponse::new(
        "Team performance retrieved successfully",
        performance,
    )))
}

/// Report request body
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestReportBody {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub report_type: ReportType,
    pub export_format: ExportFormat,
    pub email_to: Option<String>,
}

/// Queue a report request
///
/// The request is recorded as pending; generation and delivery are handled
/// out of band.
#[utoipa::path(
    post,
    path = "/api/performance/reports",
    tag = "performance",
    request_body = RequestReportBody,
    responses(
        (status = 201, description = "Report request created", body = ReportRequest),
        (status = 400, description = "Invalid input", body = crate::error::ErrorBody),
        (status = 500, description = "Internal server error", body = crate::error::ErrorBody),
    ),
    security(("bearer_auth" = []))
)]
pub async fn request_report_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    ApiJson(body): ApiJson<RequestReportBody>,
) -> Result<impl IntoResponse, AppError> {
    let report = performance::request_report(
        &state.pool,
        user.id,
        body.start_date,
        body.end_date,
        body.report_type,
        body.export_format,
        body.email_to,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new("Report request created", report)),
    ))
}

/// Report request status lookup
#[utoipa::path(
    get,
    path = "/api/performance/reports/{reportId}",
    tag = "performance",
    params(("reportId" = i64, Path, description = "Report request id")),
    responses(
        (status = 200, description = "Report status retrieved successfully", body = ReportRequest),
        (status = 404, description = "Report request not found", body = crate::error::ErrorBody),
        (status = 500, description = "Internal server error", body = crate::error::ErrorBody),
    ),
    security(("bearer_auth" = []))
)]
pub async fn report_status_handler(
    State(state): State<Arc<AppState>>,
    Path(report_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let report = performance::get_report_status(&state.pool, report_id).await?;
    Ok(Json(ApiResponse::new(
        "Report status retrieved successfully",
        report,
    )))
}
