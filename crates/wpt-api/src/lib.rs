//! Warehouse productivity REST API
//!
//! Tracks warehouse operator daily output (binning/picking counts and
//! attendance) behind a role-gated JWT auth layer, and rolls the logs up
//! into per-period performance metrics.

pub mod audit;
pub mod auth;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod services;
pub mod state;

use axum::{http::HeaderValue, routing::get, Router};
use state::AppState;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health_check,
        handlers::auth::register_handler,
        handlers::auth::login_handler,
        handlers::auth::refresh_handler,
        handlers::auth::logout_handler,
        handlers::users::list_users_handler,
        handlers::daily_logs::upsert_daily_log_handler,
        handlers::daily_logs::list_daily_logs_handler,
        handlers::daily_logs::daily_log_stats_handler,
        handlers::daily_logs::get_daily_log_handler,
        handlers::daily_logs::delete_daily_log_handler,
        handlers::daily_logs::user_daily_logs_handler,
        handlers::activity_logs::list_activity_logs_handler,
        handlers::performance::metrics_handler,
        handlers::performance::operator_performance_handler,
        handlers::performance::team_performance_handler,
        handlers::performance::request_report_handler,
        handlers::performance::report_status_handler,
    ),
    components(schemas(
        error::ErrorBody,
        auth::RegisterRequest,
        auth::LoginRequest,
        auth::RefreshRequest,
        auth::UserPublic,
        auth::AuthResponse,
        auth::TokenPair,
        handlers::daily_logs::UpsertDailyLogRequest,
        handlers::performance::RequestReportBody,
        services::daily_logs::DailyLog,
        services::daily_logs::DailyLogStats,
        services::activity_logs::ActivityLogEntry,
        services::activity_logs::DataType,
        services::activity_logs::ActivityStatus,
        services::performance::GroupBy,
        services::performance::PeriodMetrics,
        services::performance::TeamPeriodMetrics,
        services::performance::OperatorPeriodMetrics,
        services::performance::OperatorPerformance,
        services::performance::DailyBreakdownEntry,
        services::performance::ReportType,
        services::performance::ExportFormat,
        services::performance::ReportRequest,
    )),
    tags(
        (name = "auth", description = "Registration, login and session tokens"),
        (name = "users", description = "User listing"),
        (name = "daily-logs", description = "Operator daily output logs"),
        (name = "activity-logs", description = "Data-change audit trail"),
        (name = "performance", description = "Period rollups and reports"),
        (name = "health", description = "Liveness"),
    )
)]
pub struct ApiDoc;

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| o.parse::<HeaderValue>().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(parsed)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Assemble the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.server.cors_origins);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(handlers::health::health_check))
        .nest("/api", routes::api_routes(state.clone()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Router without the Swagger UI, for driving requests in tests
#[cfg(any(test, feature = "test-utils"))]
pub fn create_router_for_testing(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .nest("/api", routes::api_routes(state.clone()))
        .with_state(state)
}
