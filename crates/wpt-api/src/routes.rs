//! API route definitions

use crate::auth::middleware::{auth_middleware, require_any_role};
use crate::handlers::{activity_logs, auth, daily_logs, performance, users};
use crate::state::AppState;
use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

/// Roles allowed to mutate daily logs
const LOG_WRITERS: &[&str] = &["editor", "operator", "admin"];

/// Create the /api routes
pub fn api_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/refresh-token", post(auth::refresh_handler));

    // Daily-log mutations carry an extra role allow-list
    let daily_log_writes = Router::new()
        .route("/daily-logs", post(daily_logs::upsert_daily_log_handler))
        .route("/daily-logs/:id", delete(daily_logs::delete_daily_log_handler))
        .route_layer(middleware::from_fn(require_any_role(LOG_WRITERS)));

    // Protected routes (any authenticated role)
    let protected_routes = Router::new()
        .route("/auth/logout", post(auth::logout_handler))
        .route("/users", get(users::list_users_handler))
        // Daily logs
        .merge(daily_log_writes)
        .route("/daily-logs", get(daily_logs::list_daily_logs_handler))
        .route("/daily-logs/stats", get(daily_logs::daily_log_stats_handler))
        .route("/daily-logs/:id", get(daily_logs::get_daily_log_handler))
        .route(
            "/daily-logs/user/:user_id",
            get(daily_logs::user_daily_logs_handler),
        )
        // Activity logs
        .route(
            "/activity-logs",
            get(activity_logs::list_activity_logs_handler),
        )
        // Performance metrics
        .route("/performance/metrics", get(performance::metrics_handler))
        .route(
            "/performance/operators/:user_id",
            get(performance::operator_performance_handler),
        )
        .route(
            "/performance/team",
            get(performance::team_performance_handler),
        )
        .route(
            "/performance/reports",
            post(performance::request_report_handler),
        )
        .route(
            "/performance/reports/:report_id",
            get(performance::report_status_handler),
        )
        .layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new().merge(public_routes).merge(protected_routes)
}
