//! HTTP handlers
//!
//! Thin translation layer between axum extractors and the auth/service
//! modules; every success goes out wrapped in `ApiResponse`.

pub mod activity_logs;
pub mod auth;
pub mod daily_logs;
pub mod health;
pub mod performance;
pub mod users;
