//! Activity log data access
//!
//! Append-only audit trail of data changes. Entries are written as a side
//! effect of daily-log mutations and read back through a paginated,
//! filterable listing.

use crate::error::AppError;
use crate::services::Page;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use utoipa::ToSchema;

/// Category of data an activity entry refers to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Binning,
    Picking,
    Attendance,
    DailyLog,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Binning => "binning",
            DataType::Picking => "picking",
            DataType::Attendance => "attendance",
            DataType::DailyLog => "daily_log",
        }
    }
}

/// Outcome recorded for an activity entry
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ActivityStatus {
    Success,
    Failure,
}

impl ActivityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityStatus::Success => "success",
            ActivityStatus::Failure => "failure",
        }
    }
}

/// Activity log entry joined with the acting user
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLogEntry {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub full_name: String,
    pub data_type: String,
    pub status: String,
    pub change_history: serde_json::Value,
    pub activity_time: DateTime<Utc>,
}

/// Listing filters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActivityLogFilter {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub data_type: Option<DataType>,
    pub status: Option<ActivityStatus>,
    pub user_id: Option<i64>,
}

/// Append an entry; failures are logged and swallowed so the primary
/// mutation is never rolled back by audit bookkeeping.
pub async fn record_activity(
    pool: &PgPool,
    user_id: i64,
    data_type: DataType,
    status: ActivityStatus,
    change_history: serde_json::Value,
) {
    let result = sqlx::query(
        "INSERT INTO activity_logs (user_id, data_type, status, change_history) \
         VALUES ($1, $2, $3, $4)",
    )
    .bind(user_id)
    .bind(data_type.as_str())
    .bind(status.as_str())
    .bind(change_history)
    .execute(pool)
    .await;

    if let Err(e) = result {
        tracing::warn!(error = %e, "failed to record activity log entry");
    }
}

/// Paginated activity listing, newest first
pub async fn list_activity_logs(
    pool: &PgPool,
    page: i64,
    limit: i64,
    filter: ActivityLogFilter,
) -> Result<Page<ActivityLogEntry>, AppError> {
    super::validate_pagination(page, limit)?;
    if let (Some(start), Some(end)) = (filter.start_date, filter.end_date) {
        if start > end {
            return Err(AppError::BadRequest(
                "startDate must be before or equal to endDate".to_string(),
            ));
        }
    }

    let data_type = filter.data_type.map(|d| d.as_str());
    let status = filter.status.map(|s| s.as_str());

    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM activity_logs a WHERE \
         ($1::timestamptz IS NULL OR a.activity_time >= $1) AND \
         ($2::timestamptz IS NULL OR a.activity_time <= $2) AND \
         ($3::text IS NULL OR a.data_type = $3) AND \
         ($4::text IS NULL OR a.status = $4) AND \
         ($5::bigint IS NULL OR a.user_id = $5)",
    )
    .bind(filter.start_date)
    .bind(filter.end_date)
    .bind(data_type)
    .bind(status)
    .bind(filter.user_id)
    .fetch_one(pool)
    .await?;

    let logs = sqlx::query_as::<_, ActivityLogEntry>(
        "SELECT a.id, a.user_id, u.username, u.full_name, a.data_type, a.status, \
         a.change_history, a.activity_time \
         FROM activity_logs a JOIN users u ON u.id = a.user_id WHERE \
         ($1::timestamptz IS NULL OR a.activity_time >= $1) AND \
         ($2::timestamptz IS NULL OR a.activity_time <= $2) AND \
         ($3::text IS NULL OR a.data_type = $3) AND \
         ($4::text IS NULL OR a.status = $4) AND \
         ($5::bigint IS NULL OR a.user_id = $5) \
         ORDER BY a.activity_time DESC OFFSET $6 LIMIT $7",
    )
    .bind(filter.start_date)
    .bind(filter.end_date)
    .bind(data_type)
    .bind(status)
    .bind(filter.user_id)
    .bind((page - 1) * limit)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(Page::new(logs, total, page, limit))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_type_wire_names() {
        assert_eq!(DataType::DailyLog.as_str(), "daily_log");
        let parsed: DataType = serde_json::from_str("\"daily_log\"").unwrap();
        assert_eq!(parsed, DataType::DailyLog);
    }

    #[test]
    fn status_wire_names() {
        let parsed: ActivityStatus = serde_json::from_str("\"failure\"").unwrap();
        assert_eq!(parsed, ActivityStatus::Failure);
    }
}
