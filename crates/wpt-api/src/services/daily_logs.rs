//! Daily log data access
//!
//! One row per operator per day: attendance plus binning/picking counts.
//! Writes are upserts keyed on (user_id, log_date) and every mutation
//! leaves an activity-log entry behind.

use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::services::activity_logs::{record_activity, ActivityStatus, DataType};
use crate::services::Page;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use serde_json::json;
use sqlx::PgPool;
use utoipa::ToSchema;

/// Daily log row joined with its owner
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyLog {
    pub id: i64,
    pub user_id: i64,
    pub full_name: String,
    pub email: String,
    pub role: String,
    pub log_date: NaiveDate,
    pub is_present: bool,
    pub binning_count: i32,
    pub picking_count: i32,
    pub total_items: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const LOG_SELECT: &str = "SELECT d.id, d.user_id, u.full_name, u.email, r.name AS role, \
     d.log_date, d.is_present, d.binning_count, d.picking_count, d.total_items, \
     d.created_at, d.updated_at \
     FROM daily_logs d JOIN users u ON u.id = d.user_id JOIN roles r ON r.id = u.role_id";

/// Create or update the log for (user, date)
///
/// Only operators and editors may own daily logs; the date must not be in
/// the future and counts must be non-negative.
pub async fn upsert_daily_log(
    pool: &PgPool,
    user_id: i64,
    log_date: NaiveDate,
    is_present: bool,
    binning_count: Option<i32>,
    picking_count: Option<i32>,
) -> Result<DailyLog, AppError> {
    if log_date > Utc::now().date_naive() {
        return Err(AppError::BadRequest(
            "Cannot create log for future dates".to_string(),
        ));
    }

    let role: Option<String> = sqlx::query_scalar(
        "SELECT r.name FROM users u JOIN roles r ON r.id = u.role_id WHERE u.id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    let role = role.ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    if role != "operator" && role != "editor" {
        return Err(AppError::Forbidden(
            "Only operators and editors can create daily logs".to_string(),
        ));
    }

    if binning_count.is_some_and(|c| c < 0) {
        return Err(AppError::BadRequest(
            "binningCount must be a non-negative number".to_string(),
        ));
    }
    if picking_count.is_some_and(|c| c < 0) {
        return Err(AppError::BadRequest(
            "pickingCount must be a non-negative number".to_string(),
        ));
    }

    let binning = binning_count.unwrap_or(0);
    let picking = picking_count.unwrap_or(0);
    let total_items = binning + picking;

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO daily_logs (user_id, log_date, is_present, binning_count, picking_count, total_items) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         ON CONFLICT (user_id, log_date) DO UPDATE SET \
         is_present = EXCLUDED.is_present, binning_count = EXCLUDED.binning_count, \
         picking_count = EXCLUDED.picking_count, total_items = EXCLUDED.total_items, \
         updated_at = NOW() \
         RETURNING id",
    )
    .bind(user_id)
    .bind(log_date)
    .bind(is_present)
    .bind(binning)
    .bind(picking)
    .bind(total_items)
    .fetch_one(pool)
    .await?;

    record_activity(
        pool,
        user_id,
        DataType::DailyLog,
        ActivityStatus::Success,
        json!({
            "details": format!("Updated daily log for {log_date}"),
            "changes": {
                "isPresent": is_present,
                "binningCount": binning,
                "pickingCount": picking,
                "totalItems": total_items,
            }
        }),
    )
    .await;

    get_daily_log(pool, id).await
}

/// Paginated listing, newest log date first
pub async fn list_daily_logs(
    pool: &PgPool,
    page: i64,
    limit: i64,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    user_id: Option<i64>,
) -> Result<Page<DailyLog>, AppError> {
    super::validate_pagination(page, limit)?;
    if let (Some(start), Some(end)) = (start_date, end_date) {
        if start > end {
            return Err(AppError::BadRequest(
                "startDate must be before or equal to endDate".to_string(),
            ));
        }
    }

    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM daily_logs d WHERE \
         ($1::date IS NULL OR d.log_date >= $1) AND \
         ($2::date IS NULL OR d.log_date <= $2) AND \
         ($3::bigint IS NULL OR d.user_id = $3)",
    )
    .bind(start_date)
    .bind(end_date)
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    let logs = sqlx::query_as::<_, DailyLog>(&format!(
        "{LOG_SELECT} WHERE \
         ($1::date IS NULL OR d.log_date >= $1) AND \
         ($2::date IS NULL OR d.log_date <= $2) AND \
         ($3::bigint IS NULL OR d.user_id = $3) \
         ORDER BY d.log_date DESC OFFSET $4 LIMIT $5"
    ))
    .bind(start_date)
    .bind(end_date)
    .bind(user_id)
    .bind((page - 1) * limit)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(Page::new(logs, total, page, limit))
}

pub async fn get_daily_log(pool: &PgPool, id: i64) -> Result<DailyLog, AppError> {
    if id < 1 {
        return Err(AppError::BadRequest("Invalid log ID".to_string()));
    }

    sqlx::query_as::<_, DailyLog>(&format!("{LOG_SELECT} WHERE d.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Daily log not found".to_string()))
}

/// Delete a log; allowed for the log owner or an admin
pub async fn delete_daily_log(
    pool: &PgPool,
    id: i64,
    acting_user: &AuthenticatedUser,
) -> Result<(), AppError> {
    let log = get_daily_log(pool, id).await?;

    if log.user_id != acting_user.id && acting_user.role != "admin" {
        return Err(AppError::Forbidden(
            "Not authorized to delete this log".to_string(),
        ));
    }

    sqlx::query("DELETE FROM daily_logs WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    record_activity(
        pool,
        acting_user.id,
        DataType::DailyLog,
        ActivityStatus::Success,
        json!({
            "details": format!("Deleted daily log {id}"),
            "deletedLog": {
                "id": log.id,
                "userId": log.user_id,
                "logDate": log.log_date,
                "isPresent": log.is_present,
                "binningCount": log.binning_count,
                "pickingCount": log.picking_count,
                "totalItems": log.total_items,
            }
        }),
    )
    .await;

    Ok(())
}

/// Listing scoped to a single user
pub async fn get_user_daily_logs(
    pool: &PgPool,
    user_id: i64,
    page: i64,
    limit: i64,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> Result<Page<DailyLog>, AppError> {
    let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await?;
    if exists == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    list_daily_logs(pool, page, limit, start_date, end_date, Some(user_id)).await
}

/// Attendance and throughput statistics for one user over a date range
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyLogStats {
    pub total_binning: i64,
    pub total_picking: i64,
    pub total_items: i64,
    pub average_items_per_day: f64,
    pub present_days: i64,
    pub total_days: i64,
    pub attendance_rate: f64,
}

pub async fn get_daily_log_stats(
    pool: &PgPool,
    user_id: i64,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<DailyLogStats, AppError> {
    if start_date > end_date {
        return Err(AppError::BadRequest(
            "startDate must be before or equal to endDate".to_string(),
        ));
    }

    let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await?;
    if exists == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    let rows: Vec<(bool, i32, i32)> = sqlx::query_as(
        "SELECT is_present, binning_count, picking_count FROM daily_logs \
         WHERE user_id = $1 AND log_date BETWEEN $2 AND $3",
    )
    .bind(user_id)
    .bind(start_date)
    .bind(end_date)
    .fetch_all(pool)
    .await?;

    Ok(compute_stats(&rows, start_date, end_date))
}

fn compute_stats(rows: &[(bool, i32, i32)], start_date: NaiveDate, end_date: NaiveDate) -> DailyLogStats {
    let total_days = (end_date - start_date).num_days() + 1;
    let present_days = rows.iter().filter(|(present, _, _)| *present).count() as i64;
    let total_binning: i64 = rows.iter().map(|(_, b, _)| *b as i64).sum();
    let total_picking: i64 = rows.iter().map(|(_, _, p)| *p as i64).sum();
    let total_items = total_binning + total_picking;

    DailyLogStats {
        total_binning,
        total_picking,
        total_items,
        average_items_per_day: if present_days > 0 {
            total_items as f64 / present_days as f64
        } else {
            0.0
        },
        present_days,
        total_days,
        attendance_rate: if total_days > 0 {
            present_days as f64 / total_days as f64 * 100.0
        } else {
            0.0
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn stats_over_a_week() {
        let rows = vec![
            (true, 10, 20),
            (true, 5, 5),
            (false, 0, 0),
            (true, 30, 0),
        ];
        let stats = compute_stats(&rows, date("2025-03-03"), date("2025-03-09"));

        assert_eq!(stats.total_days, 7);
        assert_eq!(stats.present_days, 3);
        assert_eq!(stats.total_binning, 45);
        assert_eq!(stats.total_picking, 25);
        assert_eq!(stats.total_items, 70);
        assert!((stats.average_items_per_day - 70.0 / 3.0).abs() < 1e-9);
        assert!((stats.attendance_rate - 3.0 / 7.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn stats_with_no_logs() {
        let stats = compute_stats(&[], date("2025-03-03"), date("2025-03-03"));
        assert_eq!(stats.total_days, 1);
        assert_eq!(stats.average_items_per_day, 0.0);
        assert_eq!(stats.attendance_rate, 0.0);
    }
}
