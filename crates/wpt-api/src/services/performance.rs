//! Performance metrics aggregation
//!
//! Daily logs are materialized for the requested range, then rolled up in a
//! single pass grouped by day, ISO week, or month. The grouping itself is
//! pure so it can be tested without a database.

use crate::error::AppError;
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::{BTreeMap, HashSet};
use utoipa::ToSchema;

/// Grouping granularity for rollups
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    #[default]
    Day,
    Week,
    Month,
}

impl GroupBy {
    /// Map a log date onto its period start
    fn period_key(&self, date: NaiveDate) -> NaiveDate {
        match self {
            GroupBy::Day => date,
            GroupBy::Week => date - Duration::days(date.weekday().num_days_from_monday() as i64),
            GroupBy::Month => date.with_day(1).unwrap_or(date),
        }
    }
}

/// The slice of a daily log the aggregation needs
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MetricsRow {
    pub user_id: i64,
    pub username: String,
    pub full_name: String,
    pub log_date: NaiveDate,
    pub is_present: bool,
    pub binning_count: i32,
    pub picking_count: i32,
    pub total_items: i32,
}

/// Per-period rollup
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PeriodMetrics {
    pub period: NaiveDate,
    pub total_items: i64,
    pub average_items_per_operator: f64,
    pub binning_percentage: f64,
    pub picking_percentage: f64,
    pub attendance_rate: f64,
    pub active_operators: i64,
}

/// Per-period rollup with target tracking and per-operator breakdown
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamPeriodMetrics {
    pub period: NaiveDate,
    pub total_items: i64,
    pub average_items_per_operator: f64,
    pub binning_percentage: f64,
    pub picking_percentage: f64,
    pub attendance_rate: f64,
    pub active_operators: i64,
    pub target_achievement: Option<f64>,
    pub operator_performance: Vec<OperatorPeriodMetrics>,
}

/// One operator's share of a team period
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OperatorPeriodMetrics {
    pub user_id: i64,
    pub username: String,
    pub full_name: String,
    pub total_items: i64,
    pub average_items_per_day: f64,
    pub attendance_rate: f64,
}

/// Single-operator rollup with daily breakdown
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OperatorPerformance {
    pub total_items: i64,
    pub average_items_per_day: f64,
    pub binning_percentage: f64,
    pub picking_percentage: f64,
    pub attendance_rate: f64,
    pub target_achievement: Option<f64>,
    pub daily_breakdown: Vec<DailyBreakdownEntry>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyBreakdownEntry {
    pub date: NaiveDate,
    pub total_items: i32,
    pub binning_count: i32,
    pub picking_count: i32,
    pub is_present: bool,
}

#[derive(Debug, Default)]
struct PeriodAccumulator {
    total_items: i64,
    total_binning: i64,
    total_picking: i64,
    present_count: i64,
    row_count: i64,
    operators: HashSet<i64>,
    per_operator: BTreeMap<i64, OperatorAccumulator>,
}

#[derive(Debug, Default)]
struct OperatorAccumulator {
    username: String,
    full_name: String,
    total_items: i64,
    present_days: i64,
}

fn pct(part: i64, whole: i64) -> f64 {
    if whole > 0 {
        part as f64 / whole as f64 * 100.0
    } else {
        0.0
    }
}

fn accumulate(rows: &[MetricsRow], group_by: GroupBy) -> BTreeMap<NaiveDate, PeriodAccumulator> {
    let mut groups: BTreeMap<NaiveDate, PeriodAccumulator> = BTreeMap::new();
    for row in rows {
        let acc = groups.entry(group_by.period_key(row.log_date)).or_default();
        acc.total_items += row.total_items as i64;
        acc.total_binning += row.binning_count as i64;
        acc.total_picking += row.picking_count as i64;
        acc.present_count += row.is_present as i64;
        acc.row_count += 1;
        acc.operators.insert(row.user_id);

        let op = acc.per_operator.entry(row.user_id).or_default();
        if op.username.is_empty() {
            op.username = row.username.clone();
            op.full_name = row.full_name.clone();
        }
        op.total_items += row.total_items as i64;
        op.present_days += row.is_present as i64;
    }
    groups
}

/// Pure period rollup, one entry per period in ascending date order
pub fn group_metrics(rows: &[MetricsRow], group_by: GroupBy) -> Vec<PeriodMetrics> {
    accumulate(rows, group_by)
        .into_iter()
        .map(|(period, acc)| PeriodMetrics {
            period,
            total_items: acc.total_items,
            average_items_per_operator: if acc.operators.is_empty() {
                0.0
            } else {
                acc.total_items as f64 / acc.operators.len() as f64
            },
            binning_percentage: pct(acc.total_binning, acc.total_items),
            picking_percentage: pct(acc.total_picking, acc.total_items),
            attendance_rate: pct(acc.present_count, acc.row_count),
            active_operators: acc.operators.len() as i64,
        })
        .collect()
}

/// Pure team rollup including per-operator breakdown and target tracking
pub fn group_team_metrics(
    rows: &[MetricsRow],
    group_by: GroupBy,
    daily_target: Option<i32>,
) -> Vec<TeamPeriodMetrics> {
    accumulate(rows, group_by)
        .into_iter()
        .map(|(period, acc)| {
            let operator_performance = acc
                .per_operator
                .iter()
                .map(|(user_id, op)| OperatorPeriodMetrics {
                    user_id: *user_id,
                    username: op.username.clone(),
                    full_name: op.full_name.clone(),
                    total_items: op.total_items,
                    average_items_per_day: if acc.row_count > 0 {
                        op.total_items as f64 / acc.row_count as f64
                    } else {
                        0.0
                    },
                    attendance_rate: pct(op.present_days, acc.row_count),
                })
                .collect();

            TeamPeriodMetrics {
                period,
                total_items: acc.total_items,
                average_items_per_operator: if acc.operators.is_empty() {
                    0.0
                } else {
                    acc.total_items as f64 / acc.operators.len() as f64
                },
                binning_percentage: pct(acc.total_binning, acc.total_items),
                picking_percentage: pct(acc.total_picking, acc.total_items),
                attendance_rate: pct(acc.present_count, acc.row_count),
                active_operators: acc.operators.len() as i64,
                target_achievement: daily_target.map(|target| {
                    if target > 0 && acc.row_count > 0 {
                        acc.total_items as f64 / (target as i64 * acc.row_count) as f64 * 100.0
                    } else {
                        0.0
                    }
                }),
                operator_performance,
            }
        })
        .collect()
}

const METRICS_SELECT: &str = "SELECT d.user_id, u.username, u.full_name, d.log_date, \
     d.is_present, d.binning_count, d.picking_count, d.total_items \
     FROM daily_logs d JOIN users u ON u.id = d.user_id";

async fn fetch_rows(
    pool: &PgPool,
    start_date: NaiveDate,
    end_date: NaiveDate,
    user_id: Option<i64>,
) -> Result<Vec<MetricsRow>, AppError> {
    if start_date > end_date {
        return Err(AppError::BadRequest(
            "startDate must be before or equal to endDate".to_string(),
        ));
    }

    let rows = sqlx::query_as::<_, MetricsRow>(&format!(
        "{METRICS_SELECT} WHERE d.log_date BETWEEN $1 AND $2 \
         AND ($3::bigint IS NULL OR d.user_id = $3) \
         ORDER BY d.log_date ASC"
    ))
    .bind(start_date)
    .bind(end_date)
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Daily target in effect right now, if any
async fn current_daily_target(pool: &PgPool) -> Result<Option<i32>, AppError> {
    let target: Option<i32> = sqlx::query_scalar(
        "SELECT daily_target FROM targets \
         WHERE effective_from <= NOW() AND (effective_to IS NULL OR effective_to > NOW()) \
         ORDER BY effective_from DESC LIMIT 1",
    )
    .fetch_optional(pool)
    .await?;
    Ok(target)
}

pub async fn get_performance_metrics(
    pool: &PgPool,
    start_date: NaiveDate,
    end_date: NaiveDate,
    user_id: Option<i64>,
    group_by: GroupBy,
) -> Result<Vec<PeriodMetrics>, AppError> {
    let rows = fetch_rows(pool, start_date, end_date, user_id).await?;
    Ok(group_metrics(&rows, group_by))
}

pub async fn get_team_performance(
    pool: &PgPool,
    start_date: NaiveDate,
    end_date: NaiveDate,
    group_by: GroupBy,
) -> Result<Vec<TeamPeriodMetrics>, AppError> {
    let rows = fetch_rows(pool, start_date, end_date, None).await?;
    let target = current_daily_target(pool).await?;
    Ok(group_team_metrics(&rows, group_by, target))
}

pub async fn get_operator_performance(
    pool: &PgPool,
    user_id: i64,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<OperatorPerformance, AppError> {
    let rows = fetch_rows(pool, start_date, end_date, Some(user_id)).await?;
    if rows.is_empty() {
        return Err(AppError::NotFound(
            "No performance data found for this operator".to_string(),
        ));
    }

    let total_items: i64 = rows.iter().map(|r| r.total_items as i64).sum();
    let total_binning: i64 = rows.iter().map(|r| r.binning_count as i64).sum();
    let total_picking: i64 = rows.iter().map(|r| r.picking_count as i64).sum();
    let present_days = rows.iter().filter(|r| r.is_present).count() as i64;
    let day_count = rows.len() as i64;

    let target = current_daily_target(pool).await?;

    Ok(OperatorPerformance {
        total_items,
        average_items_per_day: total_items as f64 / day_count as f64,
        binning_percentage: pct(total_binning, total_items),
        picking_percentage: pct(total_picking, total_items),
        attendance_rate: pct(present_days, day_count),
        target_achievement: target.map(|t| {
            if t > 0 {
                total_items as f64 / (t as i64 * day_count) as f64 * 100.0
            } else {
                0.0
            }
        }),
        daily_breakdown: rows
            .iter()
            .map(|r| DailyBreakdownEntry {
                date: r.log_date,
                total_items: r.total_items,
                binning_count: r.binning_count,
                picking_count: r.picking_count,
                is_present: r.is_present,
            })
            .collect(),
    })
}

/// Kind of report a request asks for
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReportType {
    Daily,
    Weekly,
    Monthly,
}

impl ReportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::Daily => "daily",
            ReportType::Weekly => "weekly",
            ReportType::Monthly => "monthly",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Excel,
    Pdf,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Excel => "excel",
            ExportFormat::Pdf => "pdf",
        }
    }
}

/// Stored report request
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    pub id: i64,
    pub user_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub report_type: String,
    pub export_format: String,
    pub email_to: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Record a pending report request. Generation and delivery run out of
/// band; this only queues the work.
pub async fn request_report(
    pool: &PgPool,
    user_id: i64,
    start_date: NaiveDate,
    end_date: NaiveDate,
    report_type: ReportType,
    export_format: ExportFormat,
    email_to: Option<String>,
) -> Result<ReportRequest, AppError> {
    if start_date > end_date {
        return Err(AppError::BadRequest(
            "startDate must be before or equal to endDate".to_string(),
        ));
    }

    let report = sqlx::query_as::<_, ReportRequest>(
        "INSERT INTO report_requests (user_id, start_date, end_date, report_type, export_format, email_to, status) \
         VALUES ($1, $2, $3, $4, $5, $6, 'pending') \
         RETURNING id, user_id, start_date, end_date, report_type, export_format, email_to, status, created_at",
    )
    .bind(user_id)
    .bind(start_date)
    .bind(end_date)
    .bind(report_type.as_str())
    .bind(export_format.as_str())
    .bind(email_to)
    .fetch_one(pool)
    .await?;

    Ok(report)
}

pub async fn get_report_status(pool: &PgPool, report_id: i64) -> Result<ReportRequest, AppError> {
    sqlx::query_as::<_, ReportRequest>(
        "SELECT id, user_id, start_date, end_date, report_type, export_format, email_to, status, created_at \
         FROM report_requests WHERE id = $1",
    )
    .bind(report_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Report request not found".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn row(user_id: i64, log_date: &str, present: bool, binning: i32, picking: i32) -> MetricsRow {
        MetricsRow {
            user_id,
            username: format!("user{user_id}"),
            full_name: format!("User {user_id}"),
            log_date: date(log_date),
            is_present: present,
            binning_count: binning,
            picking_count: picking,
            total_items: binning + picking,
        }
    }

    #[test]
    fn period_keys_per_granularity() {
        // 2025-03-05 is a Wednesday
        let d = date("2025-03-05");
        assert_eq!(GroupBy::Day.period_key(d), d);
        assert_eq!(GroupBy::Week.period_key(d), date("2025-03-03"));
        assert_eq!(GroupBy::Month.period_key(d), date("2025-03-01"));
    }

    #[test]
    fn monday_maps_to_itself_for_weekly_grouping() {
        let monday = date("2025-03-03");
        assert_eq!(GroupBy::Week.period_key(monday), monday);
    }

    #[test]
    fn groups_by_day_with_rates() {
        let rows = vec![
            row(1, "2025-03-03", true, 30, 70),
            row(2, "2025-03-03", false, 0, 0),
            row(1, "2025-03-04", true, 10, 10),
        ];

        let metrics = group_metrics(&rows, GroupBy::Day);
        assert_eq!(metrics.len(), 2);

        let first = &metrics[0];
        assert_eq!(first.period, date("2025-03-03"));
        assert_eq!(first.total_items, 100);
        assert_eq!(first.active_operators, 2);
        assert!((first.average_items_per_operator - 50.0).abs() < 1e-9);
        assert!((first.binning_percentage - 30.0).abs() < 1e-9);
        assert!((first.picking_percentage - 70.0).abs() < 1e-9);
        assert!((first.attendance_rate - 50.0).abs() < 1e-9);
    }

    #[test]
    fn zero_items_yields_zero_percentages() {
        let rows = vec![row(1, "2025-03-03", false, 0, 0)];
        let metrics = group_metrics(&rows, GroupBy::Day);
        assert_eq!(metrics[0].binning_percentage, 0.0);
        assert_eq!(metrics[0].picking_percentage, 0.0);
        assert_eq!(metrics[0].attendance_rate, 0.0);
    }

    #[test]
    fn weekly_grouping_merges_a_working_week() {
        let rows = vec![
            row(1, "2025-03-03", true, 10, 0),
            row(1, "2025-03-05", true, 0, 20),
            row(2, "2025-03-07", true, 5, 5),
            row(1, "2025-03-10", true, 1, 1),
        ];

        let metrics = group_metrics(&rows, GroupBy::Week);
        assert_eq!(metrics.len(), 2);
        assert_eq!(metrics[0].period, date("2025-03-03"));
        assert_eq!(metrics[0].total_items, 40);
        assert_eq!(metrics[0].active_operators, 2);
        assert_eq!(metrics[1].period, date("2025-03-10"));
        assert_eq!(metrics[1].total_items, 2);
    }

    #[test]
    fn team_metrics_carry_target_and_breakdown() {
        let rows = vec![
            row(1, "2025-03-03", true, 50, 50),
            row(2, "2025-03-03", true, 25, 25),
        ];

        let metrics = group_team_metrics(&rows, GroupBy::Day, Some(100));
        assert_eq!(metrics.len(), 1);
        let period = &metrics[0];

        // 150 items against 100/day over 2 rows
        assert_eq!(period.target_achievement, Some(75.0));
        assert_eq!(period.operator_performance.len(), 2);

        let op1 = &period.operator_performance[0];
        assert_eq!(op1.user_id, 1);
        assert_eq!(op1.total_items, 100);
        assert!((op1.average_items_per_day - 50.0).abs() < 1e-9);
        assert!((op1.attendance_rate - 50.0).abs() < 1e-9);
    }

    #[test]
    fn team_metrics_without_target() {
        let rows = vec![row(1, "2025-03-03", true, 10, 10)];
        let metrics = group_team_metrics(&rows, GroupBy::Day, None);
        assert_eq!(metrics[0].target_achievement, None);
    }

    #[test]
    fn empty_input_groups_to_nothing() {
        assert!(group_metrics(&[], GroupBy::Day).is_empty());
        assert!(group_team_metrics(&[], GroupBy::Month, Some(10)).is_empty());
    }
}
