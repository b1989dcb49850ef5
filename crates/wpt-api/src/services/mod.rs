//! Data-access services backing the CRUD endpoints
//!
//! These modules talk to PostgreSQL directly; only the auth subsystem goes
//! through the credential-store seam.

pub mod activity_logs;
pub mod daily_logs;
pub mod performance;

use crate::error::AppError;
use serde::Serialize;

/// Paginated listing envelope
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub logs: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new(logs: Vec<T>, total: i64, page: i64, limit: i64) -> Self {
        Self {
            logs,
            total,
            page,
            limit,
            total_pages: (total + limit - 1) / limit,
        }
    }
}

pub(crate) fn validate_pagination(page: i64, limit: i64) -> Result<(), AppError> {
    if page < 1 {
        return Err(AppError::BadRequest("page must be at least 1".to_string()));
    }
    if !(1..=100).contains(&limit) {
        return Err(AppError::BadRequest(
            "limit must be between 1 and 100".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_count_rounds_up() {
        let page = Page::new(vec![1, 2, 3], 11, 1, 5);
        assert_eq!(page.total_pages, 3);
    }

    #[test]
    fn pagination_bounds() {
        assert!(validate_pagination(1, 1).is_ok());
        assert!(validate_pagination(1, 100).is_ok());
        assert!(validate_pagination(0, 10).is_err());
        assert!(validate_pagination(1, 0).is_err());
        assert!(validate_pagination(1, 101).is_err());
    }
}
