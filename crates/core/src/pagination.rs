//! `start` / `count` / `sort` validation for admin list endpoints.
//!
//! Sort values are checked against a per-endpoint whitelist of column
//! names (with an optional `-` prefix for descending order) so no user
//! input is ever interpolated into SQL.

use serde::Deserialize;

use crate::error::CoreError;

/// Default page size for list endpoints.
pub const DEFAULT_COUNT: i64 = 15;

/// Maximum page size for list endpoints.
pub const MAX_COUNT: i64 = 100;

/// Raw query parameters common to every admin list endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub start: Option<i64>,
    pub count: Option<i64>,
    pub sort: Option<String>,
}

/// Validated pagination window.
#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    pub start: i64,
    pub count: i64,
}

/// Validated sort: a whitelisted column and a direction.
#[derive(Debug, Clone, Copy)]
pub struct Sort {
    pub column: &'static str,
    pub descending: bool,
}

impl Sort {
    /// SQL fragment for an ORDER BY clause, e.g. `created_at DESC`.
    pub fn to_sql(self) -> String {
        let direction = if self.descending { "DESC" } else { "ASC" };
        format!("{} {direction}", self.column)
    }
}

/// Validate `start`/`count`. Negative values and a zero or oversized
/// `count` are rejected.
pub fn validate_pagination(query: &ListQuery) -> Result<Pagination, CoreError> {
    let start = query.start.unwrap_or(0);
    if start < 0 {
        return Err(CoreError::Validation("Invalid start pagination".into()));
    }

    let count = query.count.unwrap_or(DEFAULT_COUNT);
    if count <= 0 || count > MAX_COUNT {
        return Err(CoreError::Validation("Invalid count pagination".into()));
    }

    Ok(Pagination { start, count })
}

/// Validate a `sort` value against a whitelist of API field names.
///
/// `allowed` maps API sort names (e.g. `"createdAt"`) to SQL column
/// names. A missing sort falls back to the first entry, descending.
pub fn validate_sort(
    sort: Option<&str>,
    allowed: &[(&'static str, &'static str)],
) -> Result<Sort, CoreError> {
    let Some(raw) = sort else {
        return Ok(Sort {
            column: allowed[0].1,
            descending: true,
        });
    };

    let (descending, field) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw),
    };

    for (name, column) in allowed {
        if *name == field {
            return Ok(Sort {
                column,
                descending,
            });
        }
    }

    Err(CoreError::Validation(format!("Invalid sort '{raw}'")))
}
