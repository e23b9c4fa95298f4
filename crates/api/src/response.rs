//! Shared response envelope types for API handlers.
//!
//! Single entities use the `{ "data": ... }` envelope; admin listings use
//! `{ "total": N, "data": [...] }`.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// Paginated `{ "total": N, "data": [...] }` envelope for list endpoints.
#[derive(Debug, Serialize)]
pub struct ListResponse<T: Serialize> {
    pub total: i64,
    pub data: Vec<T>,
}
