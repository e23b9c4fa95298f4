//! Video anchor entity.
//!
//! Videos are owned by the wider platform; this subsystem only needs the
//! row as the immutable authorization anchor for job file access.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use mediagrid_core::types::{DbId, Timestamp};

/// A row from the `videos` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: DbId,
    pub uuid: Uuid,
    pub name: String,
    pub created_at: Timestamp,
}

/// Body of `POST /videos` (admin).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVideo {
    pub name: String,
}
