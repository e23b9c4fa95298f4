//! Registration token entity.

use serde::Serialize;
use sqlx::FromRow;

use mediagrid_core::types::{DbId, Timestamp};

/// A row from the `runner_registration_tokens` table.
///
/// The token value is a bearer secret; it is only ever serialized on the
/// admin surface.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationToken {
    pub id: DbId,
    pub registration_token: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
