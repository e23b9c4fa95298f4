//! Runner entity and registration DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use mediagrid_core::types::{DbId, Timestamp};

/// A row from the `runners` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Runner {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    /// Long-lived bearer credential; never chosen by the client.
    #[serde(skip_serializing)]
    pub runner_token: String,
    /// Source address of the most recent contact.
    pub ip_address: String,
    pub last_contact: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Body of `POST /runners/register`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRunner {
    pub name: String,
    pub description: Option<String>,
    pub registration_token: String,
}

/// Body of `POST /runners/unregister`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnregisterRunner {
    pub runner_token: String,
}
