//! Runner job entity and protocol DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use mediagrid_core::types::{DbId, Timestamp};

use super::status::{JobState, StateId};

/// A row from the `runner_jobs` table.
#[derive(Debug, Clone, FromRow)]
pub struct RunnerJob {
    pub id: DbId,
    pub uuid: Uuid,
    pub job_type: String,
    pub state: StateId,
    /// Runner-visible job description.
    pub payload: serde_json::Value,
    /// Internal context, never sent to runners.
    pub private_payload: serde_json::Value,
    pub priority: i32,
    pub progress: Option<i16>,
    pub failures: i32,
    pub error: Option<String>,
    /// Set iff `state` is processing; forms the lease together with
    /// `runner_id`.
    pub processing_job_token: Option<String>,
    pub runner_id: Option<DbId>,
    pub video_id: DbId,
    pub started_at: Option<Timestamp>,
    pub finished_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Parameters for enqueueing a new job.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRunnerJob {
    #[serde(rename = "type")]
    pub job_type: String,
    pub video_uuid: Uuid,
    #[serde(default)]
    pub payload: serde_json::Value,
    #[serde(default)]
    pub private_payload: serde_json::Value,
    #[serde(default)]
    pub priority: i32,
}

/// Filter for the admin job listing, on top of the common
/// start/count/sort parameters.
#[derive(Debug, Default)]
pub struct RunnerJobListFilter {
    pub state_one_of: Option<Vec<StateId>>,
}

/// Serialized job state: numeric id plus human label.
#[derive(Debug, Serialize)]
pub struct JobStateView {
    pub id: StateId,
    pub label: &'static str,
}

impl From<StateId> for JobStateView {
    fn from(id: StateId) -> Self {
        JobStateView {
            id,
            label: JobState::from_id(id).map(JobState::label).unwrap_or("Unknown"),
        }
    }
}

/// Job representation for API responses.
///
/// Excludes `private_payload` and the lease token: runners and admins see
/// the same shape.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunnerJobView {
    pub uuid: Uuid,
    #[serde(rename = "type")]
    pub job_type: String,
    pub state: JobStateView,
    pub payload: serde_json::Value,
    pub priority: i32,
    pub progress: Option<i16>,
    pub failures: i32,
    pub error: Option<String>,
    pub runner_id: Option<DbId>,
    pub started_at: Option<Timestamp>,
    pub finished_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<&RunnerJob> for RunnerJobView {
    fn from(job: &RunnerJob) -> Self {
        RunnerJobView {
            uuid: job.uuid,
            job_type: job.job_type.clone(),
            state: job.state.into(),
            payload: job.payload.clone(),
            priority: job.priority,
            progress: job.progress,
            failures: job.failures,
            error: job.error.clone(),
            runner_id: job.runner_id,
            started_at: job.started_at,
            finished_at: job.finished_at,
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}

/// Summary sent to a polling runner for each available job.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableJob {
    pub uuid: Uuid,
    #[serde(rename = "type")]
    pub job_type: String,
    pub payload: serde_json::Value,
}

impl From<&RunnerJob> for AvailableJob {
    fn from(job: &RunnerJob) -> Self {
        AvailableJob {
            uuid: job.uuid,
            job_type: job.job_type.clone(),
            payload: job.payload.clone(),
        }
    }
}
