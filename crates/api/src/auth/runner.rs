//! Runner capability-token resolution.
//!
//! Every runner-facing endpoint authenticates through these helpers with
//! a fixed error discipline: malformed identifiers fail with 400 before
//! any lookup, unknown or non-matching credentials fail with 404, and a
//! correctly owned job in the wrong state fails with 400.

use axum::http::HeaderMap;
use uuid::Uuid;

use mediagrid_core::error::CoreError;
use mediagrid_core::runners::parse_uuid;
use mediagrid_core::tokens::{check_token_format, tokens_match};
use mediagrid_db::models::runner::Runner;
use mediagrid_db::models::runner_job::RunnerJob;
use mediagrid_db::models::status::JobState;
use mediagrid_db::repositories::{RunnerJobRepo, RunnerRepo};

use crate::error::AppResult;

/// Best-effort client address for `runners.last_contact` tracking.
pub fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|| "0.0.0.0".to_string())
}

/// Resolve a runner from its session token.
///
/// Refreshes `last_contact` as a side effect (throttled in the store).
pub async fn authenticate_runner(
    pool: &sqlx::PgPool,
    headers: &HeaderMap,
    runner_token: &str,
) -> AppResult<Runner> {
    check_token_format("runnerToken", runner_token)?;

    let runner = RunnerRepo::find_by_token(pool, runner_token)
        .await?
        .ok_or_else(|| CoreError::not_found("Runner", "by token"))?;

    RunnerRepo::update_last_contact(pool, runner.id, &client_ip(headers)).await?;

    Ok(runner)
}

/// Resolve a job the runner merely names (the accept path: no job token
/// exists yet).
pub async fn resolve_named_job(
    pool: &sqlx::PgPool,
    headers: &HeaderMap,
    job_uuid: &str,
    runner_token: &str,
) -> AppResult<(RunnerJob, Runner)> {
    let uuid = parse_uuid("jobUUID", job_uuid)?;
    let runner = authenticate_runner(pool, headers, runner_token).await?;

    let job = RunnerJobRepo::find_by_uuid(pool, uuid)
        .await?
        .ok_or_else(|| CoreError::not_found("Runner job", uuid))?;

    Ok((job, runner))
}

/// Resolve a job the runner claims to own via the (jobUUID, runnerToken,
/// jobToken) triple.
///
/// A non-matching triple answers 404 without revealing which leg failed;
/// a correctly owned job that is no longer processing answers 400.
pub async fn resolve_owned_job(
    pool: &sqlx::PgPool,
    headers: &HeaderMap,
    job_uuid: &str,
    runner_token: &str,
    job_token: &str,
) -> AppResult<(RunnerJob, Runner)> {
    let uuid = parse_uuid("jobUUID", job_uuid)?;
    check_token_format("jobToken", job_token)?;
    let runner = authenticate_runner(pool, headers, runner_token).await?;

    let job = RunnerJobRepo::find_by_uuid(pool, uuid)
        .await?
        .ok_or_else(|| CoreError::not_found("Runner job", uuid))?;

    if job.runner_id != Some(runner.id) {
        return Err(CoreError::Ownership(format!(
            "runner {} does not hold job {uuid}",
            runner.id
        ))
        .into());
    }

    // Lease tokens only exist while processing; past that point the job
    // is owned but no longer mutable by the runner.
    let Some(lease_token) = job.processing_job_token.as_deref() else {
        return Err(CoreError::StateConflict(format!(
            "Job {uuid} is not in processing state"
        ))
        .into());
    };

    if job.state != JobState::Processing.id() {
        return Err(CoreError::StateConflict(format!(
            "Job {uuid} is not in processing state"
        ))
        .into());
    }

    if !tokens_match(lease_token, job_token) {
        return Err(CoreError::Ownership(format!(
            "job token mismatch for job {uuid}"
        ))
        .into());
    }

    Ok((job, runner))
}

/// Check that a file route's `videoUUID` matches the job's video.
///
/// The caller resolves the video row first so an unknown uuid answers 404
/// and only a known-but-foreign video answers 403.
pub fn check_video_scope(job: &RunnerJob, video_id: i64, video_uuid: Uuid) -> AppResult<()> {
    if job.video_id != video_id {
        return Err(CoreError::Forbidden(format!(
            "Video {video_uuid} does not belong to this job"
        ))
        .into());
    }
    Ok(())
}
