//! Handlers for `/runners/jobs`: the runner-facing job protocol plus the
//! admin job surface.
//!
//! Runner endpoints authenticate with capability tokens in the request
//! body (see [`crate::auth::runner`]); admin endpoints use JWT.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use mediagrid_core::error::CoreError;
use mediagrid_core::job_types::{parse_job_types_filter, validate_success_payload, RunnerJobType};
use mediagrid_core::live::{
    validate_live_update, LiveRtmpHlsUpdatePayload, LiveUpdateKind,
};
use mediagrid_core::pagination::{validate_pagination, validate_sort};
use mediagrid_core::runners::{
    parse_uuid, validate_abort_reason, validate_error_message, validate_progress,
};
use mediagrid_db::models::runner_job::{
    AvailableJob, CreateRunnerJob, RunnerJob, RunnerJobListFilter, RunnerJobView,
};
use mediagrid_db::models::status::JobState;
use mediagrid_db::repositories::{RunnerJobRepo, VideoRepo};
use mediagrid_events::bus::{
    JobEvent, EVENT_JOB_ABORTED, EVENT_JOB_ACCEPTED, EVENT_JOB_CANCELLED, EVENT_JOB_COMPLETED,
    EVENT_JOB_CREATED, EVENT_JOB_ERRORED,
};

use crate::auth::runner::{authenticate_runner, resolve_named_job, resolve_owned_job};
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::{DataResponse, ListResponse};
use crate::state::AppState;
use crate::storage;
use crate::upload::{collect_form, RunnerForm};

/// How many pending jobs a request call advertises at most.
const AVAILABLE_JOBS_LIMIT: i64 = 10;

/// Whitelisted sort fields for the admin job listing.
const JOB_SORT: &[(&str, &str)] = &[
    ("createdAt", "created_at"),
    ("updatedAt", "updated_at"),
    ("priority", "priority"),
    ("state", "state"),
    ("progress", "progress"),
];

// ---------------------------------------------------------------------------
// Runner protocol: request / accept
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestJobsBody {
    pub runner_token: String,
    pub job_types: Option<Vec<String>>,
}

/// POST /api/v1/runners/jobs/request
///
/// Advisory listing of pending jobs matching the runner's declared types.
/// Never mutates job state; the jobs may be gone by the time the runner
/// tries to accept one.
pub async fn request_jobs(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<RequestJobsBody>,
) -> AppResult<impl IntoResponse> {
    let types = parse_job_types_filter(input.job_types.as_ref())?;
    let runner = authenticate_runner(&state.pool, &headers, &input.runner_token).await?;

    let type_names: Vec<String> = types.iter().map(|t| t.as_str().to_string()).collect();
    let filter = if type_names.is_empty() {
        None
    } else {
        Some(type_names.as_slice())
    };

    let jobs = RunnerJobRepo::list_available(&state.pool, filter, AVAILABLE_JOBS_LIMIT).await?;
    let available: Vec<AvailableJob> = jobs.iter().map(AvailableJob::from).collect();

    tracing::debug!(runner_id = runner.id, count = available.len(), "Jobs requested");

    Ok(Json(json!({ "availableJobs": available })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptJobBody {
    pub runner_token: String,
}

/// POST /api/v1/runners/jobs/{uuid}/accept
///
/// The dispatch decision point. The conditional update in the store picks
/// exactly one winner under concurrent accepts; every loser gets 400.
pub async fn accept_job(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(job_uuid): Path<String>,
    Json(input): Json<AcceptJobBody>,
) -> AppResult<impl IntoResponse> {
    let (job, runner) =
        resolve_named_job(&state.pool, &headers, &job_uuid, &input.runner_token).await?;

    if job.state != JobState::Pending.id() {
        return Err(CoreError::StateConflict(format!(
            "Job {} is not in pending state",
            job.uuid
        ))
        .into());
    }

    let Some(accepted) = RunnerJobRepo::accept(&state.pool, job.uuid, runner.id).await? else {
        // Lost the race between the state check and the update.
        return Err(CoreError::StateConflict(format!(
            "Job {} is not in pending state",
            job.uuid
        ))
        .into());
    };

    tracing::info!(
        job_uuid = %accepted.uuid,
        job_type = %accepted.job_type,
        runner_id = runner.id,
        "Job accepted",
    );

    state.event_bus.publish(
        JobEvent::new(EVENT_JOB_ACCEPTED, accepted.uuid, accepted.job_type.clone())
            .with_runner(runner.id),
    );

    let job_token = accepted
        .processing_job_token
        .clone()
        .ok_or_else(|| AppError::InternalError("Accepted job lost its lease token".into()))?;

    Ok(Json(json!({
        "job": RunnerJobView::from(&accepted),
        "jobToken": job_token,
    })))
}

// ---------------------------------------------------------------------------
// Runner protocol: abort / error
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbortJobBody {
    pub runner_token: String,
    pub job_token: String,
    pub reason: String,
}

/// POST /api/v1/runners/jobs/{uuid}/abort
///
/// The runner gives the job back; it returns to the pending pool for
/// another runner with a fresh lease.
pub async fn abort_job(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(job_uuid): Path<String>,
    Json(input): Json<AbortJobBody>,
) -> AppResult<impl IntoResponse> {
    validate_abort_reason(&input.reason)?;

    let (job, runner) = resolve_owned_job(
        &state.pool,
        &headers,
        &job_uuid,
        &input.runner_token,
        &input.job_token,
    )
    .await?;

    if !RunnerJobRepo::abort(&state.pool, job.id).await? {
        return Err(CoreError::StateConflict(format!(
            "Job {} is not in processing state",
            job.uuid
        ))
        .into());
    }

    tracing::info!(
        job_uuid = %job.uuid,
        runner_id = runner.id,
        reason = %input.reason,
        "Job aborted by runner",
    );

    state.event_bus.publish(
        JobEvent::new(EVENT_JOB_ABORTED, job.uuid, job.job_type.clone())
            .with_runner(runner.id)
            .with_payload(json!({ "reason": input.reason })),
    );

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorJobBody {
    pub runner_token: String,
    pub job_token: String,
    pub message: String,
}

/// POST /api/v1/runners/jobs/{uuid}/error
///
/// Terminal failure. The job is not re-queued; an operator decides what
/// happens next.
pub async fn error_job(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(job_uuid): Path<String>,
    Json(input): Json<ErrorJobBody>,
) -> AppResult<impl IntoResponse> {
    validate_error_message(&input.message)?;

    let (job, runner) = resolve_owned_job(
        &state.pool,
        &headers,
        &job_uuid,
        &input.runner_token,
        &input.job_token,
    )
    .await?;

    if !RunnerJobRepo::error(&state.pool, job.id, &input.message).await? {
        return Err(CoreError::StateConflict(format!(
            "Job {} is not in processing state",
            job.uuid
        ))
        .into());
    }

    tracing::warn!(
        job_uuid = %job.uuid,
        runner_id = runner.id,
        error = %input.message,
        "Job errored",
    );

    state.event_bus.publish(
        JobEvent::new(EVENT_JOB_ERRORED, job.uuid, job.job_type.clone())
            .with_runner(runner.id)
            .with_payload(json!({ "message": input.message })),
    );

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Runner protocol: update (progress + live chunks)
// ---------------------------------------------------------------------------

/// POST /api/v1/runners/jobs/{uuid}/update (multipart)
///
/// Progress report for every job type; for live jobs the same call also
/// relays playlist/chunk files. All filename validation happens before
/// any byte reaches the live directory.
pub async fn update_job(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(job_uuid): Path<String>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let spool = storage::tmp_dir(&state.config.storage_dir);
    let form = collect_form(multipart, &spool).await?;

    let outcome = update_job_inner(&state, &headers, &job_uuid, &form).await;

    // Spool cleanup either way; persisted files were already moved out.
    form.discard().await;
    outcome
}

async fn update_job_inner(
    state: &AppState,
    headers: &HeaderMap,
    job_uuid: &str,
    form: &RunnerForm,
) -> AppResult<StatusCode> {
    let runner_token = form.require_field("runnerToken")?;
    let job_token = form.require_field("jobToken")?;

    let progress: Option<i16> = match form.field("progress") {
        None => None,
        Some(raw) => Some(
            raw.parse()
                .map_err(|_| CoreError::Validation(format!("Invalid progress '{raw}'")))?,
        ),
    };
    validate_progress(progress)?;

    let (job, runner) =
        resolve_owned_job(&state.pool, headers, job_uuid, runner_token, job_token).await?;

    let job_type = RunnerJobType::parse(&job.job_type)?;

    if job_type.is_live() {
        if form.field("payload[type]").is_some() {
            relay_live_chunk(state, &job, form).await?;
        }
    } else if form.fields.keys().any(|k| k.starts_with("payload[")) {
        return Err(CoreError::Validation(format!(
            "Job type {job_type} does not accept update payloads"
        ))
        .into());
    }

    if !RunnerJobRepo::update_progress(&state.pool, job.id, progress).await? {
        return Err(CoreError::StateConflict(format!(
            "Job {} is not in processing state",
            job.uuid
        ))
        .into());
    }

    tracing::debug!(job_uuid = %job.uuid, runner_id = runner.id, ?progress, "Job updated");

    Ok(StatusCode::NO_CONTENT)
}

/// Apply the live part of an update: validate the declared filenames,
/// then move the spooled files into `STORAGE_DIR/live/{videoUUID}/`.
async fn relay_live_chunk(state: &AppState, job: &RunnerJob, form: &RunnerForm) -> AppResult<()> {
    let kind = match form.require_field("payload[type]")? {
        "add-chunk" => LiveUpdateKind::AddChunk,
        "remove-chunk" => LiveUpdateKind::RemoveChunk,
        other => {
            return Err(CoreError::Validation(format!("Unknown update type '{other}'")).into());
        }
    };

    let payload = LiveRtmpHlsUpdatePayload {
        kind,
        master_playlist_file: form
            .file("payload[masterPlaylistFile]")
            .map(|f| f.path.display().to_string()),
        resolution_playlist_filename: form
            .require_field("payload[resolutionPlaylistFilename]")?
            .to_string(),
        resolution_playlist_file: form
            .file("payload[resolutionPlaylistFile]")
            .map(|f| f.path.display().to_string()),
        video_chunk_filename: form
            .require_field("payload[videoChunkFilename]")?
            .to_string(),
        video_chunk_file: form
            .file("payload[videoChunkFile]")
            .map(|f| f.path.display().to_string()),
    };

    validate_live_update(&payload)?;

    let video = VideoRepo::find_by_id(&state.pool, job.video_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Video", job.video_id))?;
    let storage_dir = &state.config.storage_dir;

    match payload.kind {
        LiveUpdateKind::AddChunk => {
            if let Some(file) = form.file("payload[videoChunkFile]") {
                storage::persist_live_file(
                    storage_dir,
                    video.uuid,
                    &payload.video_chunk_filename,
                    &file.path,
                )
                .await?;
            }
            if let Some(file) = form.file("payload[resolutionPlaylistFile]") {
                storage::persist_live_file(
                    storage_dir,
                    video.uuid,
                    &payload.resolution_playlist_filename,
                    &file.path,
                )
                .await?;
            }
            if let Some(file) = form.file("payload[masterPlaylistFile]") {
                storage::persist_live_file(storage_dir, video.uuid, "master.m3u8", &file.path)
                    .await?;
            }
        }
        LiveUpdateKind::RemoveChunk => {
            let chunk =
                storage::live_dir(storage_dir, video.uuid).join(&payload.video_chunk_filename);
            if let Err(e) = tokio::fs::remove_file(&chunk).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    return Err(AppError::InternalError(format!(
                        "Cannot remove live chunk: {e}"
                    )));
                }
            }
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Runner protocol: success
// ---------------------------------------------------------------------------

/// POST /api/v1/runners/jobs/{uuid}/success (multipart)
///
/// Terminal success. The payload shape depends on the job type; result
/// files are kept under `STORAGE_DIR/results/{jobUUID}/`.
pub async fn success_job(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(job_uuid): Path<String>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let spool = storage::tmp_dir(&state.config.storage_dir);
    let form = collect_form(multipart, &spool).await?;

    let outcome = success_job_inner(&state, &headers, &job_uuid, &form).await;

    form.discard().await;
    outcome
}

async fn success_job_inner(
    state: &AppState,
    headers: &HeaderMap,
    job_uuid: &str,
    form: &RunnerForm,
) -> AppResult<StatusCode> {
    let runner_token = form.require_field("runnerToken")?;
    let job_token = form.require_field("jobToken")?;

    let (job, runner) =
        resolve_owned_job(&state.pool, headers, job_uuid, runner_token, job_token).await?;

    let job_type = RunnerJobType::parse(&job.job_type)?;

    // Assemble the declared payload: text fields as values, file parts as
    // their spool paths (moved to the results directory after validation).
    let mut payload = serde_json::Map::new();
    for (key, value) in &form.fields {
        if let Some(inner) = payload_key(key) {
            payload.insert(inner.to_string(), json!(value));
        }
    }
    for file in &form.files {
        if let Some(inner) = payload_key(&file.field) {
            payload.insert(inner.to_string(), json!(file.path.display().to_string()));
        }
    }
    let payload = serde_json::Value::Object(payload);

    validate_success_payload(job_type, &payload)?;

    if !RunnerJobRepo::complete(&state.pool, job.id).await? {
        return Err(CoreError::StateConflict(format!(
            "Job {} is not in processing state",
            job.uuid
        ))
        .into());
    }

    // Keep produced files for the platform to collect.
    let results_dir = storage::results_dir(&state.config.storage_dir, job.uuid);
    if !form.files.is_empty() {
        tokio::fs::create_dir_all(&results_dir).await.map_err(|e| {
            AppError::InternalError(format!("Cannot create results directory: {e}"))
        })?;
        for file in &form.files {
            if let Some(inner) = payload_key(&file.field) {
                storage::move_file(&file.path, &results_dir.join(inner)).await?;
            }
        }
    }

    tracing::info!(
        job_uuid = %job.uuid,
        job_type = %job.job_type,
        runner_id = runner.id,
        "Job completed",
    );

    state.event_bus.publish(
        JobEvent::new(EVENT_JOB_COMPLETED, job.uuid, job.job_type.clone())
            .with_runner(runner.id)
            .with_payload(payload),
    );

    Ok(StatusCode::NO_CONTENT)
}

/// Extract `xxx` from a `payload[xxx]` form field name.
fn payload_key(field: &str) -> Option<&str> {
    field.strip_prefix("payload[")?.strip_suffix(']')
}

// ---------------------------------------------------------------------------
// Admin surface
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct AdminJobListQuery {
    pub start: Option<i64>,
    pub count: Option<i64>,
    pub sort: Option<String>,
    #[serde(rename = "stateOneOf")]
    pub state_one_of: Option<String>,
}

/// GET /api/v1/runners/jobs (admin)
///
/// `stateOneOf` is a comma-separated list of state ids.
pub async fn list_jobs(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<AdminJobListQuery>,
) -> AppResult<impl IntoResponse> {
    let list_query = mediagrid_core::pagination::ListQuery {
        start: query.start,
        count: query.count,
        sort: query.sort.clone(),
    };
    let pagination = validate_pagination(&list_query)?;
    let sort = validate_sort(query.sort.as_deref(), JOB_SORT)?;

    let state_one_of = match query.state_one_of.as_deref() {
        None | Some("") => None,
        Some(raw) => {
            let mut states = Vec::new();
            for part in raw.split(',') {
                let id: i16 = part
                    .trim()
                    .parse()
                    .map_err(|_| CoreError::Validation(format!("Invalid state '{part}'")))?;
                if JobState::from_id(id).is_none() {
                    return Err(CoreError::Validation(format!("Unknown state {id}")).into());
                }
                states.push(id);
            }
            Some(states)
        }
    };

    let filter = RunnerJobListFilter { state_one_of };

    let jobs = RunnerJobRepo::list_for_admin(&state.pool, &filter, pagination, sort).await?;
    let total = RunnerJobRepo::count_for_admin(&state.pool, &filter).await?;

    let data: Vec<RunnerJobView> = jobs.iter().map(RunnerJobView::from).collect();

    Ok(Json(ListResponse { total, data }))
}

/// POST /api/v1/runners/jobs (admin)
///
/// Enqueue a new job against an existing video.
pub async fn enqueue_job(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateRunnerJob>,
) -> AppResult<impl IntoResponse> {
    RunnerJobType::parse(&input.job_type)?;

    let video = VideoRepo::find_by_uuid(&state.pool, input.video_uuid)
        .await?
        .ok_or_else(|| CoreError::not_found("Video", input.video_uuid))?;

    let job = RunnerJobRepo::create(&state.pool, video.id, &input).await?;

    tracing::info!(
        job_uuid = %job.uuid,
        job_type = %job.job_type,
        video_uuid = %video.uuid,
        admin_id = admin.user_id,
        "Job enqueued",
    );

    state
        .event_bus
        .publish(JobEvent::new(EVENT_JOB_CREATED, job.uuid, job.job_type.clone()));

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: RunnerJobView::from(&job),
        }),
    ))
}

/// POST /api/v1/runners/jobs/{uuid}/cancel (admin)
pub async fn cancel_job(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(job_uuid): Path<String>,
) -> AppResult<impl IntoResponse> {
    let uuid = parse_uuid("jobUUID", &job_uuid)?;

    let job = RunnerJobRepo::find_by_uuid(&state.pool, uuid)
        .await?
        .ok_or_else(|| CoreError::not_found("Runner job", uuid))?;

    if !RunnerJobRepo::cancel(&state.pool, uuid).await? {
        return Err(CoreError::StateConflict(format!(
            "Job {uuid} is already in a terminal state"
        ))
        .into());
    }

    tracing::info!(job_uuid = %uuid, admin_id = admin.user_id, "Job cancelled");

    state
        .event_bus
        .publish(JobEvent::new(EVENT_JOB_CANCELLED, uuid, job.job_type));

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/runners/jobs/{uuid} (admin)
///
/// Removes the job in any state and cleans up partial live output.
pub async fn delete_job(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(job_uuid): Path<String>,
) -> AppResult<impl IntoResponse> {
    let uuid = parse_uuid("jobUUID", &job_uuid)?;

    let job = RunnerJobRepo::find_by_uuid(&state.pool, uuid)
        .await?
        .ok_or_else(|| CoreError::not_found("Runner job", uuid))?;

    if let Some(video) = VideoRepo::find_by_id(&state.pool, job.video_id).await? {
        if RunnerJobType::parse(&job.job_type).is_ok_and(RunnerJobType::is_live) {
            storage::remove_live_dir(&state.config.storage_dir, video.uuid).await?;
        }
    }
    storage::remove_results_dir(&state.config.storage_dir, uuid).await?;

    RunnerJobRepo::delete(&state.pool, uuid).await?;

    tracing::info!(job_uuid = %uuid, admin_id = admin.user_id, "Job deleted");

    Ok(StatusCode::NO_CONTENT)
}
