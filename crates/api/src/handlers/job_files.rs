//! Handlers for `/runners/jobs/{uuid}/files/...`: the file access gateway.
//!
//! A runner holding a processing lease fetches the source media it needs
//! over these POST routes, authenticating with the same token pair as the
//! rest of the protocol. Scope tiers: malformed `videoUUID` answers 400,
//! unknown 404, known but not this job's video 403.

use std::path::Path as FsPath;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tokio_util::io::ReaderStream;

use mediagrid_core::error::CoreError;
use mediagrid_core::job_types::{studio_payload_references_file, RunnerJobType};
use mediagrid_core::runners::parse_uuid;
use mediagrid_db::models::runner_job::RunnerJob;
use mediagrid_db::models::video::Video;
use mediagrid_db::repositories::VideoRepo;

use crate::auth::runner::{check_video_scope, resolve_owned_job};
use crate::error::AppResult;
use crate::state::AppState;
use crate::storage;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAccessBody {
    pub runner_token: String,
    pub job_token: String,
}

/// Resolve the job lease and the scoped video for a file route.
async fn resolve_file_scope(
    state: &AppState,
    headers: &HeaderMap,
    job_uuid: &str,
    video_uuid: &str,
    body: &FileAccessBody,
) -> AppResult<(RunnerJob, Video)> {
    let video_uuid = parse_uuid("videoUUID", video_uuid)?;

    let (job, _runner) = resolve_owned_job(
        &state.pool,
        headers,
        job_uuid,
        &body.runner_token,
        &body.job_token,
    )
    .await?;

    let video = VideoRepo::find_by_uuid(&state.pool, video_uuid)
        .await?
        .ok_or_else(|| CoreError::not_found("Video", video_uuid))?;

    check_video_scope(&job, video.id, video.uuid)?;

    Ok((job, video))
}

/// Stream a storage file, answering 404 when it does not exist.
async fn stream_file(path: &FsPath) -> AppResult<Response> {
    let file = match tokio::fs::File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(CoreError::not_found("File", path.display()).into());
        }
        Err(e) => {
            return Err(crate::error::AppError::InternalError(format!(
                "Cannot open file: {e}"
            )));
        }
    };

    let stream = ReaderStream::new(file);
    let body = Body::from_stream(stream);

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/octet-stream")],
        body,
    )
        .into_response())
}

/// POST /api/v1/runners/jobs/{uuid}/files/videos/{videoUUID}/max-quality
pub async fn max_quality(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((job_uuid, video_uuid)): Path<(String, String)>,
    axum::Json(body): axum::Json<FileAccessBody>,
) -> AppResult<Response> {
    let (job, video) =
        resolve_file_scope(&state, &headers, &job_uuid, &video_uuid, &body).await?;

    tracing::debug!(job_uuid = %job.uuid, video_uuid = %video.uuid, "Source video fetched");

    stream_file(&storage::video_source_path(&state.config.storage_dir, video.uuid)).await
}

/// POST /api/v1/runners/jobs/{uuid}/files/videos/{videoUUID}/previews/max-quality
pub async fn preview_max_quality(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((job_uuid, video_uuid)): Path<(String, String)>,
    axum::Json(body): axum::Json<FileAccessBody>,
) -> AppResult<Response> {
    let (job, video) =
        resolve_file_scope(&state, &headers, &job_uuid, &video_uuid, &body).await?;

    tracing::debug!(job_uuid = %job.uuid, video_uuid = %video.uuid, "Preview fetched");

    stream_file(&storage::video_preview_path(&state.config.storage_dir, video.uuid)).await
}

/// POST /api/v1/runners/jobs/{uuid}/files/videos/{videoUUID}/studio/task-files/{filename}
///
/// Only filenames referenced by the studio job's task list are served.
pub async fn studio_task_file(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((job_uuid, video_uuid, filename)): Path<(String, String, String)>,
    axum::Json(body): axum::Json<FileAccessBody>,
) -> AppResult<Response> {
    let (job, video) =
        resolve_file_scope(&state, &headers, &job_uuid, &video_uuid, &body).await?;

    if RunnerJobType::parse(&job.job_type)? != RunnerJobType::VideoStudioTranscoding {
        return Err(CoreError::Validation(format!(
            "Job {} is not a studio job",
            job.uuid
        ))
        .into());
    }

    // Bare name, and the job's payload must actually reference it.
    if filename.contains('/') || filename.contains('\\') || filename.contains("..") {
        return Err(CoreError::Validation(format!("Invalid filename '{filename}'")).into());
    }
    if !studio_payload_references_file(&job.payload, &filename) {
        return Err(CoreError::Validation(format!(
            "File '{filename}' is not referenced by this job"
        ))
        .into());
    }

    tracing::debug!(job_uuid = %job.uuid, %filename, "Studio task file fetched");

    stream_file(&storage::studio_file_path(
        &state.config.storage_dir,
        video.uuid,
        &filename,
    ))
    .await
}
