//! Storage layout for video sources, studio inputs and live output.
//!
//! ```text
//! STORAGE_DIR/
//!   videos/{videoUUID}/max-quality        source video bytes
//!   videos/{videoUUID}/preview            source preview bytes
//!   videos/{videoUUID}/studio/{filename}  studio task input files
//!   live/{videoUUID}/{filename}           relayed live playlists/chunks
//!   results/{jobUUID}/{key}               files shipped with job success
//!   tmp/                                  multipart upload spool
//! ```
//!
//! Callers validate every path component before it reaches this module;
//! nothing here interprets client input beyond joining known-safe names.

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::{AppError, AppResult};

pub fn video_source_path(storage_dir: &Path, video_uuid: Uuid) -> PathBuf {
    storage_dir
        .join("videos")
        .join(video_uuid.to_string())
        .join("max-quality")
}

pub fn video_preview_path(storage_dir: &Path, video_uuid: Uuid) -> PathBuf {
    storage_dir
        .join("videos")
        .join(video_uuid.to_string())
        .join("preview")
}

pub fn studio_file_path(storage_dir: &Path, video_uuid: Uuid, filename: &str) -> PathBuf {
    storage_dir
        .join("videos")
        .join(video_uuid.to_string())
        .join("studio")
        .join(filename)
}

pub fn live_dir(storage_dir: &Path, video_uuid: Uuid) -> PathBuf {
    storage_dir.join("live").join(video_uuid.to_string())
}

/// Spool directory for in-flight multipart uploads.
pub fn tmp_dir(storage_dir: &Path) -> PathBuf {
    storage_dir.join("tmp")
}

/// Directory holding the files a job shipped with its success report.
pub fn results_dir(storage_dir: &Path, job_uuid: Uuid) -> PathBuf {
    storage_dir.join("results").join(job_uuid.to_string())
}

/// Move a spooled upload into the live directory under its validated
/// filename, creating the directory on first chunk.
pub async fn persist_live_file(
    storage_dir: &Path,
    video_uuid: Uuid,
    filename: &str,
    spooled: &Path,
) -> AppResult<PathBuf> {
    let dir = live_dir(storage_dir, video_uuid);
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| AppError::InternalError(format!("Cannot create live directory: {e}")))?;

    let target = dir.join(filename);
    move_file(spooled, &target).await?;
    Ok(target)
}

/// Delete a video's live output directory, ignoring a missing one.
pub async fn remove_live_dir(storage_dir: &Path, video_uuid: Uuid) -> AppResult<()> {
    let dir = live_dir(storage_dir, video_uuid);
    match tokio::fs::remove_dir_all(&dir).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(AppError::InternalError(format!(
            "Cannot remove live directory: {e}"
        ))),
    }
}

/// Delete a job's results directory, ignoring a missing one.
pub async fn remove_results_dir(storage_dir: &Path, job_uuid: Uuid) -> AppResult<()> {
    let dir = results_dir(storage_dir, job_uuid);
    match tokio::fs::remove_dir_all(&dir).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(AppError::InternalError(format!(
            "Cannot remove results directory: {e}"
        ))),
    }
}

/// Rename with a copy fallback for cross-device spool directories.
pub(crate) async fn move_file(from: &Path, to: &Path) -> AppResult<()> {
    if tokio::fs::rename(from, to).await.is_ok() {
        return Ok(());
    }
    tokio::fs::copy(from, to)
        .await
        .map_err(|e| AppError::InternalError(format!("Cannot store uploaded file: {e}")))?;
    let _ = tokio::fs::remove_file(from).await;
    Ok(())
}
