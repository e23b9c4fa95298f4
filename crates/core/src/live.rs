//! Live chunk update validation.
//!
//! A live runner reports each produced HLS segment as an `add-chunk`
//! update carrying the master playlist, the per-resolution playlist, and
//! the chunk itself. Filenames chosen by the runner are written to disk,
//! so they are validated for hygiene BEFORE any byte is accepted: bare
//! names only, matching the single-resolution naming scheme.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Known live update kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LiveUpdateKind {
    #[serde(rename = "add-chunk")]
    AddChunk,
    #[serde(rename = "remove-chunk")]
    RemoveChunk,
}

/// Update payload of a `live-rtmp-hls-transcoding` job.
///
/// The `*_file` fields hold server-local paths of the files uploaded with
/// the request (filled in by the multipart layer); the `*_filename`
/// fields are the names the runner wants them stored under.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveRtmpHlsUpdatePayload {
    #[serde(rename = "type")]
    pub kind: LiveUpdateKind,

    pub master_playlist_file: Option<String>,

    pub resolution_playlist_filename: String,
    pub resolution_playlist_file: Option<String>,

    pub video_chunk_filename: String,
    pub video_chunk_file: Option<String>,
}

/// Resolution playlist names look like `0.m3u8`.
fn playlist_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+\.m3u8$").expect("static regex"))
}

/// Chunk names look like `1-000068.ts` (`{resolution}-{seq}.ts`).
fn chunk_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+-\d+\.ts$").expect("static regex"))
}

/// A bare filename: no separators, no parent-directory traversal.
fn is_bare_filename(name: &str) -> bool {
    !name.is_empty()
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains("..")
        && name != "."
}

/// Whether a resolution playlist filename is acceptable to write.
pub fn is_valid_playlist_filename(name: &str) -> bool {
    is_bare_filename(name) && playlist_name_regex().is_match(name)
}

/// Whether a video chunk filename is acceptable to write.
pub fn is_valid_chunk_filename(name: &str) -> bool {
    is_bare_filename(name) && chunk_name_regex().is_match(name)
}

/// Validate a live update payload before any file write.
pub fn validate_live_update(payload: &LiveRtmpHlsUpdatePayload) -> Result<(), CoreError> {
    if !is_valid_playlist_filename(&payload.resolution_playlist_filename) {
        return Err(CoreError::Validation(format!(
            "Invalid resolutionPlaylistFilename '{}'",
            payload.resolution_playlist_filename
        )));
    }

    if !is_valid_chunk_filename(&payload.video_chunk_filename) {
        return Err(CoreError::Validation(format!(
            "Invalid videoChunkFilename '{}'",
            payload.video_chunk_filename
        )));
    }

    Ok(())
}
