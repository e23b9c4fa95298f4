//! The closed set of runner job types and their success payload schemas.
//!
//! Each job type carries its own strongly-typed success payload; an
//! incoming success body is validated by [`validate_success_payload`],
//! a single dispatch-by-tag function, instead of ad hoc shape checks at
//! every call site.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Runner job type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunnerJobType {
    #[serde(rename = "vod-web-video-transcoding")]
    VodWebVideoTranscoding,
    #[serde(rename = "vod-hls-transcoding")]
    VodHlsTranscoding,
    #[serde(rename = "vod-audio-merge-transcoding")]
    VodAudioMergeTranscoding,
    #[serde(rename = "video-studio-transcoding")]
    VideoStudioTranscoding,
    #[serde(rename = "live-rtmp-hls-transcoding")]
    LiveRtmpHlsTranscoding,
}

impl RunnerJobType {
    /// All known job types, in dispatch priority order.
    pub const ALL: [RunnerJobType; 5] = [
        RunnerJobType::VodWebVideoTranscoding,
        RunnerJobType::VodHlsTranscoding,
        RunnerJobType::VodAudioMergeTranscoding,
        RunnerJobType::VideoStudioTranscoding,
        RunnerJobType::LiveRtmpHlsTranscoding,
    ];

    /// The wire name of this job type (e.g. `"vod-hls-transcoding"`).
    pub fn as_str(self) -> &'static str {
        match self {
            RunnerJobType::VodWebVideoTranscoding => "vod-web-video-transcoding",
            RunnerJobType::VodHlsTranscoding => "vod-hls-transcoding",
            RunnerJobType::VodAudioMergeTranscoding => "vod-audio-merge-transcoding",
            RunnerJobType::VideoStudioTranscoding => "video-studio-transcoding",
            RunnerJobType::LiveRtmpHlsTranscoding => "live-rtmp-hls-transcoding",
        }
    }

    /// Parse a wire name, rejecting unknown types.
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == value)
            .ok_or_else(|| CoreError::Validation(format!("Unknown job type '{value}'")))
    }

    /// Whether this job streams chunks through the live relay.
    pub fn is_live(self) -> bool {
        matches!(self, RunnerJobType::LiveRtmpHlsTranscoding)
    }
}

impl std::fmt::Display for RunnerJobType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Success payloads
// ---------------------------------------------------------------------------

/// Success payload for `vod-web-video-transcoding`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VodWebVideoTranscodingSuccess {
    /// Path of the produced video file (uploaded alongside the request).
    pub video_file: String,
}

/// Success payload for `vod-hls-transcoding`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VodHlsTranscodingSuccess {
    pub video_file: String,
    pub resolution_playlist_file: String,
}

/// Success payload for `vod-audio-merge-transcoding`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VodAudioMergeTranscodingSuccess {
    pub video_file: String,
}

/// Success payload for `video-studio-transcoding`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStudioTranscodingSuccess {
    pub video_file: String,
}

/// Validate a success payload against the schema of the given job type.
///
/// Live jobs complete without a payload (their output was already shipped
/// chunk by chunk); every VOD/studio type requires its typed file fields.
pub fn validate_success_payload(
    job_type: RunnerJobType,
    payload: &serde_json::Value,
) -> Result<(), CoreError> {
    let invalid = |e: serde_json::Error| {
        CoreError::Validation(format!("Invalid success payload for {job_type}: {e}"))
    };

    match job_type {
        RunnerJobType::VodWebVideoTranscoding => {
            serde_json::from_value::<VodWebVideoTranscodingSuccess>(payload.clone())
                .map_err(invalid)?;
        }
        RunnerJobType::VodHlsTranscoding => {
            serde_json::from_value::<VodHlsTranscodingSuccess>(payload.clone())
                .map_err(invalid)?;
        }
        RunnerJobType::VodAudioMergeTranscoding => {
            serde_json::from_value::<VodAudioMergeTranscodingSuccess>(payload.clone())
                .map_err(invalid)?;
        }
        RunnerJobType::VideoStudioTranscoding => {
            serde_json::from_value::<VideoStudioTranscodingSuccess>(payload.clone())
                .map_err(invalid)?;
        }
        RunnerJobType::LiveRtmpHlsTranscoding => {}
    }

    Ok(())
}

/// Whether a studio job payload references `filename` as one of its task
/// input files.
///
/// Task definitions nest their file references at varying depths, so the
/// check walks every string under `payload.tasks`.
pub fn studio_payload_references_file(payload: &serde_json::Value, filename: &str) -> bool {
    fn walk(value: &serde_json::Value, filename: &str) -> bool {
        match value {
            serde_json::Value::String(s) => s == filename,
            serde_json::Value::Array(items) => items.iter().any(|v| walk(v, filename)),
            serde_json::Value::Object(map) => map.values().any(|v| walk(v, filename)),
            _ => false,
        }
    }

    payload
        .get("tasks")
        .map(|tasks| walk(tasks, filename))
        .unwrap_or(false)
}

/// Parse the `jobTypes` filter of a dispatch request. `None` or an empty
/// list means "any type"; unknown names are rejected.
pub fn parse_job_types_filter(
    values: Option<&Vec<String>>,
) -> Result<Vec<RunnerJobType>, CoreError> {
    match values {
        None => Ok(Vec::new()),
        Some(list) => list.iter().map(|v| RunnerJobType::parse(v)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_all_wire_names() {
        for t in RunnerJobType::ALL {
            assert_eq!(RunnerJobType::parse(t.as_str()).unwrap(), t);
        }
        assert!(RunnerJobType::parse("toto").is_err());
    }

    #[test]
    fn web_video_success_requires_video_file() {
        let t = RunnerJobType::VodWebVideoTranscoding;

        assert!(validate_success_payload(t, &json!({ "videoFile": "out.mp4" })).is_ok());
        assert!(validate_success_payload(t, &json!({ "hello": "out.mp4" })).is_err());
        assert!(validate_success_payload(t, &json!({})).is_err());
    }

    #[test]
    fn hls_success_requires_playlist_too() {
        let t = RunnerJobType::VodHlsTranscoding;

        assert!(validate_success_payload(t, &json!({ "videoFile": "out.mp4" })).is_err());
        assert!(validate_success_payload(
            t,
            &json!({ "videoFile": "out-720.mp4", "resolutionPlaylistFile": "720.m3u8" }),
        )
        .is_ok());
    }

    #[test]
    fn live_success_accepts_empty_payload() {
        let t = RunnerJobType::LiveRtmpHlsTranscoding;
        assert!(validate_success_payload(t, &json!({})).is_ok());
    }

    #[test]
    fn studio_file_lookup_walks_nested_tasks() {
        let payload = json!({
            "tasks": [
                { "name": "cut", "options": { "start": 2 } },
                { "name": "add-intro", "options": { "file": "intro.mp4" } },
            ],
        });

        assert!(studio_payload_references_file(&payload, "intro.mp4"));
        assert!(!studio_payload_references_file(&payload, "outro.mp4"));
        assert!(!studio_payload_references_file(&json!({}), "intro.mp4"));
    }

    #[test]
    fn job_types_filter_rejects_unknown_names() {
        assert!(parse_job_types_filter(None).unwrap().is_empty());
        assert!(parse_job_types_filter(Some(&vec![])).unwrap().is_empty());

        let good = parse_job_types_filter(Some(&vec![
            "vod-hls-transcoding".into(),
            "live-rtmp-hls-transcoding".into(),
        ]))
        .unwrap();
        assert_eq!(good.len(), 2);

        assert!(parse_job_types_filter(Some(&vec!["toto".into()])).is_err());
    }
}
