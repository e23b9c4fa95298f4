//! Handlers for the `/videos` resource (admin).
//!
//! Videos are owned by the wider platform; this surface only creates the
//! anchor rows that jobs and the file gateway hang off.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use mediagrid_core::error::CoreError;
use mediagrid_db::models::video::CreateVideo;
use mediagrid_db::repositories::VideoRepo;

use crate::error::AppResult;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/videos (admin)
pub async fn create_video(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateVideo>,
) -> AppResult<impl IntoResponse> {
    if input.name.trim().is_empty() {
        return Err(CoreError::Validation("Video name must not be empty".into()).into());
    }

    let video = VideoRepo::create(&state.pool, &input.name).await?;

    tracing::info!(video_id = video.id, uuid = %video.uuid, admin_id = admin.user_id, "Video created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: video })))
}
