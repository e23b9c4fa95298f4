//! Route definitions for `/runners/jobs`: runner protocol, admin surface
//! and the file gateway.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::{job_files, runner_jobs};
use crate::state::AppState;

/// Routes mounted at `/runners/jobs`.
///
/// ```text
/// GET    /                       -> list_jobs (admin)
/// POST   /                       -> enqueue_job (admin)
/// POST   /request                -> request_jobs
/// POST   /{uuid}/accept          -> accept_job
/// POST   /{uuid}/abort           -> abort_job
/// POST   /{uuid}/update          -> update_job
/// POST   /{uuid}/error           -> error_job
/// POST   /{uuid}/success         -> success_job
/// POST   /{uuid}/cancel          -> cancel_job (admin)
/// DELETE /{uuid}                 -> delete_job (admin)
/// POST   /{uuid}/files/videos/{videoUUID}/max-quality
/// POST   /{uuid}/files/videos/{videoUUID}/previews/max-quality
/// POST   /{uuid}/files/videos/{videoUUID}/studio/task-files/{filename}
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(runner_jobs::list_jobs).post(runner_jobs::enqueue_job),
        )
        .route("/request", post(runner_jobs::request_jobs))
        .route("/{uuid}/accept", post(runner_jobs::accept_job))
        .route("/{uuid}/abort", post(runner_jobs::abort_job))
        .route("/{uuid}/update", post(runner_jobs::update_job))
        .route("/{uuid}/error", post(runner_jobs::error_job))
        .route("/{uuid}/success", post(runner_jobs::success_job))
        .route("/{uuid}/cancel", post(runner_jobs::cancel_job))
        .route("/{uuid}", delete(runner_jobs::delete_job))
        .route(
            "/{uuid}/files/videos/{videoUUID}/max-quality",
            post(job_files::max_quality),
        )
        .route(
            "/{uuid}/files/videos/{videoUUID}/previews/max-quality",
            post(job_files::preview_max_quality),
        )
        .route(
            "/{uuid}/files/videos/{videoUUID}/studio/task-files/{filename}",
            post(job_files::studio_task_file),
        )
}
