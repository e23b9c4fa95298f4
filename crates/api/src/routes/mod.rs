pub mod health;
pub mod registration_tokens;
pub mod runner_jobs;
pub mod runners;
pub mod videos;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /runners/register                                 register (public)
/// /runners/unregister                               unregister (runner token)
/// /runners                                          list (admin)
/// /runners/{id}                                     delete (admin)
///
/// /runners/registration-tokens                      issue, list (admin)
/// /runners/registration-tokens/{id}                 revoke (admin)
///
/// /runners/jobs                                     list (admin), enqueue (admin)
/// /runners/jobs/request                             poll available jobs
/// /runners/jobs/{uuid}/accept                       lease a pending job
/// /runners/jobs/{uuid}/abort                        give the job back
/// /runners/jobs/{uuid}/update                       progress / live chunks
/// /runners/jobs/{uuid}/error                        terminal failure
/// /runners/jobs/{uuid}/success                      terminal success
/// /runners/jobs/{uuid}/cancel                       cancel (admin)
/// /runners/jobs/{uuid}                              delete (admin)
/// /runners/jobs/{uuid}/files/videos/{videoUUID}/max-quality
/// /runners/jobs/{uuid}/files/videos/{videoUUID}/previews/max-quality
/// /runners/jobs/{uuid}/files/videos/{videoUUID}/studio/task-files/{filename}
///
/// /videos                                           create anchor row (admin)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/runners/registration-tokens", registration_tokens::router())
        .nest("/runners/jobs", runner_jobs::router())
        .merge(runners::router())
        .nest("/videos", videos::router())
}
