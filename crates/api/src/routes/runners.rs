//! Route definitions for the `/runners` resource.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::runners;
use crate::state::AppState;

/// Routes mounted at the API root (they share the `/runners` prefix with
/// the nested jobs and registration-token routers).
///
/// ```text
/// POST   /runners/register      -> register (public)
/// POST   /runners/unregister    -> unregister (runner token)
/// GET    /runners               -> list_runners (admin)
/// DELETE /runners/{id}          -> delete_runner (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/runners/register", post(runners::register))
        .route("/runners/unregister", post(runners::unregister))
        .route("/runners", get(runners::list_runners))
        .route("/runners/{id}", delete(runners::delete_runner))
}
