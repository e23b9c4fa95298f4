//! Route definitions for the `/videos` resource (admin).

use axum::routing::post;
use axum::Router;

use crate::handlers::videos;
use crate::state::AppState;

/// Routes mounted at `/videos`.
///
/// ```text
/// POST   /        -> create_video (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(videos::create_video))
}
