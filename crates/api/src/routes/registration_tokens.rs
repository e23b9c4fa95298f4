//! Route definitions for `/runners/registration-tokens` (admin only).

use axum::routing::{delete, get};
use axum::Router;

use crate::handlers::registration_tokens;
use crate::state::AppState;

/// Routes mounted at `/runners/registration-tokens`.
///
/// ```text
/// GET    /        -> list_tokens
/// POST   /        -> create_token
/// DELETE /{id}    -> delete_token
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(registration_tokens::list_tokens).post(registration_tokens::create_token),
        )
        .route("/{id}", delete(registration_tokens::delete_token))
}
