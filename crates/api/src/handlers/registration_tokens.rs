//! Handlers for `/runners/registration-tokens` (admin only).

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use mediagrid_core::error::CoreError;
use mediagrid_core::pagination::{validate_pagination, validate_sort, ListQuery};
use mediagrid_core::types::DbId;
use mediagrid_db::repositories::RegistrationTokenRepo;

use crate::error::AppResult;
use crate::middleware::rbac::RequireAdmin;
use crate::response::{DataResponse, ListResponse};
use crate::state::AppState;

/// Whitelisted sort fields for the token listing.
const TOKEN_SORT: &[(&str, &str)] = &[("createdAt", "created_at")];

/// POST /api/v1/runners/registration-tokens
///
/// Mint a new registration token. 201 with the token row.
pub async fn create_token(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let token = RegistrationTokenRepo::create(&state.pool).await?;

    tracing::info!(token_id = token.id, admin_id = admin.user_id, "Registration token issued");

    Ok((StatusCode::CREATED, Json(DataResponse { data: token })))
}

/// GET /api/v1/runners/registration-tokens
pub async fn list_tokens(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<impl IntoResponse> {
    let pagination = validate_pagination(&query)?;
    let sort = validate_sort(query.sort.as_deref(), TOKEN_SORT)?;

    let data = RegistrationTokenRepo::list(&state.pool, pagination, sort).await?;
    let total = RegistrationTokenRepo::count(&state.pool).await?;

    Ok(Json(ListResponse { total, data }))
}

/// DELETE /api/v1/runners/registration-tokens/{id}
///
/// Revoke a token. Runners already registered with it keep their session.
pub async fn delete_token(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    if !RegistrationTokenRepo::delete(&state.pool, id).await? {
        return Err(CoreError::not_found("Registration token", id).into());
    }

    tracing::info!(token_id = id, admin_id = admin.user_id, "Registration token revoked");

    Ok(StatusCode::NO_CONTENT)
}
