//! Handlers for the `/runners` resource: public registration plus the
//! admin listing/deletion surface.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use mediagrid_core::error::CoreError;
use mediagrid_core::pagination::{validate_pagination, validate_sort, ListQuery};
use mediagrid_core::runners::{validate_runner_description, validate_runner_name};
use mediagrid_core::tokens::check_token_format;
use mediagrid_core::types::{DbId, Timestamp};
use mediagrid_db::models::runner::{RegisterRunner, UnregisterRunner};
use mediagrid_db::repositories::{RegistrationTokenRepo, RunnerJobRepo, RunnerRepo};

use crate::auth::runner::client_ip;
use crate::error::AppResult;
use crate::middleware::rbac::RequireAdmin;
use crate::response::{DataResponse, ListResponse};
use crate::state::AppState;

/// Whitelisted sort fields for the runner listing.
const RUNNER_SORT: &[(&str, &str)] = &[
    ("createdAt", "created_at"),
    ("lastContact", "last_contact"),
    ("name", "name"),
];

/// Registration response: the only place the session token is revealed.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredRunner {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub runner_token: String,
    pub created_at: Timestamp,
}

/// POST /api/v1/runners/register
///
/// Exchange a registration token for a runner session token.
pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<RegisterRunner>,
) -> AppResult<impl IntoResponse> {
    validate_runner_name(&input.name)?;
    validate_runner_description(input.description.as_deref())?;
    check_token_format("registrationToken", &input.registration_token)?;

    RegistrationTokenRepo::find_by_value(&state.pool, &input.registration_token)
        .await?
        .ok_or_else(|| CoreError::not_found("Registration token", "by value"))?;

    // Name collisions answer 400, not 409: from the runner's side this is
    // a bad request it can fix by renaming itself. The unique constraint
    // still backs this check against concurrent registrations.
    if RunnerRepo::exists_by_name(&state.pool, &input.name).await? {
        return Err(CoreError::Validation(format!(
            "A runner named '{}' already exists",
            input.name
        ))
        .into());
    }

    let runner = RunnerRepo::register(
        &state.pool,
        &input.name,
        input.description.as_deref(),
        &client_ip(&headers),
    )
    .await?;

    tracing::info!(runner_id = runner.id, name = %runner.name, "Runner registered");

    let response = RegisteredRunner {
        id: runner.id,
        name: runner.name,
        description: runner.description,
        runner_token: runner.runner_token,
        created_at: runner.created_at,
    };

    Ok((StatusCode::CREATED, Json(DataResponse { data: response })))
}

/// POST /api/v1/runners/unregister
pub async fn unregister(
    State(state): State<AppState>,
    Json(input): Json<UnregisterRunner>,
) -> AppResult<impl IntoResponse> {
    check_token_format("runnerToken", &input.runner_token)?;

    if !RunnerRepo::delete_by_token(&state.pool, &input.runner_token).await? {
        return Err(CoreError::not_found("Runner", "by token").into());
    }

    tracing::info!("Runner unregistered");

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/runners (admin)
pub async fn list_runners(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<impl IntoResponse> {
    let pagination = validate_pagination(&query)?;
    let sort = validate_sort(query.sort.as_deref(), RUNNER_SORT)?;

    let data = RunnerRepo::list(&state.pool, pagination, sort).await?;
    let total = RunnerRepo::count(&state.pool).await?;

    Ok(Json(ListResponse { total, data }))
}

/// DELETE /api/v1/runners/{id} (admin)
///
/// With `RUNNER_DELETE_ABORTS_JOBS` set, in-flight jobs return to the
/// pending pool immediately; otherwise they wait for the stalled sweep.
pub async fn delete_runner(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let runner = RunnerRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| CoreError::not_found("Runner", id))?;

    if state.config.runner_delete_aborts_jobs {
        let aborted = RunnerJobRepo::abort_jobs_of_runner(&state.pool, runner.id).await?;
        if aborted > 0 {
            tracing::info!(runner_id = runner.id, aborted, "Returned in-flight jobs to pool");
        }
    }

    RunnerRepo::delete(&state.pool, runner.id).await?;

    tracing::info!(runner_id = runner.id, name = %runner.name, admin_id = admin.user_id, "Runner deleted");

    Ok(StatusCode::NO_CONTENT)
}
