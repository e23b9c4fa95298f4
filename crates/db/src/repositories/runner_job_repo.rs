//! Repository for the `runner_jobs` table.
//!
//! Every state transition here is a guarded conditional update: the
//! `WHERE` clause names the expected current state and the caller learns
//! from `rows_affected` (or the returned row) whether it won. Lost races
//! surface as `None`/`false`, never as a double transition.

use sqlx::PgPool;
use uuid::Uuid;

use mediagrid_core::pagination::{Pagination, Sort};
use mediagrid_core::tokens::generate_job_token;
use mediagrid_core::types::DbId;

use crate::models::runner_job::{CreateRunnerJob, RunnerJob, RunnerJobListFilter};
use crate::models::status::JobState;

/// Column list for `runner_jobs` queries.
const COLUMNS: &str = "\
    id, uuid, job_type, state, payload, private_payload, priority, \
    progress, failures, error, processing_job_token, runner_id, video_id, \
    started_at, finished_at, created_at, updated_at";

/// Provides CRUD operations and guarded state transitions for runner jobs.
pub struct RunnerJobRepo;

impl RunnerJobRepo {
    /// Enqueue a new pending job for a video.
    pub async fn create(
        pool: &PgPool,
        video_id: DbId,
        input: &CreateRunnerJob,
    ) -> Result<RunnerJob, sqlx::Error> {
        let query = format!(
            "INSERT INTO runner_jobs (job_type, state, payload, private_payload, priority, video_id) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RunnerJob>(&query)
            .bind(&input.job_type)
            .bind(JobState::Pending.id())
            .bind(&input.payload)
            .bind(&input.private_payload)
            .bind(input.priority)
            .bind(video_id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_uuid(
        pool: &PgPool,
        uuid: Uuid,
    ) -> Result<Option<RunnerJob>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM runner_jobs WHERE uuid = $1");
        sqlx::query_as::<_, RunnerJob>(&query)
            .bind(uuid)
            .fetch_optional(pool)
            .await
    }

    /// Jobs a polling runner may accept, best first.
    ///
    /// `job_types` narrows the listing to the types the runner declared it
    /// can handle; `None` means no restriction.
    pub async fn list_available(
        pool: &PgPool,
        job_types: Option<&[String]>,
        limit: i64,
    ) -> Result<Vec<RunnerJob>, sqlx::Error> {
        let type_filter = if job_types.is_some() {
            "AND job_type = ANY($2)"
        } else {
            ""
        };
        let query = format!(
            "SELECT {COLUMNS} FROM runner_jobs \
             WHERE state = $1 {type_filter} \
             ORDER BY priority DESC, created_at ASC \
             LIMIT {limit}"
        );
        let mut q = sqlx::query_as::<_, RunnerJob>(&query).bind(JobState::Pending.id());
        if let Some(types) = job_types {
            q = q.bind(types);
        }
        q.fetch_all(pool).await
    }

    /// Atomically lease a pending job to a runner, minting its job token.
    ///
    /// The `state = pending` guard is the whole dispatch story: when two
    /// runners accept the same job, exactly one update matches and the
    /// loser gets `None`.
    pub async fn accept(
        pool: &PgPool,
        uuid: Uuid,
        runner_id: DbId,
    ) -> Result<Option<RunnerJob>, sqlx::Error> {
        let query = format!(
            "UPDATE runner_jobs \
             SET state = $3, runner_id = $2, processing_job_token = $4, \
                 progress = 0, started_at = NOW() \
             WHERE uuid = $1 AND state = $5 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RunnerJob>(&query)
            .bind(uuid)
            .bind(runner_id)
            .bind(JobState::Processing.id())
            .bind(generate_job_token())
            .bind(JobState::Pending.id())
            .fetch_optional(pool)
            .await
    }

    /// Record incremental progress on a leased job. The `updated_at`
    /// trigger doubles as the liveness signal for the stalled-job sweep.
    pub async fn update_progress(
        pool: &PgPool,
        id: DbId,
        progress: Option<i16>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE runner_jobs \
             SET progress = COALESCE($2, progress) \
             WHERE id = $1 AND state = $3",
        )
        .bind(id)
        .bind(progress)
        .bind(JobState::Processing.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Finish a leased job successfully, clearing its lease.
    pub async fn complete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE runner_jobs \
             SET state = $2, progress = 100, processing_job_token = NULL, \
                 finished_at = NOW() \
             WHERE id = $1 AND state = $3",
        )
        .bind(id)
        .bind(JobState::Completed.id())
        .bind(JobState::Processing.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Fail a leased job terminally, recording the runner's error message.
    pub async fn error(
        pool: &PgPool,
        id: DbId,
        message: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE runner_jobs \
             SET state = $2, error = $3, failures = failures + 1, \
                 processing_job_token = NULL, finished_at = NOW() \
             WHERE id = $1 AND state = $4",
        )
        .bind(id)
        .bind(JobState::Errored.id())
        .bind(message)
        .bind(JobState::Processing.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Return a leased job to the pending pool. The lease, progress and
    /// start timestamp are cleared so the next runner starts fresh.
    pub async fn abort(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE runner_jobs \
             SET state = $2, failures = failures + 1, runner_id = NULL, \
                 processing_job_token = NULL, progress = NULL, started_at = NULL \
             WHERE id = $1 AND state = $3",
        )
        .bind(id)
        .bind(JobState::Pending.id())
        .bind(JobState::Processing.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Admin cancellation. Valid from pending or processing; a terminal
    /// job stays terminal and the call reports `false`.
    pub async fn cancel(pool: &PgPool, uuid: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE runner_jobs \
             SET state = $2, processing_job_token = NULL, finished_at = NOW() \
             WHERE uuid = $1 AND state IN ($3, $4)",
        )
        .bind(uuid)
        .bind(JobState::Cancelled.id())
        .bind(JobState::Pending.id())
        .bind(JobState::Processing.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Admin deletion, any state. Returns `false` for an unknown uuid.
    pub async fn delete(pool: &PgPool, uuid: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM runner_jobs WHERE uuid = $1")
            .bind(uuid)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Reclaim processing jobs whose runner went silent for longer than
    /// `ttl_secs`. Returns `(uuid, job_type)` of every reclaimed job.
    pub async fn release_stalled(
        pool: &PgPool,
        ttl_secs: u64,
    ) -> Result<Vec<(Uuid, String)>, sqlx::Error> {
        sqlx::query_as(
            "UPDATE runner_jobs \
             SET state = $1, failures = failures + 1, runner_id = NULL, \
                 processing_job_token = NULL, progress = NULL, started_at = NULL \
             WHERE state = $2 AND updated_at < NOW() - make_interval(secs => $3) \
             RETURNING uuid, job_type",
        )
        .bind(JobState::Pending.id())
        .bind(JobState::Processing.id())
        .bind(ttl_secs as f64)
        .fetch_all(pool)
        .await
    }

    /// Return all jobs leased to a runner to the pending pool. Used when a
    /// deleted runner's work should be redispatched instead of waiting for
    /// the stalled-job sweep.
    pub async fn abort_jobs_of_runner(
        pool: &PgPool,
        runner_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE runner_jobs \
             SET state = $2, failures = failures + 1, runner_id = NULL, \
                 processing_job_token = NULL, progress = NULL, started_at = NULL \
             WHERE runner_id = $1 AND state = $3",
        )
        .bind(runner_id)
        .bind(JobState::Pending.id())
        .bind(JobState::Processing.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn list_for_admin(
        pool: &PgPool,
        filter: &RunnerJobListFilter,
        pagination: Pagination,
        sort: Sort,
    ) -> Result<Vec<RunnerJob>, sqlx::Error> {
        // Build the WHERE clause and track the next bind parameter index.
        let mut conditions: Vec<String> = Vec::new();
        let mut bind_idx: u32 = 1;

        if filter.state_one_of.is_some() {
            conditions.push(format!("state = ANY(${bind_idx})"));
            bind_idx += 1;
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let query = format!(
            "SELECT {COLUMNS} FROM runner_jobs \
             {where_clause} \
             ORDER BY {} \
             LIMIT ${bind_idx} OFFSET ${}",
            sort.to_sql(),
            bind_idx + 1,
        );

        let mut q = sqlx::query_as::<_, RunnerJob>(&query);
        if let Some(states) = &filter.state_one_of {
            q = q.bind(states);
        }
        q = q.bind(pagination.count).bind(pagination.start);

        q.fetch_all(pool).await
    }

    pub async fn count_for_admin(
        pool: &PgPool,
        filter: &RunnerJobListFilter,
    ) -> Result<i64, sqlx::Error> {
        let (query, has_filter) = if filter.state_one_of.is_some() {
            (
                "SELECT COUNT(*) FROM runner_jobs WHERE state = ANY($1)",
                true,
            )
        } else {
            ("SELECT COUNT(*) FROM runner_jobs", false)
        };

        let mut q = sqlx::query_as::<_, (i64,)>(query);
        if has_filter {
            if let Some(states) = &filter.state_one_of {
                q = q.bind(states);
            }
        }
        let (total,) = q.fetch_one(pool).await?;
        Ok(total)
    }
}
