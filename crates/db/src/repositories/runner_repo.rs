//! Repository for the `runners` table.

use sqlx::PgPool;

use mediagrid_core::pagination::{Pagination, Sort};
use mediagrid_core::runners::LAST_CONTACT_UPDATE_INTERVAL_SECS;
use mediagrid_core::tokens::generate_runner_token;
use mediagrid_core::types::DbId;

use crate::models::runner::Runner;

const COLUMNS: &str =
    "id, runner_token, name, description, ip_address, last_contact, created_at, updated_at";

/// Provides CRUD operations for registered runners.
pub struct RunnerRepo;

impl RunnerRepo {
    /// Register a new runner, minting its session token.
    pub async fn register(
        pool: &PgPool,
        name: &str,
        description: Option<&str>,
        ip_address: &str,
    ) -> Result<Runner, sqlx::Error> {
        let query = format!(
            "INSERT INTO runners (runner_token, name, description, ip_address, last_contact) \
             VALUES ($1, $2, $3, $4, NOW()) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Runner>(&query)
            .bind(generate_runner_token())
            .bind(name)
            .bind(description)
            .bind(ip_address)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Runner>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM runners WHERE id = $1");
        sqlx::query_as::<_, Runner>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Resolve a runner from its session token. Every runner-facing
    /// endpoint goes through this lookup.
    pub async fn find_by_token(
        pool: &PgPool,
        runner_token: &str,
    ) -> Result<Option<Runner>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM runners WHERE runner_token = $1");
        sqlx::query_as::<_, Runner>(&query)
            .bind(runner_token)
            .fetch_optional(pool)
            .await
    }

    pub async fn exists_by_name(pool: &PgPool, name: &str) -> Result<bool, sqlx::Error> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM runners WHERE name = $1)")
                .bind(name)
                .fetch_one(pool)
                .await?;
        Ok(exists)
    }

    /// Delete a runner by id (admin path). Jobs it holds keep their lease
    /// thanks to `ON DELETE SET NULL`; the dispatcher reclaims them when
    /// the stalled-job sweep runs, or the caller aborts them explicitly.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM runners WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a runner by its own token (unregister path).
    pub async fn delete_by_token(pool: &PgPool, runner_token: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM runners WHERE runner_token = $1")
            .bind(runner_token)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Bump `last_contact` and refresh the caller's IP, throttled so chatty
    /// runners do not turn every progress ping into a row update.
    pub async fn update_last_contact(
        pool: &PgPool,
        id: DbId,
        ip_address: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE runners \
             SET last_contact = NOW(), ip_address = $2 \
             WHERE id = $1 \
               AND last_contact < NOW() - make_interval(secs => $3)",
        )
        .bind(id)
        .bind(ip_address)
        .bind(LAST_CONTACT_UPDATE_INTERVAL_SECS as f64)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn list(
        pool: &PgPool,
        pagination: Pagination,
        sort: Sort,
    ) -> Result<Vec<Runner>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM runners ORDER BY {} LIMIT $1 OFFSET $2",
            sort.to_sql(),
        );
        sqlx::query_as::<_, Runner>(&query)
            .bind(pagination.count)
            .bind(pagination.start)
            .fetch_all(pool)
            .await
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM runners")
            .fetch_one(pool)
            .await?;
        Ok(total)
    }
}
