//! Repository for the `runner_registration_tokens` table.

use sqlx::PgPool;

use mediagrid_core::pagination::{Pagination, Sort};
use mediagrid_core::tokens::generate_registration_token;
use mediagrid_core::types::DbId;

use crate::models::registration_token::RegistrationToken;

/// Column list for `runner_registration_tokens` queries.
const COLUMNS: &str = "id, registration_token, created_at, updated_at";

/// Provides CRUD operations for runner registration tokens.
pub struct RegistrationTokenRepo;

impl RegistrationTokenRepo {
    /// Mint and persist a new registration token.
    pub async fn create(pool: &PgPool) -> Result<RegistrationToken, sqlx::Error> {
        let query = format!(
            "INSERT INTO runner_registration_tokens (registration_token) \
             VALUES ($1) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RegistrationToken>(&query)
            .bind(generate_registration_token())
            .fetch_one(pool)
            .await
    }

    /// Look up a token by its secret value (the registration path).
    ///
    /// Consumption does not destroy the token: one registration token can
    /// onboard any number of runners until an admin deletes it.
    pub async fn find_by_value(
        pool: &PgPool,
        value: &str,
    ) -> Result<Option<RegistrationToken>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM runner_registration_tokens WHERE registration_token = $1");
        sqlx::query_as::<_, RegistrationToken>(&query)
            .bind(value)
            .fetch_optional(pool)
            .await
    }

    /// Delete a token by id. Returns `false` if the id is unknown.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM runner_registration_tokens WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Paginated admin listing.
    pub async fn list(
        pool: &PgPool,
        pagination: Pagination,
        sort: Sort,
    ) -> Result<Vec<RegistrationToken>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM runner_registration_tokens \
             ORDER BY {} \
             LIMIT $1 OFFSET $2",
            sort.to_sql(),
        );
        sqlx::query_as::<_, RegistrationToken>(&query)
            .bind(pagination.count)
            .bind(pagination.start)
            .fetch_all(pool)
            .await
    }

    /// Total row count for the admin listing envelope.
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (total,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM runner_registration_tokens")
                .fetch_one(pool)
                .await?;
        Ok(total)
    }
}
