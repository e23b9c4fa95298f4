//! Repository for the `videos` table.

use sqlx::PgPool;
use uuid::Uuid;

use mediagrid_core::types::DbId;

use crate::models::video::Video;

const COLUMNS: &str = "id, uuid, name, created_at";

pub struct VideoRepo;

impl VideoRepo {
    pub async fn create(pool: &PgPool, name: &str) -> Result<Video, sqlx::Error> {
        let query = format!("INSERT INTO videos (name) VALUES ($1) RETURNING {COLUMNS}");
        sqlx::query_as::<_, Video>(&query)
            .bind(name)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Video>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM videos WHERE id = $1");
        sqlx::query_as::<_, Video>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_uuid(pool: &PgPool, uuid: Uuid) -> Result<Option<Video>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM videos WHERE uuid = $1");
        sqlx::query_as::<_, Video>(&query)
            .bind(uuid)
            .fetch_optional(pool)
            .await
    }
}
