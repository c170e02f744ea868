//! Idempotent fact writes and aggregate queries against `PostgreSQL`.
//!
//! Each write is one parameterized statement with `ON CONFLICT` arbitration,
//! so replayed or concurrently duplicated facts resolve at the store layer
//! without application-level locking. Aggregates feed the cache-aside read
//! path when the counter cache misses.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tally_types::{ActorId, CommentId, FactId, ItemId};

use crate::error::StoreError;
use crate::traits::EngagementStore;

/// Durable store adapter over a `PostgreSQL` connection pool.
///
/// Cheap to clone; the underlying [`PgPool`] is reference-counted.
#[derive(Clone)]
pub struct FactStore {
    pool: PgPool,
}

impl FactStore {
    /// Create a fact store bound to a connection pool.
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EngagementStore for FactStore {
    async fn insert_like_if_absent(
        &self,
        fact_id: FactId,
        item: ItemId,
        actor: ActorId,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r"INSERT INTO item_likes (id, item_id, actor_id, created_at)
              VALUES ($1, $2, $3, $4)
              ON CONFLICT (item_id, actor_id) DO NOTHING",
        )
        .bind(fact_id.into_inner())
        .bind(item.into_inner())
        .bind(actor.into_inner())
        .bind(at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_like(&self, item: ItemId, actor: ActorId) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r"DELETE FROM item_likes
              WHERE item_id = $1 AND actor_id = $2",
        )
        .bind(item.into_inner())
        .bind(actor.into_inner())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn upsert_view(
        &self,
        fact_id: FactId,
        item: ItemId,
        actor: ActorId,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r"INSERT INTO item_views (id, item_id, actor_id, first_viewed_at, last_viewed_at, view_count)
              VALUES ($1, $2, $3, $4, $4, 1)
              ON CONFLICT (item_id, actor_id)
              DO UPDATE SET
                  last_viewed_at = EXCLUDED.last_viewed_at,
                  view_count = item_views.view_count + 1",
        )
        .bind(fact_id.into_inner())
        .bind(item.into_inner())
        .bind(actor.into_inner())
        .bind(at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn insert_comment_if_absent(
        &self,
        comment_id: CommentId,
        item: ItemId,
        actor: ActorId,
        content: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r"INSERT INTO item_comments (id, item_id, actor_id, content, created_at)
              VALUES ($1, $2, $3, $4, $5)
              ON CONFLICT (id) DO NOTHING",
        )
        .bind(comment_id.into_inner())
        .bind(item.into_inner())
        .bind(actor.into_inner())
        .bind(content)
        .bind(at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_likes(&self, item: ItemId) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar(
            r"SELECT COUNT(*) FROM item_likes WHERE item_id = $1",
        )
        .bind(item.into_inner())
        .fetch_one(&self.pool)
        .await?;

        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn sum_views(&self, item: ItemId) -> Result<u64, StoreError> {
        // SUM over INTEGER yields BIGINT; COALESCE covers the no-rows case.
        let total: i64 = sqlx::query_scalar(
            r"SELECT COALESCE(SUM(view_count), 0) FROM item_views WHERE item_id = $1",
        )
        .bind(item.into_inner())
        .fetch_one(&self.pool)
        .await?;

        Ok(u64::try_from(total).unwrap_or(0))
    }

    async fn count_comments(&self, item: ItemId) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar(
            r"SELECT COUNT(*) FROM item_comments WHERE item_id = $1",
        )
        .bind(item.into_inner())
        .fetch_one(&self.pool)
        .await?;

        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn exists(&self, item: ItemId) -> Result<bool, StoreError> {
        let exists: bool = sqlx::query_scalar(
            r"SELECT EXISTS (SELECT 1 FROM items WHERE id = $1)",
        )
        .bind(item.into_inner())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}
