//! `PostgreSQL` connection pooling and schema migration.
//!
//! The pool is sized for the pipeline's access pattern: short, single
//! statement writes from the fallback path and the consumer, plus the
//! occasional aggregate query on a cache miss. Pool limits are fixed
//! here; only the URL and the connect timeout vary by deployment.

use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::error::StoreError;

/// Upper bound on pooled connections. Writes are single statements, so a
/// small pool goes a long way.
const MAX_CONNECTIONS: u32 = 10;

/// Idle connections are reclaimed after this long.
const IDLE_TIMEOUT: Duration = Duration::from_secs(300);

/// Connect timeout when the caller does not supply one.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// A pooled `PostgreSQL` connection with migration support.
#[derive(Clone)]
pub struct PostgresPool {
    pool: PgPool,
}

impl PostgresPool {
    /// Connect to the database at `url`, waiting up to `connect_timeout`
    /// for each connection acquisition.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Postgres`] if the URL is malformed or the
    /// server is unreachable within the timeout.
    pub async fn connect(url: &str, connect_timeout: Duration) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(connect_timeout)
            .idle_timeout(IDLE_TIMEOUT)
            .connect(url)
            .await?;

        tracing::info!(max_connections = MAX_CONNECTIONS, "connected to PostgreSQL");
        Ok(Self { pool })
    }

    /// Connect with the default timeout.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Postgres`] on connection failure.
    pub async fn connect_url(url: &str) -> Result<Self, StoreError> {
        Self::connect(url, DEFAULT_CONNECT_TIMEOUT).await
    }

    /// Apply pending migrations from the crate's `migrations/` directory.
    ///
    /// Idempotent; already-applied migrations are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Migration`] if a migration fails.
    pub async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("migrations applied");
        Ok(())
    }

    /// The underlying pool, for binding a [`crate::FactStore`] or running
    /// ad-hoc queries.
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Close all pooled connections gracefully.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
