//! Error types for the storage layer.
//!
//! All errors are propagated via [`StoreError`] which wraps the underlying
//! [`sqlx`] and [`fred`] errors. Cache implementations absorb their own
//! errors before they reach a caller (a broken cache degrades, it never
//! fails a request); [`StoreError`] therefore surfaces only from durable
//! store operations and from connection setup.

/// Errors that can occur in the storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A `PostgreSQL` operation failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A `PostgreSQL` migration failed.
    #[error("PostgreSQL migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A Redis-protocol operation failed.
    #[error("cache tier error: {0}")]
    Cache(#[from] fred::error::Error),

    /// A configuration error (bad URL, unparsable option).
    #[error("configuration error: {0}")]
    Config(String),
}
