//! Storage layer for the Tally engagement pipeline (`PostgreSQL` + Redis).
//!
//! `PostgreSQL` is the durable source of truth: every engagement fact lands
//! in one of three tables with uniqueness constraints that make replays
//! idempotent. The Redis-protocol tier holds the hot, denormalized counter
//! snapshots that the read path serves from and the write path updates
//! optimistically.
//!
//! # Architecture (cache-aside)
//!
//! ```text
//! Request path
//!     |
//!     +-- Optimistic counter updates --> CounterCache
//!     |       RedisCounterCache   (fred, shared tier)
//!     |       MemoryCounterCache  (dashmap, single process)
//!     |       DisabledCounterCache (tier switched off)
//!     |
//!     +-- Idempotent fact writes -----> EngagementStore
//!             FactStore            (sqlx, ON CONFLICT arbitration)
//!             MemoryEngagementStore (tests and embedded use)
//! ```
//!
//! # Modules
//!
//! - [`traits`] -- the [`CounterCache`] and [`EngagementStore`] seams
//! - [`postgres`] -- `PostgreSQL` connection pool and migrations
//! - [`fact_store`] -- idempotent fact writes and aggregate queries
//! - [`redis_cache`] -- shared counter cache over the Redis protocol
//! - [`memory`] -- in-process implementations of both seams
//! - [`disabled`] -- the always-indeterminate cache for a switched-off tier
//! - [`tier`] -- configuration-driven backend selection ([`CacheTier`])
//! - [`error`] -- shared error types

pub mod disabled;
pub mod error;
pub mod fact_store;
pub mod memory;
pub mod postgres;
pub mod redis_cache;
pub mod tier;
pub mod traits;

// Re-export primary types for convenience.
pub use disabled::DisabledCounterCache;
pub use error::StoreError;
pub use fact_store::FactStore;
pub use memory::{MemoryCounterCache, MemoryEngagementStore};
pub use postgres::PostgresPool;
pub use redis_cache::{CacheTtl, RedisCounterCache};
pub use tier::CacheTier;
pub use traits::{CounterCache, EngagementStore};
