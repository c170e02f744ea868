//! The two seams of the storage layer: durable facts and cached counters.
//!
//! The orchestrator and the event consumer are written against these traits
//! rather than concrete backends so that the pipeline's decision logic can
//! be exercised without live infrastructure, and so a deployment can swap
//! the shared Redis tier for the in-process cache without touching callers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tally_types::{
    ActorId, CacheOutcome, CacheRead, CommentId, CounterSnapshot, FactId, ItemId,
};

use crate::error::StoreError;

/// Idempotent writes and aggregate reads against the durable store.
///
/// Every write is a single complete statement: a caller cancelled mid-flight
/// leaves no partial state. Uniqueness constraints -- `(item, actor)` for
/// likes, the comment ID for comments -- are the final arbiter of
/// idempotency; concurrent duplicate inserts are resolved here, not by
/// application-level locking. Views deliberately have no per-fact
/// idempotency key: an upsert always applies.
#[async_trait]
pub trait EngagementStore: Send + Sync {
    /// Insert a like row unless `(item, actor)` already has one.
    ///
    /// Returns `true` if a row was inserted, `false` if the conflict was
    /// silently ignored.
    async fn insert_like_if_absent(
        &self,
        fact_id: FactId,
        item: ItemId,
        actor: ActorId,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// Delete the like row for `(item, actor)`.
    ///
    /// Deleting a non-existent row is a no-op; returns `true` only if a row
    /// was actually removed.
    async fn delete_like(&self, item: ItemId, actor: ActorId) -> Result<bool, StoreError>;

    /// Insert a view row with count 1, or increment the existing
    /// `(item, actor)` row's count.
    async fn upsert_view(
        &self,
        fact_id: FactId,
        item: ItemId,
        actor: ActorId,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Insert a comment row unless the comment ID already exists.
    ///
    /// Returns `true` if a row was inserted.
    async fn insert_comment_if_absent(
        &self,
        comment_id: CommentId,
        item: ItemId,
        actor: ActorId,
        content: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// Number of active likes on an item.
    async fn count_likes(&self, item: ItemId) -> Result<u64, StoreError>;

    /// Total views on an item, summed across actors.
    async fn sum_views(&self, item: ItemId) -> Result<u64, StoreError>;

    /// Number of comments on an item.
    async fn count_comments(&self, item: ItemId) -> Result<u64, StoreError>;

    /// Whether the item exists in the durable store.
    async fn exists(&self, item: ItemId) -> Result<bool, StoreError>;
}

/// The per-item counter cache.
///
/// Every operation is infallible from the caller's perspective: a disabled
/// or erroring tier degrades to [`CacheOutcome::Indeterminate`],
/// [`CacheRead::Unavailable`], or a silent no-op, with the failure logged
/// and metered inside the implementation. Mutations use only atomic
/// increment/decrement and set add/remove primitives, so concurrent
/// requests interleave safely.
#[async_trait]
pub trait CounterCache: Send + Sync {
    /// Record the item as known to exist; refreshes the existence TTL.
    async fn mark_exists(&self, item: ItemId);

    /// Whether the item is in the known-items set.
    ///
    /// Returns `false` on a cache-tier error or when the tier is disabled.
    async fn is_known(&self, item: ItemId) -> bool;

    /// Add the actor to the item's like set, incrementing the like counter
    /// if the actor was not already present.
    async fn register_like(&self, item: ItemId, actor: ActorId) -> CacheOutcome;

    /// Remove the actor from the item's like set, decrementing the like
    /// counter (clamped at zero) if the actor was present.
    async fn unregister_like(&self, item: ItemId, actor: ActorId) -> CacheOutcome;

    /// Unconditionally increment the item's view counter. Views are not
    /// toggles; there is no dedup.
    async fn register_view(&self, item: ItemId);

    /// Unconditionally increment the item's comment counter.
    async fn register_comment(&self, item: ItemId);

    /// Read the cached counter snapshot, if present and unexpired.
    async fn snapshot(&self, item: ItemId) -> CacheRead<CounterSnapshot>;

    /// Seed or repair the snapshot after a miss was resolved against the
    /// durable store. Last writer wins under concurrent seeding.
    async fn write_snapshot(&self, item: ItemId, counts: CounterSnapshot);
}
