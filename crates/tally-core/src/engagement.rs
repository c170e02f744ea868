//! The engagement orchestrator: optimistic cache+queue with synchronous
//! fallback.
//!
//! Every write operation follows the same state machine:
//!
//! ```text
//! enter(op)
//!   -> ensure item known (cache hit, else existence check against store;
//!      not-found is terminal)
//!   -> async disabled: apply synchronously AND update cache   [SyncApplied]
//!   -> async enabled:
//!        optimistic cache update
//!        toggle already applied per cache:                    [AlreadyApplied]
//!        publish fact
//!          acknowledged:                                      [Queued]
//!          failed: apply synchronously WITHOUT re-touching
//!                  the cache (already updated optimistically) [FallbackApplied]
//! ```
//!
//! The optimistic cache update happens before publish so concurrent
//! readers see the effect immediately regardless of broker health. The
//! fallback path must not re-apply the cache delta: that would double
//! count. An indeterminate cache answer (tier disabled or erroring) falls
//! through to publish; the store's uniqueness constraints absorb a
//! duplicate Like, and a duplicate Unlike is a harmless delete-by-key.

use chrono::{DateTime, Utc};
use tally_events::FactPublisher;
use tally_store::{CounterCache, EngagementStore};
use tally_types::{
    ActorId, CacheOutcome, CacheRead, CommentId, CounterSnapshot, EngagementFact, FactId, ItemId,
};

use crate::error::EngagementError;

/// Terminal state of one orchestrated operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngagementOutcome {
    /// Async mode disabled: persisted directly, cache updated after.
    SyncApplied,
    /// Fact acknowledged by the broker; durable application deferred to
    /// the consumer.
    Queued,
    /// Publish failed; persisted directly without re-touching the cache.
    FallbackApplied,
    /// Toggle already in the requested state per the cache; nothing
    /// published, nothing persisted.
    AlreadyApplied,
}

/// Receipt returned to the caller of [`EngagementService::add_comment`].
///
/// Identical regardless of which path applied the comment; the IDs and
/// timestamp match what the consumer will (or the fallback did) store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentReceipt {
    /// The assigned comment identifier.
    pub comment_id: CommentId,
    /// The commented item.
    pub item_id: ItemId,
    /// The commenting actor.
    pub actor_id: ActorId,
    /// The comment body.
    pub content: String,
    /// When the comment was accepted (UTC).
    pub created_at: DateTime<Utc>,
    /// Which path applied the comment.
    pub outcome: EngagementOutcome,
}

/// The decision layer invoked by the request path.
///
/// Generic over the three seams so deployments can mix backends (shared
/// Redis or in-process cache, `PostgreSQL` or in-memory store, NATS or no
/// broker) and tests can run without infrastructure.
pub struct EngagementService<C, S, P> {
    cache: C,
    store: S,
    publisher: P,
    async_enabled: bool,
}

impl<C, S, P> EngagementService<C, S, P>
where
    C: CounterCache,
    S: EngagementStore,
    P: FactPublisher,
{
    /// Create a service.
    ///
    /// `async_enabled` selects the optimistic cache+queue path; when false
    /// every operation persists synchronously and updates the cache after
    /// the durable write.
    pub const fn new(cache: C, store: S, publisher: P, async_enabled: bool) -> Self {
        Self {
            cache,
            store,
            publisher,
            async_enabled,
        }
    }

    /// Register a like from `actor` on `item`. Idempotent toggle.
    pub async fn like(
        &self,
        item: ItemId,
        actor: ActorId,
    ) -> Result<EngagementOutcome, EngagementError> {
        self.ensure_known(item).await?;

        if !self.async_enabled {
            self.persist_like(item, actor, Utc::now(), true).await?;
            record_fallback("like");
            return Ok(EngagementOutcome::SyncApplied);
        }

        if self.cache.register_like(item, actor).await == CacheOutcome::AlreadyPresent {
            return Ok(EngagementOutcome::AlreadyApplied);
        }

        let fact = EngagementFact::like(item, actor);
        if self.publisher.publish(&fact).await {
            return Ok(EngagementOutcome::Queued);
        }

        // The cache was already updated optimistically above; re-touching
        // it here would double count.
        self.persist_like(item, actor, fact.occurred_at, false).await?;
        record_fallback("like");
        Ok(EngagementOutcome::FallbackApplied)
    }

    /// Remove `actor`'s like from `item`. Idempotent toggle.
    pub async fn unlike(
        &self,
        item: ItemId,
        actor: ActorId,
    ) -> Result<EngagementOutcome, EngagementError> {
        self.ensure_known(item).await?;

        if !self.async_enabled {
            self.persist_unlike(item, actor, true).await?;
            record_fallback("unlike");
            return Ok(EngagementOutcome::SyncApplied);
        }

        if self.cache.unregister_like(item, actor).await == CacheOutcome::AlreadyPresent {
            return Ok(EngagementOutcome::AlreadyApplied);
        }

        let fact = EngagementFact::unlike(item, actor);
        if self.publisher.publish(&fact).await {
            return Ok(EngagementOutcome::Queued);
        }

        self.persist_unlike(item, actor, false).await?;
        record_fallback("unlike");
        Ok(EngagementOutcome::FallbackApplied)
    }

    /// Register a view from `actor` on `item`. Monotonic increment, never
    /// deduplicated.
    pub async fn view(
        &self,
        item: ItemId,
        actor: ActorId,
    ) -> Result<EngagementOutcome, EngagementError> {
        self.ensure_known(item).await?;

        if !self.async_enabled {
            self.persist_view(item, actor, Utc::now(), true).await?;
            record_fallback("view");
            return Ok(EngagementOutcome::SyncApplied);
        }

        self.cache.register_view(item).await;

        let fact = EngagementFact::view(item, actor);
        if self.publisher.publish(&fact).await {
            return Ok(EngagementOutcome::Queued);
        }

        self.persist_view(item, actor, fact.occurred_at, false).await?;
        record_fallback("view");
        Ok(EngagementOutcome::FallbackApplied)
    }

    /// Add a comment from `actor` on `item`. Append-only, deduplicated by
    /// the assigned comment ID on replay.
    pub async fn add_comment(
        &self,
        item: ItemId,
        actor: ActorId,
        content: &str,
    ) -> Result<CommentReceipt, EngagementError> {
        self.ensure_known(item).await?;

        let comment_id = CommentId::new();
        let now = Utc::now();

        let outcome = if self.async_enabled {
            self.cache.register_comment(item).await;

            let fact = EngagementFact::comment(item, actor, comment_id, content, now);
            if self.publisher.publish(&fact).await {
                EngagementOutcome::Queued
            } else {
                self.persist_comment(comment_id, item, actor, content, now, false)
                    .await?;
                record_fallback("comment");
                EngagementOutcome::FallbackApplied
            }
        } else {
            self.persist_comment(comment_id, item, actor, content, now, true)
                .await?;
            record_fallback("comment");
            EngagementOutcome::SyncApplied
        };

        Ok(CommentReceipt {
            comment_id,
            item_id: item,
            actor_id: actor,
            content: content.to_owned(),
            created_at: now,
            outcome,
        })
    }

    /// Read the item's counters, cache-aside.
    ///
    /// Returns the cached snapshot when present; otherwise aggregates from
    /// the durable store, seeds the cache (last writer wins under
    /// concurrent seeding), and returns the fresh snapshot. An item with
    /// no engagement reads as all zeros.
    pub async fn counters(&self, item: ItemId) -> Result<CounterSnapshot, EngagementError> {
        if let CacheRead::Present(counts) = self.cache.snapshot(item).await {
            return Ok(counts);
        }

        let counts = CounterSnapshot {
            likes: self.store.count_likes(item).await?,
            views: self.store.sum_views(item).await?,
            comments: self.store.count_comments(item).await?,
        };
        self.cache.write_snapshot(item, counts).await;
        Ok(counts)
    }

    /// Confirm the item exists, consulting the existence token first.
    ///
    /// On a cache miss (or disabled/erroring tier) the durable store is
    /// the authority; a hit there refreshes the token.
    async fn ensure_known(&self, item: ItemId) -> Result<(), EngagementError> {
        if self.cache.is_known(item).await {
            return Ok(());
        }
        if !self.store.exists(item).await? {
            return Err(EngagementError::NotFound(item));
        }
        self.cache.mark_exists(item).await;
        Ok(())
    }

    async fn persist_like(
        &self,
        item: ItemId,
        actor: ActorId,
        at: DateTime<Utc>,
        update_cache: bool,
    ) -> Result<(), EngagementError> {
        let inserted = self
            .store
            .insert_like_if_absent(FactId::new(), item, actor, at)
            .await?;
        if inserted && update_cache {
            self.cache.register_like(item, actor).await;
        }
        Ok(())
    }

    async fn persist_unlike(
        &self,
        item: ItemId,
        actor: ActorId,
        update_cache: bool,
    ) -> Result<(), EngagementError> {
        let deleted = self.store.delete_like(item, actor).await?;
        if deleted && update_cache {
            self.cache.unregister_like(item, actor).await;
        }
        Ok(())
    }

    async fn persist_view(
        &self,
        item: ItemId,
        actor: ActorId,
        at: DateTime<Utc>,
        update_cache: bool,
    ) -> Result<(), EngagementError> {
        self.store
            .upsert_view(FactId::new(), item, actor, at)
            .await?;
        if update_cache {
            self.cache.register_view(item).await;
        }
        Ok(())
    }

    async fn persist_comment(
        &self,
        comment_id: CommentId,
        item: ItemId,
        actor: ActorId,
        content: &str,
        at: DateTime<Utc>,
        update_cache: bool,
    ) -> Result<(), EngagementError> {
        let inserted = self
            .store
            .insert_comment_if_absent(comment_id, item, actor, content, at)
            .await?;
        if inserted && update_cache {
            self.cache.register_comment(item).await;
        }
        Ok(())
    }

    /// The cache tier this service mutates.
    pub const fn cache(&self) -> &C {
        &self.cache
    }

    /// The durable store this service falls back to.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// The publisher this service queues facts through.
    pub const fn publisher(&self) -> &P {
        &self.publisher
    }
}

/// Meter a write that went through the durable store on the request path.
fn record_fallback(operation: &'static str) {
    metrics::counter!("engagement_db_fallback_total", "operation" => operation).increment(1);
    tracing::debug!(operation, "engagement persisted on the request path");
}
