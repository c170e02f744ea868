//! In-process implementations of both storage seams.
//!
//! [`MemoryCounterCache`] is a real cache tier for single-node deployments:
//! per-item atomic counters behind a concurrent map, with the same
//! clamp-at-zero and toggle semantics as the Redis tier. It does not enforce
//! TTLs -- entries live until the process exits -- which is acceptable for a
//! tier whose contents are always recomputable from the durable store.
//!
//! [`MemoryEngagementStore`] mirrors the `PostgreSQL` adapter's uniqueness
//! semantics without a database. The orchestrator and consumer test suites
//! run entirely against it.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::{DashMap, DashSet};
use tally_types::{
    ActorId, CacheOutcome, CacheRead, CommentId, CounterSnapshot, FactId, ItemId,
};

use crate::error::StoreError;
use crate::traits::{CounterCache, EngagementStore};

/// Per-item atomic counters.
#[derive(Default)]
struct Counters {
    likes: AtomicU64,
    views: AtomicU64,
    comments: AtomicU64,
}

impl Counters {
    fn load(&self) -> CounterSnapshot {
        CounterSnapshot {
            likes: self.likes.load(Ordering::Relaxed),
            views: self.views.load(Ordering::Relaxed),
            comments: self.comments.load(Ordering::Relaxed),
        }
    }
}

/// Process-local counter cache.
///
/// Lazily creates per-item entries on first engagement, exactly like the
/// Redis tier creates hash keys on first `HINCRBY`.
#[derive(Default)]
pub struct MemoryCounterCache {
    known: DashSet<ItemId>,
    counters: DashMap<ItemId, Counters>,
    likers: DashMap<ItemId, DashSet<ActorId>>,
}

impl MemoryCounterCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    fn bump(&self, item: ItemId, pick: impl Fn(&Counters) -> &AtomicU64) {
        let entry = self.counters.entry(item).or_default();
        pick(entry.value()).fetch_add(1, Ordering::Relaxed);
    }
}

#[async_trait]
impl CounterCache for MemoryCounterCache {
    async fn mark_exists(&self, item: ItemId) {
        self.known.insert(item);
    }

    async fn is_known(&self, item: ItemId) -> bool {
        self.known.contains(&item)
    }

    async fn register_like(&self, item: ItemId, actor: ActorId) -> CacheOutcome {
        let likers = self.likers.entry(item).or_default();
        if likers.insert(actor) {
            self.bump(item, |c| &c.likes);
            CacheOutcome::Added
        } else {
            CacheOutcome::AlreadyPresent
        }
    }

    async fn unregister_like(&self, item: ItemId, actor: ActorId) -> CacheOutcome {
        let removed = self
            .likers
            .get(&item)
            .is_some_and(|likers| likers.remove(&actor).is_some());
        if !removed {
            return CacheOutcome::AlreadyPresent;
        }

        if let Some(entry) = self.counters.get(&item) {
            // Clamp at zero; the set and counter can drift after a seed.
            let _ = entry
                .likes
                .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| {
                    Some(v.saturating_sub(1))
                });
        }
        CacheOutcome::Added
    }

    async fn register_view(&self, item: ItemId) {
        self.bump(item, |c| &c.views);
    }

    async fn register_comment(&self, item: ItemId) {
        self.bump(item, |c| &c.comments);
    }

    async fn snapshot(&self, item: ItemId) -> CacheRead<CounterSnapshot> {
        self.counters.get(&item).map_or_else(
            || {
                metrics::counter!("engagement_cache_total", "result" => "miss").increment(1);
                CacheRead::Absent
            },
            |entry| {
                metrics::counter!("engagement_cache_total", "result" => "hit").increment(1);
                CacheRead::Present(entry.load())
            },
        )
    }

    async fn write_snapshot(&self, item: ItemId, counts: CounterSnapshot) {
        let entry = self.counters.entry(item).or_default();
        entry.likes.store(counts.likes, Ordering::Relaxed);
        entry.views.store(counts.views, Ordering::Relaxed);
        entry.comments.store(counts.comments, Ordering::Relaxed);
    }
}

/// A stored comment row.
#[derive(Debug, Clone)]
struct CommentRow {
    item: ItemId,
}

/// In-process durable store with the same idempotency arbitration as
/// `PostgreSQL`: likes unique on `(item, actor)`, comments unique on their
/// ID, views an always-applied upsert.
#[derive(Default)]
pub struct MemoryEngagementStore {
    items: DashSet<ItemId>,
    likes: DashSet<(ItemId, ActorId)>,
    views: DashMap<(ItemId, ActorId), u64>,
    comments: DashMap<CommentId, CommentRow>,
}

impl MemoryEngagementStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an item so that [`EngagementStore::exists`] reports it.
    ///
    /// Items are created by an external system in production; this stands in
    /// for that system.
    pub fn insert_item(&self, item: ItemId) {
        self.items.insert(item);
    }
}

#[async_trait]
impl EngagementStore for MemoryEngagementStore {
    async fn insert_like_if_absent(
        &self,
        _fact_id: FactId,
        item: ItemId,
        actor: ActorId,
        _at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        Ok(self.likes.insert((item, actor)))
    }

    async fn delete_like(&self, item: ItemId, actor: ActorId) -> Result<bool, StoreError> {
        Ok(self.likes.remove(&(item, actor)).is_some())
    }

    async fn upsert_view(
        &self,
        _fact_id: FactId,
        item: ItemId,
        actor: ActorId,
        _at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut entry = self.views.entry((item, actor)).or_insert(0);
        *entry = entry.saturating_add(1);
        Ok(())
    }

    async fn insert_comment_if_absent(
        &self,
        comment_id: CommentId,
        item: ItemId,
        _actor: ActorId,
        _content: &str,
        _at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        if self.comments.contains_key(&comment_id) {
            return Ok(false);
        }
        self.comments.insert(comment_id, CommentRow { item });
        Ok(true)
    }

    async fn count_likes(&self, item: ItemId) -> Result<u64, StoreError> {
        let count = self.likes.iter().filter(|pair| pair.0 == item).count();
        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }

    async fn sum_views(&self, item: ItemId) -> Result<u64, StoreError> {
        let total = self
            .views
            .iter()
            .filter(|entry| entry.key().0 == item)
            .map(|entry| *entry.value())
            .fold(0_u64, u64::saturating_add);
        Ok(total)
    }

    async fn count_comments(&self, item: ItemId) -> Result<u64, StoreError> {
        let count = self.comments.iter().filter(|row| row.item == item).count();
        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }

    async fn exists(&self, item: ItemId) -> Result<bool, StoreError> {
        Ok(self.items.contains(&item))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn like_toggle_is_idempotent_in_cache() {
        let cache = MemoryCounterCache::new();
        let item = ItemId::new();
        let actor = ActorId::new();

        assert_eq!(cache.register_like(item, actor).await, CacheOutcome::Added);
        assert_eq!(
            cache.register_like(item, actor).await,
            CacheOutcome::AlreadyPresent
        );

        assert_eq!(
            cache.snapshot(item).await,
            CacheRead::Present(CounterSnapshot::new(1, 0, 0))
        );
    }

    #[tokio::test]
    async fn unlike_never_liked_is_noop_and_never_negative() {
        let cache = MemoryCounterCache::new();
        let item = ItemId::new();
        let actor = ActorId::new();

        assert_eq!(
            cache.unregister_like(item, actor).await,
            CacheOutcome::AlreadyPresent
        );
        assert_eq!(cache.snapshot(item).await, CacheRead::Absent);

        // Seed a drifted snapshot with zero likes, then force a removal
        // through the like set: the counter clamps instead of wrapping.
        cache.register_like(item, actor).await;
        cache.write_snapshot(item, CounterSnapshot::ZERO).await;
        assert_eq!(
            cache.unregister_like(item, actor).await,
            CacheOutcome::Added
        );
        assert_eq!(
            cache.snapshot(item).await,
            CacheRead::Present(CounterSnapshot::ZERO)
        );
    }

    #[tokio::test]
    async fn views_count_every_call() {
        let cache = MemoryCounterCache::new();
        let item = ItemId::new();
        for _ in 0..5 {
            cache.register_view(item).await;
        }
        assert_eq!(
            cache.snapshot(item).await,
            CacheRead::Present(CounterSnapshot::new(0, 5, 0))
        );
    }

    #[tokio::test]
    async fn store_like_conflicts_on_item_actor_pair() {
        let store = MemoryEngagementStore::new();
        let item = ItemId::new();
        let actor = ActorId::new();
        store.insert_item(item);

        let first = store
            .insert_like_if_absent(FactId::new(), item, actor, Utc::now())
            .await;
        let second = store
            .insert_like_if_absent(FactId::new(), item, actor, Utc::now())
            .await;
        assert!(matches!(first, Ok(true)));
        assert!(matches!(second, Ok(false)));
        assert!(matches!(store.count_likes(item).await, Ok(1)));
    }

    #[tokio::test]
    async fn view_upsert_accumulates_per_actor() {
        let store = MemoryEngagementStore::new();
        let item = ItemId::new();
        let actor = ActorId::new();
        store.insert_item(item);

        for _ in 0..3 {
            let applied = store
                .upsert_view(FactId::new(), item, actor, Utc::now())
                .await;
            assert!(applied.is_ok());
        }
        assert!(matches!(store.sum_views(item).await, Ok(3)));
    }
}
