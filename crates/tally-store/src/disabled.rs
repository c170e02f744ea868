//! The cache implementation used when the counter tier is switched off.
//!
//! Every read reports unavailable and every mutation is a silent no-op, so
//! the orchestrator takes the same code path as it does during a cache
//! outage: novelty is indeterminate, reads fall through to the durable
//! store.

use async_trait::async_trait;
use tally_types::{ActorId, CacheOutcome, CacheRead, CounterSnapshot, ItemId};

use crate::traits::CounterCache;

/// A counter cache that is permanently disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledCounterCache;

impl DisabledCounterCache {
    /// Create the disabled cache.
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CounterCache for DisabledCounterCache {
    async fn mark_exists(&self, _item: ItemId) {}

    async fn is_known(&self, _item: ItemId) -> bool {
        false
    }

    async fn register_like(&self, _item: ItemId, _actor: ActorId) -> CacheOutcome {
        CacheOutcome::Indeterminate
    }

    async fn unregister_like(&self, _item: ItemId, _actor: ActorId) -> CacheOutcome {
        CacheOutcome::Indeterminate
    }

    async fn register_view(&self, _item: ItemId) {}

    async fn register_comment(&self, _item: ItemId) {}

    async fn snapshot(&self, _item: ItemId) -> CacheRead<CounterSnapshot> {
        CacheRead::Unavailable
    }

    async fn write_snapshot(&self, _item: ItemId, _counts: CounterSnapshot) {}
}
