//! Deployment-time selection of the counter cache backend.
//!
//! The cache tier is a single boolean in configuration: on means a shared
//! Redis-protocol server, off means [`DisabledCounterCache`] and every
//! operation degrades the same way it would during a cache outage. The
//! [`CacheTier`] enum lets callers hold either backend in one concrete
//! type without boxing.

use async_trait::async_trait;
use tally_types::{ActorId, CacheOutcome, CacheRead, CounterSnapshot, ItemId};

use crate::disabled::DisabledCounterCache;
use crate::error::StoreError;
use crate::redis_cache::{CacheTtl, RedisCounterCache};
use crate::traits::CounterCache;

/// The configured counter cache backend.
pub enum CacheTier {
    /// Shared cache over the Redis protocol.
    Redis(RedisCounterCache),
    /// Tier switched off; all operations degrade to miss/indeterminate.
    Disabled(DisabledCounterCache),
}

impl CacheTier {
    /// Select and connect the backend for the given configuration.
    ///
    /// When `enabled` is false the URL is never dialed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the tier is enabled and the connection
    /// fails.
    pub async fn connect(enabled: bool, url: &str, ttl: CacheTtl) -> Result<Self, StoreError> {
        if !enabled {
            tracing::info!("counter cache tier disabled by configuration");
            return Ok(Self::Disabled(DisabledCounterCache::new()));
        }
        Ok(Self::Redis(RedisCounterCache::connect(url, ttl).await?))
    }

    /// Whether the tier is backed by a live cache server.
    pub const fn is_enabled(&self) -> bool {
        matches!(self, Self::Redis(_))
    }
}

#[async_trait]
impl CounterCache for CacheTier {
    async fn mark_exists(&self, item: ItemId) {
        match self {
            Self::Redis(cache) => cache.mark_exists(item).await,
            Self::Disabled(cache) => cache.mark_exists(item).await,
        }
    }

    async fn is_known(&self, item: ItemId) -> bool {
        match self {
            Self::Redis(cache) => cache.is_known(item).await,
            Self::Disabled(cache) => cache.is_known(item).await,
        }
    }

    async fn register_like(&self, item: ItemId, actor: ActorId) -> CacheOutcome {
        match self {
            Self::Redis(cache) => cache.register_like(item, actor).await,
            Self::Disabled(cache) => cache.register_like(item, actor).await,
        }
    }

    async fn unregister_like(&self, item: ItemId, actor: ActorId) -> CacheOutcome {
        match self {
            Self::Redis(cache) => cache.unregister_like(item, actor).await,
            Self::Disabled(cache) => cache.unregister_like(item, actor).await,
        }
    }

    async fn register_view(&self, item: ItemId) {
        match self {
            Self::Redis(cache) => cache.register_view(item).await,
            Self::Disabled(cache) => cache.register_view(item).await,
        }
    }

    async fn register_comment(&self, item: ItemId) {
        match self {
            Self::Redis(cache) => cache.register_comment(item).await,
            Self::Disabled(cache) => cache.register_comment(item).await,
        }
    }

    async fn snapshot(&self, item: ItemId) -> CacheRead<CounterSnapshot> {
        match self {
            Self::Redis(cache) => cache.snapshot(item).await,
            Self::Disabled(cache) => cache.snapshot(item).await,
        }
    }

    async fn write_snapshot(&self, item: ItemId, counts: CounterSnapshot) {
        match self {
            Self::Redis(cache) => cache.write_snapshot(item, counts).await,
            Self::Disabled(cache) => cache.write_snapshot(item, counts).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_tier_never_dials_the_url() {
        // An unroutable URL proves selection happens before any connect.
        let tier = CacheTier::connect(false, "redis://unreachable.invalid:1", CacheTtl::default())
            .await;

        assert!(tier.is_ok());
        let Ok(tier) = tier else { return };
        assert!(!tier.is_enabled());
        assert_eq!(tier.snapshot(ItemId::new()).await, CacheRead::Unavailable);
        assert_eq!(
            tier.register_like(ItemId::new(), ActorId::new()).await,
            CacheOutcome::Indeterminate
        );
    }
}
