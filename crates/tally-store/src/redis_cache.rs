//! Shared counter cache over the Redis protocol.
//!
//! Holds the denormalized per-item counters, the per-item like-actor set,
//! and the known-items set. All mutations use Redis atomic primitives
//! (`SADD`/`SREM`/`HINCRBY`), never read-modify-write, so concurrent
//! requests against the same item interleave safely.
//!
//! # Key Patterns
//!
//! | Pattern | Type | Description |
//! |---------|------|-------------|
//! | `engagement:items` | Set | Item existence tokens |
//! | `engagement:item:{id}:counts` | Hash | `likes` / `views` / `comments` |
//! | `engagement:item:{id}:likers` | Set | Actors with an active like |
//!
//! Every operation absorbs its own failures: an erroring tier is logged,
//! metered, and reported to the caller as indeterminate/unavailable. The
//! durable store remains correct without this tier; it only gets slower.

use std::collections::HashMap;
use std::time::Duration;

use fred::prelude::*;
use tally_types::{ActorId, CacheOutcome, CacheRead, CounterSnapshot, ItemId};

use crate::error::StoreError;
use crate::traits::CounterCache;

/// Key of the known-items set.
const ITEMS_KEY: &str = "engagement:items";

/// Hash field for the like counter.
const FIELD_LIKES: &str = "likes";

/// Hash field for the view counter.
const FIELD_VIEWS: &str = "views";

/// Hash field for the comment counter.
const FIELD_COMMENTS: &str = "comments";

/// Independent TTLs for the three cached structures.
///
/// A zero duration disables expiry for that structure.
#[derive(Debug, Clone, Copy)]
pub struct CacheTtl {
    /// TTL of the per-item counts hash.
    pub snapshot: Duration,
    /// TTL of the per-item like-actor set.
    pub like_set: Duration,
    /// TTL of the known-items set.
    pub existence: Duration,
}

impl Default for CacheTtl {
    fn default() -> Self {
        Self {
            snapshot: Duration::from_secs(120),
            like_set: Duration::from_secs(300),
            existence: Duration::from_secs(3600),
        }
    }
}

/// Counter cache backed by a Redis-protocol server.
#[derive(Clone)]
pub struct RedisCounterCache {
    client: Client,
    ttl: CacheTtl,
}

impl RedisCounterCache {
    /// Connect to the cache tier at the given URL.
    ///
    /// The URL follows the Redis URL scheme: `redis://host:port` or
    /// `redis://host:port/db`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Config`] if the URL cannot be parsed and
    /// [`StoreError::Cache`] if the connection fails.
    pub async fn connect(url: &str, ttl: CacheTtl) -> Result<Self, StoreError> {
        let config = Config::from_url(url)
            .map_err(|e| StoreError::Config(format!("invalid cache URL: {e}")))?;

        let client = Builder::from_config(config).build()?;
        client.init().await?;

        tracing::info!("connected to counter cache");
        Ok(Self { client, ttl })
    }

    fn counts_key(item: ItemId) -> String {
        format!("engagement:item:{item}:counts")
    }

    fn likers_key(item: ItemId) -> String {
        format!("engagement:item:{item}:likers")
    }

    /// Apply a TTL to `key`, skipping zero (disabled) durations.
    async fn apply_ttl(&self, key: &str, ttl: Duration) -> Result<(), Error> {
        if ttl.is_zero() {
            return Ok(());
        }
        let seconds = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        let _: i64 = self.client.expire(key, seconds, None).await?;
        Ok(())
    }

    /// Record a tier error: metered, logged, degraded.
    fn tier_error(operation: &'static str, item: ItemId, error: &Error) {
        metrics::counter!("engagement_cache_errors_total").increment(1);
        tracing::warn!(%item, operation, %error, "counter cache operation failed");
    }

    fn record_hit() {
        metrics::counter!("engagement_cache_total", "result" => "hit").increment(1);
    }

    fn record_miss() {
        metrics::counter!("engagement_cache_total", "result" => "miss").increment(1);
    }

    async fn try_mark_exists(&self, item: ItemId) -> Result<(), Error> {
        let _: i64 = self
            .client
            .sadd(ITEMS_KEY, item.to_string().as_str())
            .await?;
        self.apply_ttl(ITEMS_KEY, self.ttl.existence).await
    }

    async fn try_is_known(&self, item: ItemId) -> Result<bool, Error> {
        self.client
            .sismember(ITEMS_KEY, item.to_string().as_str())
            .await
    }

    async fn try_register_like(&self, item: ItemId, actor: ActorId) -> Result<CacheOutcome, Error> {
        let likers = Self::likers_key(item);
        let added: i64 = self
            .client
            .sadd(likers.as_str(), actor.to_string().as_str())
            .await?;
        if added == 0 {
            return Ok(CacheOutcome::AlreadyPresent);
        }

        let counts = Self::counts_key(item);
        let _: i64 = self.client.hincrby(counts.as_str(), FIELD_LIKES, 1).await?;
        self.apply_ttl(counts.as_str(), self.ttl.snapshot).await?;
        self.apply_ttl(likers.as_str(), self.ttl.like_set).await?;
        Ok(CacheOutcome::Added)
    }

    async fn try_unregister_like(
        &self,
        item: ItemId,
        actor: ActorId,
    ) -> Result<CacheOutcome, Error> {
        let likers = Self::likers_key(item);
        let removed: i64 = self
            .client
            .srem(likers.as_str(), actor.to_string().as_str())
            .await?;
        if removed == 0 {
            return Ok(CacheOutcome::AlreadyPresent);
        }

        let counts = Self::counts_key(item);
        let remaining: i64 = self
            .client
            .hincrby(counts.as_str(), FIELD_LIKES, -1)
            .await?;
        if remaining < 0 {
            // Underflow repair: the set and the counter drifted (TTL skew
            // or a seeded snapshot), so clamp the counter back to zero.
            let zero: HashMap<&str, &str> = HashMap::from([(FIELD_LIKES, "0")]);
            let _: () = self.client.hset(counts.as_str(), zero).await?;
        }
        self.apply_ttl(counts.as_str(), self.ttl.snapshot).await?;
        self.apply_ttl(likers.as_str(), self.ttl.like_set).await?;
        Ok(CacheOutcome::Added)
    }

    async fn try_increment(&self, item: ItemId, field: &'static str) -> Result<(), Error> {
        let counts = Self::counts_key(item);
        let _: i64 = self.client.hincrby(counts.as_str(), field, 1).await?;
        self.apply_ttl(counts.as_str(), self.ttl.snapshot).await
    }

    async fn try_snapshot(&self, item: ItemId) -> Result<Option<CounterSnapshot>, Error> {
        let counts = Self::counts_key(item);
        let raw: HashMap<String, String> = self.client.hgetall(counts.as_str()).await?;
        if raw.is_empty() {
            return Ok(None);
        }
        Ok(Some(CounterSnapshot {
            likes: parse_field(&raw, FIELD_LIKES),
            views: parse_field(&raw, FIELD_VIEWS),
            comments: parse_field(&raw, FIELD_COMMENTS),
        }))
    }

    async fn try_write_snapshot(
        &self,
        item: ItemId,
        counts: CounterSnapshot,
    ) -> Result<(), Error> {
        let key = Self::counts_key(item);
        let fields: HashMap<&str, String> = HashMap::from([
            (FIELD_LIKES, counts.likes.to_string()),
            (FIELD_VIEWS, counts.views.to_string()),
            (FIELD_COMMENTS, counts.comments.to_string()),
        ]);
        let _: () = self.client.hset(key.as_str(), fields).await?;
        self.apply_ttl(key.as_str(), self.ttl.snapshot).await
    }
}

#[async_trait::async_trait]
impl CounterCache for RedisCounterCache {
    async fn mark_exists(&self, item: ItemId) {
        if let Err(e) = self.try_mark_exists(item).await {
            Self::tier_error("mark_exists", item, &e);
        }
    }

    async fn is_known(&self, item: ItemId) -> bool {
        match self.try_is_known(item).await {
            Ok(known) => {
                if known {
                    Self::record_hit();
                } else {
                    Self::record_miss();
                }
                known
            }
            Err(e) => {
                Self::tier_error("is_known", item, &e);
                false
            }
        }
    }

    async fn register_like(&self, item: ItemId, actor: ActorId) -> CacheOutcome {
        match self.try_register_like(item, actor).await {
            Ok(outcome) => outcome,
            Err(e) => {
                Self::tier_error("register_like", item, &e);
                CacheOutcome::Indeterminate
            }
        }
    }

    async fn unregister_like(&self, item: ItemId, actor: ActorId) -> CacheOutcome {
        match self.try_unregister_like(item, actor).await {
            Ok(outcome) => outcome,
            Err(e) => {
                Self::tier_error("unregister_like", item, &e);
                CacheOutcome::Indeterminate
            }
        }
    }

    async fn register_view(&self, item: ItemId) {
        if let Err(e) = self.try_increment(item, FIELD_VIEWS).await {
            Self::tier_error("register_view", item, &e);
        }
    }

    async fn register_comment(&self, item: ItemId) {
        if let Err(e) = self.try_increment(item, FIELD_COMMENTS).await {
            Self::tier_error("register_comment", item, &e);
        }
    }

    async fn snapshot(&self, item: ItemId) -> CacheRead<CounterSnapshot> {
        match self.try_snapshot(item).await {
            Ok(Some(counts)) => {
                Self::record_hit();
                CacheRead::Present(counts)
            }
            Ok(None) => {
                Self::record_miss();
                CacheRead::Absent
            }
            Err(e) => {
                Self::tier_error("snapshot", item, &e);
                CacheRead::Unavailable
            }
        }
    }

    async fn write_snapshot(&self, item: ItemId, counts: CounterSnapshot) {
        if let Err(e) = self.try_write_snapshot(item, counts).await {
            Self::tier_error("write_snapshot", item, &e);
        }
    }
}

/// Parse a hash field as `u64`, treating missing or malformed values as 0.
fn parse_field(raw: &HashMap<String, String>, field: &str) -> u64 {
    raw.get(field)
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0)
}
