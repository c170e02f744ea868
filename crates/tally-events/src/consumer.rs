//! The at-least-once consumer that drains facts into the durable store.
//!
//! Runs on an independent worker, continuously polling the subject tree.
//! Each fact is applied through one idempotent store statement; duplicates
//! from redelivery resolve at the store's uniqueness constraints (except
//! views, which have no per-fact key and always apply -- an accepted
//! property of the pipeline).
//!
//! One poisoned fact must never block the stream: store errors and
//! malformed payloads are logged, metered, and dropped. There is no retry
//! and no dead-letter; durability for queued facts relies on the broker's
//! own delivery guarantees.

use futures::StreamExt as _;
use tally_store::EngagementStore;
use tally_types::{EngagementFact, FactKind};

use crate::error::EventsError;

/// Apply one delivered fact to the durable store.
///
/// Idempotent under redelivery for likes, unlikes, and comments. A store
/// error drops only this fact: it is logged and metered, and the caller
/// continues with the next delivery.
pub async fn apply_fact<S: EngagementStore>(store: &S, fact: &EngagementFact) {
    let kind = fact.kind.as_str();
    metrics::counter!("engagement_consumed_total", "kind" => kind).increment(1);

    let result = match fact.kind {
        FactKind::Like => store
            .insert_like_if_absent(fact.fact_id, fact.item_id, fact.actor_id, fact.occurred_at)
            .await
            .map(|_| ()),
        FactKind::Unlike => store
            .delete_like(fact.item_id, fact.actor_id)
            .await
            .map(|_| ()),
        FactKind::View => {
            store
                .upsert_view(fact.fact_id, fact.item_id, fact.actor_id, fact.occurred_at)
                .await
        }
        FactKind::Comment => {
            let Some(comment_id) = fact.comment_id else {
                tracing::warn!(
                    fact_id = %fact.fact_id,
                    "comment fact without comment ID dropped"
                );
                return;
            };
            let content = fact.comment_content.as_deref().unwrap_or("");
            store
                .insert_comment_if_absent(
                    comment_id,
                    fact.item_id,
                    fact.actor_id,
                    content,
                    fact.occurred_at,
                )
                .await
                .map(|_| ())
        }
    };

    if let Err(e) = result {
        metrics::counter!("engagement_consumer_store_errors_total", "kind" => kind).increment(1);
        tracing::warn!(
            fact_id = %fact.fact_id,
            kind,
            item = %fact.item_id,
            %e,
            "fact skipped after store error"
        );
    }
}

/// Consumer binding a NATS subscription to an [`EngagementStore`].
pub struct EngagementConsumer<S> {
    client: async_nats::Client,
    topic: String,
    store: S,
}

impl<S: EngagementStore> EngagementConsumer<S> {
    /// Create a consumer from an already-connected client.
    pub const fn new(client: async_nats::Client, topic: String, store: S) -> Self {
        Self {
            client,
            topic,
            store,
        }
    }

    /// Subscribe to `{topic}.>` and apply facts until the subscription ends.
    ///
    /// # Errors
    ///
    /// Returns [`EventsError::Nats`] if the subscription cannot be
    /// established. Individual fact failures do not end the loop.
    pub async fn run(&self) -> Result<(), EventsError> {
        let subject = format!("{}.>", self.topic);
        tracing::info!(subject = subject, "subscribing to engagement facts");
        let mut subscriber = self
            .client
            .subscribe(subject.clone())
            .await
            .map_err(|e| EventsError::Nats(format!("failed to subscribe to {subject}: {e}")))?;

        while let Some(message) = subscriber.next().await {
            match serde_json::from_slice::<EngagementFact>(&message.payload) {
                Ok(fact) => apply_fact(&self.store, &fact).await,
                Err(e) => {
                    tracing::warn!(subject = %message.subject, %e, "malformed fact dropped");
                }
            }
        }

        tracing::info!("fact subscription ended");
        Ok(())
    }

    /// The store this consumer applies facts to.
    pub const fn store(&self) -> &S {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use tally_store::{MemoryEngagementStore, StoreError};
    use tally_types::{ActorId, CommentId, FactId, ItemId};

    use super::*;

    #[tokio::test]
    async fn replayed_comment_fact_stores_one_comment() {
        let store = MemoryEngagementStore::new();
        let item = ItemId::new();
        store.insert_item(item);

        let fact = EngagementFact::comment(
            item,
            ActorId::new(),
            CommentId::new(),
            "hello",
            Utc::now(),
        );
        apply_fact(&store, &fact).await;
        apply_fact(&store, &fact).await;

        assert!(matches!(store.count_comments(item).await, Ok(1)));
    }

    #[tokio::test]
    async fn like_then_unlike_replay_is_idempotent() {
        let store = MemoryEngagementStore::new();
        let item = ItemId::new();
        let actor = ActorId::new();
        store.insert_item(item);

        let like = EngagementFact::like(item, actor);
        apply_fact(&store, &like).await;
        apply_fact(&store, &like).await;
        assert!(matches!(store.count_likes(item).await, Ok(1)));

        let unlike = EngagementFact::unlike(item, actor);
        apply_fact(&store, &unlike).await;
        apply_fact(&store, &unlike).await;
        assert!(matches!(store.count_likes(item).await, Ok(0)));
    }

    #[tokio::test]
    async fn comment_fact_missing_id_is_dropped() {
        let store = MemoryEngagementStore::new();
        let item = ItemId::new();
        store.insert_item(item);

        let mut fact =
            EngagementFact::comment(item, ActorId::new(), CommentId::new(), "x", Utc::now());
        fact.comment_id = None;
        apply_fact(&store, &fact).await;

        assert!(matches!(store.count_comments(item).await, Ok(0)));
    }

    /// A store whose like writes always fail, for the poisoned-fact path.
    #[derive(Default)]
    struct FailingLikes {
        inner: MemoryEngagementStore,
    }

    #[async_trait]
    impl EngagementStore for FailingLikes {
        async fn insert_like_if_absent(
            &self,
            _fact_id: FactId,
            _item: ItemId,
            _actor: ActorId,
            _at: DateTime<Utc>,
        ) -> Result<bool, StoreError> {
            Err(StoreError::Config("like writes disabled".to_owned()))
        }

        async fn delete_like(&self, item: ItemId, actor: ActorId) -> Result<bool, StoreError> {
            self.inner.delete_like(item, actor).await
        }

        async fn upsert_view(
            &self,
            fact_id: FactId,
            item: ItemId,
            actor: ActorId,
            at: DateTime<Utc>,
        ) -> Result<(), StoreError> {
            self.inner.upsert_view(fact_id, item, actor, at).await
        }

        async fn insert_comment_if_absent(
            &self,
            comment_id: CommentId,
            item: ItemId,
            actor: ActorId,
            content: &str,
            at: DateTime<Utc>,
        ) -> Result<bool, StoreError> {
            self.inner
                .insert_comment_if_absent(comment_id, item, actor, content, at)
                .await
        }

        async fn count_likes(&self, item: ItemId) -> Result<u64, StoreError> {
            self.inner.count_likes(item).await
        }

        async fn sum_views(&self, item: ItemId) -> Result<u64, StoreError> {
            self.inner.sum_views(item).await
        }

        async fn count_comments(&self, item: ItemId) -> Result<u64, StoreError> {
            self.inner.count_comments(item).await
        }

        async fn exists(&self, item: ItemId) -> Result<bool, StoreError> {
            self.inner.exists(item).await
        }
    }

    #[tokio::test]
    async fn poisoned_fact_does_not_block_subsequent_facts() {
        let store = FailingLikes::default();
        let item = ItemId::new();
        store.inner.insert_item(item);

        // The like fact fails against the store and is dropped...
        apply_fact(&store, &EngagementFact::like(item, ActorId::new())).await;
        // ...and the next fact still applies.
        apply_fact(&store, &EngagementFact::view(item, ActorId::new())).await;

        assert!(matches!(store.sum_views(item).await, Ok(1)));
    }
}
