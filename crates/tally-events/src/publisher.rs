//! Fact publication with a bounded timeout and boolean outcome.
//!
//! The publisher is fire-and-forget with respect to durable application: a
//! `true` return means the broker acknowledged the handoff within the
//! timeout, nothing more. Every failure mode -- serialization, transport,
//! timeout, disabled async mode -- collapses to `false`, and the caller is
//! responsible for the synchronous fallback path.

use std::time::Duration;

use async_trait::async_trait;
use tally_types::EngagementFact;

/// The publishing seam of the pipeline.
///
/// Implementations must never block the caller for longer than their
/// configured timeout.
#[async_trait]
pub trait FactPublisher: Send + Sync {
    /// Attempt to hand the fact to the broker.
    ///
    /// Returns `true` only on acknowledged enqueue within the timeout.
    async fn publish(&self, fact: &EngagementFact) -> bool;
}

/// NATS-backed fact publisher.
#[derive(Clone)]
pub struct NatsFactPublisher {
    client: async_nats::Client,
    topic: String,
    timeout: Duration,
    enabled: bool,
}

impl NatsFactPublisher {
    /// Create a publisher from an already-connected client.
    ///
    /// `topic` is the subject prefix; each fact publishes on
    /// `{topic}.{item_id}`. When `enabled` is false every publish reports
    /// failure, which routes all traffic through the synchronous path.
    pub const fn new(
        client: async_nats::Client,
        topic: String,
        timeout: Duration,
        enabled: bool,
    ) -> Self {
        Self {
            client,
            topic,
            timeout,
            enabled,
        }
    }

    async fn try_publish(&self, subject: String, payload: Vec<u8>) -> Result<(), String> {
        self.client
            .publish(subject.clone(), payload.into())
            .await
            .map_err(|e| format!("publish to {subject} failed: {e}"))?;
        // Flush forces the write to the server; without it the message may
        // sit in the client buffer past our timeout accounting.
        self.client
            .flush()
            .await
            .map_err(|e| format!("flush failed: {e}"))
    }
}

#[async_trait]
impl FactPublisher for NatsFactPublisher {
    async fn publish(&self, fact: &EngagementFact) -> bool {
        if !self.enabled {
            return false;
        }

        let payload = match serde_json::to_vec(fact) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(fact_id = %fact.fact_id, %e, "failed to serialize fact");
                return false;
            }
        };

        let subject = format!("{}.{}", self.topic, fact.routing_key());
        let kind = fact.kind.as_str();

        match tokio::time::timeout(self.timeout, self.try_publish(subject, payload)).await {
            Ok(Ok(())) => {
                metrics::counter!("engagement_published_total", "kind" => kind).increment(1);
                tracing::debug!(
                    fact_id = %fact.fact_id,
                    kind,
                    item = %fact.item_id,
                    "fact queued"
                );
                true
            }
            Ok(Err(reason)) => {
                metrics::counter!("engagement_publish_failed_total", "kind" => kind)
                    .increment(1);
                tracing::warn!(
                    fact_id = %fact.fact_id,
                    kind,
                    item = %fact.item_id,
                    reason,
                    "fact publish failed"
                );
                false
            }
            Err(_) => {
                metrics::counter!("engagement_publish_failed_total", "kind" => kind)
                    .increment(1);
                tracing::warn!(
                    fact_id = %fact.fact_id,
                    kind,
                    item = %fact.item_id,
                    timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
                    "fact publish timed out"
                );
                false
            }
        }
    }
}

/// A publisher for deployments without a broker: every publish fails, so
/// the orchestrator always takes the synchronous path.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledPublisher;

impl DisabledPublisher {
    /// Create the disabled publisher.
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FactPublisher for DisabledPublisher {
    async fn publish(&self, _fact: &EngagementFact) -> bool {
        false
    }
}
