//! The asynchronous event channel of the Tally engagement pipeline.
//!
//! Facts travel from the request path to the durable store through NATS:
//! the [`NatsFactPublisher`] hands each fact to the broker with a bounded
//! timeout, and the [`EngagementConsumer`] drains the subject tree on an
//! independent worker, applying facts idempotently to any
//! [`tally_store::EngagementStore`].
//!
//! # Subject Convention
//!
//! - **Publish:** `{topic}.{item_id}` -- the item ID is the routing key, so
//!   facts for one item share a subject and preserve relative order for a
//!   single-consumer deployment.
//! - **Subscribe:** `{topic}.>`
//!
//! Delivery is at-least-once from the pipeline's perspective: a fact whose
//! publish was acknowledged may still be redelivered, and the durable
//! store's uniqueness constraints absorb the duplicates.

pub mod consumer;
pub mod error;
pub mod publisher;

pub use consumer::{EngagementConsumer, apply_fact};
pub use error::EventsError;
pub use publisher::{DisabledPublisher, FactPublisher, NatsFactPublisher};

/// Connect to a NATS server.
///
/// # Errors
///
/// Returns [`EventsError::Nats`] if the connection cannot be established.
pub async fn connect(url: &str) -> Result<async_nats::Client, EventsError> {
    tracing::info!(url = url, "connecting to NATS server");
    let client = async_nats::connect(url)
        .await
        .map_err(|e| EventsError::Nats(format!("failed to connect to {url}: {e}")))?;
    tracing::info!("NATS connection established");
    Ok(client)
}
