//! Error types for the event channel.
//!
//! Publish failures are deliberately NOT errors: the publisher contract is
//! a boolean, and the orchestrator owns the synchronous fallback. Errors
//! here surface only from connection setup and from the consumer's
//! subscription, where failing loudly is correct.

/// Errors that can occur in the event channel.
#[derive(Debug, thiserror::Error)]
pub enum EventsError {
    /// A NATS connection or subscription operation failed.
    #[error("NATS error: {0}")]
    Nats(String),

    /// A fact payload could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
