//! Shared types for the Tally engagement-counter pipeline.
//!
//! This crate defines the vocabulary every other Tally crate speaks:
//! strongly-typed identifiers, the [`EngagementFact`] wire type carried over
//! the event channel, the cached [`CounterSnapshot`] projection, and the sum
//! types that make cache degradation explicit at the type level.
//!
//! It deliberately depends on nothing heavier than `serde`, `uuid`, and
//! `chrono` so that both the request path and the consumer worker can share
//! it without pulling in storage or broker dependencies.

pub mod cache;
pub mod fact;
pub mod ids;
pub mod snapshot;

// Re-export primary types for convenience.
pub use cache::{CacheOutcome, CacheRead};
pub use fact::{EngagementFact, FactKind};
pub use ids::{ActorId, CommentId, FactId, ItemId};
pub use snapshot::CounterSnapshot;
