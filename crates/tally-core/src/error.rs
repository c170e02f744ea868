//! The user-visible error taxonomy of the pipeline.
//!
//! Only two failures ever reach a caller: the referenced item does not
//! exist, or the durable store failed on a synchronous/fallback write.
//! Cache-tier errors degrade inside the cache implementations and publish
//! failures reroute to the fallback path; neither appears here.

use tally_store::StoreError;
use tally_types::ItemId;

/// Errors surfaced by the engagement orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum EngagementError {
    /// The referenced item does not exist. Terminal for the request.
    #[error("item {0} not found")]
    NotFound(ItemId),

    /// The durable store failed on a synchronous write. Retryable: the
    /// write is a single idempotent statement, so no partial state
    /// remains.
    #[error(transparent)]
    Store(#[from] StoreError),
}
