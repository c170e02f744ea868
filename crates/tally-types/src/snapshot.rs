//! The cached per-item counter projection.

use serde::{Deserialize, Serialize};

/// Denormalized engagement counters for one item.
///
/// A snapshot is a cached projection of facts applied to the durable store.
/// It is permitted to be briefly stale; the durable aggregates are the
/// source of truth and repopulate it after TTL expiry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterSnapshot {
    /// Number of actors with an active like.
    pub likes: u64,
    /// Total views across all actors (each actor may view repeatedly).
    pub views: u64,
    /// Number of comments.
    pub comments: u64,
}

impl CounterSnapshot {
    /// A snapshot with all counters at zero.
    pub const ZERO: Self = Self {
        likes: 0,
        views: 0,
        comments: 0,
    };

    /// Create a snapshot from explicit counter values.
    pub const fn new(likes: u64, views: u64, comments: u64) -> Self {
        Self {
            likes,
            views,
            comments,
        }
    }
}
