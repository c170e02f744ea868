//! Sum types that make cache-tier degradation explicit.
//!
//! The cache tier is allowed to be disabled or erroring at any time, and the
//! orchestrator must behave differently for "definitely already applied"
//! versus "cannot tell". Booleans and `Option` cannot carry that third
//! state, so both signals are modeled as dedicated enums.

/// Result of a membership mutation on the cached like-actor set.
///
/// The orchestrator suppresses duplicate fact publication only on
/// [`AlreadyPresent`]; [`Indeterminate`] falls through to publish and lets
/// the durable store's uniqueness constraints absorb any duplicate.
///
/// [`AlreadyPresent`]: CacheOutcome::AlreadyPresent
/// [`Indeterminate`]: CacheOutcome::Indeterminate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    /// The actor was newly added/removed; the counter moved.
    Added,
    /// The actor was already in the target state; nothing changed.
    AlreadyPresent,
    /// The cache tier is disabled or erroring; novelty is unknown.
    Indeterminate,
}

/// Result of reading a value from the cache tier.
///
/// A miss ([`Absent`]) is an expected outcome, not an error. A disabled or
/// erroring tier reports [`Unavailable`] so callers cannot mistake an
/// outage for a legitimate miss, even though both fall back to the durable
/// store.
///
/// [`Absent`]: CacheRead::Absent
/// [`Unavailable`]: CacheRead::Unavailable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheRead<T> {
    /// The value was cached and unexpired.
    Present(T),
    /// The cache tier answered: no value for this key.
    Absent,
    /// The cache tier is disabled or failed to answer.
    Unavailable,
}

impl<T> CacheRead<T> {
    /// Convert to an [`Option`], collapsing `Absent` and `Unavailable`.
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Present(value) => Some(value),
            Self::Absent | Self::Unavailable => None,
        }
    }

    /// Whether the read produced a cached value.
    pub const fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_is_not_a_miss_but_collapses_to_none() {
        let read: CacheRead<u64> = CacheRead::Unavailable;
        assert_ne!(read, CacheRead::Absent);
        assert_eq!(read.into_option(), None);
        assert!(!read.is_present());
    }
}
