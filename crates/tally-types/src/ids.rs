//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Every identifier in the pipeline is strongly typed to prevent accidental
//! mixing at compile time -- handing an actor ID where an item ID belongs is
//! a compile error, not a data-corruption incident. All IDs use UUID v7
//! (time-ordered) for efficient database indexing.
//!
//! Items are created by an external system; this crate only ever observes
//! their IDs. Fact and comment IDs are generated app-side by the
//! orchestrator.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a content item (e.g. a post).
    ItemId
}

define_id! {
    /// Unique identifier for the actor performing an engagement.
    ActorId
}

define_id! {
    /// Unique identifier for an engagement fact, used as the idempotency
    /// key when the fact is applied to the durable store.
    FactId
}

define_id! {
    /// Unique identifier for a comment. Assigned when the comment is
    /// accepted, before the fact is queued, so replays deduplicate on it.
    CommentId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct_types_with_stable_display() {
        let raw = Uuid::now_v7();
        let item = ItemId::from(raw);
        assert_eq!(item.into_inner(), raw);
        assert_eq!(item.to_string(), raw.to_string());
    }

    #[test]
    fn new_ids_are_unique() {
        assert_ne!(FactId::new(), FactId::new());
    }
}
