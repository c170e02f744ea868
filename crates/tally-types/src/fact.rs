//! The engagement fact carried over the event channel.
//!
//! A fact is an immutable record of one interaction. It is created by the
//! orchestrator on the request path, serialized as JSON, and delivered
//! at-least-once to the consumer. Duplicates are possible; the durable
//! store's uniqueness constraints absorb them for likes and comments.
//!
//! # Wire Contract
//!
//! ```json
//! {
//!   "factId": "0192...",
//!   "type": "COMMENT",
//!   "itemId": "0192...",
//!   "actorId": "0192...",
//!   "commentId": "0192...",
//!   "commentContent": "nice post",
//!   "occurredAt": "2026-08-30T12:00:00Z"
//! }
//! ```
//!
//! `commentId` and `commentContent` are present only for `COMMENT` facts.
//! The routing key on the channel is the item ID.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ActorId, CommentId, FactId, ItemId};

/// The kind of interaction a fact records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FactKind {
    /// An actor liked an item (idempotent toggle on).
    Like,
    /// An actor removed their like (idempotent toggle off).
    Unlike,
    /// An actor viewed an item (monotonic per-actor increment).
    View,
    /// An actor commented on an item (append-only).
    Comment,
}

impl FactKind {
    /// Lowercase label used in log fields and metric labels.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Unlike => "unlike",
            Self::View => "view",
            Self::Comment => "comment",
        }
    }
}

impl core::fmt::Display for FactKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable engagement interaction on an item.
///
/// Constructed via [`EngagementFact::like`], [`EngagementFact::unlike`],
/// [`EngagementFact::view`], or [`EngagementFact::comment`]; each assigns a
/// fresh [`FactId`] and stamps `occurred_at` with the current UTC time
/// (except `comment`, whose timestamp is supplied so the receipt returned to
/// the caller matches what the consumer will store).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementFact {
    /// Unique fact identifier (idempotency key).
    pub fact_id: FactId,
    /// The kind of interaction.
    #[serde(rename = "type")]
    pub kind: FactKind,
    /// The item the interaction targets.
    pub item_id: ItemId,
    /// The actor who performed the interaction.
    pub actor_id: ActorId,
    /// Comment identifier; present only for [`FactKind::Comment`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_id: Option<CommentId>,
    /// Comment body; present only for [`FactKind::Comment`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_content: Option<String>,
    /// When the interaction occurred (UTC).
    pub occurred_at: DateTime<Utc>,
}

impl EngagementFact {
    /// Build a like fact for `(item, actor)`.
    pub fn like(item_id: ItemId, actor_id: ActorId) -> Self {
        Self::bare(FactKind::Like, item_id, actor_id)
    }

    /// Build an unlike fact for `(item, actor)`.
    pub fn unlike(item_id: ItemId, actor_id: ActorId) -> Self {
        Self::bare(FactKind::Unlike, item_id, actor_id)
    }

    /// Build a view fact for `(item, actor)`.
    pub fn view(item_id: ItemId, actor_id: ActorId) -> Self {
        Self::bare(FactKind::View, item_id, actor_id)
    }

    /// Build a comment fact carrying the comment ID and body.
    pub fn comment(
        item_id: ItemId,
        actor_id: ActorId,
        comment_id: CommentId,
        content: impl Into<String>,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            fact_id: FactId::new(),
            kind: FactKind::Comment,
            item_id,
            actor_id,
            comment_id: Some(comment_id),
            comment_content: Some(content.into()),
            occurred_at,
        }
    }

    fn bare(kind: FactKind, item_id: ItemId, actor_id: ActorId) -> Self {
        Self {
            fact_id: FactId::new(),
            kind,
            item_id,
            actor_id,
            comment_id: None,
            comment_content: None,
            occurred_at: Utc::now(),
        }
    }

    /// The routing key for the event channel: the item ID as a string.
    ///
    /// Facts for the same item route to the same partition so that per-item
    /// ordering is preserved where the store semantics benefit from it.
    pub fn routing_key(&self) -> String {
        self.item_id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_fact_wire_shape_omits_comment_fields() {
        let fact = EngagementFact::like(ItemId::new(), ActorId::new());
        let json = serde_json::to_value(&fact).map_or_else(|_| serde_json::Value::Null, |v| v);

        assert_eq!(json.get("type").and_then(|v| v.as_str()), Some("LIKE"));
        assert!(json.get("factId").is_some());
        assert!(json.get("itemId").is_some());
        assert!(json.get("actorId").is_some());
        assert!(json.get("occurredAt").is_some());
        assert!(json.get("commentId").is_none());
        assert!(json.get("commentContent").is_none());
    }

    #[test]
    fn comment_fact_carries_id_and_content() {
        let comment_id = CommentId::new();
        let fact = EngagementFact::comment(
            ItemId::new(),
            ActorId::new(),
            comment_id,
            "first!",
            Utc::now(),
        );
        assert_eq!(fact.kind, FactKind::Comment);
        assert_eq!(fact.comment_id, Some(comment_id));
        assert_eq!(fact.comment_content.as_deref(), Some("first!"));
    }

    #[test]
    fn routing_key_is_item_id() {
        let item = ItemId::new();
        let fact = EngagementFact::view(item, ActorId::new());
        assert_eq!(fact.routing_key(), item.to_string());
    }
}
