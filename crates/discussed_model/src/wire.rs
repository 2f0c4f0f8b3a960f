//! Wire payload types and normalization.
//!
//! Entities arrive as flat JSON objects with ISO-8601 timestamp strings and
//! a nested interaction object that the server sometimes omits. This module
//! is the only place allowed to assume that shape. Normalization is lenient:
//! an unparseable or missing timestamp falls back to the current time, and a
//! missing interaction block becomes a zero-valued one, so presentation code
//! never sees a hole.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::comment::{Comment, CommentThread, Reply};
use crate::dedupe::dedupe_replies;
use crate::feed_item::FeedItem;
use crate::interaction::{InteractionState, ReplyInteractions};
use crate::repost::Repost;

/// Raw interaction block as transmitted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InteractionWire {
    /// Number of likes.
    #[serde(default)]
    pub likes: u32,
    /// Whether the current user has liked.
    #[serde(default)]
    pub user_liked: bool,
    /// Number of replies.
    #[serde(default)]
    pub reply_count: u32,
    /// Number of reposts.
    #[serde(default)]
    pub reposts: u32,
    /// Whether the current user has reposted.
    #[serde(default)]
    pub user_reposted: bool,
    /// ISO-8601 time of the most recent interaction.
    #[serde(default)]
    pub last_interaction: Option<String>,
}

/// Raw comment as transmitted.
#[derive(Debug, Clone, Deserialize)]
pub struct CommentWire {
    /// Entity id.
    pub id: String,
    /// Topic id.
    #[serde(default)]
    pub topic_id: String,
    /// Author id.
    #[serde(default)]
    pub user_id: String,
    /// Author display name.
    #[serde(default)]
    pub user_name: String,
    /// Body text.
    #[serde(default)]
    pub content: String,
    /// Interaction block; may be absent.
    #[serde(default)]
    pub user_interactions: Option<InteractionWire>,
    /// ISO-8601 creation time.
    #[serde(default)]
    pub created_at: Option<String>,
    /// ISO-8601 update time.
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Raw repost as transmitted.
#[derive(Debug, Clone, Deserialize)]
pub struct RepostWire {
    /// Entity id.
    pub id: String,
    /// The reposted comment's id.
    #[serde(default)]
    pub comment_id: String,
    /// The reposting user's id.
    #[serde(default)]
    pub user_id: String,
    /// Display name of the reposting user.
    #[serde(default)]
    pub repost_user_name: String,
    /// Display name of the original author.
    #[serde(default)]
    pub comment_user_name: String,
    /// Embedded original comment; may be absent on malformed payloads.
    #[serde(default)]
    pub comment: Option<CommentWire>,
    /// Likes on the repost itself.
    #[serde(default)]
    pub likes: u32,
    /// Whether the current user has liked the repost.
    #[serde(default)]
    pub liked: bool,
    /// ISO-8601 creation time.
    #[serde(default)]
    pub created_at: Option<String>,
    /// ISO-8601 update time.
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Raw reply as transmitted.
#[derive(Debug, Clone, Deserialize)]
pub struct ReplyWire {
    /// Entity id.
    pub id: String,
    /// Parent comment id.
    #[serde(default)]
    pub comment_id: String,
    /// Author id.
    #[serde(default)]
    pub user_id: String,
    /// Author display name.
    #[serde(default)]
    pub user_name: String,
    /// Body text.
    #[serde(default)]
    pub content: String,
    /// Interaction block; may be absent.
    #[serde(default)]
    pub user_interactions: Option<InteractionWire>,
    /// ISO-8601 creation time.
    #[serde(default)]
    pub created_at: Option<String>,
    /// ISO-8601 update time.
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Raw feed entry: a `{ comment, repost }` pair with exactly one side set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedItemWire {
    /// The comment side.
    #[serde(default)]
    pub comment: Option<CommentWire>,
    /// The repost side.
    #[serde(default)]
    pub repost: Option<RepostWire>,
}

/// Raw comment-with-replies payload from the detail endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ThreadWire {
    /// The parent comment.
    pub comment: CommentWire,
    /// Replies; may be absent.
    #[serde(default)]
    pub replies: Option<Vec<ReplyWire>>,
}

/// Parses an ISO-8601 timestamp, falling back to `now` when missing or
/// malformed.
pub fn parse_timestamp(raw: Option<&str>, now: DateTime<Utc>) -> DateTime<Utc> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(now)
}

fn normalize_interactions(wire: Option<InteractionWire>, now: DateTime<Utc>) -> InteractionState {
    match wire {
        Some(w) => InteractionState {
            likes: w.likes,
            user_liked: w.user_liked,
            reply_count: w.reply_count,
            reposts: w.reposts,
            user_reposted: w.user_reposted,
            last_interaction: parse_timestamp(w.last_interaction.as_deref(), now),
        },
        None => InteractionState::empty(now),
    }
}

/// Normalizes a raw comment into a typed entity.
pub fn normalize_comment(wire: CommentWire) -> Comment {
    let now = Utc::now();
    Comment {
        id: wire.id,
        topic_id: wire.topic_id,
        user_id: wire.user_id,
        user_name: wire.user_name,
        content: wire.content,
        user_interactions: normalize_interactions(wire.user_interactions, now),
        created_at: parse_timestamp(wire.created_at.as_deref(), now),
        updated_at: parse_timestamp(wire.updated_at.as_deref(), now),
    }
}

/// Normalizes a raw repost into a typed entity.
///
/// Returns `None` when the embedded original comment is missing; a repost
/// without its snapshot cannot be rendered and is dropped.
pub fn normalize_repost(wire: RepostWire) -> Option<Repost> {
    let now = Utc::now();
    let comment = normalize_comment(wire.comment?);
    Some(Repost {
        id: wire.id,
        comment_id: wire.comment_id,
        user_id: wire.user_id,
        repost_user_name: wire.repost_user_name,
        comment_user_name: wire.comment_user_name,
        comment,
        likes: wire.likes,
        liked: wire.liked,
        created_at: parse_timestamp(wire.created_at.as_deref(), now),
        updated_at: parse_timestamp(wire.updated_at.as_deref(), now),
    })
}

/// Normalizes a raw reply into a typed entity.
pub fn normalize_reply(wire: ReplyWire) -> Reply {
    let now = Utc::now();
    let interactions = match wire.user_interactions {
        Some(w) => ReplyInteractions {
            likes: w.likes,
            user_liked: w.user_liked,
            last_interaction: parse_timestamp(w.last_interaction.as_deref(), now),
        },
        None => ReplyInteractions::empty(now),
    };
    Reply {
        id: wire.id,
        comment_id: wire.comment_id,
        user_id: wire.user_id,
        user_name: wire.user_name,
        content: wire.content,
        interactions,
        created_at: parse_timestamp(wire.created_at.as_deref(), now),
        updated_at: parse_timestamp(wire.updated_at.as_deref(), now),
    }
}

/// Normalizes one feed entry, preferring the comment side when both are
/// (incorrectly) populated. Entries with neither side are dropped.
pub fn normalize_feed_item(wire: FeedItemWire) -> Option<FeedItem> {
    if let Some(comment) = wire.comment {
        return Some(FeedItem::Comment(normalize_comment(comment)));
    }
    wire.repost
        .and_then(normalize_repost)
        .map(FeedItem::Repost)
}

/// Normalizes a batch of feed entries, dropping malformed ones.
pub fn normalize_feed_items(wires: Vec<FeedItemWire>) -> Vec<FeedItem> {
    wires.into_iter().filter_map(normalize_feed_item).collect()
}

/// Normalizes a comment-with-replies payload, deduplicating the replies.
pub fn normalize_thread(wire: ThreadWire) -> CommentThread {
    let comment = normalize_comment(wire.comment);
    let replies = dedupe_replies(
        wire.replies
            .unwrap_or_default()
            .into_iter()
            .map(normalize_reply)
            .collect(),
    );
    CommentThread { comment, replies }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_interactions_default_to_zero() {
        let wire: CommentWire = serde_json::from_value(serde_json::json!({
            "id": "c-1",
            "topic_id": "t-1",
            "user_id": "u-1",
            "user_name": "author",
            "content": "hello",
            "created_at": "2026-01-02T03:04:05Z",
            "updated_at": "2026-01-02T03:04:05Z"
        }))
        .unwrap();

        let before = Utc::now();
        let comment = normalize_comment(wire);
        assert_eq!(comment.user_interactions.likes, 0);
        assert!(!comment.user_interactions.user_liked);
        assert!(comment.user_interactions.last_interaction >= before);
    }

    #[test]
    fn timestamps_are_parsed() {
        let wire: CommentWire = serde_json::from_value(serde_json::json!({
            "id": "c-1",
            "created_at": "2026-01-02T03:04:05Z",
            "user_interactions": {
                "likes": 7,
                "user_liked": true,
                "reply_count": 1,
                "reposts": 0,
                "user_reposted": false,
                "last_interaction": "2026-01-03T00:00:00Z"
            }
        }))
        .unwrap();

        let comment = normalize_comment(wire);
        assert_eq!(comment.created_at.to_rfc3339(), "2026-01-02T03:04:05+00:00");
        assert_eq!(comment.user_interactions.likes, 7);
        assert!(comment.user_interactions.user_liked);
    }

    #[test]
    fn malformed_timestamp_falls_back_to_now() {
        let before = Utc::now();
        let parsed = parse_timestamp(Some("not-a-date"), before);
        assert_eq!(parsed, before);
    }

    #[test]
    fn feed_item_picks_exactly_one_side() {
        let wires: Vec<FeedItemWire> = serde_json::from_value(serde_json::json!([
            { "comment": { "id": "c-1", "content": "a" } },
            { "repost": {
                "id": "r-1",
                "comment_id": "c-2",
                "comment": { "id": "c-2", "content": "b" },
                "likes": 1,
                "liked": false
            } },
            { }
        ]))
        .unwrap();

        let items = normalize_feed_items(wires);
        assert_eq!(items.len(), 2);
        assert!(items[0].is_comment());
        assert!(items[1].is_repost());
    }

    #[test]
    fn repost_without_snapshot_is_dropped() {
        let wire: RepostWire = serde_json::from_value(serde_json::json!({
            "id": "r-1",
            "comment_id": "c-2"
        }))
        .unwrap();
        assert!(normalize_repost(wire).is_none());
    }

    #[test]
    fn thread_replies_are_deduplicated() {
        let wire: ThreadWire = serde_json::from_value(serde_json::json!({
            "comment": { "id": "c-1", "content": "parent" },
            "replies": [
                { "id": "p-1", "comment_id": "c-1", "content": "first" },
                { "id": "p-2", "comment_id": "c-1", "content": "second" },
                { "id": "p-1", "comment_id": "c-1", "content": "first again" }
            ]
        }))
        .unwrap();

        let thread = normalize_thread(wire);
        assert_eq!(thread.replies.len(), 2);
        assert_eq!(thread.replies[0].id, "p-1");
        // Last occurrence wins within one payload.
        assert_eq!(thread.replies[0].content, "first again");
    }
}
