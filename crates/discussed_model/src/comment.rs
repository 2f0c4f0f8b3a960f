//! Comments and replies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::interaction::{InteractionState, ReplyInteractions};

/// A top-level comment in a feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    /// Opaque identifier, unique within a feed.
    pub id: String,
    /// The topic this comment belongs to.
    pub topic_id: String,
    /// Author identity.
    pub user_id: String,
    /// Author display name.
    pub user_name: String,
    /// Freeform body text.
    pub content: String,
    /// Interaction counters.
    pub user_interactions: InteractionState,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    /// Returns a copy with the like state toggled atomically.
    pub fn with_like_toggled(&self, now: DateTime<Utc>) -> Self {
        Self {
            user_interactions: self.user_interactions.with_like_toggled(now),
            ..self.clone()
        }
    }
}

/// A reply to a comment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    /// Opaque identifier.
    pub id: String,
    /// The parent comment.
    pub comment_id: String,
    /// Author identity.
    pub user_id: String,
    /// Author display name.
    pub user_name: String,
    /// Freeform body text.
    pub content: String,
    /// Interaction counters.
    pub interactions: ReplyInteractions,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

/// A comment together with its replies, as returned by the detail endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentThread {
    /// The parent comment.
    pub comment: Comment,
    /// Deduplicated replies, oldest first as sent by the server.
    pub replies: Vec<Reply>,
}
