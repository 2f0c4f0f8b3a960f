//! Reposts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::comment::Comment;

/// A repost of a comment.
///
/// A repost carries its own `likes`/`liked` pair, independent of the
/// embedded original comment's counters. The embedded comment is a
/// read-only snapshot from the repost's perspective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repost {
    /// Opaque identifier.
    pub id: String,
    /// The reposted comment's id.
    pub comment_id: String,
    /// The user who reposted.
    pub user_id: String,
    /// Display name of the reposting user.
    pub repost_user_name: String,
    /// Display name of the original comment's author.
    pub comment_user_name: String,
    /// Snapshot of the original comment.
    pub comment: Comment,
    /// Likes on the repost itself.
    pub likes: u32,
    /// Whether the current user has liked the repost.
    pub liked: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl Repost {
    /// Returns a copy with the repost's own like state toggled atomically.
    pub fn with_like_toggled(&self, now: DateTime<Utc>) -> Self {
        let liked = !self.liked;
        let likes = if liked {
            self.likes + 1
        } else {
            self.likes.saturating_sub(1)
        };
        Self {
            likes,
            liked,
            updated_at: now,
            ..self.clone()
        }
    }
}
