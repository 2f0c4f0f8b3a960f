//! Interaction counters and commands.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Interaction counters embedded in a comment.
///
/// `likes` and `user_liked` are only ever updated together: toggling
/// `user_liked` moves `likes` by exactly one in the same mutation. Use
/// [`InteractionState::with_like_toggled`] rather than editing the fields
/// independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionState {
    /// Number of likes.
    pub likes: u32,
    /// Whether the current user has liked this entity.
    pub user_liked: bool,
    /// Number of replies.
    pub reply_count: u32,
    /// Number of reposts.
    pub reposts: u32,
    /// Whether the current user has reposted this entity.
    pub user_reposted: bool,
    /// Time of the most recent interaction.
    pub last_interaction: DateTime<Utc>,
}

impl InteractionState {
    /// Creates a zero-valued interaction block stamped with the given time.
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self {
            likes: 0,
            user_liked: false,
            reply_count: 0,
            reposts: 0,
            user_reposted: false,
            last_interaction: now,
        }
    }

    /// Returns a copy with `user_liked` flipped and `likes` moved by one.
    pub fn with_like_toggled(&self, now: DateTime<Utc>) -> Self {
        let liked = !self.user_liked;
        let likes = if liked {
            self.likes + 1
        } else {
            self.likes.saturating_sub(1)
        };
        Self {
            likes,
            user_liked: liked,
            last_interaction: now,
            ..self.clone()
        }
    }

    /// Returns a copy with `reply_count` raised by one.
    pub fn with_reply_added(&self, now: DateTime<Utc>) -> Self {
        Self {
            reply_count: self.reply_count + 1,
            last_interaction: now,
            ..self.clone()
        }
    }

    /// Returns a copy with `reply_count` lowered by one.
    pub fn with_reply_removed(&self, now: DateTime<Utc>) -> Self {
        Self {
            reply_count: self.reply_count.saturating_sub(1),
            last_interaction: now,
            ..self.clone()
        }
    }
}

/// The interaction subset carried by a reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyInteractions {
    /// Number of likes.
    pub likes: u32,
    /// Whether the current user has liked this reply.
    pub user_liked: bool,
    /// Time of the most recent interaction.
    pub last_interaction: DateTime<Utc>,
}

impl ReplyInteractions {
    /// Creates a zero-valued interaction block stamped with the given time.
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self {
            likes: 0,
            user_liked: false,
            last_interaction: now,
        }
    }
}

/// A transient like/unlike request, never persisted locally.
///
/// Exactly one of `comment_id` / `repost_id` is set; it selects which
/// entity's counters the server mutates. The constructors enforce this.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InteractionCommand {
    /// Target comment, when liking a comment.
    pub comment_id: Option<String>,
    /// Target repost, when liking a repost.
    pub repost_id: Option<String>,
    /// The acting user.
    pub user_id: String,
    /// The new liked value.
    pub liked: bool,
}

impl InteractionCommand {
    /// Creates a command targeting a comment.
    pub fn for_comment(
        comment_id: impl Into<String>,
        user_id: impl Into<String>,
        liked: bool,
    ) -> Self {
        Self {
            comment_id: Some(comment_id.into()),
            repost_id: None,
            user_id: user_id.into(),
            liked,
        }
    }

    /// Creates a command targeting a repost.
    pub fn for_repost(
        repost_id: impl Into<String>,
        user_id: impl Into<String>,
        liked: bool,
    ) -> Self {
        Self {
            comment_id: None,
            repost_id: Some(repost_id.into()),
            user_id: user_id.into(),
            liked,
        }
    }

    /// Returns the id of the targeted entity.
    pub fn target_id(&self) -> &str {
        self.comment_id
            .as_deref()
            .or(self.repost_id.as_deref())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_toggle_moves_counter_by_one() {
        let now = Utc::now();
        let state = InteractionState {
            likes: 3,
            user_liked: false,
            reply_count: 5,
            reposts: 2,
            user_reposted: false,
            last_interaction: now,
        };

        let liked = state.with_like_toggled(now);
        assert!(liked.user_liked);
        assert_eq!(liked.likes, 4);
        // Unrelated counters are untouched.
        assert_eq!(liked.reply_count, 5);
        assert_eq!(liked.reposts, 2);

        let unliked = liked.with_like_toggled(now);
        assert!(!unliked.user_liked);
        assert_eq!(unliked.likes, 3);
    }

    #[test]
    fn unlike_saturates_at_zero() {
        let now = Utc::now();
        let mut state = InteractionState::empty(now);
        // Inconsistent server data: liked but zero likes.
        state.user_liked = true;
        let toggled = state.with_like_toggled(now);
        assert!(!toggled.user_liked);
        assert_eq!(toggled.likes, 0);
    }

    #[test]
    fn reply_count_adjustments() {
        let now = Utc::now();
        let state = InteractionState::empty(now);
        let bumped = state.with_reply_added(now);
        assert_eq!(bumped.reply_count, 1);
        let restored = bumped.with_reply_removed(now);
        assert_eq!(restored.reply_count, 0);
        assert_eq!(restored.with_reply_removed(now).reply_count, 0);
    }

    #[test]
    fn command_targets_exactly_one_entity() {
        let comment = InteractionCommand::for_comment("c-1", "u-1", true);
        assert!(comment.comment_id.is_some());
        assert!(comment.repost_id.is_none());
        assert_eq!(comment.target_id(), "c-1");

        let repost = InteractionCommand::for_repost("r-1", "u-1", false);
        assert!(repost.comment_id.is_none());
        assert!(repost.repost_id.is_some());
        assert_eq!(repost.target_id(), "r-1");
    }
}
