//! The feed item union.

use chrono::{DateTime, Utc};

use crate::comment::Comment;
use crate::repost::Repost;

/// One entry in a feed: a comment or a repost, never both.
///
/// The server transmits feed entries as `{ comment, repost }` pairs where
/// exactly one side is populated; locally the exclusivity is structural.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedItem {
    /// A top-level comment.
    Comment(Comment),
    /// A repost wrapping a comment snapshot.
    Repost(Repost),
}

impl FeedItem {
    /// Returns the identifier of the inner entity.
    pub fn id(&self) -> &str {
        match self {
            FeedItem::Comment(c) => &c.id,
            FeedItem::Repost(r) => &r.id,
        }
    }

    /// Returns true if this entry is a comment.
    pub fn is_comment(&self) -> bool {
        matches!(self, FeedItem::Comment(_))
    }

    /// Returns true if this entry is a repost.
    pub fn is_repost(&self) -> bool {
        matches!(self, FeedItem::Repost(_))
    }

    /// Returns the inner comment, if this entry is one.
    pub fn as_comment(&self) -> Option<&Comment> {
        match self {
            FeedItem::Comment(c) => Some(c),
            FeedItem::Repost(_) => None,
        }
    }

    /// Returns the inner repost, if this entry is one.
    pub fn as_repost(&self) -> Option<&Repost> {
        match self {
            FeedItem::Comment(_) => None,
            FeedItem::Repost(r) => Some(r),
        }
    }

    /// Creation time of the inner entity.
    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            FeedItem::Comment(c) => c.created_at,
            FeedItem::Repost(r) => r.created_at,
        }
    }
}
