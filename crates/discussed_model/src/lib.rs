//! # Discussed Model
//!
//! Feed entities and wire mappers for the Discussed client.
//!
//! This crate provides:
//! - Typed feed entities (`Comment`, `Repost`, `Reply`, `FeedItem`)
//! - Interaction counters (`InteractionState`) with atomic like toggling
//! - The `InteractionCommand` sent for like/unlike actions
//! - Wire payload types and normalization (timestamps, defaulted counters)
//! - Deduplication and batch merging by entity identifier
//!
//! This is a pure data crate with no I/O operations. The wire types in
//! [`wire`] are the only place allowed to assume the server's JSON shape;
//! everything downstream works with normalized entities.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod comment;
mod dedupe;
mod feed_item;
mod interaction;
mod repost;
pub mod wire;

pub use comment::{Comment, CommentThread, Reply};
pub use dedupe::{dedupe_by_id, dedupe_feed_items, dedupe_replies, merge_batches};
pub use feed_item::FeedItem;
pub use interaction::{InteractionCommand, InteractionState, ReplyInteractions};
pub use repost::Repost;
