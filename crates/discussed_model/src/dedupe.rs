//! Deduplication and batch merging by entity identifier.

use std::collections::HashMap;

use crate::comment::Reply;
use crate::feed_item::FeedItem;

/// Collapses a list so each identifier appears exactly once.
///
/// Items keep the position of their first occurrence; when an id repeats,
/// the last occurrence's value wins. This matters for interaction counters
/// that may have changed between fetches of the same entity.
pub fn dedupe_by_id<T, F>(items: Vec<T>, key: F) -> Vec<T>
where
    F: Fn(&T) -> &str,
{
    let mut positions: HashMap<String, usize> = HashMap::with_capacity(items.len());
    let mut out: Vec<T> = Vec::with_capacity(items.len());
    for item in items {
        let id = key(&item).to_owned();
        match positions.get(&id) {
            Some(&pos) => out[pos] = item,
            None => {
                positions.insert(id, out.len());
                out.push(item);
            }
        }
    }
    out
}

/// Deduplicates feed items by id.
pub fn dedupe_feed_items(items: Vec<FeedItem>) -> Vec<FeedItem> {
    dedupe_by_id(items, |item| item.id())
}

/// Deduplicates replies by id.
pub fn dedupe_replies(replies: Vec<Reply>) -> Vec<Reply> {
    dedupe_by_id(replies, |reply| reply.id.as_str())
}

/// Merges a newly fetched batch into an accumulated list.
///
/// Entries from `fetched` win over previously held entries with the same
/// id; ordering follows the accumulated list, with genuinely new entries
/// appended in fetch order.
pub fn merge_batches(accumulated: Vec<FeedItem>, fetched: Vec<FeedItem>) -> Vec<FeedItem> {
    let mut combined = accumulated;
    combined.extend(fetched);
    dedupe_feed_items(combined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comment::Comment;
    use crate::interaction::InteractionState;
    use chrono::Utc;

    fn comment_item(id: &str, likes: u32) -> FeedItem {
        let now = Utc::now();
        let mut interactions = InteractionState::empty(now);
        interactions.likes = likes;
        FeedItem::Comment(Comment {
            id: id.into(),
            topic_id: "t-1".into(),
            user_id: "u-1".into(),
            user_name: "author".into(),
            content: format!("content {id}"),
            user_interactions: interactions,
            created_at: now,
            updated_at: now,
        })
    }

    fn likes_of(item: &FeedItem) -> u32 {
        item.as_comment().unwrap().user_interactions.likes
    }

    #[test]
    fn last_occurrence_wins_in_place() {
        let items = vec![
            comment_item("a", 1),
            comment_item("b", 2),
            comment_item("a", 9),
        ];
        let deduped = dedupe_feed_items(items);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].id(), "a");
        assert_eq!(likes_of(&deduped[0]), 9);
        assert_eq!(deduped[1].id(), "b");
    }

    #[test]
    fn merge_prefers_fetched_counters() {
        let accumulated = vec![comment_item("a", 1), comment_item("b", 2)];
        let fetched = vec![comment_item("b", 5), comment_item("c", 3)];
        let merged = merge_batches(accumulated, fetched);
        assert_eq!(
            merged.iter().map(|i| i.id()).collect::<Vec<_>>(),
            vec!["a", "b", "c"]
        );
        assert_eq!(likes_of(&merged[1]), 5);
    }

    #[test]
    fn empty_inputs() {
        assert!(dedupe_feed_items(Vec::new()).is_empty());
        let merged = merge_batches(Vec::new(), vec![comment_item("a", 0)]);
        assert_eq!(merged.len(), 1);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;
        use std::collections::HashSet;

        fn arb_items() -> impl Strategy<Value = Vec<FeedItem>> {
            proptest::collection::vec(("[a-e]", 0u32..100), 0..40).prop_map(|pairs| {
                pairs
                    .into_iter()
                    .map(|(id, likes)| comment_item(&id, likes))
                    .collect()
            })
        }

        proptest! {
            #[test]
            fn dedupe_is_idempotent(items in arb_items()) {
                let once = dedupe_feed_items(items);
                let twice = dedupe_feed_items(once.clone());
                prop_assert_eq!(once, twice);
            }

            #[test]
            fn dedupe_yields_unique_ids(items in arb_items()) {
                let deduped = dedupe_feed_items(items);
                let ids: HashSet<&str> = deduped.iter().map(|i| i.id()).collect();
                prop_assert_eq!(ids.len(), deduped.len());
            }
        }
    }
}
