//! Optimistic interaction reconciler.
//!
//! Every mutation follows the same two-phase shape: compute the new local
//! value and apply it to the in-memory list immediately, issue the network
//! command, and on rejection recompute the list with the original entity
//! restored. A command either ends `Confirmed` (the optimistic value
//! stands) or `RolledBack` (the pre-mutation entity is back); there is no
//! intermediate pending state.

use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;

use discussed_model::wire::{self, CommentWire, RepostWire};
use discussed_model::{Comment, FeedItem, InteractionCommand, Repost};

use crate::auth::{AuthRetry, CredentialProvider, ErrorSink};
use crate::error::{SyncError, SyncResult};
use crate::feed::{FeedStore, FeedTab};
use crate::transport::{ApiRequest, Transport};

#[derive(Debug, Deserialize)]
struct ValidateWire {
    #[serde(rename = "canComment", default)]
    can_comment: bool,
}

/// Behavior switches for the reconciler.
#[derive(Debug, Clone, Default)]
pub struct ReconcilerConfig {
    /// Whether a failed reply post rolls the parent's optimistic
    /// `reply_count` increment back. Off by default: replies are rare and
    /// the count self-corrects on the next fetch.
    pub rollback_failed_reply: bool,
}

/// Applies user interactions optimistically and reconciles them with the
/// authoritative server outcome.
///
/// The reconciler reads the active tab's list to locate a target and
/// replaces the whole list to reflect one item's mutation; it never owns
/// or touches the pagination cursor. Concurrent commands on the same
/// entity are not serialized: each computes from whatever in-memory value
/// is current when it runs, last writer wins.
pub struct Reconciler<T, P> {
    transport: Arc<T>,
    auth: Arc<AuthRetry<P>>,
    store: Arc<FeedStore>,
    sink: Arc<dyn ErrorSink>,
    user_id: String,
    config: ReconcilerConfig,
}

impl<T: Transport, P: CredentialProvider> Reconciler<T, P> {
    /// Creates a reconciler acting as the given user.
    pub fn new(
        transport: Arc<T>,
        auth: Arc<AuthRetry<P>>,
        store: Arc<FeedStore>,
        user_id: impl Into<String>,
    ) -> Self {
        let sink = auth.sink();
        Self {
            transport,
            auth,
            store,
            sink,
            user_id: user_id.into(),
            config: ReconcilerConfig::default(),
        }
    }

    /// Overrides the default behavior switches.
    pub fn with_config(mut self, config: ReconcilerConfig) -> Self {
        self.config = config;
        self
    }

    /// Toggles the like state of a comment or repost.
    ///
    /// The flip is applied to the active list immediately; if the server
    /// rejects the command the original entity is restored wholesale, not
    /// just the two counters, in case other fields diverged optimistically
    /// in the meantime.
    pub async fn toggle_like(&self, target: &FeedItem) -> SyncResult<()> {
        let tab = self.store.active_tab();
        let items = self.store.items(tab);
        let index = match items.iter().position(|item| item.id() == target.id()) {
            Some(index) => index,
            None => {
                let error = SyncError::MissingTarget(target.id().to_string());
                self.sink.report(&error);
                return Err(error);
            }
        };

        let original = items[index].clone();
        let now = Utc::now();
        let (updated, command) = match &original {
            FeedItem::Comment(comment) => {
                let toggled = comment.with_like_toggled(now);
                let command = InteractionCommand::for_comment(
                    &comment.id,
                    &self.user_id,
                    toggled.user_interactions.user_liked,
                );
                (FeedItem::Comment(toggled), command)
            }
            FeedItem::Repost(repost) => {
                let toggled = repost.with_like_toggled(now);
                let command =
                    InteractionCommand::for_repost(&repost.id, &self.user_id, toggled.liked);
                (FeedItem::Repost(toggled), command)
            }
        };

        let body = match serde_json::to_value(&command) {
            Ok(body) => body,
            Err(e) => {
                let error = SyncError::Unclassified(format!("failed to encode command: {e}"));
                self.sink.report(&error);
                return Err(error);
            }
        };

        let mut next = items;
        next[index] = updated;
        self.store.replace_items(tab, next);
        tracing::debug!(id = target.id(), liked = command.liked, "optimistic like applied");

        if let Err(error) = self.send_like(body).await {
            self.restore(tab, original);
            return Err(error);
        }
        Ok(())
    }

    /// Reposts a comment.
    ///
    /// No optimistic insert happens: a repost's identity and its comment
    /// snapshot cannot be synthesized client-side without risking a ghost
    /// entry, so the caller blocks until the server returns the created
    /// repost, which is then prepended to the active tab. The source
    /// comment's own `reposts` counter is left to the next fetch.
    pub async fn submit_repost(&self, comment: &Comment) -> SyncResult<Repost> {
        let transport = Arc::clone(&self.transport);
        let path = format!("/comment/{}-repost", comment.id);
        let body = serde_json::json!({
            "comment_id": comment.id,
            "user_id": self.user_id,
        });

        let repost = self
            .auth
            .execute(&self.user_id, None, |credential| {
                let transport = Arc::clone(&transport);
                let request =
                    ApiRequest::post(path.clone(), body.clone()).with_credential(credential);
                async move {
                    let response = transport.request(request).await?.require_success()?;
                    let raw: RepostWire = response.decode()?;
                    wire::normalize_repost(raw).ok_or_else(|| {
                        SyncError::Decode("repost payload is missing its comment snapshot".into())
                    })
                }
            })
            .await?;

        let tab = self.store.active_tab();
        self.store.prepend_item(tab, FeedItem::Repost(repost.clone()));
        Ok(repost)
    }

    /// Posts a reply to a comment.
    ///
    /// The only optimistic mutation is the parent's `reply_count`
    /// increment; the reply body is not inserted into any held list — an
    /// open detail thread is expected to re-fetch explicitly via
    /// [`crate::FeedEngine::fetch_thread`].
    pub async fn submit_reply(&self, parent_comment_id: &str, content: &str) -> SyncResult<()> {
        let tab = self.store.active_tab();
        let now = Utc::now();

        let items = self.store.items(tab);
        let parent = items.iter().enumerate().find_map(|(index, item)| match item {
            FeedItem::Comment(c) if c.id == parent_comment_id => Some((index, c.clone())),
            _ => None,
        });
        if let Some((index, original)) = &parent {
            let bumped = Comment {
                user_interactions: original.user_interactions.with_reply_added(now),
                ..original.clone()
            };
            let mut next = items.clone();
            next[*index] = FeedItem::Comment(bumped);
            self.store.replace_items(tab, next);
        }

        let transport = Arc::clone(&self.transport);
        let body = serde_json::json!({
            "comment_id": parent_comment_id,
            "user_id": self.user_id,
            "content": escape_content(content),
        });

        let result = self
            .auth
            .execute(&self.user_id, None, |credential| {
                let transport = Arc::clone(&transport);
                let request =
                    ApiRequest::post("/reply", body.clone()).with_credential(credential);
                async move {
                    transport.request(request).await?.require_success()?;
                    Ok(())
                }
            })
            .await;

        if let Err(error) = result {
            if self.config.rollback_failed_reply {
                if let Some((_, original)) = parent {
                    self.restore(tab, FeedItem::Comment(original));
                }
            }
            return Err(error);
        }
        Ok(())
    }

    /// Posts a new top-level comment and returns the created entity.
    ///
    /// The caller decides where (and whether) to insert it.
    pub async fn submit_comment(&self, topic_id: &str, content: &str) -> SyncResult<Comment> {
        let transport = Arc::clone(&self.transport);
        let body = serde_json::json!({
            "topic_id": topic_id,
            "user_id": self.user_id,
            "content": escape_content(content),
        });

        self.auth
            .execute(&self.user_id, None, |credential| {
                let transport = Arc::clone(&transport);
                let request =
                    ApiRequest::post("/comment", body.clone()).with_credential(credential);
                async move {
                    let response = transport.request(request).await?.require_success()?;
                    let raw: CommentWire = response.decode()?;
                    Ok(wire::normalize_comment(raw))
                }
            })
            .await
    }

    /// Advisory daily rate-limit check, consulted before opening a compose
    /// surface. The server remains authoritative and may still reject the
    /// eventual submit; any failure here maps to `false`.
    pub async fn can_interact_today(&self, user_id: &str) -> bool {
        let transport = Arc::clone(&self.transport);
        let path = format!("/comment/validate/{user_id}");

        let result = self
            .auth
            .execute(user_id, None, |credential| {
                let transport = Arc::clone(&transport);
                let request = ApiRequest::get(path.clone()).with_credential(credential);
                async move {
                    let response = transport.request(request).await?.require_success()?;
                    let raw: ValidateWire = response.decode()?;
                    Ok(raw.can_comment)
                }
            })
            .await;

        result.unwrap_or(false)
    }

    async fn send_like(&self, body: serde_json::Value) -> SyncResult<()> {
        let transport = Arc::clone(&self.transport);
        self.auth
            .execute(&self.user_id, None, |credential| {
                let transport = Arc::clone(&transport);
                let request = ApiRequest::patch("/comment/like-interaction", body.clone())
                    .with_credential(credential);
                async move {
                    transport.request(request).await?.require_success()?;
                    Ok(())
                }
            })
            .await
    }

    /// Puts the pre-mutation entity back into the current list. If the
    /// entity is gone (the tab was reloaded meanwhile) there is nothing to
    /// roll back.
    fn restore(&self, tab: FeedTab, original: FeedItem) {
        let mut items = self.store.items(tab);
        if let Some(index) = items.iter().position(|item| item.id() == original.id()) {
            tracing::debug!(id = original.id(), "rolling back optimistic mutation");
            items[index] = original;
            self.store.replace_items(tab, items);
        }
    }
}

/// Escapes raw newlines so the body survives JSON-string transport the
/// way the service expects.
fn escape_content(content: &str) -> String {
    content.replace('\n', "\\n").replace('\r', "\\r")
}
