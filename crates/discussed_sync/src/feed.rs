//! Feed pagination engine.
//!
//! The engine owns per-tab accumulated item lists and cursors, merges
//! paginated batches idempotently, and tracks whether more data exists.
//! Revealing already-buffered items never touches the network; the offset
//! advances only when a fetched page is actually applied.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use discussed_model::wire::{self, CommentWire, FeedItemWire, ThreadWire};
use discussed_model::{dedupe_feed_items, merge_batches, CommentThread, FeedItem};

use crate::auth::{AuthRetry, CredentialProvider, ErrorSink};
use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::transport::{ApiRequest, Transport};

/// A feed tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedTab {
    /// The personalized feed.
    ForYou,
    /// Comments from followed accounts.
    Following,
    /// Top comments.
    Top,
}

impl FeedTab {
    /// All tabs.
    pub const ALL: [FeedTab; 3] = [FeedTab::ForYou, FeedTab::Following, FeedTab::Top];

    /// Stable name, for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedTab::ForYou => "for-you",
            FeedTab::Following => "following",
            FeedTab::Top => "top",
        }
    }
}

/// Pagination position for one tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedCursor {
    /// How many items have been requested from the server so far.
    pub offset: usize,
    /// Page size.
    pub batch_size: usize,
    /// Whether the server may still hold more data for this tab.
    pub has_more: bool,
    /// How many accumulated items are currently revealed.
    pub visible_count: usize,
}

impl FeedCursor {
    fn reset(batch_size: usize) -> Self {
        Self {
            offset: 0,
            batch_size,
            has_more: true,
            visible_count: batch_size,
        }
    }
}

struct TabState {
    cursor: FeedCursor,
    items: Vec<FeedItem>,
    epoch: u64,
}

impl TabState {
    fn new(batch_size: usize) -> Self {
        Self {
            cursor: FeedCursor::reset(batch_size),
            items: Vec::new(),
            epoch: 0,
        }
    }
}

/// Shared per-tab feed state: cursors and accumulated item lists.
///
/// The pagination engine exclusively drives the cursors; the reconciler
/// only reads the active list and replaces it wholesale to reflect a
/// single item's mutation. Each reset bumps the tab's epoch so results of
/// superseded fetches are discarded instead of clobbering newer state.
pub struct FeedStore {
    batch_size: usize,
    tabs: RwLock<HashMap<FeedTab, TabState>>,
    active: RwLock<FeedTab>,
}

impl FeedStore {
    /// Creates a store with the given page size.
    pub fn new(batch_size: usize) -> Self {
        let mut tabs = HashMap::new();
        for tab in FeedTab::ALL {
            tabs.insert(tab, TabState::new(batch_size));
        }
        Self {
            batch_size,
            tabs: RwLock::new(tabs),
            active: RwLock::new(FeedTab::ForYou),
        }
    }

    /// The currently active tab.
    pub fn active_tab(&self) -> FeedTab {
        *self.active.read()
    }

    /// Marks a tab active without touching its state.
    pub fn set_active(&self, tab: FeedTab) {
        *self.active.write() = tab;
    }

    /// The cursor for a tab.
    pub fn cursor(&self, tab: FeedTab) -> FeedCursor {
        self.tabs.read()[&tab].cursor.clone()
    }

    /// The full accumulated list for a tab.
    pub fn items(&self, tab: FeedTab) -> Vec<FeedItem> {
        self.tabs.read()[&tab].items.clone()
    }

    /// The visible window: the first `min(visible_count, len)` items.
    pub fn visible(&self, tab: FeedTab) -> Vec<FeedItem> {
        let tabs = self.tabs.read();
        let state = &tabs[&tab];
        let shown = state.cursor.visible_count.min(state.items.len());
        state.items[..shown].to_vec()
    }

    /// Replaces a tab's accumulated list wholesale, leaving the cursor
    /// untouched. Used by the reconciler to reflect one item's mutation.
    pub fn replace_items(&self, tab: FeedTab, items: Vec<FeedItem>) {
        self.tabs.write().get_mut(&tab).expect("tab exists").items = items;
    }

    /// Prepends one item to a tab's accumulated list. An item whose id is
    /// already present is ignored, keeping the list duplicate-free.
    pub fn prepend_item(&self, tab: FeedTab, item: FeedItem) {
        let mut tabs = self.tabs.write();
        let state = tabs.get_mut(&tab).expect("tab exists");
        if state.items.iter().any(|i| i.id() == item.id()) {
            return;
        }
        state.items.insert(0, item);
        // Keep the freshly added entry on screen.
        state.cursor.visible_count += 1;
    }

    /// Resets a tab's cursor for a fresh initial load and returns the new
    /// epoch. The accumulated list is retained until the fetch lands.
    fn begin_initial(&self, tab: FeedTab) -> u64 {
        let mut tabs = self.tabs.write();
        let state = tabs.get_mut(&tab).expect("tab exists");
        state.cursor = FeedCursor::reset(self.batch_size);
        state.epoch += 1;
        state.epoch
    }

    /// Applies an initial batch if the tab has not been reset since the
    /// fetch began. The fetched entries win over retained ones with the
    /// same id, so returning to a tab refreshes counters without dropping
    /// already-buffered pages.
    fn apply_initial(&self, tab: FeedTab, epoch: u64, fetched: Vec<FeedItem>, has_more: bool) {
        let mut tabs = self.tabs.write();
        let state = tabs.get_mut(&tab).expect("tab exists");
        if state.epoch != epoch {
            tracing::debug!(tab = tab.as_str(), "discarding stale initial batch");
            return;
        }
        let retained = std::mem::take(&mut state.items);
        state.items = if retained.is_empty() {
            fetched
        } else {
            merge_batches(retained, fetched)
        };
        state.cursor.has_more = has_more;
    }

    /// Reveals up to one more page of already-buffered items.
    fn reveal(&self, tab: FeedTab) {
        let mut tabs = self.tabs.write();
        let state = tabs.get_mut(&tab).expect("tab exists");
        state.cursor.visible_count =
            (state.cursor.visible_count + state.cursor.batch_size).min(state.items.len());
    }

    /// Merges a follow-up batch if the tab has not been reset since the
    /// fetch began. The offset lands here rather than ahead of the fetch,
    /// so a failed page stays retryable at the same position.
    fn apply_more(
        &self,
        tab: FeedTab,
        epoch: u64,
        offset: usize,
        fetched: Vec<FeedItem>,
        has_more: bool,
    ) {
        let mut tabs = self.tabs.write();
        let state = tabs.get_mut(&tab).expect("tab exists");
        if state.epoch != epoch {
            tracing::debug!(tab = tab.as_str(), "discarding stale batch");
            return;
        }
        let accumulated = std::mem::take(&mut state.items);
        let before = accumulated.len();
        let merged = merge_batches(accumulated, fetched);
        let added = merged.len().saturating_sub(before);
        state.items = merged;
        state.cursor.offset = offset;
        state.cursor.visible_count += added;
        state.cursor.has_more = has_more;
    }

    fn epoch(&self, tab: FeedTab) -> u64 {
        self.tabs.read()[&tab].epoch
    }
}

/// Fetches and accumulates paginated feed batches per tab.
pub struct FeedEngine<T, P> {
    config: SyncConfig,
    transport: Arc<T>,
    auth: Arc<AuthRetry<P>>,
    store: Arc<FeedStore>,
    sink: Arc<dyn ErrorSink>,
    user_id: Option<String>,
}

impl<T: Transport, P: CredentialProvider> FeedEngine<T, P> {
    /// Creates an engine for the given user session. `user_id` of `None`
    /// reads public feeds only.
    pub fn new(
        config: SyncConfig,
        transport: Arc<T>,
        auth: Arc<AuthRetry<P>>,
        store: Arc<FeedStore>,
        user_id: Option<String>,
    ) -> Self {
        let sink = auth.sink();
        Self {
            config,
            transport,
            auth,
            store,
            sink,
            user_id,
        }
    }

    /// The shared feed state.
    pub fn store(&self) -> Arc<FeedStore> {
        Arc::clone(&self.store)
    }

    /// Loads the first page of a tab, resetting its cursor, and returns
    /// the visible window.
    pub async fn load_initial(&self, tab: FeedTab) -> SyncResult<Vec<FeedItem>> {
        let epoch = self.store.begin_initial(tab);
        let fetched = dedupe_feed_items(self.fetch_batch(tab, 0).await?);
        let has_more = fetched.len() >= self.config.batch_size;
        tracing::debug!(tab = tab.as_str(), count = fetched.len(), "initial batch loaded");
        self.store.apply_initial(tab, epoch, fetched, has_more);
        Ok(self.store.visible(tab))
    }

    /// Shows one more page of a tab and returns the visible window.
    ///
    /// When enough items are already buffered this only widens the visible
    /// window; otherwise the offset advances and the next page is fetched
    /// and merge-deduplicated into the accumulated list, with the fetched
    /// entries winning over stale duplicates.
    pub async fn load_more(&self, tab: FeedTab) -> SyncResult<Vec<FeedItem>> {
        let cursor = self.store.cursor(tab);
        let buffered = self.store.items(tab).len();

        if cursor.visible_count < buffered {
            self.store.reveal(tab);
            return Ok(self.store.visible(tab));
        }
        if !cursor.has_more {
            // A short batch pinned this tab until the next full reset.
            return Ok(self.store.visible(tab));
        }

        let epoch = self.store.epoch(tab);
        let offset = cursor.offset + cursor.batch_size;

        let fetched = dedupe_feed_items(self.fetch_batch(tab, offset).await?);
        let has_more = fetched.len() >= self.config.batch_size;
        tracing::debug!(tab = tab.as_str(), offset, count = fetched.len(), "batch loaded");
        self.store.apply_more(tab, epoch, offset, fetched, has_more);
        Ok(self.store.visible(tab))
    }

    /// Switches the active tab, resetting its cursor and loading its first
    /// page. The previously active tab's accumulated list stays buffered.
    pub async fn set_active_tab(&self, tab: FeedTab) -> SyncResult<Vec<FeedItem>> {
        self.store.set_active(tab);
        self.load_initial(tab).await
    }

    /// The visible window for a tab.
    pub fn visible(&self, tab: FeedTab) -> Vec<FeedItem> {
        self.store.visible(tab)
    }

    /// Fetches a comment together with its deduplicated replies.
    pub async fn fetch_thread(&self, comment_id: &str) -> SyncResult<CommentThread> {
        let request = ApiRequest::get(format!("/comment/{comment_id}"));
        let result = async {
            let response = self.transport.request(request).await?.require_success()?;
            let wire: ThreadWire = response.decode()?;
            Ok(wire::normalize_thread(wire))
        }
        .await;
        if let Err(error) = &result {
            self.sink.report(error);
        }
        result
    }

    async fn fetch_batch(&self, tab: FeedTab, offset: usize) -> SyncResult<Vec<FeedItem>> {
        match tab {
            FeedTab::ForYou => match &self.user_id {
                Some(user) => self.fetch_authed_items(format!("/comment/feed-{user}"), offset).await,
                None => {
                    self.fetch_anonymous_items(
                        ApiRequest::get("/comment/feed").with_query("offset", offset.to_string()),
                    )
                    .await
                }
            },
            FeedTab::Top => {
                let mut request =
                    ApiRequest::get("/comment/top").with_query("offset", offset.to_string());
                if let Some(user) = &self.user_id {
                    request = request.with_query("userId", user.clone());
                }
                self.fetch_anonymous_items(request).await
            }
            FeedTab::Following => match &self.user_id {
                Some(user) => {
                    self.fetch_following(format!("/comment/{user}/following"), user, offset)
                        .await
                }
                None => {
                    let error = SyncError::MissingUser;
                    self.sink.report(&error);
                    Err(error)
                }
            },
        }
    }

    /// Fetches a page of `{ comment, repost }` entries through the retry
    /// wrapper.
    async fn fetch_authed_items(&self, path: String, offset: usize) -> SyncResult<Vec<FeedItem>> {
        let user = self.user_id.clone().ok_or(SyncError::MissingUser)?;
        let transport = Arc::clone(&self.transport);
        let offset = offset.to_string();
        self.auth
            .execute(&user, None, |credential| {
                let transport = Arc::clone(&transport);
                let request = ApiRequest::get(path.clone())
                    .with_query("offset", offset.clone())
                    .with_credential(credential);
                async move {
                    let response = transport.request(request).await?.require_success()?;
                    let wires: Vec<FeedItemWire> = response.decode()?;
                    Ok(wire::normalize_feed_items(wires))
                }
            })
            .await
    }

    /// Fetches a page of bare comments from the following endpoint.
    async fn fetch_following(
        &self,
        path: String,
        user: &str,
        offset: usize,
    ) -> SyncResult<Vec<FeedItem>> {
        let transport = Arc::clone(&self.transport);
        let offset = offset.to_string();
        self.auth
            .execute(user, None, |credential| {
                let transport = Arc::clone(&transport);
                let request = ApiRequest::get(path.clone())
                    .with_query("offset", offset.clone())
                    .with_credential(credential);
                async move {
                    let response = transport.request(request).await?.require_success()?;
                    let wires: Vec<CommentWire> = response.decode()?;
                    Ok(wires
                        .into_iter()
                        .map(|w| FeedItem::Comment(wire::normalize_comment(w)))
                        .collect())
                }
            })
            .await
    }

    /// Fetches a page without a credential. Failures are reported to the
    /// sink and degrade to an empty batch, so a public read shows an
    /// empty page instead of failing outright.
    async fn fetch_anonymous_items(&self, request: ApiRequest) -> SyncResult<Vec<FeedItem>> {
        let result = async {
            let response = self.transport.request(request).await?.require_success()?;
            let wires: Vec<FeedItemWire> = response.decode()?;
            Ok(wire::normalize_feed_items(wires))
        }
        .await;
        match result {
            Ok(items) => Ok(items),
            Err(error) => {
                self.sink.report(&error);
                Ok(Vec::new())
            }
        }
    }
}
