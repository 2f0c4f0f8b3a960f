//! # Discussed Sync
//!
//! Client-side synchronization core for the Discussed social feed.
//!
//! This crate provides:
//! - Authenticated retry wrapper (refresh the credential and retry once)
//! - Optimistic interaction reconciler (like, repost, reply with rollback)
//! - Feed pagination and deduplication engine (per-tab cursors, merge on id)
//! - HTTP transport abstraction with a scripted mock for tests
//!
//! ## Architecture
//!
//! The engine holds an in-memory [`FeedStore`] per session:
//! 1. Fetches land as raw wire payloads and are normalized by
//!    `discussed_model` before touching the store
//! 2. Every stored list is deduplicated by id; a fetched entry wins over
//!    an accumulated one
//! 3. Mutations apply optimistically and roll back wholesale when the
//!    server rejects the command
//!
//! ## Key Invariants
//!
//! - The server is authoritative; local state is a cache plus optimism
//! - A rejected credential triggers at most one refresh per logical call
//! - The credential travels per request, never as shared client state
//! - A reset tab silently discards responses from superseded fetches

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod auth;
mod config;
mod error;
mod feed;
mod http;
mod reconciler;
mod transport;

pub use auth::{AuthRetry, CredentialProvider, ErrorSink, StaticProvider, TracingSink};
pub use config::{RetryConfig, SyncConfig};
pub use error::{SyncError, SyncResult};
pub use feed::{FeedCursor, FeedEngine, FeedStore, FeedTab};
pub use http::HttpTransport;
pub use reconciler::{Reconciler, ReconcilerConfig};
pub use transport::{ApiRequest, ApiResponse, Method, MockTransport, Transport};
