//! Credential acquisition and the authenticated retry wrapper.

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

use crate::config::RetryConfig;
use crate::error::{SyncError, SyncResult};

/// Supplies a currently valid bearer credential for a user.
///
/// Invoked fresh on every explicit refresh request; the engine assumes no
/// caching contract beyond "last obtained value or none". Obtaining may
/// itself perform network I/O.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Obtains a credential for the given user, or `None` when the user
    /// has no valid session.
    async fn obtain(&self, user_id: &str) -> SyncResult<Option<String>>;
}

/// Fire-and-forget diagnostic sink.
///
/// Reporting never fails and never affects control flow; every terminal
/// error passes through here exactly once before reaching the caller.
pub trait ErrorSink: Send + Sync {
    /// Records a terminal error.
    fn report(&self, error: &SyncError);
}

/// Default sink that logs through `tracing`.
#[derive(Debug, Default)]
pub struct TracingSink;

impl ErrorSink for TracingSink {
    fn report(&self, error: &SyncError) {
        tracing::warn!(%error, user_message = %error.user_message(), "sync operation failed");
    }
}

/// Provider returning a fixed credential.
///
/// Useful in tests and for sessions where the credential is issued out of
/// band and never expires during the process lifetime.
#[derive(Debug, Default)]
pub struct StaticProvider {
    credential: Option<String>,
}

impl StaticProvider {
    /// Creates a provider that always hands out the given credential.
    pub fn new(credential: impl Into<String>) -> Self {
        Self {
            credential: Some(credential.into()),
        }
    }

    /// Creates a provider with no credential.
    pub fn none() -> Self {
        Self { credential: None }
    }
}

#[async_trait]
impl CredentialProvider for StaticProvider {
    async fn obtain(&self, _user_id: &str) -> SyncResult<Option<String>> {
        Ok(self.credential.clone())
    }
}

/// Executes units of work that need a bearer credential, retrying once
/// after a credential refresh when the work fails with an authorization
/// error.
///
/// The refresh budget is allocated per call to [`AuthRetry::execute`],
/// never shared across in-flight calls. At most two physical attempts are
/// made, and the second always uses a freshly obtained credential.
pub struct AuthRetry<P> {
    provider: Arc<P>,
    sink: Arc<dyn ErrorSink>,
    retry: RetryConfig,
}

impl<P: CredentialProvider> AuthRetry<P> {
    /// Creates a retry wrapper around the given provider.
    pub fn new(provider: Arc<P>, sink: Arc<dyn ErrorSink>, retry: RetryConfig) -> Self {
        Self {
            provider,
            sink,
            retry,
        }
    }

    /// Returns the error sink shared with this wrapper.
    pub fn sink(&self) -> Arc<dyn ErrorSink> {
        Arc::clone(&self.sink)
    }

    /// Runs `work` with a credential, refreshing and retrying once on an
    /// authorization failure.
    ///
    /// When `existing` is `None` a credential is obtained before the first
    /// attempt. Terminal errors are routed through the sink and then
    /// propagated unchanged.
    pub async fn execute<T, F, Fut>(
        &self,
        user_id: &str,
        existing: Option<String>,
        work: F,
    ) -> SyncResult<T>
    where
        F: Fn(Option<String>) -> Fut,
        Fut: Future<Output = SyncResult<T>>,
    {
        let mut credential = match existing {
            Some(credential) => Some(credential),
            None => self.obtain(user_id).await?,
        };

        // The budget lives on this call's stack, not in shared state.
        let mut refreshes = 0u32;
        loop {
            match work(credential.clone()).await {
                Ok(value) => return Ok(value),
                Err(error) if error.is_unauthorized() && refreshes < self.retry.max_refreshes => {
                    refreshes += 1;
                    tracing::debug!(user_id, refreshes, "credential rejected, refreshing");
                    // Forced refresh: the failed credential is never reused.
                    credential = self.obtain(user_id).await?;
                    tokio::time::sleep(self.retry.refresh_delay).await;
                }
                Err(error) => {
                    self.sink.report(&error);
                    return Err(error);
                }
            }
        }
    }

    async fn obtain(&self, user_id: &str) -> SyncResult<Option<String>> {
        match self.provider.obtain(user_id).await {
            Ok(credential) => Ok(credential),
            Err(error) => {
                self.sink.report(&error);
                Err(error)
            }
        }
    }
}
