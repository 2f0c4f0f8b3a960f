//! Configuration for the sync engine.

use std::time::Duration;

/// Configuration for feed synchronization.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Base URL of the comment service.
    pub base_url: String,
    /// Number of items fetched (and revealed) per page.
    pub batch_size: usize,
    /// Request timeout enforced by the transport.
    pub timeout: Duration,
    /// Credential refresh/retry behavior.
    pub retry: RetryConfig,
}

impl SyncConfig {
    /// Creates a new configuration for the given service URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            batch_size: 10,
            timeout: Duration::from_secs(20),
            retry: RetryConfig::default(),
        }
    }

    /// Sets the page size.
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the retry configuration.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new("")
    }
}

/// Configuration for the credential refresh-and-retry behavior.
///
/// The budget is per logical call, never shared across in-flight calls, so
/// concurrent operations cannot consume each other's retries.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of credential refreshes per call.
    pub max_refreshes: u32,
    /// Fixed delay before retrying after a refresh, to avoid hammering the
    /// service on rapid repeated failures.
    pub refresh_delay: Duration,
}

impl RetryConfig {
    /// Creates a retry configuration with the given refresh budget.
    pub fn new(max_refreshes: u32) -> Self {
        Self {
            max_refreshes,
            refresh_delay: Duration::from_millis(300),
        }
    }

    /// Creates a configuration that never refreshes or retries.
    pub fn no_retry() -> Self {
        Self {
            max_refreshes: 0,
            refresh_delay: Duration::ZERO,
        }
    }

    /// Sets the post-refresh delay.
    pub fn with_refresh_delay(mut self, delay: Duration) -> Self {
        self.refresh_delay = delay;
        self
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::new(1)
    }
}
