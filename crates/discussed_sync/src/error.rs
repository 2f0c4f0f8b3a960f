//! Error types for the sync engine.

use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

const SERVER_FALLBACK: &str = "An error occurred on our side, we're sorry for the inconvenience.";
const CONNECT_FALLBACK: &str =
    "Unable to connect to the server. Please check your internet connection.";
const GENERIC_FALLBACK: &str = "An unexpected error occurred. Please try again.";

/// Errors that can occur while talking to the feed service.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Credential rejected or expired. Recoverable exactly once via
    /// refresh-and-retry in [`crate::AuthRetry`].
    #[error("authorization rejected: {0}")]
    Unauthorized(String),

    /// No response reached the server (connectivity, timeout).
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
        /// Whether the call timed out rather than failing to connect.
        timed_out: bool,
    },

    /// The server responded with a structured failure payload.
    #[error("server rejected the request (status {status})")]
    Business {
        /// HTTP status code.
        status: u16,
        /// Server-provided human-readable detail, when present.
        detail: Option<String>,
    },

    /// A response arrived but could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// The operation requires a user identity that is absent.
    #[error("no user identity available")]
    MissingUser,

    /// The targeted entity is not present in the active feed.
    #[error("item {0} is not present in the active feed")]
    MissingTarget(String),

    /// Any other failure.
    #[error("unexpected error: {0}")]
    Unclassified(String),
}

impl SyncError {
    /// Creates a transport error for a failed connection.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            timed_out: false,
        }
    }

    /// Creates a transport error for a timed-out call.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            timed_out: true,
        }
    }

    /// Returns true if this is an authorization failure.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, SyncError::Unauthorized(_))
    }

    /// Returns the message suitable for showing to the user.
    ///
    /// Business errors surface the server-provided detail when present;
    /// everything else falls back to a generic message.
    pub fn user_message(&self) -> String {
        match self {
            SyncError::Business { detail, .. } => detail
                .clone()
                .unwrap_or_else(|| SERVER_FALLBACK.to_string()),
            SyncError::Transport { .. } => CONNECT_FALLBACK.to_string(),
            _ => GENERIC_FALLBACK.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_classification() {
        assert!(SyncError::Unauthorized("expired".into()).is_unauthorized());
        assert!(!SyncError::transport("refused").is_unauthorized());
        assert!(!SyncError::Business {
            status: 429,
            detail: None
        }
        .is_unauthorized());
    }

    #[test]
    fn user_message_prefers_server_detail() {
        let err = SyncError::Business {
            status: 409,
            detail: Some("You already reposted this comment.".into()),
        };
        assert_eq!(err.user_message(), "You already reposted this comment.");

        let err = SyncError::Business {
            status: 500,
            detail: None,
        };
        assert_eq!(err.user_message(), SERVER_FALLBACK);
    }

    #[test]
    fn user_message_fallbacks() {
        assert_eq!(
            SyncError::timeout("deadline exceeded").user_message(),
            CONNECT_FALLBACK
        );
        assert_eq!(
            SyncError::Unclassified("boom".into()).user_message(),
            GENERIC_FALLBACK
        );
    }
}
