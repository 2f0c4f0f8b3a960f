//! HTTP transport implementation backed by reqwest.

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::transport::{ApiRequest, ApiResponse, Method, Transport};

/// Problem-details failure payload (`type`/`title`/`status`/`detail`).
#[derive(Debug, Deserialize)]
struct ProblemWire {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

/// Transport that talks to the comment service over HTTP.
///
/// Enforces the configured timeout on every call and classifies outcomes
/// into the [`SyncError`] taxonomy: 401 becomes `Unauthorized`, connection
/// and timeout failures become `Transport`, any other non-2xx becomes
/// `Business` carrying the server's problem-details message when present.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Creates a transport for the configured service.
    pub fn new(config: &SyncConfig) -> SyncResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SyncError::transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base, path.trim_start_matches('/'))
}

/// Classifies a non-2xx status into the error taxonomy.
fn error_for_status(status: u16, body: &serde_json::Value) -> SyncError {
    let problem: Option<ProblemWire> = serde_json::from_value(body.clone()).ok();
    let detail = problem.and_then(|p| p.detail.or(p.title));
    if status == 401 {
        return SyncError::Unauthorized(detail.unwrap_or_else(|| "credential rejected".into()));
    }
    SyncError::Business { status, detail }
}

fn classify_send_error(error: reqwest::Error) -> SyncError {
    if error.is_timeout() {
        SyncError::timeout(error.to_string())
    } else {
        SyncError::transport(error.to_string())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(&self, request: ApiRequest) -> SyncResult<ApiResponse> {
        let url = join_url(&self.base_url, &request.path);
        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Patch => self.client.patch(&url),
        };
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(credential) = &request.credential {
            builder = builder.bearer_auth(credential);
        }

        let response = builder.send().await.map_err(classify_send_error)?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await.map_err(classify_send_error)?;
        let data = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
        };

        if !(200..300).contains(&status) {
            tracing::debug!(status, path = %request.path, "request rejected");
            return Err(error_for_status(status, &data));
        }

        if !bytes.is_empty() && data.is_null() && bytes.as_ref() != b"null" {
            return Err(SyncError::Decode(format!(
                "response from {} is not valid JSON",
                request.path
            )));
        }

        Ok(ApiResponse::new(status, data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joining_normalizes_slashes() {
        assert_eq!(
            join_url("https://api.example.com", "/comment/feed"),
            "https://api.example.com/comment/feed"
        );
        assert_eq!(
            join_url("https://api.example.com", "comment/top"),
            "https://api.example.com/comment/top"
        );
    }

    #[test]
    fn status_401_becomes_unauthorized() {
        let err = error_for_status(401, &serde_json::json!({ "detail": "token expired" }));
        assert!(err.is_unauthorized());
        assert_eq!(err.user_message(), "An unexpected error occurred. Please try again.");
    }

    #[test]
    fn other_statuses_become_business_with_detail() {
        let err = error_for_status(
            429,
            &serde_json::json!({ "title": "Rate limited", "status": 429 }),
        );
        match err {
            SyncError::Business { status, detail } => {
                assert_eq!(status, 429);
                assert_eq!(detail.as_deref(), Some("Rate limited"));
            }
            other => panic!("unexpected classification: {other:?}"),
        }

        let err = error_for_status(500, &serde_json::Value::Null);
        assert!(matches!(err, SyncError::Business { status: 500, detail: None }));
    }

    #[test]
    fn detail_is_preferred_over_title() {
        let err = error_for_status(
            400,
            &serde_json::json!({ "title": "Bad Request", "detail": "content is empty" }),
        );
        match err {
            SyncError::Business { detail, .. } => {
                assert_eq!(detail.as_deref(), Some("content is empty"));
            }
            other => panic!("unexpected classification: {other:?}"),
        }
    }
}
