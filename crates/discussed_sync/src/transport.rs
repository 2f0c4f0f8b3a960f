//! Transport layer abstraction.
//!
//! A [`Transport`] performs one HTTP-shaped request and returns a typed
//! response or a classified [`SyncError`]. The credential travels as an
//! explicit per-request field rather than a shared mutable default header,
//! so a refresh triggered by one in-flight call can never leak into
//! another call's headers.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use std::collections::VecDeque;

use crate::error::{SyncError, SyncResult};

/// HTTP method of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET.
    Get,
    /// POST.
    Post,
    /// PATCH.
    Patch,
}

/// One HTTP-shaped request.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// Method.
    pub method: Method,
    /// Path relative to the configured base URL.
    pub path: String,
    /// Query parameters.
    pub query: Vec<(String, String)>,
    /// JSON body, for POST/PATCH.
    pub body: Option<serde_json::Value>,
    /// Bearer credential attached to this call only.
    pub credential: Option<String>,
}

impl ApiRequest {
    /// Creates a GET request.
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            query: Vec::new(),
            body: None,
            credential: None,
        }
    }

    /// Creates a POST request with a JSON body.
    pub fn post(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            query: Vec::new(),
            body: Some(body),
            credential: None,
        }
    }

    /// Creates a PATCH request with a JSON body.
    pub fn patch(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: Method::Patch,
            path: path.into(),
            query: Vec::new(),
            body: Some(body),
            credential: None,
        }
    }

    /// Appends a query parameter.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Attaches a bearer credential to this request.
    pub fn with_credential(mut self, credential: Option<String>) -> Self {
        self.credential = credential;
        self
    }
}

/// A successful response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Decoded JSON body; `Null` for empty bodies.
    pub data: serde_json::Value,
}

impl ApiResponse {
    /// Creates a response.
    pub fn new(status: u16, data: serde_json::Value) -> Self {
        Self { status, data }
    }

    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decodes the body into a typed value.
    pub fn decode<T: DeserializeOwned>(&self) -> SyncResult<T> {
        serde_json::from_value(self.data.clone()).map_err(|e| SyncError::Decode(e.to_string()))
    }

    /// Maps a non-2xx response to a business error.
    ///
    /// Any result that is not exactly success is treated as a failure by
    /// the callers, regardless of how the transport classified it.
    pub fn require_success(self) -> SyncResult<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(SyncError::Business {
                status: self.status,
                detail: None,
            })
        }
    }
}

/// Performs one request against the remote feed service.
///
/// Implementations classify failures into the [`SyncError`] taxonomy;
/// in particular a rejected credential must surface as
/// [`SyncError::Unauthorized`] so the retry wrapper can recover it.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends the request and returns the typed response.
    async fn request(&self, request: ApiRequest) -> SyncResult<ApiResponse>;
}

/// A scripted transport for testing.
///
/// Responses are consumed first-in first-out regardless of path; every
/// request is recorded for later assertions.
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<SyncResult<ApiResponse>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl MockTransport {
    /// Creates an empty mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts a successful response.
    pub fn push_ok(&self, status: u16, data: serde_json::Value) {
        self.responses
            .lock()
            .push_back(Ok(ApiResponse::new(status, data)));
    }

    /// Scripts a failure.
    pub fn push_err(&self, error: SyncError) {
        self.responses.lock().push_back(Err(error));
    }

    /// Returns all requests seen so far.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }

    /// Returns the number of requests seen so far.
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn request(&self, request: ApiRequest) -> SyncResult<ApiResponse> {
        self.requests.lock().push(request);
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(SyncError::Unclassified("no scripted response".into())))
    }
}
