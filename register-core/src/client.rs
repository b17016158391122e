//! Outbound transport for the registration call.
//!
//! The form never talks to reqwest directly: it goes through
//! [`RegistrationClient`], so the validation and gating logic can be
//! exercised against [`MockRegistrationClient`] without a network.
//!
//! Clients hold no cookies of their own. One client serves every visitor,
//! so the caller passes the visitor's `Cookie` header in [`PostOptions`]
//! and receives the `Set-Cookie` values back with the result.

use crate::error::TransportError;
use crate::observability::inject_trace_context;
use async_trait::async_trait;
use reqwest::header::{COOKIE, HeaderMap, SET_COOKIE};
use reqwest::{Client, Url};
use serde_json::Value;
use std::sync::Mutex;

/// Per-request options for [`RegistrationClient::post`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostOptions {
    pub headers: Vec<(String, String)>,
    /// Send `cookie` with the request and hand back any cookies the server sets.
    pub with_credentials: bool,
    /// `Cookie` header value belonging to the submitting visitor.
    pub cookie: Option<String>,
}

impl PostOptions {
    /// `Content-Type: application/json` with credentials included.
    pub fn json_with_credentials() -> Self {
        Self {
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            with_credentials: true,
            cookie: None,
        }
    }
}

/// A 2xx response. The body is kept only when it parses as JSON.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientResponse {
    pub status: u16,
    pub body: Option<Value>,
    /// Raw `Set-Cookie` values; empty unless credentials were requested.
    pub set_cookies: Vec<String>,
}

#[async_trait]
pub trait RegistrationClient: Send + Sync {
    /// POST `body` as JSON to `path`, relative to the client's base URL.
    ///
    /// Non-2xx responses are returned as a [`TransportError`] carrying the
    /// status code.
    async fn post(
        &self,
        path: &str,
        body: &Value,
        options: &PostOptions,
    ) -> Result<ClientResponse, TransportError>;
}

/// reqwest-backed client, shared by every visitor.
pub struct HttpRegistrationClient {
    client: Client,
    base_url: String,
}

impl HttpRegistrationClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, TransportError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Url::parse(&base_url).map_err(|e| {
            TransportError::network(format!("Invalid registration base URL {}: {}", base_url, e))
        })?;

        Ok(Self {
            client: Client::new(),
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, path: &str) -> Result<Url, TransportError> {
        let raw = format!("{}{}", self.base_url, path);
        Url::parse(&raw).map_err(|e| TransportError::network(format!("Invalid URL {}: {}", raw, e)))
    }
}

#[async_trait]
impl RegistrationClient for HttpRegistrationClient {
    async fn post(
        &self,
        path: &str,
        body: &Value,
        options: &PostOptions,
    ) -> Result<ClientResponse, TransportError> {
        let url = self.url_for(path)?;

        let mut headers = HeaderMap::new();
        inject_trace_context(&mut headers);

        let mut request = self.client.post(url.clone()).headers(headers);
        for (name, value) in &options.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if options.with_credentials
            && let Some(cookie) = &options.cookie
        {
            request = request.header(COOKIE, cookie.as_str());
        }

        let response = request.json(body).send().await.map_err(|e| {
            tracing::warn!("Failed to send POST request to {}: {}", url, e);
            TransportError {
                status: e.status().map(|s| s.as_u16()),
                message: e.to_string(),
                set_cookies: Vec::new(),
            }
        })?;

        let set_cookies: Vec<String> = if options.with_credentials {
            response
                .headers()
                .get_all(SET_COOKIE)
                .iter()
                .filter_map(|v| v.to_str().ok())
                .map(|v| v.to_string())
                .collect()
        } else {
            Vec::new()
        };

        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| {
            tracing::warn!("Failed to read response body from {}: {}", url, e);
            TransportError {
                status: Some(status.as_u16()),
                message: e.to_string(),
                set_cookies: set_cookies.clone(),
            }
        })?;

        if !status.is_success() {
            return Err(TransportError::http(
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unexpected status"),
            )
            .with_set_cookies(set_cookies));
        }

        let body = if bytes.is_empty() {
            None
        } else {
            serde_json::from_slice(&bytes).ok()
        };

        Ok(ClientResponse {
            status: status.as_u16(),
            body,
            set_cookies,
        })
    }
}

/// A request captured by [`MockRegistrationClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub path: String,
    pub body: Value,
    pub options: PostOptions,
}

/// Records every call and answers with a scripted outcome.
pub struct MockRegistrationClient {
    requests: Mutex<Vec<RecordedRequest>>,
    outcome: Mutex<Result<ClientResponse, TransportError>>,
}

impl Default for MockRegistrationClient {
    fn default() -> Self {
        Self::succeeding()
    }
}

impl MockRegistrationClient {
    /// Answers every request with `201 Created` and an empty body.
    pub fn succeeding() -> Self {
        Self::with_outcome(Ok(ClientResponse {
            status: 201,
            ..ClientResponse::default()
        }))
    }

    pub fn failing_with_status(status: u16) -> Self {
        Self::with_outcome(Err(TransportError::http(status, "mock rejection")))
    }

    pub fn failing_network() -> Self {
        Self::with_outcome(Err(TransportError::network("mock network failure")))
    }

    pub fn with_outcome(outcome: Result<ClientResponse, TransportError>) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            outcome: Mutex::new(outcome),
        }
    }

    /// Replace the scripted outcome for subsequent requests.
    pub fn set_outcome(&self, outcome: Result<ClientResponse, TransportError>) {
        if let Ok(mut current) = self.outcome.lock() {
            *current = outcome;
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or_default()
    }
}

#[async_trait]
impl RegistrationClient for MockRegistrationClient {
    async fn post(
        &self,
        path: &str,
        body: &Value,
        options: &PostOptions,
    ) -> Result<ClientResponse, TransportError> {
        self.requests
            .lock()
            .map_err(|e| TransportError::network(format!("Mock client mutex poisoned: {}", e)))?
            .push(RecordedRequest {
                path: path.to_string(),
                body: body.clone(),
                options: options.clone(),
            });

        self.outcome
            .lock()
            .map_err(|e| TransportError::network(format!("Mock client mutex poisoned: {}", e)))?
            .clone()
    }
}
