//! HTTP plumbing behind a narrow, mockable trait.
//!
//! The platform clients only ever need "send this GET/POST and give me a
//! status and a body". [`Transport`] captures exactly that, so the stat
//! fetchers can be exercised against canned responses, and
//! [`HttpClientTransport`] adapts any [`http_client::HttpClient`] to it with
//! a fixed per-call timeout.

use crate::{Result, StatsError};
use async_trait::async_trait;
use http_client::{HttpClient, Request};
use http_types::{Method, Url};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// A request as the platform clients describe it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn post(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Post,
            url: url.into(),
            headers: Vec::new(),
            body: Some(body.into()),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends a single request and returns the raw status and body.
///
/// Implementations own timeouts; callers own status interpretation.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// [`Transport`] over any [`HttpClient`] implementation.
#[derive(Clone)]
pub struct HttpClientTransport {
    client: Arc<dyn HttpClient + Send + Sync>,
    timeout: Duration,
}

impl HttpClientTransport {
    pub fn new(client: Box<dyn HttpClient + Send + Sync>, timeout: Duration) -> Self {
        Self {
            client: Arc::from(client),
            timeout,
        }
    }

    /// Transport over the platform's native (curl) client.
    #[cfg(feature = "curl")]
    pub fn native(timeout: Duration) -> Self {
        Self::new(Box::new(http_client::native::NativeClient::new()), timeout)
    }
}

#[async_trait]
impl Transport for HttpClientTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let url = request
            .url
            .parse::<Url>()
            .map_err(|e| StatsError::Http(format!("Invalid URL {}: {e}", redact(&request.url))))?;
        let method = match request.method {
            HttpMethod::Get => Method::Get,
            HttpMethod::Post => Method::Post,
        };

        let mut http_request = Request::new(method, url);
        for (name, value) in &request.headers {
            let _ = http_request.insert_header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            http_request.set_body(body);
        }

        let request_start = std::time::Instant::now();
        let send = async {
            let mut response = self
                .client
                .send(http_request)
                .await
                .map_err(|e| StatsError::Http(e.to_string()))?;
            let body = response
                .body_string()
                .await
                .map_err(|e| StatsError::Http(e.to_string()))?;
            let status: u16 = response.status().into();
            Ok::<_, StatsError>(HttpResponse { status, body })
        };

        let response = tokio::time::timeout(self.timeout, send)
            .await
            .map_err(|_| {
                StatsError::Http(format!(
                    "Request to {} timed out after {}s",
                    redact(&request.url),
                    self.timeout.as_secs()
                ))
            })??;

        log::debug!(
            "{:?} {} -> {} ({} bytes, {} ms)",
            request.method,
            redact(&request.url),
            response.status,
            response.body.len(),
            request_start.elapsed().as_millis()
        );
        Ok(response)
    }
}

static KEY_PARAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([?&]key=)[^&]*").expect("valid key redaction pattern"));

/// Replace the value of a `key=` query parameter so API keys never reach logs.
pub fn redact(url: &str) -> String {
    KEY_PARAM.replace_all(url, "${1}REDACTED").into_owned()
}

/// Send a request and return its body, treating non-2xx as an error.
pub(crate) async fn fetch_text(transport: &dyn Transport, request: HttpRequest) -> Result<String> {
    let url = redact(&request.url);
    let response = transport.send(request).await?;
    if !response.is_success() {
        return Err(StatsError::Status {
            status: response.status,
            url,
        });
    }
    Ok(response.body)
}

/// Send a request and deserialize a JSON body.
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    transport: &dyn Transport,
    request: HttpRequest,
) -> Result<T> {
    let body = fetch_text(transport, request).await?;
    serde_json::from_str(&body).map_err(|e| StatsError::Parse(e.to_string()))
}
