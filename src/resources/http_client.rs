//! HTTP client seam for the resource layer, mockable for tests.

use std::collections::HashMap;
use std::fmt::Debug;
use std::str::FromStr;

use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;

/// Minimal response view the resource layer needs.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response body as text
    pub body: String,
}

impl HttpResponse {
    /// Parse the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }

    /// Whether the status is in the 2xx range
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Abstraction over outgoing HTTP so the resource client can be exercised
/// without a network.
#[async_trait]
pub trait HttpClient: Send + Sync + Debug {
    /// Send a request with the given method, URL, headers, and body
    async fn request(
        &self,
        method: &str,
        url: &str,
        headers: HashMap<String, String>,
        body: Option<String>,
    ) -> Result<HttpResponse>;

    /// Send a GET request
    async fn get(&self, url: &str, headers: HashMap<String, String>) -> Result<HttpResponse> {
        self.request("GET", url, headers, None).await
    }

    /// Send a POST request
    async fn post(
        &self,
        url: &str,
        headers: HashMap<String, String>,
        body: Option<String>,
    ) -> Result<HttpResponse> {
        self.request("POST", url, headers, body).await
    }
}

/// Production implementation backed by reqwest.
#[derive(Debug, Clone, Default)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    /// Create a client with reqwest defaults
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn request(
        &self,
        method: &str,
        url: &str,
        headers: HashMap<String, String>,
        body: Option<String>,
    ) -> Result<HttpResponse> {
        let method = Method::from_str(method.to_uppercase().as_str())?;
        let mut request_builder = self.client.request(method, url);

        let mut header_map = HeaderMap::new();
        for (key, value) in headers {
            let name = HeaderName::from_str(&key)?;
            let value = HeaderValue::from_str(&value)?;
            header_map.insert(name, value);
        }
        request_builder = request_builder.headers(header_map);

        if let Some(body) = body {
            request_builder = request_builder.body(body);
        }

        let response = request_builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        Ok(HttpResponse { status, body })
    }
}

/// What the mock saw for a URL, for assertions on decoration.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Request method
    pub method: String,
    /// Headers exactly as handed to the client
    pub headers: HashMap<String, String>,
}

/// Mock client: canned responses keyed by full URL, with request capture.
#[derive(Debug, Clone, Default)]
pub struct MockHttpClient {
    responses: std::sync::Arc<DashMap<String, HttpResponse>>,
    requests: std::sync::Arc<DashMap<String, RecordedRequest>>,
}

impl MockHttpClient {
    /// Create an empty mock
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a canned response for a URL
    pub fn add_response(&self, url: &str, status: StatusCode, body: impl Into<String>) {
        self.responses.insert(
            url.to_string(),
            HttpResponse {
                status,
                body: body.into(),
            },
        );
    }

    /// Register a canned JSON response for a URL
    pub fn add_json_response<T: serde::Serialize>(
        &self,
        url: &str,
        status: StatusCode,
        data: &T,
    ) -> Result<()> {
        self.add_response(url, status, serde_json::to_string(data)?);
        Ok(())
    }

    /// The last request the mock saw for a URL
    pub fn recorded_request(&self, url: &str) -> Option<RecordedRequest> {
        self.requests.get(url).map(|r| r.value().clone())
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn request(
        &self,
        method: &str,
        url: &str,
        headers: HashMap<String, String>,
        _body: Option<String>,
    ) -> Result<HttpResponse> {
        self.requests.insert(
            url.to_string(),
            RecordedRequest {
                method: method.to_string(),
                headers,
            },
        );
        match self.responses.get(url) {
            Some(response) => Ok(response.value().clone()),
            None => Err(anyhow::anyhow!("no mock response for URL: {}", url)),
        }
    }
}
