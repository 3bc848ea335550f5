//! Resource layer: bearer decoration of outgoing requests and the
//! authenticated API client for domain records.

pub mod http_client;

pub use http_client::{HttpClient, HttpResponse, MockHttpClient, ReqwestHttpClient};

use std::collections::HashMap;
use std::sync::Arc;

use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ResourceError;
use crate::session::SessionStore;

/// Name of the header carrying the bearer credential
pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// Attaches the current session's bearer credential to outgoing request
/// headers.
///
/// Reads a store snapshot synchronously: during the bootstrap window the
/// request goes out unauthenticated rather than stalling. The caller's
/// header map is never mutated; a new map is returned.
#[derive(Clone)]
pub struct AuthHeaderDecorator {
    store: SessionStore,
}

impl AuthHeaderDecorator {
    /// Create a decorator reading from the given store
    pub fn new(store: SessionStore) -> Self {
        Self { store }
    }

    /// Return a copy of `base` with the bearer header attached when a
    /// session exists, or an equal copy when none does.
    pub fn decorate(&self, base: &HashMap<String, String>) -> HashMap<String, String> {
        let mut headers = base.clone();
        if let Some(session) = self.store.snapshot().session {
            headers.insert(
                AUTHORIZATION_HEADER.to_string(),
                format!("Bearer {}", session.access_token),
            );
        }
        headers
    }
}

/// Listing filter for graph queries.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    /// Free-text search filter
    pub search: Option<String>,
    /// Page size
    pub limit: Option<u32>,
    /// Page offset
    pub offset: Option<u32>,
}

impl ListQuery {
    fn apply(&self, url: &mut Url) {
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(search) = &self.search {
                pairs.append_pair("search", search);
            }
            if let Some(limit) = self.limit {
                pairs.append_pair("limit", &limit.to_string());
            }
            if let Some(offset) = self.offset {
                pairs.append_pair("offset", &offset.to_string());
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }
    }
}

/// Summary record for a graph owned by or visible to the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphSummary {
    /// Record identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Free-form description
    pub description: String,
    /// User-assigned tags
    pub tags: Vec<String>,
    /// Creation timestamp as reported by the server
    pub created_at: String,
}

/// A publicly shared graph, carrying owner attribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicGraphSummary {
    /// The shared graph
    #[serde(flatten)]
    pub graph: GraphSummary,
    /// Owner display name, if shared
    pub owner_name: Option<String>,
    /// Owner email, if shared
    pub owner_email: Option<String>,
}

/// Authenticated client for the domain-record API. Every request passes
/// through the decorator, so it carries a bearer credential exactly when a
/// session exists.
pub struct ResourceClient {
    http: Arc<dyn HttpClient>,
    base_url: String,
    decorator: AuthHeaderDecorator,
}

impl ResourceClient {
    /// Create a client for the API at `base_url`, authenticated from `store`
    pub fn new(http: Arc<dyn HttpClient>, base_url: impl Into<String>, store: SessionStore) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            decorator: AuthHeaderDecorator::new(store),
        }
    }

    /// List graphs belonging to the current user
    pub async fn list_my_graphs(
        &self,
        query: &ListQuery,
    ) -> Result<Vec<GraphSummary>, ResourceError> {
        self.get_json("/graphs/", query).await
    }

    /// List publicly shared graphs
    pub async fn list_public_graphs(
        &self,
        query: &ListQuery,
    ) -> Result<Vec<PublicGraphSummary>, ResourceError> {
        self.get_json("/sharing/public", query).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &ListQuery,
    ) -> Result<T, ResourceError> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| ResourceError::Transport(anyhow::anyhow!(e)))?;
        query.apply(&mut url);

        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        let headers = self.decorator.decorate(&headers);

        debug!(url = %url, "resource request");
        let response = self
            .http
            .get(url.as_str(), headers)
            .await
            .map_err(ResourceError::Transport)?;

        if !response.is_success() {
            return Err(ResourceError::Status {
                status: response.status.as_u16(),
            });
        }

        Ok(response.json()?)
    }
}
