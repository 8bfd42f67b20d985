//! HTTP sources for the sheet viewer API.
//!
//! Both endpoints are plain `GET` requests returning JSON. Requests carry
//! no-cache headers so every fetch reaches the origin.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::header::{HeaderMap, HeaderValue, CACHE_CONTROL, PRAGMA};
use reqwest::Client;
use serde_json::Value;

use super::{DataSnapshot, FetchError, Source, StatsSnapshot};

/// Thin wrapper over a reqwest client bound to one API base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    endpoint: String,
}

impl ApiClient {
    /// Create a new builder for configuring the client.
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// Returns the base URL requests are made against.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path.trim_start_matches('/'))
    }

    /// `GET` a path and parse the body as JSON.
    async fn get_json(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, FetchError> {
        let url = self.url(path);

        let response = self.client.get(&url).query(query).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::Http(format!(
                "API returned status {}",
                response.status()
            )));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

/// Builder for [`ApiClient`].
#[derive(Debug, Default)]
pub struct ApiClientBuilder {
    endpoint: Option<String>,
    timeout: Option<Duration>,
}

impl ApiClientBuilder {
    /// Set the API base URL (e.g., "http://127.0.0.1:8000").
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the request timeout (default: 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<ApiClient, FetchError> {
        let timeout = self.timeout.unwrap_or(Duration::from_secs(10));

        let mut headers = HeaderMap::new();
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache, no-store"));
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        let endpoint = self
            .endpoint
            .unwrap_or_else(|| "http://127.0.0.1:8000".to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(ApiClient { client, endpoint })
    }
}

/// Optional filters for `/api/data`, forwarded verbatim to the server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataQuery {
    /// Free-text search. Trimmed; empty means no filter.
    pub search: String,
    /// Column to restrict the search to. Empty means all columns.
    pub column: String,
}

impl DataQuery {
    /// Query parameters to send; empty filters are omitted.
    pub fn params(&self) -> Vec<(&'static str, &str)> {
        let mut params = Vec::new();
        let search = self.search.trim();
        if !search.is_empty() {
            params.push(("search", search));
        }
        if !self.column.is_empty() {
            params.push(("column", self.column.as_str()));
        }
        params
    }

    pub fn is_empty(&self) -> bool {
        self.params().is_empty()
    }
}

/// Shared, mutable filter state for a [`TableSource`].
///
/// The UI edits the query; the source reads it on every fetch.
#[derive(Debug, Clone, Default)]
pub struct QueryHandle(Arc<RwLock<DataQuery>>);

impl QueryHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current query.
    pub fn get(&self) -> DataQuery {
        self.0.read().clone()
    }

    pub fn set_search(&self, search: impl Into<String>) {
        self.0.write().search = search.into();
    }

    pub fn set_column(&self, column: impl Into<String>) {
        self.0.write().column = column.into();
    }

    /// Drop both filters.
    pub fn clear(&self) {
        *self.0.write() = DataQuery::default();
    }
}

/// Source for `GET /api/data`.
#[derive(Debug)]
pub struct TableSource {
    client: ApiClient,
    path: String,
    query: QueryHandle,
    description: String,
}

impl TableSource {
    /// Create a source for the given path with an empty query.
    pub fn new(client: ApiClient, path: impl Into<String>) -> Self {
        Self::with_query(client, path, QueryHandle::new())
    }

    /// Create a source whose filters are driven by an existing handle.
    pub fn with_query(client: ApiClient, path: impl Into<String>, query: QueryHandle) -> Self {
        let path = path.into();
        let description = client.url(&path);
        Self {
            client,
            path,
            query,
            description,
        }
    }

    /// Handle to edit this source's filters.
    pub fn query(&self) -> &QueryHandle {
        &self.query
    }
}

#[async_trait]
impl Source for TableSource {
    type Snapshot = DataSnapshot;

    async fn fetch(&self) -> Result<DataSnapshot, FetchError> {
        let query = self.query.get();
        let body = self.client.get_json(&self.path, &query.params()).await?;
        Ok(serde_json::from_value(body)?)
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Source for `GET /api/stats`.
#[derive(Debug)]
pub struct StatsSource {
    client: ApiClient,
    path: String,
    description: String,
}

impl StatsSource {
    pub fn new(client: ApiClient, path: impl Into<String>) -> Self {
        let path = path.into();
        let description = client.url(&path);
        Self {
            client,
            path,
            description,
        }
    }
}

#[async_trait]
impl Source for StatsSource {
    type Snapshot = StatsSnapshot;

    async fn fetch(&self) -> Result<StatsSnapshot, FetchError> {
        let body = self.client.get_json(&self.path, &[]).await?;
        Ok(StatsSnapshot::from_envelope(body)?)
    }

    fn description(&self) -> &str {
        &self.description
    }
}
