//! REST client for the hosted content store
//!
//! Speaks the PostgREST dialect exposed by the hosted backend under
//! `/rest/v1`. Every request carries the public API key; requests made
//! through `as_user` additionally carry the signed-in user's access token so
//! the service's row-level policies see an authenticated caller.

use async_trait::async_trait;
use reqwest::{header, Client, Response};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::query::Query;
use super::ContentStore;
use crate::types::{FolioError, Result};

/// Connection settings for the hosted store
#[derive(Debug, Clone)]
pub struct RestStoreConfig {
    /// Service base URL, without the `/rest/v1` suffix
    pub base_url: String,
    /// Public (anon) API key
    pub anon_key: String,
    /// Per-request timeout
    pub timeout: Duration,
}

/// PostgREST-backed content store
#[derive(Clone)]
pub struct RestStore {
    config: Arc<RestStoreConfig>,
    client: Client,
    access_token: Option<String>,
}

impl RestStore {
    /// Create a new store client
    pub fn new(config: RestStoreConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| FolioError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config: Arc::new(config),
            client,
            access_token: None,
        })
    }

    fn table_url(&self, collection: &str) -> String {
        format!(
            "{}/rest/v1/{}",
            self.config.base_url.trim_end_matches('/'),
            collection
        )
    }

    fn rpc_url(&self, procedure: &str) -> String {
        format!(
            "{}/rest/v1/rpc/{}",
            self.config.base_url.trim_end_matches('/'),
            procedure
        )
    }

    fn bearer(&self) -> String {
        let token = self.access_token.as_deref().unwrap_or(&self.config.anon_key);
        format!("Bearer {}", token)
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.config.anon_key)
            .header(header::AUTHORIZATION, self.bearer())
    }

    async fn handle_response(&self, response: Response) -> Result<Value> {
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|v| v.get("message").and_then(Value::as_str).map(String::from))
                .unwrap_or(text);
            return Err(FolioError::Store(format!("{}: {}", status.as_u16(), message)));
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text)
            .map_err(|e| FolioError::Store(format!("Invalid response body: {}", e)))
    }

    async fn handle_rows(&self, response: Response) -> Result<Vec<Value>> {
        match self.handle_response(response).await? {
            Value::Array(rows) => Ok(rows),
            Value::Null => Ok(Vec::new()),
            other => Ok(vec![other]),
        }
    }
}

#[async_trait]
impl ContentStore for RestStore {
    async fn select(&self, collection: &str, query: &Query) -> Result<Vec<Value>> {
        let url = self.table_url(collection);
        debug!("GET {} {:?}", url, query);

        let response = self
            .request(reqwest::Method::GET, &url)
            .query(&query.to_params())
            .send()
            .await?;

        self.handle_rows(response).await
    }

    async fn insert(&self, collection: &str, rows: Vec<Value>) -> Result<Vec<Value>> {
        let url = self.table_url(collection);

        let response = self
            .request(reqwest::Method::POST, &url)
            .header("Prefer", "return=representation")
            .json(&rows)
            .send()
            .await?;

        self.handle_rows(response).await
    }

    async fn update(&self, collection: &str, id: &str, patch: Value) -> Result<Vec<Value>> {
        let url = self.table_url(collection);

        let response = self
            .request(reqwest::Method::PATCH, &url)
            .header("Prefer", "return=representation")
            .query(&[("id", format!("eq.{}", id))])
            .json(&patch)
            .send()
            .await?;

        self.handle_rows(response).await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        let url = self.table_url(collection);

        let response = self
            .request(reqwest::Method::DELETE, &url)
            .query(&[("id", format!("eq.{}", id))])
            .send()
            .await?;

        self.handle_response(response).await.map(|_| ())
    }

    async fn upsert(&self, collection: &str, row: Value) -> Result<Value> {
        let url = self.table_url(collection);

        let response = self
            .request(reqwest::Method::POST, &url)
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(&vec![row])
            .send()
            .await?;

        self.handle_rows(response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| FolioError::Store(format!("Upsert into {} returned no row", collection)))
    }

    async fn rpc(&self, procedure: &str, args: Value) -> Result<Value> {
        let url = self.rpc_url(procedure);

        let response = self
            .request(reqwest::Method::POST, &url)
            .json(&args)
            .send()
            .await?;

        self.handle_response(response).await
    }

    fn as_user(&self, access_token: &str) -> Arc<dyn ContentStore> {
        Arc::new(Self {
            config: Arc::clone(&self.config),
            client: self.client.clone(),
            access_token: Some(access_token.to_string()),
        })
    }
}
