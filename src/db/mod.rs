//! Content store client
//!
//! All persistence lives in a hosted backend. This module is the boundary to
//! it: a `ContentStore` trait over table-like collections, a REST client that
//! speaks the hosted service's PostgREST dialect, and an in-memory store used
//! in dev mode and tests.

pub mod memory;
pub mod query;
pub mod rest;
pub mod schemas;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::types::{FolioError, Result};

pub use memory::{MemoryStore, StoreOp};
pub use query::{Filter, Order, Query};
pub use rest::{RestStore, RestStoreConfig};

/// Stored procedure bumping a research article's view counter
pub const INCREMENT_RESEARCH_VIEWS: &str = "increment_research_views";

/// Stored procedure bumping a research article's download counter
pub const INCREMENT_RESEARCH_DOWNLOADS: &str = "increment_research_downloads";

/// Remote queryable store
///
/// Rows cross this boundary as JSON objects. `update` has patch semantics at
/// this level (only the given columns change); callers that want full-row
/// replacement send every editable column.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Select rows matching the query
    async fn select(&self, collection: &str, query: &Query) -> Result<Vec<Value>>;

    /// Insert rows, returning them as stored (with generated id/created_at)
    async fn insert(&self, collection: &str, rows: Vec<Value>) -> Result<Vec<Value>>;

    /// Update the row with the given id, returning the updated rows
    async fn update(&self, collection: &str, id: &str, patch: Value) -> Result<Vec<Value>>;

    /// Hard delete the row with the given id
    async fn delete(&self, collection: &str, id: &str) -> Result<()>;

    /// Insert or replace a single row keyed by its id
    async fn upsert(&self, collection: &str, row: Value) -> Result<Value>;

    /// Invoke a server-side procedure
    async fn rpc(&self, procedure: &str, args: Value) -> Result<Value>;

    /// A handle acting with a signed-in user's credentials
    fn as_user(&self, access_token: &str) -> Arc<dyn ContentStore>;
}

/// Typed row of a named collection
pub trait Row: Serialize + DeserializeOwned + Send + Sync {
    const COLLECTION: &'static str;
}

/// Decode raw rows into a typed schema
pub fn decode_rows<T: DeserializeOwned>(collection: &str, rows: Vec<Value>) -> Result<Vec<T>> {
    rows.into_iter()
        .map(|row| decode_row(collection, row))
        .collect()
}

/// Decode a single raw row into a typed schema
pub fn decode_row<T: DeserializeOwned>(collection: &str, row: Value) -> Result<T> {
    serde_json::from_value(row)
        .map_err(|e| FolioError::Store(format!("Malformed row in {}: {}", collection, e)))
}

/// Select and decode rows of a typed collection
pub async fn select_rows<T: Row>(store: &dyn ContentStore, query: &Query) -> Result<Vec<T>> {
    let rows = store.select(T::COLLECTION, query).await?;
    decode_rows(T::COLLECTION, rows)
}

/// Encode a typed value as a row object
pub fn encode_row<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value)
        .map_err(|e| FolioError::Internal(format!("Failed to encode row: {}", e)))
}
