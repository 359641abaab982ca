//! In-memory content store
//!
//! Stands in for the hosted store in dev mode and tests. Behaves like the
//! remote one where the application can observe it: generated `id` and
//! `created_at` on insert, equality filters, ordering, limits, and the two
//! counter procedures. Individual operations can be switched to fail so
//! callers' error paths can be exercised.

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use dashmap::{DashMap, DashSet};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use super::query::{compare_values, Query};
use super::schemas::RESEARCH_COLLECTION;
use super::{ContentStore, INCREMENT_RESEARCH_DOWNLOADS, INCREMENT_RESEARCH_VIEWS};
use crate::types::{FolioError, Result};

/// Store operations that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Select,
    Insert,
    Update,
    Delete,
    Upsert,
    Rpc,
}

#[derive(Default)]
struct Inner {
    collections: DashMap<String, Vec<Value>>,
    failing: DashSet<StoreOp>,
}

/// Content store held entirely in memory
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call of `op` fail with a store error until restored
    pub fn fail_operation(&self, op: StoreOp) {
        self.inner.failing.insert(op);
    }

    /// Undo `fail_operation`
    pub fn restore_operation(&self, op: StoreOp) {
        self.inner.failing.remove(&op);
    }

    /// Number of rows currently held in a collection
    pub fn len(&self, collection: &str) -> usize {
        self.inner
            .collections
            .get(collection)
            .map(|rows| rows.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    fn check(&self, op: StoreOp) -> Result<()> {
        if self.inner.failing.contains(&op) {
            return Err(FolioError::Store(format!("{:?} unavailable", op)));
        }
        Ok(())
    }

    fn increment(&self, collection: &str, id: &str, column: &str) {
        if let Some(mut rows) = self.inner.collections.get_mut(collection) {
            for row in rows.iter_mut().filter(|r| row_id(r) == Some(id)) {
                let current = row.get(column).and_then(Value::as_u64).unwrap_or(0);
                if let Some(obj) = row.as_object_mut() {
                    obj.insert(column.to_string(), Value::from(current + 1));
                }
            }
        }
    }
}

fn row_id(row: &Value) -> Option<&str> {
    row.get("id").and_then(Value::as_str)
}

fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Fill in the columns the remote store would generate
fn with_generated_columns(row: Value) -> Result<Value> {
    let mut obj: Map<String, Value> = match row {
        Value::Object(obj) => obj,
        other => {
            return Err(FolioError::Store(format!(
                "Rows must be JSON objects, got {}",
                other
            )))
        }
    };

    if !obj.get("id").map(Value::is_string).unwrap_or(false) {
        obj.insert("id".into(), Value::String(Uuid::new_v4().to_string()));
    }
    if !obj.get("created_at").map(Value::is_string).unwrap_or(false) {
        obj.insert("created_at".into(), Value::String(now_timestamp()));
    }

    Ok(Value::Object(obj))
}

fn merge_into(target: &mut Value, patch: &Value) {
    if let (Some(target), Some(patch)) = (target.as_object_mut(), patch.as_object()) {
        for (key, value) in patch {
            if key != "id" {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn select(&self, collection: &str, query: &Query) -> Result<Vec<Value>> {
        self.check(StoreOp::Select)?;

        let rows = match self.inner.collections.get(collection) {
            Some(rows) => rows.clone(),
            None => return Ok(Vec::new()),
        };

        let mut matched: Vec<(usize, Value)> = rows
            .into_iter()
            .enumerate()
            .filter(|(_, row)| query.matches(row))
            .collect();

        if let Some(ref order) = query.order {
            matched.sort_by(|(ia, a), (ib, b)| {
                let ordering = compare_values(a.get(&order.column), b.get(&order.column))
                    .then(ia.cmp(ib));
                if order.ascending {
                    ordering
                } else {
                    ordering.reverse()
                }
            });
        }

        let limit = query.limit.unwrap_or(usize::MAX);
        Ok(matched.into_iter().take(limit).map(|(_, row)| row).collect())
    }

    async fn insert(&self, collection: &str, rows: Vec<Value>) -> Result<Vec<Value>> {
        self.check(StoreOp::Insert)?;

        let stored = rows
            .into_iter()
            .map(with_generated_columns)
            .collect::<Result<Vec<_>>>()?;

        self.inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .extend(stored.iter().cloned());

        debug!("Inserted {} row(s) into {}", stored.len(), collection);
        Ok(stored)
    }

    async fn update(&self, collection: &str, id: &str, patch: Value) -> Result<Vec<Value>> {
        self.check(StoreOp::Update)?;

        let mut updated = Vec::new();
        if let Some(mut rows) = self.inner.collections.get_mut(collection) {
            for row in rows.iter_mut().filter(|r| row_id(r) == Some(id)) {
                merge_into(row, &patch);
                updated.push(row.clone());
            }
        }

        Ok(updated)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        self.check(StoreOp::Delete)?;

        if let Some(mut rows) = self.inner.collections.get_mut(collection) {
            rows.retain(|r| row_id(r) != Some(id));
        }

        Ok(())
    }

    async fn upsert(&self, collection: &str, row: Value) -> Result<Value> {
        self.check(StoreOp::Upsert)?;

        let row = with_generated_columns(row)?;
        let id = row_id(&row).unwrap_or_default().to_string();

        let mut rows = self
            .inner
            .collections
            .entry(collection.to_string())
            .or_default();

        if let Some(existing) = rows.iter_mut().find(|r| row_id(r) == Some(id.as_str())) {
            let created_at = existing.get("created_at").cloned();
            merge_into(existing, &row);
            if let (Some(obj), Some(created_at)) = (existing.as_object_mut(), created_at) {
                obj.insert("created_at".into(), created_at);
            }
            return Ok(existing.clone());
        }

        rows.push(row.clone());
        Ok(row)
    }

    async fn rpc(&self, procedure: &str, args: Value) -> Result<Value> {
        self.check(StoreOp::Rpc)?;

        let article_id = args
            .get("article_id")
            .and_then(Value::as_str)
            .ok_or_else(|| FolioError::Store(format!("{} requires article_id", procedure)))?;

        match procedure {
            INCREMENT_RESEARCH_VIEWS => self.increment(RESEARCH_COLLECTION, article_id, "views"),
            INCREMENT_RESEARCH_DOWNLOADS => {
                self.increment(RESEARCH_COLLECTION, article_id, "downloads")
            }
            other => return Err(FolioError::Store(format!("Unknown procedure: {}", other))),
        }

        Ok(Value::Null)
    }

    fn as_user(&self, _access_token: &str) -> Arc<dyn ContentStore> {
        Arc::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_insert_generates_id_and_timestamp() {
        let store = MemoryStore::new();
        let rows = store
            .insert("blogs", vec![json!({ "title": "Tokyo" })])
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert!(rows[0]["id"].is_string());
        assert!(rows[0]["created_at"].is_string());
        assert_eq!(store.len("blogs"), 1);
    }

    #[tokio::test]
    async fn test_select_filters_orders_and_limits() {
        let store = MemoryStore::new();
        store
            .insert(
                "blogs",
                vec![
                    json!({ "title": "a", "published": true, "n": 1 }),
                    json!({ "title": "b", "published": false, "n": 2 }),
                    json!({ "title": "c", "published": true, "n": 3 }),
                    json!({ "title": "d", "published": true, "n": 4 }),
                ],
            )
            .await
            .unwrap();

        let rows = store
            .select("blogs", &Query::new().eq("published", true).order_desc("n").limit(2))
            .await
            .unwrap();

        let titles: Vec<&str> = rows.iter().map(|r| r["title"].as_str().unwrap()).collect();
        assert_eq!(titles, vec!["d", "c"]);
    }

    #[tokio::test]
    async fn test_descending_ties_put_latest_insert_first() {
        let store = MemoryStore::new();
        for title in ["first", "second"] {
            store
                .insert("blogs", vec![json!({ "title": title, "created_at": "2024-01-01T00:00:00Z" })])
                .await
                .unwrap();
        }

        let rows = store
            .select("blogs", &Query::new().order_desc("created_at"))
            .await
            .unwrap();
        assert_eq!(rows[0]["title"], "second");
    }

    #[tokio::test]
    async fn test_update_patches_columns() {
        let store = MemoryStore::new();
        let row = store
            .insert("blogs", vec![json!({ "title": "a", "views": 0 })])
            .await
            .unwrap()
            .remove(0);
        let id = row["id"].as_str().unwrap();

        let updated = store.update("blogs", id, json!({ "views": 5 })).await.unwrap();
        assert_eq!(updated[0]["views"], 5);
        assert_eq!(updated[0]["title"], "a");

        let missing = store.update("blogs", "nope", json!({ "views": 1 })).await.unwrap();
        assert!(missing.is_empty());
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_id() {
        let store = MemoryStore::new();
        let created = store
            .upsert("resume_info", json!({ "full_name": "A" }))
            .await
            .unwrap();
        let id = created["id"].as_str().unwrap().to_string();

        let replaced = store
            .upsert("resume_info", json!({ "id": id, "full_name": "B" }))
            .await
            .unwrap();

        assert_eq!(replaced["full_name"], "B");
        assert_eq!(replaced["created_at"], created["created_at"]);
        assert_eq!(store.len("resume_info"), 1);
    }

    #[tokio::test]
    async fn test_rpc_increments_counters() {
        let store = MemoryStore::new();
        let row = store
            .insert(RESEARCH_COLLECTION, vec![json!({ "title": "paper" })])
            .await
            .unwrap()
            .remove(0);
        let id = row["id"].as_str().unwrap();

        store
            .rpc(INCREMENT_RESEARCH_DOWNLOADS, json!({ "article_id": id }))
            .await
            .unwrap();
        store
            .rpc(INCREMENT_RESEARCH_DOWNLOADS, json!({ "article_id": id }))
            .await
            .unwrap();

        let rows = store
            .select(RESEARCH_COLLECTION, &Query::new().eq("id", id))
            .await
            .unwrap();
        assert_eq!(rows[0]["downloads"], 2);

        assert!(store.rpc("drop_tables", json!({ "article_id": id })).await.is_err());
    }

    #[tokio::test]
    async fn test_failing_operation() {
        let store = MemoryStore::new();
        store.fail_operation(StoreOp::Insert);
        assert!(store.insert("blogs", vec![json!({})]).await.is_err());

        store.restore_operation(StoreOp::Insert);
        assert!(store.insert("blogs", vec![json!({})]).await.is_ok());
    }
}
