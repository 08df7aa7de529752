//! Collection manager.
//!
//! Validated create/read/update/delete over the `users`, `tasks` and `products`
//! collections. Every public operation returns a [`DbResult`] and never an
//! error: validation, query-syntax and storage failures are folded into the
//! result with `success == false`.
//!
//! Filters go through a two-tier parse: the full query syntax first, then the
//! flat legacy syntax. A filter fails only when both reject it.
//!
//! Mutations hold the store's write lock from id computation through persistence,
//! so concurrent creates cannot hand out the same id.

mod seed;
mod tasks;

pub use seed::SeedCounts;

use std::path::Path;

use parking_lot::RwLock;
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use tracing::{debug, error, info, warn};

use crate::convert::{document_to_json, documents_to_json};
use crate::error::{McpError, Result};
use crate::query::{self, supported_operators, Predicate};
use crate::response::timestamp_now;
use crate::schema::Collection;
use crate::store::{DocumentStore, RowKey};
use crate::value::{Document, Value};

/// Matches above this count are logged before a delete proceeds.
const BULK_DELETE_WARNING: usize = 10;

/// Uniform outcome of a manager operation.
///
/// `success` is `true` exactly when `error` is `None`.
#[derive(Debug, Clone, Serialize)]
pub struct DbResult {
    /// Whether the operation succeeded
    pub success: bool,
    /// Result payload (documents, a document, or a summary object)
    pub data: JsonValue,
    /// Human-readable outcome
    pub message: String,
    /// Records returned or affected
    pub count: usize,
    /// Failure description, `None` on success
    pub error: Option<String>,
    /// Machine-readable failure kind, `None` on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<&'static str>,
    /// Operation-specific context (e.g. the user id a helper was called with)
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, JsonValue>,
}

impl DbResult {
    /// Successful outcome.
    pub fn ok(data: JsonValue, message: impl Into<String>, count: usize) -> Self {
        Self {
            success: true,
            data,
            message: message.into(),
            count,
            error: None,
            error_code: None,
            metadata: Map::new(),
        }
    }

    /// Failed outcome. `context` prefixes the error text; `data` is the empty payload.
    pub fn failed(context: &str, err: &McpError, message: impl Into<String>, data: JsonValue) -> Self {
        let detail = format!("{}: {}", context, err);
        error!(code = err.code(), "{}", detail);
        Self {
            success: false,
            data,
            message: message.into(),
            count: 0,
            error: Some(detail),
            error_code: Some(err.code()),
            metadata: Map::new(),
        }
    }

    /// Attach a metadata entry.
    pub fn with_meta(mut self, key: &str, value: impl Into<JsonValue>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }
}

/// Manager over the three fixed collections.
pub struct DatabaseManager {
    store: RwLock<DocumentStore>,
}

impl DatabaseManager {
    /// Wrap an opened store.
    pub fn new(store: DocumentStore) -> Self {
        Self {
            store: RwLock::new(store),
        }
    }

    /// Open a file-backed manager.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let store = DocumentStore::open(path.as_ref())?;
        info!(path = %path.as_ref().display(), "Connected to database");
        Ok(Self::new(store))
    }

    /// Manager over a store with no backing file.
    pub fn in_memory() -> Self {
        Self::new(DocumentStore::in_memory())
    }

    /// Flush and release the store.
    pub fn close(self) -> Result<()> {
        let store = self.store.into_inner();
        store.flush()?;
        info!("Database connection closed");
        Ok(())
    }

    /// Next id for a collection: one past the largest integer id, or 1 if none.
    pub fn get_next_id(&self, collection: &str) -> Result<i64> {
        let c: Collection = collection.parse()?;
        next_id(&self.store.read(), c)
    }

    // ── Create ───────────────────────────────────────────────────────────

    /// Validate and insert one document, assigning `id` and `created_at`.
    pub fn create(&self, collection: &str, data: &Document) -> DbResult {
        match self.try_create(collection, data) {
            Ok(doc) => {
                info!(collection, id = ?doc.get("id"), "Created record");
                DbResult::ok(
                    document_to_json(doc),
                    format!("Record created successfully in {}", collection),
                    1,
                )
            }
            Err(e) => DbResult::failed(
                &format!("Failed to create record in {}", collection),
                &e,
                "Record creation failed",
                JsonValue::Null,
            ),
        }
    }

    fn try_create(&self, collection: &str, data: &Document) -> Result<Document> {
        let c: Collection = collection.parse()?;
        let mut doc = c.validate_create(data)?;

        let mut store = self.store.write();
        if doc.get("id").map_or(true, Value::is_null) {
            doc.insert("id".into(), Value::Int(next_id(&store, c)?));
        }
        if !matches!(doc.get("created_at"), Some(Value::String(_))) {
            doc.insert("created_at".into(), Value::String(timestamp_now()));
        }

        let key = store.insert(c.name(), doc)?;
        store
            .get(c.name(), key)
            .cloned()
            .ok_or_else(|| McpError::Internal(format!("row {} vanished after insert", key)))
    }

    // ── Read ─────────────────────────────────────────────────────────────

    /// All documents, or those matching `filters`, in insertion order.
    pub fn read(&self, collection: &str, filters: Option<&Document>) -> DbResult {
        match self.find(collection, filters) {
            Ok(docs) => {
                let count = docs.len();
                info!(collection, count, "Read records");
                DbResult::ok(
                    documents_to_json(docs),
                    format!("Successfully retrieved {} records from {}", count, collection),
                    count,
                )
            }
            Err(e) => DbResult::failed(
                &format!("Failed to read records from {}", collection),
                &e,
                "Record retrieval failed",
                JsonValue::Array(Vec::new()),
            ),
        }
    }

    /// Typed form of [`read`](Self::read).
    pub fn find(&self, collection: &str, filters: Option<&Document>) -> Result<Vec<Document>> {
        let c: Collection = collection.parse()?;
        let predicate = match filters {
            Some(f) if !f.is_empty() => compile_filter(f)?,
            _ => None,
        };
        let store = self.store.read();
        let matched = matching(&store, c, predicate.as_ref())?;
        Ok(matched.into_iter().map(|(_, doc)| doc).collect())
    }

    // ── Update ───────────────────────────────────────────────────────────

    /// Merge `updates` into every document matching `filters`.
    ///
    /// An empty filter is refused before any scan. Returns the post-update documents.
    pub fn update(&self, collection: &str, filters: &Document, updates: &Document) -> DbResult {
        match self.try_update(collection, filters, updates) {
            Ok(docs) if docs.is_empty() => {
                info!(collection, "No records matched update filter");
                DbResult::ok(
                    JsonValue::Array(Vec::new()),
                    format!(
                        "No records found matching the specified criteria in {}",
                        collection
                    ),
                    0,
                )
            }
            Ok(docs) => {
                let count = docs.len();
                info!(collection, count, "Updated records");
                DbResult::ok(
                    documents_to_json(docs),
                    format!("Successfully updated {} records in {}", count, collection),
                    count,
                )
            }
            Err(e) => DbResult::failed(
                &format!("Failed to update records in {}", collection),
                &e,
                "Record update failed",
                JsonValue::Array(Vec::new()),
            ),
        }
    }

    fn try_update(
        &self,
        collection: &str,
        filters: &Document,
        updates: &Document,
    ) -> Result<Vec<Document>> {
        let c: Collection = collection.parse()?;
        if filters.is_empty() {
            return Err(McpError::Validation(
                "Filters are required for update operations to prevent accidental bulk updates"
                    .to_string(),
            ));
        }
        let patch = c.validate_update(updates)?;
        let predicate = compile_filter(filters)?;

        let mut store = self.store.write();
        let keys = row_keys(matching(&store, c, predicate.as_ref())?);
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        store.update(c.name(), &keys, &patch)?;
        Ok(keys
            .iter()
            .filter_map(|key| store.get(c.name(), *key).cloned())
            .collect())
    }

    // ── Delete ───────────────────────────────────────────────────────────

    /// Remove (or, with `soft`, flag) every document matching `filters`.
    ///
    /// An empty filter is refused before any scan. Returns the documents as they
    /// were before deletion. Soft-deleted documents stay visible to reads.
    pub fn delete(&self, collection: &str, filters: &Document, soft: bool) -> DbResult {
        match self.try_delete(collection, filters, soft) {
            Ok(docs) if docs.is_empty() => {
                info!(collection, "No records matched delete filter");
                DbResult::ok(
                    JsonValue::Array(Vec::new()),
                    format!(
                        "No records found matching the specified criteria in {}",
                        collection
                    ),
                    0,
                )
                .with_meta("soft_delete", soft)
            }
            Ok(docs) => {
                let count = docs.len();
                let verb = if soft { "soft deleted" } else { "deleted" };
                info!(collection, count, soft, "Deleted records");
                DbResult::ok(
                    documents_to_json(docs),
                    format!("Successfully {} {} records from {}", verb, count, collection),
                    count,
                )
                .with_meta("soft_delete", soft)
            }
            Err(e) => DbResult::failed(
                &format!("Failed to delete records from {}", collection),
                &e,
                "Record deletion failed",
                JsonValue::Array(Vec::new()),
            ),
        }
    }

    fn try_delete(&self, collection: &str, filters: &Document, soft: bool) -> Result<Vec<Document>> {
        let c: Collection = collection.parse()?;
        if filters.is_empty() {
            return Err(McpError::Validation(
                "Filters are required for delete operations to prevent accidental bulk deletions"
                    .to_string(),
            ));
        }
        let predicate = compile_filter(filters)?;

        let mut store = self.store.write();
        let matched = matching(&store, c, predicate.as_ref())?;
        if matched.is_empty() {
            return Ok(Vec::new());
        }
        if matched.len() > BULK_DELETE_WARNING {
            warn!(collection = c.name(), count = matched.len(), "Deleting a large number of records");
        }

        let (keys, snapshot): (Vec<RowKey>, Vec<Document>) = matched.into_iter().unzip();
        if soft {
            let mut marker = Document::new();
            marker.insert("deleted".into(), Value::Bool(true));
            marker.insert("deleted_at".into(), Value::String(timestamp_now()));
            store.update(c.name(), &keys, &marker)?;
        } else {
            store.remove(c.name(), &keys)?;
        }
        Ok(snapshot)
    }

    // ── Advanced search ──────────────────────────────────────────────────

    /// Like a filtered [`read`](Self::read), but the expression must pass the full
    /// query syntax; there is no legacy fallback, so syntax errors are reported
    /// as such rather than as an empty match.
    pub fn advanced_search(&self, collection: &str, query: &Document) -> DbResult {
        match self.search_documents(collection, query) {
            Ok(docs) => {
                let count = docs.len();
                info!(collection, count, "Advanced search completed");
                DbResult::ok(
                    documents_to_json(docs),
                    format!(
                        "Advanced search completed successfully, found {} records",
                        count
                    ),
                    count,
                )
                .with_meta("query", document_to_json(query.clone()))
            }
            Err(e) => DbResult::failed(
                &format!("Advanced search failed in {}", collection),
                &e,
                "Advanced search failed",
                JsonValue::Array(Vec::new()),
            )
            .with_meta("query", document_to_json(query.clone())),
        }
    }

    fn search_documents(&self, collection: &str, expr: &Document) -> Result<Vec<Document>> {
        let c: Collection = collection.parse()?;
        let predicate = query::parse(expr)?;
        let store = self.store.read();
        let matched = matching(&store, c, predicate.as_ref())?;
        Ok(matched.into_iter().map(|(_, doc)| doc).collect())
    }

    /// Supported operators with syntax examples.
    pub fn get_query_capabilities(&self) -> JsonValue {
        let operators: Map<String, JsonValue> = supported_operators()
            .iter()
            .map(|(category, names)| ((*category).to_string(), serde_json::json!(names)))
            .collect();

        serde_json::json!({
            "supported_operators": operators,
            "syntax_examples": {
                "simple_equality": {"field": "value"},
                "comparison": {"field": {"gt": 10}},
                "logical_and": {"$and": [{"field1": "value1"}, {"field2": "value2"}]},
                "logical_or": {"$or": [{"field1": "value1"}, {"field2": "value2"}]},
                "logical_not": {"$not": {"field": "value"}},
                "complex_example": {
                    "$and": [
                        {"status": "active"},
                        {"$or": [
                            {"priority": {"in": ["high", "urgent"]}},
                            {"assigned_to": {"exists": true}}
                        ]},
                        {"created_at": {"gte": "2024-01-01"}}
                    ]
                }
            },
            "field_operators": {
                "equality": ["eq", "ne"],
                "comparison": ["gt", "gte", "lt", "lte"],
                "string": ["contains", "startswith", "endswith"],
                "list": ["in", "not_in"],
                "existence": ["exists"],
                "range": ["between"]
            }
        })
    }
}

/// Full syntax first, legacy syntax second. Reports the full-syntax error when both fail.
fn compile_filter(filters: &Document) -> Result<Option<Predicate>> {
    match query::parse(filters) {
        Ok(predicate) => Ok(predicate),
        Err(advanced) => {
            warn!(error = %advanced, "Advanced query parsing failed, falling back to legacy");
            match query::parse_legacy(filters) {
                Ok(predicate) => Ok(Some(predicate)),
                Err(legacy) => {
                    debug!(error = %legacy, "Legacy query parsing failed");
                    Err(advanced.into())
                }
            }
        }
    }
}

fn matching(
    store: &DocumentStore,
    c: Collection,
    predicate: Option<&Predicate>,
) -> Result<Vec<(RowKey, Document)>> {
    store
        .scan(c.name(), |doc| predicate.map_or(Ok(true), |p| p.evaluate(doc)))
        .map_err(McpError::from)
}

fn row_keys(matched: Vec<(RowKey, Document)>) -> Vec<RowKey> {
    matched.into_iter().map(|(key, _)| key).collect()
}

fn next_id(store: &DocumentStore, c: Collection) -> Result<i64> {
    let max = store
        .documents(c.name())
        .filter_map(|doc| doc.get("id").and_then(Value::as_i64))
        .max()
        .unwrap_or(0)
        .max(0);
    max.checked_add(1).ok_or_else(|| {
        McpError::Validation(format!("id space exhausted in {}", c.name()))
    })
}
