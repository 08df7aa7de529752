//! Whole-file JSON document store.
//!
//! Holds named tables, each an insertion-ordered list of documents addressed by
//! an internal [`RowKey`]. Row keys are assigned on insert (and on load) and are
//! unrelated to a document's own `id` field; the store does not enforce `id`
//! uniqueness.
//!
//! Every mutating call rewrites the backing file with the full table set:
//!
//! ```json
//! { "users": [ {...}, ... ], "tasks": [ ... ], "products": [ ... ] }
//! ```
//!
//! There is no journal. A crash during the rewrite can leave a truncated file.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::debug;

use crate::error::{McpError, Result};
use crate::value::Document;

/// Internal row identity within one table.
pub type RowKey = u64;

#[derive(Default)]
struct Table {
    rows: Vec<(RowKey, Document)>,
    next_key: RowKey,
}

impl Table {
    fn from_documents(docs: Vec<Document>) -> Self {
        let mut table = Table::default();
        for doc in docs {
            table.push(doc);
        }
        table
    }

    fn push(&mut self, doc: Document) -> RowKey {
        self.next_key += 1;
        self.rows.push((self.next_key, doc));
        self.next_key
    }
}

/// Named tables of documents, optionally backed by a JSON file.
pub struct DocumentStore {
    path: Option<PathBuf>,
    tables: IndexMap<String, Table>,
}

impl DocumentStore {
    /// Open (or create) a file-backed store.
    ///
    /// A missing or empty file yields an empty store; the parent directory is
    /// created if needed. Unparseable content is a storage error.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                McpError::Storage(format!("cannot create {}: {}", parent.display(), e))
            })?;
        }

        let tables = match fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => IndexMap::new(),
            Ok(text) => {
                let raw: IndexMap<String, Vec<Document>> =
                    serde_json::from_str(&text).map_err(|e| {
                        McpError::Storage(format!("corrupted database file {}: {}", path.display(), e))
                    })?;
                raw.into_iter()
                    .map(|(name, docs)| (name, Table::from_documents(docs)))
                    .collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => IndexMap::new(),
            Err(e) => {
                return Err(McpError::Storage(format!(
                    "cannot read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        debug!(path = %path.display(), tables = tables.len(), "Opened document store");
        Ok(Self {
            path: Some(path),
            tables,
        })
    }

    /// A store with no backing file.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            tables: IndexMap::new(),
        }
    }

    /// Append a document and persist. Nothing is kept if the write fails.
    pub fn insert(&mut self, table: &str, doc: Document) -> Result<RowKey> {
        let mut keys = self.insert_many(table, vec![doc])?;
        keys.pop()
            .ok_or_else(|| McpError::Internal("insert produced no row".to_string()))
    }

    /// Append several documents with a single write. Nothing is kept if the write fails.
    pub fn insert_many(&mut self, table: &str, docs: Vec<Document>) -> Result<Vec<RowKey>> {
        let t = self.table_mut(table);
        let before = t.rows.len();
        let keys = docs.into_iter().map(|doc| t.push(doc)).collect();
        if let Err(e) = self.flush() {
            self.table_mut(table).rows.truncate(before);
            return Err(e);
        }
        Ok(keys)
    }

    /// All documents of a table, in insertion order.
    pub fn all(&self, table: &str) -> Vec<Document> {
        self.rows(table).iter().map(|(_, doc)| doc.clone()).collect()
    }

    /// Borrowing iterator over a table, in insertion order.
    pub fn documents<'a>(&'a self, table: &str) -> impl Iterator<Item = &'a Document> + 'a {
        self.rows(table).iter().map(|(_, doc)| doc)
    }

    /// Number of documents in a table.
    pub fn len(&self, table: &str) -> usize {
        self.rows(table).len()
    }

    /// Whether a table has no documents.
    pub fn is_empty(&self, table: &str) -> bool {
        self.len(table) == 0
    }

    /// Fetch one document by row key.
    pub fn get(&self, table: &str, key: RowKey) -> Option<&Document> {
        self.rows(table)
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, doc)| doc)
    }

    /// Documents for which `matches` returns `true`, in insertion order.
    ///
    /// Stops at the first error returned by `matches`.
    pub fn scan<E>(
        &self,
        table: &str,
        mut matches: impl FnMut(&Document) -> std::result::Result<bool, E>,
    ) -> std::result::Result<Vec<(RowKey, Document)>, E> {
        let mut found = Vec::new();
        for (key, doc) in self.rows(table) {
            if matches(doc)? {
                found.push((*key, doc.clone()));
            }
        }
        Ok(found)
    }

    /// Merge `patch` into each listed row and persist. Returns rows touched.
    ///
    /// If the write fails the touched rows are restored.
    pub fn update(&mut self, table: &str, keys: &[RowKey], patch: &Document) -> Result<usize> {
        let wanted: HashSet<RowKey> = keys.iter().copied().collect();
        let mut originals = Vec::new();
        if let Some(t) = self.tables.get_mut(table) {
            for (i, (key, doc)) in t.rows.iter_mut().enumerate() {
                if wanted.contains(key) {
                    originals.push((i, doc.clone()));
                    for (field, value) in patch {
                        doc.insert(field.clone(), value.clone());
                    }
                }
            }
        }
        if originals.is_empty() {
            return Ok(0);
        }
        if let Err(e) = self.flush() {
            let t = self.table_mut(table);
            for (i, doc) in originals {
                t.rows[i].1 = doc;
            }
            return Err(e);
        }
        Ok(originals.len())
    }

    /// Remove each listed row and persist. Returns rows removed.
    ///
    /// If the write fails the rows are put back.
    pub fn remove(&mut self, table: &str, keys: &[RowKey]) -> Result<usize> {
        let wanted: HashSet<RowKey> = keys.iter().copied().collect();
        let Some(t) = self.tables.get_mut(table) else {
            return Ok(0);
        };
        let snapshot = t.rows.clone();
        t.rows.retain(|(key, _)| !wanted.contains(key));
        let removed = snapshot.len() - t.rows.len();
        if removed == 0 {
            return Ok(0);
        }
        self.commit_or_restore(table, snapshot)?;
        Ok(removed)
    }

    /// Drop every document of a table and persist.
    ///
    /// If the write fails the documents are put back.
    pub fn truncate(&mut self, table: &str) -> Result<()> {
        let snapshot = std::mem::take(&mut self.table_mut(table).rows);
        self.commit_or_restore(table, snapshot)
    }

    fn commit_or_restore(&mut self, table: &str, snapshot: Vec<(RowKey, Document)>) -> Result<()> {
        if let Err(e) = self.flush() {
            self.table_mut(table).rows = snapshot;
            return Err(e);
        }
        Ok(())
    }

    /// Rewrite the backing file. No-op for in-memory stores.
    pub fn flush(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let snapshot: IndexMap<&str, Vec<&Document>> = self
            .tables
            .iter()
            .map(|(name, t)| (name.as_str(), t.rows.iter().map(|(_, doc)| doc).collect()))
            .collect();
        let bytes = serde_json::to_vec_pretty(&snapshot)?;
        fs::write(path, bytes)
            .map_err(|e| McpError::Storage(format!("cannot write {}: {}", path.display(), e)))?;
        debug!(path = %path.display(), "Flushed document store");
        Ok(())
    }

    fn rows(&self, table: &str) -> &[(RowKey, Document)] {
        self.tables
            .get(table)
            .map(|t| t.rows.as_slice())
            .unwrap_or(&[])
    }

    fn table_mut(&mut self, table: &str) -> &mut Table {
        self.tables.entry(table.to_string()).or_default()
    }
}
