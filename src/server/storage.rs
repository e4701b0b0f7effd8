//! Server-side JSON document storage.
//!
//! Stores one document per resource in a flat directory:
//! ```text
//! <DATA_DIR>/
//!   sessions.json
//!   sponsors.json
//!   magazines.json
//!   events.json
//!   luminaries.json
//! ```
//!
//! Items are kept as untyped JSON; the store only relies on the
//! `{ items, lastModified }` envelope and on item `id` fields.

use serde_json::Value;
use std::fs;
use std::io;
use std::path::PathBuf;
use tfs_core::{next_id, now_millis, Document, ResourceKind};

/// Errors that can occur during server storage operations.
#[derive(Debug)]
pub enum StoreError {
    /// I/O error reading or writing a file.
    IoError(PathBuf, io::Error),
    /// Persisted document is not valid JSON of the expected shape.
    ParseError(PathBuf, serde_json::Error),
    /// Unknown resource name.
    UnknownResource(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::IoError(path, e) => {
                write!(f, "I/O error for {}: {}", path.display(), e)
            }
            StoreError::ParseError(path, e) => {
                write!(f, "Failed to parse document {}: {}", path.display(), e)
            }
            StoreError::UnknownResource(name) => {
                write!(f, "Unknown resource: {}", name)
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::IoError(_, e) => Some(e),
            StoreError::ParseError(_, e) => Some(e),
            StoreError::UnknownResource(_) => None,
        }
    }
}

/// File-backed store of resource documents.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    data_dir: PathBuf,
}

impl DocumentStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Resolves a resource name from a request path.
    pub fn resolve(name: &str) -> Result<ResourceKind, StoreError> {
        ResourceKind::parse(name).ok_or_else(|| StoreError::UnknownResource(name.to_string()))
    }

    fn doc_path(&self, kind: ResourceKind) -> PathBuf {
        self.data_dir.join(kind.filename())
    }

    /// Loads a document. Returns `Ok(None)` if it was never written.
    pub fn load(&self, kind: ResourceKind) -> Result<Option<Document<Value>>, StoreError> {
        let path = self.doc_path(kind);

        match fs::read(&path) {
            Ok(bytes) => {
                let doc = serde_json::from_slice(&bytes)
                    .map_err(|e| StoreError::ParseError(path, e))?;
                Ok(Some(doc))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::IoError(path, e)),
        }
    }

    /// Loads a document, serving `{ items: [], lastModified: 0 }` if missing.
    pub fn load_or_empty(&self, kind: ResourceKind) -> Result<Document<Value>, StoreError> {
        Ok(self.load(kind)?.unwrap_or_default())
    }

    /// Returns true if the stored copy is newer than `since`.
    pub fn needs_update(&self, kind: ResourceKind, since: i64) -> Result<bool, StoreError> {
        Ok(self.load_or_empty(kind)?.last_modified > since)
    }

    /// Overwrites a document and returns it as stored.
    ///
    /// `lastModified` is re-stamped to be strictly greater than the previous
    /// stored value, and items without an id get one.
    pub fn save(
        &self,
        kind: ResourceKind,
        mut doc: Document<Value>,
    ) -> Result<Document<Value>, StoreError> {
        let previous = self.load(kind)?.map(|d| d.last_modified).unwrap_or(0);
        doc.stamp(previous);
        assign_missing_ids(&mut doc.items, kind.id_prefix());

        fs::create_dir_all(&self.data_dir)
            .map_err(|e| StoreError::IoError(self.data_dir.clone(), e))?;

        let path = self.doc_path(kind);
        let bytes = serde_json::to_vec_pretty(&doc)
            .map_err(|e| StoreError::ParseError(path.clone(), e))?;

        // Write atomically using temp file + rename
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, &bytes).map_err(|e| StoreError::IoError(temp_path.clone(), e))?;
        fs::rename(&temp_path, &path).map_err(|e| StoreError::IoError(path, e))?;

        Ok(doc)
    }
}

/// Gives every object item lacking a non-empty string `id` a fresh one.
fn assign_missing_ids(items: &mut [Value], prefix: &str) {
    let mut taken: Vec<String> = items
        .iter()
        .filter_map(|item| item.get("id").and_then(Value::as_str))
        .map(str::to_string)
        .collect();

    for item in items.iter_mut() {
        let Value::Object(fields) = item else {
            continue;
        };
        let has_id = matches!(fields.get("id"), Some(Value::String(id)) if !id.is_empty());
        if !has_id {
            let id = next_id(prefix, taken.iter().map(String::as_str), now_millis());
            fields.insert("id".to_string(), Value::String(id.clone()));
            taken.push(id);
        }
    }
}
