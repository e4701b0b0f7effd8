//! The per-resource JSON document and the pure edits applied to it.
//!
//! A document is the whole collection for one resource type:
//!
//! ```json
//! { "items": [ ... ], "lastModified": 1718000000000 }
//! ```
//!
//! Mutations never happen in place. Each edit builds the next document so
//! the caller can persist it first and only adopt it once the store accepts.

use chrono::Utc;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

use crate::resource::Resource;

/// Current time as Unix epoch milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// `items` is required on the wire; a missing `lastModified` reads as 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document<T> {
    pub items: Vec<T>,
    #[serde(rename = "lastModified", default)]
    pub last_modified: i64,
}

impl<T> Document<T> {
    pub fn new(items: Vec<T>, last_modified: i64) -> Self {
        Self {
            items,
            last_modified,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), 0)
    }

    /// Stamps a fresh `lastModified` that is strictly greater than `previous`.
    pub fn stamp(&mut self, previous: i64) -> i64 {
        self.last_modified = now_millis().max(previous + 1);
        self.last_modified
    }
}

impl<T> Default for Document<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: Resource> Document<T> {
    /// Built-in document used when the server copy cannot be read.
    pub fn defaults() -> Self {
        Self::new(T::defaults(), 0)
    }

    pub fn find(&self, id: &str) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Returns the document with `item` appended, and the id it was stored
    /// under. Items arriving without an id, or with one already taken, get
    /// a generated `{prefix}-{timestamp}` id.
    pub fn with_added(&self, mut item: T) -> (Self, String) {
        if item.id().is_empty() || self.find(item.id()).is_some() {
            let id = next_id(
                T::KIND.id_prefix(),
                self.items.iter().map(|i| i.id()),
                now_millis(),
            );
            item.set_id(id);
        }
        let id = item.id().to_string();

        let mut items = self.items.clone();
        items.push(item);
        (Self::new(items, self.last_modified), id)
    }

    /// Returns the document with `updates` shallow-merged into the item
    /// matching `id`. Other items are untouched; an unknown id yields an
    /// unchanged collection.
    pub fn with_updated(&self, id: &str, updates: &Map<String, Value>) -> Result<Self, serde_json::Error> {
        let items = self
            .items
            .iter()
            .map(|item| {
                if item.id() == id {
                    merge_fields(item, updates)
                } else {
                    Ok(item.clone())
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(items, self.last_modified))
    }

    /// Returns the document without the item matching `id`.
    pub fn with_removed(&self, id: &str) -> Self {
        let items = self
            .items
            .iter()
            .filter(|item| item.id() != id)
            .cloned()
            .collect();
        Self::new(items, self.last_modified)
    }
}

/// Generates `{prefix}-{now}`, bumping the timestamp until the id is free.
pub fn next_id<'a>(prefix: &str, existing: impl Iterator<Item = &'a str>, now: i64) -> String {
    let taken: HashSet<&str> = existing.collect();
    let mut stamp = now;
    loop {
        let candidate = format!("{}-{}", prefix, stamp);
        if !taken.contains(candidate.as_str()) {
            return candidate;
        }
        stamp += 1;
    }
}

/// Shallow merge: top-level fields of `updates` replace those of `item`.
/// The `id` field is never overwritten.
pub fn merge_fields<T>(item: &T, updates: &Map<String, Value>) -> Result<T, serde_json::Error>
where
    T: Serialize + DeserializeOwned,
{
    let mut value = serde_json::to_value(item)?;
    if let Value::Object(fields) = &mut value {
        for (key, update) in updates {
            if key == "id" {
                continue;
            }
            fields.insert(key.clone(), update.clone());
        }
    }
    serde_json::from_value(value)
}
