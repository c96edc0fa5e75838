//! In-memory datastore.

use std::collections::BTreeMap;

use dashmap::DashMap;
use serde_json::Value;

use crate::storage::{Datastore, Query, StoreError};

/// Documents of one kind plus its identifier sequence.
#[derive(Debug, Default)]
struct Collection {
    last_id: i64,
    documents: BTreeMap<i64, Value>,
}

/// A thread-safe datastore keeping every kind in a [`DashMap`] shard.
///
/// Mutations of one kind are serialized by the shard lock; different kinds
/// proceed in parallel.
#[derive(Debug, Default)]
pub struct MemoryDatastore {
    kinds: DashMap<String, Collection>,
}

impl MemoryDatastore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents stored for `kind`.
    pub fn len(&self, kind: &str) -> usize {
        self.kinds.get(kind).map(|c| c.documents.len()).unwrap_or(0)
    }

    fn check_kind(kind: &str) -> Result<(), StoreError> {
        if kind.trim().is_empty() {
            return Err(StoreError::InvalidKind(kind.to_string()));
        }
        Ok(())
    }
}

impl Datastore for MemoryDatastore {
    fn allocate_id(&self, kind: &str) -> Result<i64, StoreError> {
        Self::check_kind(kind)?;
        let mut collection = self.kinds.entry(kind.to_string()).or_default();
        collection.last_id += 1;
        Ok(collection.last_id)
    }

    fn get(&self, kind: &str, id: i64) -> Result<Option<Value>, StoreError> {
        Self::check_kind(kind)?;
        Ok(self
            .kinds
            .get(kind)
            .and_then(|c| c.documents.get(&id).cloned()))
    }

    fn put(&self, kind: &str, id: i64, document: Value) -> Result<(), StoreError> {
        Self::check_kind(kind)?;
        if id <= 0 {
            return Err(StoreError::Backend(format!("refusing to store {} with id {}", kind, id)));
        }
        let mut collection = self.kinds.entry(kind.to_string()).or_default();
        // Keep the sequence ahead of ids written by other means (e.g. imports).
        collection.last_id = collection.last_id.max(id);
        collection.documents.insert(id, document);
        Ok(())
    }

    fn delete(&self, kind: &str, id: i64) -> Result<bool, StoreError> {
        Self::check_kind(kind)?;
        Ok(self
            .kinds
            .get_mut(kind)
            .map(|mut c| c.documents.remove(&id).is_some())
            .unwrap_or(false))
    }

    fn query(&self, kind: &str, query: &Query) -> Result<Vec<(i64, Value)>, StoreError> {
        Self::check_kind(kind)?;
        match self.kinds.get(kind) {
            Some(collection) => query.apply(collection.documents.iter().map(|(id, doc)| (*id, doc))),
            // Still validate the query for unknown kinds.
            None => query.apply(std::iter::empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ids_are_allocated_per_kind() {
        let store = MemoryDatastore::new();
        assert_eq!(store.allocate_id("Snippets").unwrap(), 1);
        assert_eq!(store.allocate_id("Snippets").unwrap(), 2);
        assert_eq!(store.allocate_id("Roles").unwrap(), 1);
    }

    #[test]
    fn test_put_get_delete() {
        let store = MemoryDatastore::new();
        let id = store.allocate_id("Snippets").unwrap();
        store.put("Snippets", id, json!({"Title": "T"})).unwrap();
        assert_eq!(store.get("Snippets", id).unwrap(), Some(json!({"Title": "T"})));
        assert_eq!(store.len("Snippets"), 1);

        assert!(store.delete("Snippets", id).unwrap());
        assert!(!store.delete("Snippets", id).unwrap());
        assert_eq!(store.get("Snippets", id).unwrap(), None);
    }

    #[test]
    fn test_put_advances_sequence() {
        let store = MemoryDatastore::new();
        store.put("Roles", 10, json!({})).unwrap();
        assert_eq!(store.allocate_id("Roles").unwrap(), 11);
    }

    #[test]
    fn test_invalid_writes_are_rejected() {
        let store = MemoryDatastore::new();
        assert!(matches!(store.allocate_id(" "), Err(StoreError::InvalidKind(_))));
        assert!(matches!(store.put("Roles", 0, json!({})), Err(StoreError::Backend(_))));
    }

    #[test]
    fn test_query_and_count() {
        let store = MemoryDatastore::new();
        for (id, name) in [(1, "PHP"), (2, "Go"), (3, "Rust")] {
            store.put("Categories", id, json!({"Title": name})).unwrap();
        }
        let query = Query::new().filter("Title =", "Go");
        assert_eq!(store.query("Categories", &query).unwrap(), vec![(2, json!({"Title": "Go"}))]);
        assert_eq!(store.count("Categories", &Query::new()).unwrap(), 3);
        assert_eq!(store.count("Categories", &Query::new().limit(1)).unwrap(), 1);
        assert_eq!(store.count("Unknown", &Query::new()).unwrap(), 0);
    }
}
