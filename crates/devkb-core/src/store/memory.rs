//! In-memory [`EntryStore`] implementation.
//!
//! Entries live in a `HashMap` keyed by id, with a separate `Vec` recording
//! insertion order, both behind one `std::sync::RwLock`. Every operation
//! takes the lock exactly once, so an update's read-merge-write cannot
//! interleave with another writer.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use chrono::Utc;

use crate::models::{EntryPatch, KnowledgeEntry};

use super::{EntryError, EntryStore};

#[derive(Default)]
struct Entries {
    by_id: HashMap<String, KnowledgeEntry>,
    order: Vec<String>,
}

/// Process-lifetime store: empty at startup, gone at exit.
#[derive(Default)]
pub struct InMemoryStore {
    entries: RwLock<Entries>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EntryStore for InMemoryStore {
    async fn put(&self, entry: KnowledgeEntry) -> Result<(), EntryError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if !entries.by_id.contains_key(&entry.id) {
            entries.order.push(entry.id.clone());
        }
        entries.by_id.insert(entry.id.clone(), entry);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<KnowledgeEntry>, EntryError> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.by_id.get(id).cloned())
    }

    async fn update(&self, id: &str, patch: &EntryPatch) -> Result<KnowledgeEntry, EntryError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let entry = entries
            .by_id
            .get_mut(id)
            .ok_or_else(|| EntryError::NotFound(id.to_string()))?;
        patch.apply(entry, Utc::now());
        Ok(entry.clone())
    }

    async fn delete(&self, id: &str) -> Result<(), EntryError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.by_id.remove(id).is_none() {
            return Err(EntryError::NotFound(id.to_string()));
        }
        entries.order.retain(|existing| existing != id);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<KnowledgeEntry>, EntryError> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries
            .order
            .iter()
            .filter_map(|id| entries.by_id.get(id).cloned())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EntryType, NewEntry};
    use std::sync::Arc;

    fn entry(title: &str) -> KnowledgeEntry {
        NewEntry {
            entry_type: Some(EntryType::Code),
            title: Some(title.to_string()),
            content: Some(format!("{} body", title)),
            ..Default::default()
        }
        .into_entry("api", Utc::now())
        .unwrap()
    }

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let store = InMemoryStore::new();
        let e = entry("alpha");
        store.put(e.clone()).await.unwrap();
        assert_eq!(store.get(&e.id).await.unwrap(), Some(e));
        assert_eq!(store.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_list_keeps_insertion_order_on_replace() {
        let store = InMemoryStore::new();
        let a = entry("a");
        let b = entry("b");
        let c = entry("c");
        for e in [&a, &b, &c] {
            store.put(e.clone()).await.unwrap();
        }

        let mut replaced = a.clone();
        replaced.title = "a2".to_string();
        store.put(replaced).await.unwrap();

        let titles: Vec<String> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.title)
            .collect();
        assert_eq!(titles, vec!["a2", "b", "c"]);
    }

    #[tokio::test]
    async fn test_delete_twice_is_not_found() {
        let store = InMemoryStore::new();
        let e = entry("gone");
        store.put(e.clone()).await.unwrap();

        store.delete(&e.id).await.unwrap();
        assert!(matches!(
            store.delete(&e.id).await,
            Err(EntryError::NotFound(_))
        ));
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let store = InMemoryStore::new();
        let err = store
            .update("nope", &EntryPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, EntryError::NotFound(id) if id == "nope"));
    }

    #[tokio::test]
    async fn test_concurrent_updates_do_not_lose_writes() {
        let store = Arc::new(InMemoryStore::new());
        let e = entry("shared");
        store.put(e.clone()).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            let id = e.id.clone();
            handles.push(tokio::spawn(async move {
                let patch = EntryPatch {
                    tags: Some(vec![format!("t{}", i)]),
                    ..Default::default()
                };
                store.update(&id, &patch).await.unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        let stored = store.get(&e.id).await.unwrap().unwrap();
        assert_eq!(stored.tags.len(), 1);
        assert_eq!(stored.title, "shared");
        assert!(stored.updated_at >= stored.created_at);
    }
}
