//! Storage abstraction for DevKB.
//!
//! The [`EntryStore`] trait defines the operations the HTTP layer needs,
//! so the in-memory backend can be swapped for a persistent one without
//! touching the handlers.
//!
//! Implementations must be `Send + Sync` to be shared across request tasks.

pub mod memory;

use async_trait::async_trait;

use crate::models::{EntryPatch, KnowledgeEntry};

/// Failures surfaced by entry construction and store operations.
#[derive(Debug, thiserror::Error)]
pub enum EntryError {
    #[error("type, title, and content are required")]
    MissingRequired,

    #[error("entry not found: {0}")]
    NotFound(String),
}

/// Abstract storage backend for knowledge entries.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`put`](EntryStore::put) | Insert or replace by id |
/// | [`get`](EntryStore::get) | Fetch one entry |
/// | [`update`](EntryStore::update) | Merge a patch into an existing entry |
/// | [`delete`](EntryStore::delete) | Remove permanently |
/// | [`list`](EntryStore::list) | All entries in insertion order |
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Insert or replace an entry by id. A replaced entry keeps its
    /// original position in [`list`](EntryStore::list) order.
    async fn put(&self, entry: KnowledgeEntry) -> Result<(), EntryError>;

    async fn get(&self, id: &str) -> Result<Option<KnowledgeEntry>, EntryError>;

    /// Read, merge, and write back as one atomic step.
    ///
    /// Returns [`EntryError::NotFound`] when no entry has this id.
    async fn update(&self, id: &str, patch: &EntryPatch) -> Result<KnowledgeEntry, EntryError>;

    /// Returns [`EntryError::NotFound`] when no entry has this id.
    async fn delete(&self, id: &str) -> Result<(), EntryError>;

    async fn list(&self) -> Result<Vec<KnowledgeEntry>, EntryError>;
}
