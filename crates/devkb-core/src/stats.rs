//! Aggregate statistics and the bounded search history.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::{PoisonError, RwLock};

use serde::Serialize;

use crate::models::{EntryType, KnowledgeEntry};

/// Number of raw queries retained by [`SearchHistory`].
pub const SEARCH_HISTORY_CAP: usize = 100;

/// The most recent search queries, oldest evicted first.
pub struct SearchHistory {
    queries: RwLock<VecDeque<String>>,
}

impl SearchHistory {
    pub fn new() -> Self {
        Self {
            queries: RwLock::new(VecDeque::with_capacity(SEARCH_HISTORY_CAP)),
        }
    }

    pub fn record(&self, query: &str) {
        let mut queries = self.queries.write().unwrap_or_else(PoisonError::into_inner);
        queries.push_back(query.to_string());
        while queries.len() > SEARCH_HISTORY_CAP {
            queries.pop_front();
        }
    }

    /// Number of retained queries.
    pub fn count(&self) -> usize {
        self.queries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Default for SearchHistory {
    fn default() -> Self {
        Self::new()
    }
}

/// Response shape of `GET /api/stats`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KbStats {
    pub total_entries: usize,
    /// Only types with at least one entry appear.
    pub by_type: BTreeMap<EntryType, usize>,
    /// Distinct tag strings across all entries.
    pub total_tags: usize,
    pub search_history_count: usize,
}

pub fn compute_stats(entries: &[KnowledgeEntry], search_history_count: usize) -> KbStats {
    let mut by_type = BTreeMap::new();
    for e in entries {
        *by_type.entry(e.entry_type).or_insert(0) += 1;
    }

    let distinct_tags: HashSet<&str> = entries
        .iter()
        .flat_map(|e| e.tags.iter().map(String::as_str))
        .collect();

    KbStats {
        total_entries: entries.len(),
        by_type,
        total_tags: distinct_tags.len(),
        search_history_count,
    }
}
