// Distributed under the MIT software license

//! The raw key/value capability `RepoCache` is built on.
//!
//! Mirrors the teacher's split between a storage-agnostic trait
//! (`NostrDatabase`) and an in-memory default (`MemoryDatabase`): a real
//! deployment backs this with whatever durable KV store it already
//! runs (sled, redb, a relay's own database); tests use
//! [`MemoryCacheStore`].

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::CacheError;

/// A single stored entry: opaque bytes plus the timestamp it was written,
/// so [`crate::RepoCache::cleanup`] can evict by age without the backend
/// needing to understand record shapes.
#[derive(Debug, Clone)]
pub struct StoredEntry {
    /// JSON-encoded record.
    pub value: String,
    /// Unix seconds the entry was last written.
    pub written_at: i64,
}

/// Capability: a flat, pattern-matchable key/value store.
///
/// Keys are structured strings (`repo/<id>`, `merge/<repoId>/<patchId>/<target>`,
/// `commits/<repoId>/<branch>`); `clear_by_pattern` matches a literal
/// prefix, which is all the three key families above ever need.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Fetch an entry.
    async fn get(&self, key: &str) -> Result<Option<StoredEntry>, CacheError>;
    /// Write (overwrite) an entry.
    async fn set(&self, key: &str, entry: StoredEntry) -> Result<(), CacheError>;
    /// Remove an entry. No error if absent.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
    /// Remove every entry whose key starts with `prefix`.
    async fn clear_by_pattern(&self, prefix: &str) -> Result<usize, CacheError>;
    /// All entries, for age-based cleanup scans.
    async fn scan(&self) -> Result<Vec<(String, StoredEntry)>, CacheError>;
}

/// In-memory [`CacheStore`] for tests.
#[derive(Default)]
pub struct MemoryCacheStore {
    entries: Mutex<BTreeMap<String, StoredEntry>>,
}

impl MemoryCacheStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<StoredEntry>, CacheError> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, entry: StoredEntry) -> Result<(), CacheError> {
        self.entries.lock().unwrap().insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }

    async fn clear_by_pattern(&self, prefix: &str) -> Result<usize, CacheError> {
        let mut entries = self.entries.lock().unwrap();
        let matching: Vec<String> = entries
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        for key in &matching {
            entries.remove(key);
        }
        Ok(matching.len())
    }

    async fn scan(&self) -> Result<Vec<(String, StoredEntry)>, CacheError> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}
