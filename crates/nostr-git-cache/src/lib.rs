// Distributed under the MIT software license

//! Durable per-repo cache (§4.F): ref-map records, merge-analysis
//! results and commit-history pages, behind a pattern-clearable
//! key/value capability.
//!
//! `CACHE_MODE` (`off` / `per-session` / `per-repo-batch`) governs when
//! writes actually reach the backing [`CacheStore`] — the distilled
//! spec names the flag without saying what it does; the behavior here
//! is recorded as a resolved Open Question in this repo's design notes.

mod error;
mod record;
mod store;

pub use error::CacheError;
pub use record::{CachedMergeOutcome, CachedRef, CommitHistoryPage, DataLevel, MergeAnalysisRecord, RepoCacheRecord};
pub use store::{CacheStore, MemoryCacheStore, StoredEntry};

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, trace};

const SEVEN_DAYS_SECS: i64 = 7 * 24 * 60 * 60;

/// When buffered writes are flushed to the backing [`CacheStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    /// Every `set` flushes immediately.
    #[default]
    Off,
    /// Writes accumulate for the life of the `RepoCache` and flush on
    /// an explicit [`RepoCache::flush`].
    PerSession,
    /// Writes accumulate per repo id and flush on an explicit
    /// [`RepoCache::flush_repo`], or on [`RepoCache::flush`] for all
    /// repos at once.
    PerRepoBatch,
}

fn repo_key(repo_id: &str) -> String {
    format!("repo/{repo_id}")
}

fn merge_key(repo_id: &str, patch_id: &str, target: &str) -> String {
    format!("merge/{repo_id}/{patch_id}/{target}")
}

fn commits_key(repo_id: &str, branch: &str) -> String {
    format!("commits/{repo_id}/{branch}")
}

/// Which repo id a buffered key belongs to, for `per-repo-batch` flushing.
fn repo_id_of_key(key: &str) -> Option<&str> {
    key.split('/').nth(1)
}

/// Repo cache: typed accessors over a [`CacheStore`], with TTL cleanup
/// and mode-gated write buffering.
pub struct RepoCache {
    store: Arc<dyn CacheStore>,
    mode: CacheMode,
    pending: Mutex<HashMap<String, StoredEntry>>,
}

impl RepoCache {
    /// New cache over `store`, flushing writes according to `mode`.
    pub fn new(store: Arc<dyn CacheStore>, mode: CacheMode) -> Self {
        Self {
            store,
            mode,
            pending: Mutex::new(HashMap::new()),
        }
    }

    async fn write(&self, key: String, entry: StoredEntry) -> Result<(), CacheError> {
        match self.mode {
            CacheMode::Off => self.store.set(&key, entry).await,
            CacheMode::PerSession | CacheMode::PerRepoBatch => {
                self.pending.lock().await.insert(key, entry);
                Ok(())
            }
        }
    }

    async fn read(&self, key: &str) -> Result<Option<StoredEntry>, CacheError> {
        if let Some(entry) = self.pending.lock().await.get(key).cloned() {
            return Ok(Some(entry));
        }
        self.store.get(key).await
    }

    /// Flush every buffered write to the backing store, regardless of mode.
    #[tracing::instrument(skip(self))]
    pub async fn flush(&self) -> Result<(), CacheError> {
        let mut pending = self.pending.lock().await;
        let count = pending.len();
        for (key, entry) in pending.drain() {
            self.store.set(&key, entry).await?;
        }
        debug!(flushed = count, "cache flush complete");
        Ok(())
    }

    /// Flush only the buffered writes belonging to `repo_id` (meaningful
    /// under [`CacheMode::PerRepoBatch`]; a no-op subset under
    /// [`CacheMode::PerSession`], which just flushes those keys early).
    #[tracing::instrument(skip(self))]
    pub async fn flush_repo(&self, repo_id: &str) -> Result<(), CacheError> {
        let mut pending = self.pending.lock().await;
        let matching: Vec<String> = pending
            .keys()
            .filter(|k| repo_id_of_key(k) == Some(repo_id))
            .cloned()
            .collect();
        for key in matching {
            if let Some(entry) = pending.remove(&key) {
                self.store.set(&key, entry).await?;
            }
        }
        Ok(())
    }

    fn encode<T: serde::Serialize>(value: &T, now: i64) -> Result<StoredEntry, CacheError> {
        Ok(StoredEntry {
            value: serde_json::to_string(value).map_err(|e| CacheError::Backend(e.to_string()))?,
            written_at: now,
        })
    }

    fn decode<T: serde::de::DeserializeOwned>(key: &str, entry: StoredEntry) -> Result<T, CacheError> {
        serde_json::from_str(&entry.value).map_err(|source| CacheError::Corrupt { key: key.to_string(), source })
    }

    /// Fetch a repo's cached state.
    pub async fn get_repo(&self, repo_id: &str) -> Result<Option<RepoCacheRecord>, CacheError> {
        let key = repo_key(repo_id);
        match self.read(&key).await? {
            Some(entry) => Ok(Some(Self::decode(&key, entry)?)),
            None => Ok(None),
        }
    }

    /// Store a repo's cached state, stamping `last_updated` to `now`.
    pub async fn set_repo(&self, repo_id: &str, mut record: RepoCacheRecord, now: i64) -> Result<(), CacheError> {
        record.last_updated = now;
        let key = repo_key(repo_id);
        trace!(repo_id, data_level = ?record.data_level, "caching repo record");
        self.write(key, Self::encode(&record, now)?).await
    }

    /// Remove a repo's cached state (used when a repo is deleted, per
    /// the clone ladder's `none` reset).
    pub async fn delete_repo(&self, repo_id: &str) -> Result<(), CacheError> {
        self.pending.lock().await.remove(&repo_key(repo_id));
        self.store.delete(&repo_key(repo_id)).await
    }

    /// Fetch a cached merge-analysis result.
    pub async fn get_merge_analysis(
        &self,
        repo_id: &str,
        patch_id: &str,
        target: &str,
    ) -> Result<Option<MergeAnalysisRecord>, CacheError> {
        let key = merge_key(repo_id, patch_id, target);
        match self.read(&key).await? {
            Some(entry) => Ok(Some(Self::decode(&key, entry)?)),
            None => Ok(None),
        }
    }

    /// Cache a merge-analysis result.
    pub async fn set_merge_analysis(
        &self,
        repo_id: &str,
        patch_id: &str,
        target: &str,
        record: MergeAnalysisRecord,
        now: i64,
    ) -> Result<(), CacheError> {
        let key = merge_key(repo_id, patch_id, target);
        self.write(key, Self::encode(&record, now)?).await
    }

    /// Fetch a cached commit-history page.
    pub async fn get_commit_history(
        &self,
        repo_id: &str,
        branch: &str,
    ) -> Result<Option<CommitHistoryPage>, CacheError> {
        let key = commits_key(repo_id, branch);
        match self.read(&key).await? {
            Some(entry) => Ok(Some(Self::decode(&key, entry)?)),
            None => Ok(None),
        }
    }

    /// Cache a commit-history page.
    pub async fn set_commit_history(
        &self,
        repo_id: &str,
        branch: &str,
        page: CommitHistoryPage,
        now: i64,
    ) -> Result<(), CacheError> {
        let key = commits_key(repo_id, branch);
        self.write(key, Self::encode(&page, now)?).await
    }

    /// Drop every cached entry for a repo (all three key families).
    pub async fn clear_repo(&self, repo_id: &str) -> Result<usize, CacheError> {
        self.pending
            .lock()
            .await
            .retain(|k, _| repo_id_of_key(k) != Some(repo_id));
        self.store.clear_by_pattern(&format!("repo/{repo_id}")).await?;
        let merge_cleared = self.store.clear_by_pattern(&format!("merge/{repo_id}/")).await?;
        let commits_cleared = self.store.clear_by_pattern(&format!("commits/{repo_id}/")).await?;
        Ok(1 + merge_cleared + commits_cleared)
    }

    /// Evict entries with `lastUpdated < now - 7 days` (§4.F).
    #[tracing::instrument(skip(self))]
    pub async fn cleanup(&self, now: i64) -> Result<usize, CacheError> {
        self.flush().await?;
        let entries = self.store.scan().await?;
        let mut evicted = 0;
        for (key, entry) in entries {
            if now.saturating_sub(entry.written_at) >= SEVEN_DAYS_SECS {
                self.store.delete(&key).await?;
                evicted += 1;
            }
        }
        debug!(evicted, "cache cleanup complete");
        Ok(evicted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh_record(now: i64) -> RepoCacheRecord {
        RepoCacheRecord {
            head_commit: Some("abc123".into()),
            data_level: DataLevel::Shallow,
            branches: vec![CachedRef { name: "main".into(), commit: "abc123".into() }],
            tags: vec![],
            clone_urls: vec!["https://example.com/repo.git".into()],
            last_updated: now,
        }
    }

    #[tokio::test]
    async fn off_mode_writes_through_immediately() {
        let store = Arc::new(MemoryCacheStore::new());
        let cache = RepoCache::new(store.clone(), CacheMode::Off);
        cache.set_repo("repo1", fresh_record(0), 1_000).await.unwrap();
        assert!(store.get("repo/repo1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn per_session_mode_buffers_until_flush() {
        let store = Arc::new(MemoryCacheStore::new());
        let cache = RepoCache::new(store.clone(), CacheMode::PerSession);
        cache.set_repo("repo1", fresh_record(0), 1_000).await.unwrap();
        assert!(store.get("repo/repo1").await.unwrap().is_none());
        assert!(cache.get_repo("repo1").await.unwrap().is_some());
        cache.flush().await.unwrap();
        assert!(store.get("repo/repo1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn per_repo_batch_flush_is_scoped() {
        let store = Arc::new(MemoryCacheStore::new());
        let cache = RepoCache::new(store.clone(), CacheMode::PerRepoBatch);
        cache.set_repo("repo1", fresh_record(0), 1_000).await.unwrap();
        cache.set_repo("repo2", fresh_record(0), 1_000).await.unwrap();
        cache.flush_repo("repo1").await.unwrap();
        assert!(store.get("repo/repo1").await.unwrap().is_some());
        assert!(store.get("repo/repo2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn cleanup_evicts_entries_older_than_seven_days() {
        let store = Arc::new(MemoryCacheStore::new());
        let cache = RepoCache::new(store.clone(), CacheMode::Off);
        cache.set_repo("stale", fresh_record(0), 0).await.unwrap();
        cache.set_repo("live", fresh_record(0), 500_000).await.unwrap();
        let evicted = cache.cleanup(700_000).await.unwrap();
        assert_eq!(evicted, 1);
        assert!(cache.get_repo("stale").await.unwrap().is_none());
        assert!(cache.get_repo("live").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn is_fresh_within_one_hour() {
        let record = fresh_record(1_000);
        assert!(record.is_fresh(1_000 + 3_000));
        assert!(!record.is_fresh(1_000 + 3_601));
    }
}
