// Distributed under the MIT software license

//! Clone Ladder (§4.G): the monotone `none → refs → shallow → full`
//! state machine for a single repo's local working tree, deduplicating
//! concurrent full-clone requests for the same `(repoId, branch)` and
//! always running the Reference Rescuer (§4.H) after a shallow clone.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use nostr_git_cache::{CacheError, CachedRef, DataLevel, RepoCache, RepoCacheRecord};
use nostr_git_objects::{CloneOptions, FetchOptions, ObjectStore, ObjectStoreError};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use crate::fallback::{with_url_fallback, PreferredUrlMap, DEFAULT_CLONE_TIMEOUT, DEFAULT_FETCH_TIMEOUT};
use crate::rescue::{rescue_references, RescueOptions};

/// Host substrings recognized as Nostr-git mirrors that truncate shallow
/// clones more aggressively than GitHub does, so a deeper shallow clone
/// is requested against them (§4.G).
const DEEP_MIRROR_HOSTS: &[&str] = &["relay.ngit.dev", "gitnostr.com", "grasp"];

/// Shallow depth used against ordinary hosts.
const SHALLOW_DEPTH_DEFAULT: u32 = 1;
/// Shallow depth used against [`DEEP_MIRROR_HOSTS`].
const SHALLOW_DEPTH_DEEP: u32 = 50;

/// Clone-ladder error.
#[derive(Debug, Error)]
pub enum LadderError {
    /// Underlying cache failure.
    #[error(transparent)]
    Cache(#[from] CacheError),
    /// Underlying object-store failure.
    #[error(transparent)]
    Object(#[from] ObjectStoreError),
    /// No clone URL in the candidate list produced a usable clone.
    #[error("no clone url succeeded for {repo_id}")]
    AllUrlsFailed {
        /// Repo that could not be cloned.
        repo_id: String,
    },
}

/// Whether any of `urls` points at a host recognized as needing a deeper
/// shallow clone (§4.G).
fn required_shallow_depth(urls: &[String]) -> u32 {
    let needs_depth = urls.iter().any(|u| DEEP_MIRROR_HOSTS.iter().any(|host| u.contains(host)));
    if needs_depth {
        SHALLOW_DEPTH_DEEP
    } else {
        SHALLOW_DEPTH_DEFAULT
    }
}

/// Build the canonical local directory for a repo id (§6): percent-encode
/// anything outside `[A-Za-z0-9._-/]`, then join under `root_dir`.
pub fn canonical_repo_dir(root_dir: &Path, repo_id: &str) -> PathBuf {
    let mut encoded = String::with_capacity(repo_id.len());
    for ch in repo_id.chars() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-' | '/') {
            encoded.push(ch);
        } else {
            for byte in ch.to_string().as_bytes() {
                encoded.push_str(&format!("%{byte:02X}"));
            }
        }
    }
    root_dir.join(encoded)
}

/// The clone ladder for a fleet of repos, backed by one [`ObjectStore`]
/// and one [`RepoCache`]. One instance is shared process-wide (§5: the
/// in-flight dedup map and preferred-url map are both process-wide).
pub struct CloneLadder {
    store: Arc<dyn ObjectStore>,
    cache: Arc<RepoCache>,
    preferred: Arc<PreferredUrlMap>,
    root_dir: PathBuf,
    in_flight: Mutex<HashMap<(String, String), Arc<Mutex<()>>>>,
}

impl CloneLadder {
    /// New ladder rooted at `root_dir`, e.g. `/repos`.
    pub fn new(store: Arc<dyn ObjectStore>, cache: Arc<RepoCache>, preferred: Arc<PreferredUrlMap>, root_dir: PathBuf) -> Self {
        Self {
            store,
            cache,
            preferred,
            root_dir,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// The working-tree directory a repo owns 1:1 (§3: "owned 1:1 by a
    /// repo-id... never loses its directory except on explicit delete").
    pub fn local_dir(&self, repo_id: &str) -> PathBuf {
        canonical_repo_dir(&self.root_dir, repo_id)
    }

    /// Resolve each local branch name to the commit it currently points
    /// at, so the cache record can carry `[{name,commit}]` rather than
    /// bare names (§3).
    async fn resolve_branch_refs(&self, dest: &Path, names: &[String]) -> Vec<CachedRef> {
        let mut out = Vec::with_capacity(names.len());
        for name in names {
            if let Ok(Some(commit)) = self
                .store
                .resolve_ref(dest, &format!("refs/heads/{name}"), Default::default())
                .await
            {
                out.push(CachedRef { name: name.clone(), commit });
            }
        }
        out
    }

    async fn lock_for(&self, repo_id: &str, branch: &str) -> Arc<Mutex<()>> {
        let mut map = self.in_flight.lock().await;
        map.entry((repo_id.to_string(), branch.to_string())).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }

    async fn current_level(&self, repo_id: &str) -> Result<DataLevel, LadderError> {
        Ok(self.cache.get_repo(repo_id).await?.map(|r| r.data_level).unwrap_or(DataLevel::None))
    }

    /// Persist a new data level, monotonically: a level that is not
    /// strictly greater than what is already cached is a no-op rather
    /// than a regression (§8 invariant 3).
    async fn advance(
        &self,
        repo_id: &str,
        new_level: DataLevel,
        clone_url: Option<String>,
        head_commit: Option<String>,
        branches: Vec<CachedRef>,
        now: i64,
    ) -> Result<DataLevel, LadderError> {
        let mut record = self.cache.get_repo(repo_id).await?.unwrap_or(RepoCacheRecord {
            head_commit: None,
            data_level: DataLevel::None,
            branches: Vec::new(),
            tags: Vec::new(),
            clone_urls: Vec::new(),
            last_updated: now,
        });
        if new_level > record.data_level {
            record.data_level = new_level;
        }
        if head_commit.is_some() {
            record.head_commit = head_commit;
        }
        if !branches.is_empty() {
            record.branches = branches;
        }
        if let Some(url) = clone_url {
            if !record.clone_urls.contains(&url) {
                record.clone_urls.insert(0, url);
            }
        }
        let level = record.data_level;
        self.cache.set_repo(repo_id, record, now).await?;
        Ok(level)
    }

    /// `none → refs`: advertise refs without materializing any objects.
    /// Modeled as listing server refs against each candidate URL without
    /// cloning (§4.G, §2 component G).
    #[instrument(skip(self, clone_urls))]
    pub async fn initialize_repo(&self, repo_id: &str, clone_urls: &[String], now: i64) -> Result<DataLevel, LadderError> {
        if self.current_level(repo_id).await? >= DataLevel::Refs {
            return self.current_level(repo_id).await;
        }
        let outcome = with_url_fallback(&self.preferred, repo_id, clone_urls, DEFAULT_FETCH_TIMEOUT, |url| {
            let store = self.store.clone();
            async move { store.list_server_refs(&url).await }
        })
        .await;
        let Some(refs) = outcome.value else {
            return Err(LadderError::AllUrlsFailed { repo_id: repo_id.to_string() });
        };
        let branches: Vec<CachedRef> = refs
            .iter()
            .filter_map(|r| r.name.strip_prefix("refs/heads/").map(|name| CachedRef { name: name.to_string(), commit: r.oid.clone() }))
            .collect();
        debug!(repo_id, url = ?outcome.used_url, branch_count = branches.len(), "initialized refs-only repo");
        self.advance(repo_id, DataLevel::Refs, outcome.used_url, None, branches, now).await
    }

    /// `refs → shallow` (or directly from `none`): clone with a bounded
    /// depth, then unconditionally run the Reference Rescuer and install
    /// the full-refspec fetch config, since shallow+singleBranch clones
    /// against uncooperative servers often omit both (§4.G).
    #[instrument(skip(self, clone_urls))]
    pub async fn ensure_shallow_clone(
        &self,
        repo_id: &str,
        clone_urls: &[String],
        branch_hint: Option<&str>,
        now: i64,
    ) -> Result<DataLevel, LadderError> {
        if self.current_level(repo_id).await? >= DataLevel::Shallow {
            return self.current_level(repo_id).await;
        }
        let dest = self.local_dir(repo_id);
        let depth = required_shallow_depth(clone_urls);
        let opts = CloneOptions {
            depth: Some(depth),
            single_ref: branch_hint.map(str::to_string),
            no_blobs: false,
        };

        let outcome = with_url_fallback(&self.preferred, repo_id, clone_urls, DEFAULT_CLONE_TIMEOUT, |url| {
            let store = self.store.clone();
            let dest = dest.clone();
            let opts = opts.clone();
            async move { store.clone_repo(&url, &dest, opts).await }
        })
        .await;
        let url = outcome.used_url.ok_or_else(|| LadderError::AllUrlsFailed { repo_id: repo_id.to_string() })?;

        self.store.set_config(&dest, "remote.origin.fetch", "+refs/heads/*:refs/remotes/origin/*").await?;

        let branches = self.store.list_branches(&dest, None).await.unwrap_or_default();
        let mut recovered_head = None;
        if branches.is_empty() {
            let target = branch_hint.map(str::to_string).unwrap_or_else(|| "main".to_string());
            let rescue_opts = RescueOptions {
                detected_default: branch_hint.map(str::to_string),
                alternate_urls: clone_urls.to_vec(),
                depth: Some(depth),
            };
            recovered_head = rescue_references(self.store.as_ref(), &dest, &target, &rescue_opts).await?;
        }

        let branches_after = self.store.list_branches(&dest, None).await.unwrap_or(branches);
        let resolved_branches = self.resolve_branch_refs(&dest, &branches_after).await;
        debug!(repo_id, url = %url, depth, branch_count = resolved_branches.len(), "advanced to shallow clone");
        self.advance(repo_id, DataLevel::Shallow, Some(url), recovered_head, resolved_branches, now).await
    }

    /// `shallow → full` (or directly from `none`/`refs`): deepen an
    /// existing clone to full history, or clone fresh at full depth.
    /// Deduplicated per `(repoId, branch)` so concurrent callers share
    /// one in-flight operation (§4.G).
    #[instrument(skip(self, clone_urls))]
    pub async fn ensure_full_clone(
        &self,
        repo_id: &str,
        clone_urls: &[String],
        branch: &str,
        now: i64,
    ) -> Result<DataLevel, LadderError> {
        let lock = self.lock_for(repo_id, branch).await;
        let _guard = lock.lock().await;

        if self.current_level(repo_id).await? >= DataLevel::Full {
            return self.current_level(repo_id).await;
        }

        let dest = self.local_dir(repo_id);
        let is_shallow = self.store.is_shallow(&dest).await.unwrap_or(true);
        let url = if is_shallow && self.store.list_remotes(&dest).await.map(|r| !r.is_empty()).unwrap_or(false) {
            self.store
                .fetch(&dest, "origin", FetchOptions { deepen: None, unshallow: true })
                .await?;
            self.preferred.get(repo_id)
        } else {
            let outcome = with_url_fallback(&self.preferred, repo_id, clone_urls, DEFAULT_CLONE_TIMEOUT, |url| {
                let store = self.store.clone();
                let dest = dest.clone();
                async move { store.clone_repo(&url, &dest, CloneOptions::default()).await }
            })
            .await;
            Some(outcome.used_url.ok_or_else(|| LadderError::AllUrlsFailed { repo_id: repo_id.to_string() })?)
        };

        let head_commit = self.store.resolve_ref(&dest, &format!("refs/heads/{branch}"), Default::default()).await?;
        let branches = self.store.list_branches(&dest, None).await.unwrap_or_default();
        let resolved_branches = self.resolve_branch_refs(&dest, &branches).await;
        debug!(repo_id, branch, "advanced to full clone");
        self.advance(repo_id, DataLevel::Full, url, head_commit, resolved_branches, now).await
    }

    /// §4.G `smartInitializeRepo`: serve from cache if fresh (<1h) and
    /// not `force`d; else sync the existing local dir in place; else do
    /// a full bootstrap from scratch.
    #[instrument(skip(self, clone_urls))]
    pub async fn smart_initialize_repo(
        &self,
        repo_id: &str,
        clone_urls: &[String],
        branch: &str,
        force: bool,
        now: i64,
    ) -> Result<DataLevel, LadderError> {
        if let Some(record) = self.cache.get_repo(repo_id).await? {
            if !force && record.is_fresh(now) {
                return Ok(record.data_level);
            }
            if record.data_level != DataLevel::None {
                // Local dir exists: sync in place rather than re-cloning.
                return self.ensure_full_clone(repo_id, clone_urls, branch, now).await;
            }
        }
        self.initialize_repo(repo_id, clone_urls, now).await?;
        self.ensure_shallow_clone(repo_id, clone_urls, Some(branch), now).await
    }

    /// Reset a repo to `none`: drop its cache record. The working
    /// directory itself is the caller's (facade's) responsibility to
    /// remove via [`nostr_git_objects::Fs`] (§3: "destroyed on explicit
    /// repo deletion").
    pub async fn delete_repo(&self, repo_id: &str) -> Result<(), LadderError> {
        self.cache.delete_repo(repo_id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nostr_git_cache::{CacheMode, MemoryCacheStore};
    use nostr_git_objects::{CommitInfo, MemoryObjectStore};

    fn make_ladder() -> (CloneLadder, Arc<MemoryObjectStore>) {
        let store = Arc::new(MemoryObjectStore::new());
        let cache = Arc::new(RepoCache::new(Arc::new(MemoryCacheStore::new()), CacheMode::Off));
        let preferred = Arc::new(PreferredUrlMap::new());
        let ladder = CloneLadder::new(store.clone(), cache, preferred, PathBuf::from("/repos"));
        (ladder, store)
    }

    fn seed(store: &MemoryObjectStore, url: &str) {
        store.seed_commit(
            url,
            "main",
            CommitInfo {
                oid: "c1".into(),
                parents: vec![],
                author_name: "Ada".into(),
                author_email: "ada@example.com".into(),
                author_time: 0,
                message: "init".into(),
            },
        );
    }

    #[test]
    fn canonical_dir_percent_encodes_disallowed_chars() {
        let dir = canonical_repo_dir(Path::new("/repos"), "owner/repo with space");
        assert_eq!(dir, Path::new("/repos/owner/repo%20with%20space"));
    }

    #[tokio::test]
    async fn ladder_advances_monotonically_through_every_rung() {
        let (ladder, store) = make_ladder();
        let url = "https://example.com/repo.git".to_string();
        seed(&store, &url);

        let refs_level = ladder.initialize_repo("o/r", &[url.clone()], 1_000).await.unwrap();
        assert_eq!(refs_level, DataLevel::Refs);

        let shallow_level = ladder.ensure_shallow_clone("o/r", &[url.clone()], Some("main"), 1_000).await.unwrap();
        assert_eq!(shallow_level, DataLevel::Shallow);

        let full_level = ladder.ensure_full_clone("o/r", &[url.clone()], "main", 1_000).await.unwrap();
        assert_eq!(full_level, DataLevel::Full);

        // Calling an earlier rung again is a no-op: level never regresses.
        let refs_again = ladder.initialize_repo("o/r", &[url], 2_000).await.unwrap();
        assert_eq!(refs_again, DataLevel::Full);
    }

    #[tokio::test]
    async fn concurrent_full_clone_requests_share_one_operation() {
        let (ladder, store) = make_ladder();
        let url = "https://example.com/repo.git".to_string();
        seed(&store, &url);
        let ladder = Arc::new(ladder);

        let a = {
            let ladder = ladder.clone();
            let url = url.clone();
            tokio::spawn(async move { ladder.ensure_full_clone("o/r", &[url], "main", 1_000).await })
        };
        let b = {
            let ladder = ladder.clone();
            let url = url.clone();
            tokio::spawn(async move { ladder.ensure_full_clone("o/r", &[url], "main", 1_000).await })
        };

        let (ra, rb) = tokio::join!(a, b);
        assert_eq!(ra.unwrap().unwrap(), DataLevel::Full);
        assert_eq!(rb.unwrap().unwrap(), DataLevel::Full);
    }

    #[tokio::test]
    async fn delete_resets_to_none() {
        let (ladder, store) = make_ladder();
        let url = "https://example.com/repo.git".to_string();
        seed(&store, &url);
        ladder.initialize_repo("o/r", &[url], 1_000).await.unwrap();
        ladder.delete_repo("o/r").await.unwrap();
        assert_eq!(ladder.current_level("o/r").await.unwrap(), DataLevel::None);
    }
}
