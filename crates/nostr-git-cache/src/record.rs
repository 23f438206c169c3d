// Distributed under the MIT software license

use nostr_git_objects::CommitInfo;
use serde::{Deserialize, Serialize};

/// Where a local clone sits on the `none → refs → shallow → full` ladder.
///
/// Owned by the cache (rather than the clone-ladder crate) because a
/// `RepoCacheRecord` needs to name it and `nostr-git-cache` sits below
/// `nostr-git-clone` in the dependency graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DataLevel {
    /// No local clone.
    None,
    /// Refs and ancestry only, no objects.
    Refs,
    /// Shallow clone, history truncated.
    Shallow,
    /// Full clone.
    Full,
}

/// A named ref and the commit it currently resolves to, as recorded in
/// a [`RepoCacheRecord`]'s `branches`/`tags` vectors (§3: `branches:
/// [{name,commit}]`, `tags?: [{name,commit}]`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedRef {
    /// Branch or tag name, unqualified (e.g. `main`, not `refs/heads/main`).
    pub name: String,
    /// Commit oid the ref points at.
    pub commit: String,
}

/// Durable per-repo record: `{headCommit, dataLevel, branches: [{name,commit}], tags: [{name,commit}], cloneUrls, lastUpdated}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoCacheRecord {
    /// Commit the default branch currently resolves to, if known.
    pub head_commit: Option<String>,
    /// Materialization level of the local clone.
    pub data_level: DataLevel,
    /// Known local branches, each with the commit it resolves to.
    pub branches: Vec<CachedRef>,
    /// Known tags, each with the commit it resolves to.
    pub tags: Vec<CachedRef>,
    /// Clone URLs tried for this repo, in the order last used.
    pub clone_urls: Vec<String>,
    /// Unix seconds this record was last refreshed.
    pub last_updated: i64,
}

impl RepoCacheRecord {
    /// Whether this record is fresh enough for `smartInitializeRepo` to
    /// skip a ladder transition (§4.G: "if cache is fresh (<1h)... serve
    /// from cache").
    pub fn is_fresh(&self, now: i64) -> bool {
        now.saturating_sub(self.last_updated) < 3600
    }
}

/// Outcome of a merge-analysis run, cached per `(repoId, patchId, target)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CachedMergeOutcome {
    /// No conflicts; patch applies cleanly.
    Clean,
    /// Conflicting hunks were found.
    Conflicts,
    /// Patch commit (or an equivalent) is already present on the target.
    UpToDate,
    /// Target has moved ahead of what the patch's base branch knew about.
    Diverged,
    /// Analysis could not complete.
    Error,
}

/// Cached merge-analysis result, keyed `merge/<repoId>/<patchId>/<target>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeAnalysisRecord {
    /// Result classification.
    pub outcome: CachedMergeOutcome,
    /// Whether the merge would be a pure fast-forward.
    pub fast_forward: bool,
    /// Unix seconds this analysis was computed.
    pub computed_at: i64,
}

/// A page of commit history, keyed `commits/<repoId>/<branch>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitHistoryPage {
    /// Commits in this page, most recent first.
    pub commits: Vec<CommitInfo>,
    /// How many commits deep this page was fetched (the `log` depth
    /// that produced it), so callers can tell a page fetched at depth
    /// 50 apart from one fetched at depth 500 (§4.G ladder decisions).
    pub depth: u32,
    /// Unix seconds this page was fetched.
    pub fetched_at: i64,
}
