// Distributed under the MIT software license

//! Safe-Push Gate (§4.K): an ordered preflight that aborts before any
//! network write the moment one condition fails.

use std::path::Path;

use nostr_git_cache::RepoCacheRecord;
use nostr_git_objects::{Fs, ObjectStore};
use nostr::Timestamp;
use serde::{Deserialize, Serialize};

use crate::error::MergeError;

/// Provider name that opts a repo out of the remote-ahead check: a
/// native relay backend has no separate "remote" to race against.
pub const NATIVE_RELAY_PROVIDER: &str = "native-relay";

/// What the preflight found when it aborted (§4.K table, right column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PreflightReason {
    /// The working tree has uncommitted changes.
    UncommittedChanges,
    /// The local clone is shallow.
    ShallowClone,
    /// The remote has moved ahead of the cached view.
    RemoteAhead,
    /// A force push was requested but not confirmed.
    ForcePushRequiresConfirmation,
}

/// Which optional checks to run, and the force-push confirmation state.
#[derive(Debug, Clone, Default)]
pub struct PreflightOptions {
    /// Fail if the working tree has uncommitted changes.
    pub block_if_uncommitted: bool,
    /// Fail if the local clone is shallow.
    pub block_if_shallow: bool,
    /// Fail if the remote has moved ahead of what the cache knows.
    pub block_if_remote_ahead: bool,
    /// Vendor/provider name driving this push; `"native-relay"` always
    /// passes the remote-ahead check regardless of `block_if_remote_ahead`.
    pub provider: String,
    /// Whether this push is allowed to force-update the remote ref.
    pub allow_force: bool,
    /// Caller has already confirmed a destructive (force) push.
    pub confirm_destructive: bool,
}

/// What the remote's head resolved to, for the remote-ahead check. The
/// engine that owns URL fallback (outside this crate) performs the
/// actual network probe and hands the outcome in here.
#[derive(Debug, Clone)]
pub enum RemoteHeadProbe {
    /// The remote's `main`/`master` resolved to this oid.
    Resolved(String),
    /// Every mirror URL failed with a CORS/network-class error; treated
    /// permissively (§4.K: "on all-URL CORS failure it is permissive").
    AllUrlsFailed,
}

/// Outcome of [`safe_push_preflight`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreflightResult {
    /// Whether every requested check passed.
    pub success: bool,
    /// Which check failed, if any.
    pub reason: Option<PreflightReason>,
    /// Set alongside `ForcePushRequiresConfirmation`.
    pub requires_confirmation: bool,
}

impl PreflightResult {
    fn ok() -> Self {
        Self { success: true, reason: None, requires_confirmation: false }
    }

    fn fail(reason: PreflightReason) -> Self {
        let requires_confirmation = reason == PreflightReason::ForcePushRequiresConfirmation;
        Self { success: false, reason: Some(reason), requires_confirmation }
    }
}

/// Whether the cached view of a repo needs refreshing against the
/// remote before a push can safely proceed (§4.K `needsUpdate`).
///
/// - `cache` absent and the remote resolved to a head: stale, must update.
/// - Cache older than one hour: stale.
/// - Cache's `head_commit` disagrees with the resolved remote head: stale.
/// - Every mirror URL failed (`AllUrlsFailed`): permissive, not stale.
pub fn needs_update(cache: Option<&RepoCacheRecord>, probe: &RemoteHeadProbe, now: Timestamp) -> bool {
    let remote_head = match probe {
        RemoteHeadProbe::AllUrlsFailed => return false,
        RemoteHeadProbe::Resolved(oid) => oid,
    };
    match cache {
        None => true,
        Some(record) => {
            if !record.is_fresh(now.as_u64() as i64) {
                return true;
            }
            record.head_commit.as_deref() != Some(remote_head.as_str())
        }
    }
}

/// Run the ordered §4.K preflight against `dest`. `cache`/`probe` are
/// only consulted when `options.block_if_remote_ahead` is set and the
/// provider isn't `"native-relay"`.
pub async fn safe_push_preflight(
    fs: &dyn Fs,
    store: &dyn ObjectStore,
    dest: &Path,
    options: &PreflightOptions,
    cache: Option<&RepoCacheRecord>,
    probe: Option<&RemoteHeadProbe>,
    now: Timestamp,
) -> Result<PreflightResult, MergeError> {
    if !fs.exists(&dest.join(".git")).await {
        return Err(MergeError::NotCloned(dest.to_path_buf()));
    }

    if options.block_if_uncommitted {
        let rows = store.status_matrix(dest).await.map_err(|e| MergeError::object("status_matrix", dest, e))?;
        if !rows.is_empty() {
            return Ok(PreflightResult::fail(PreflightReason::UncommittedChanges));
        }
    }

    if options.block_if_shallow {
        let shallow = store.is_shallow(dest).await.map_err(|e| MergeError::object("is_shallow", dest, e))?;
        if shallow {
            return Ok(PreflightResult::fail(PreflightReason::ShallowClone));
        }
    }

    if options.block_if_remote_ahead && options.provider != NATIVE_RELAY_PROVIDER {
        if let Some(probe) = probe {
            if needs_update(cache, probe, now) {
                return Ok(PreflightResult::fail(PreflightReason::RemoteAhead));
            }
        }
    }

    if options.allow_force && !options.confirm_destructive {
        return Ok(PreflightResult::fail(PreflightReason::ForcePushRequiresConfirmation));
    }

    Ok(PreflightResult::ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nostr_git_cache::{CachedRef, DataLevel};
    use nostr_git_objects::{CloneOptions, CommitInfo, FileChange, MemoryFs, MemoryObjectStore};
    use std::path::PathBuf;

    async fn cloned_dest(store: &MemoryObjectStore, fs: &MemoryFs, url: &str) -> PathBuf {
        store.seed_commit(
            url,
            "main",
            CommitInfo { oid: "c1".into(), parents: vec![], author_name: "Ada".into(), author_email: "a@x.com".into(), author_time: 0, message: "init".into() },
        );
        let dest = PathBuf::from("/work/repo");
        store.clone_repo(url, &dest, CloneOptions::default()).await.unwrap();
        fs.write_file(&dest.join(".git").join("HEAD"), b"ref: refs/heads/main\n").await.unwrap();
        dest
    }

    #[tokio::test]
    async fn s6_rejects_uncommitted_changes() {
        let store = MemoryObjectStore::new();
        let fs = MemoryFs::new();
        let url = "https://example.com/repo.git";
        let dest = cloned_dest(&store, &fs, url).await;
        store
            .apply_changes(&dest, &[FileChange::Write { path: "file.txt".into(), contents: b"changed".to_vec() }])
            .await
            .unwrap();

        let options = PreflightOptions { block_if_uncommitted: true, ..Default::default() };
        let result = safe_push_preflight(&fs, &store, &dest, &options, None, None, Timestamp::from_secs(0)).await.unwrap();
        assert!(!result.success);
        assert_eq!(result.reason, Some(PreflightReason::UncommittedChanges));
    }

    #[tokio::test]
    async fn not_cloned_is_a_hard_error_not_a_reason() {
        let store = MemoryObjectStore::new();
        let fs = MemoryFs::new();
        let options = PreflightOptions::default();
        let err = safe_push_preflight(&fs, &store, Path::new("/nowhere"), &options, None, None, Timestamp::from_secs(0))
            .await
            .unwrap_err();
        assert!(matches!(err, MergeError::NotCloned(_)));
    }

    #[tokio::test]
    async fn clean_tree_passes_without_confirmation_required() {
        let store = MemoryObjectStore::new();
        let fs = MemoryFs::new();
        let url = "https://example.com/repo.git";
        let dest = cloned_dest(&store, &fs, url).await;

        let options = PreflightOptions { block_if_uncommitted: true, block_if_shallow: true, ..Default::default() };
        let result = safe_push_preflight(&fs, &store, &dest, &options, None, None, Timestamp::from_secs(0)).await.unwrap();
        assert!(result.success);
        assert!(!result.requires_confirmation);
    }

    #[tokio::test]
    async fn force_push_without_confirmation_requires_it() {
        let store = MemoryObjectStore::new();
        let fs = MemoryFs::new();
        let url = "https://example.com/repo.git";
        let dest = cloned_dest(&store, &fs, url).await;

        let options = PreflightOptions { allow_force: true, confirm_destructive: false, ..Default::default() };
        let result = safe_push_preflight(&fs, &store, &dest, &options, None, None, Timestamp::from_secs(0)).await.unwrap();
        assert!(!result.success);
        assert!(result.requires_confirmation);
        assert_eq!(result.reason, Some(PreflightReason::ForcePushRequiresConfirmation));
    }

    #[test]
    fn needs_update_is_permissive_on_all_url_failure() {
        assert!(!needs_update(None, &RemoteHeadProbe::AllUrlsFailed, Timestamp::from_secs(100)));
    }

    #[test]
    fn needs_update_is_true_with_no_cache_and_a_resolved_remote() {
        assert!(needs_update(None, &RemoteHeadProbe::Resolved("c1".into()), Timestamp::from_secs(100)));
    }

    #[test]
    fn needs_update_is_true_when_cache_disagrees_with_remote() {
        let record = RepoCacheRecord {
            head_commit: Some("c1".into()),
            data_level: DataLevel::Full,
            branches: vec![CachedRef { name: "main".into(), commit: "c1".into() }],
            tags: vec![],
            clone_urls: vec![],
            last_updated: 100,
        };
        assert!(needs_update(Some(&record), &RemoteHeadProbe::Resolved("c2".into()), Timestamp::from_secs(150)));
        assert!(!needs_update(Some(&record), &RemoteHeadProbe::Resolved("c1".into()), Timestamp::from_secs(150)));
    }

    #[test]
    fn needs_update_is_true_once_cache_ages_past_one_hour() {
        let record = RepoCacheRecord {
            head_commit: Some("c1".into()),
            data_level: DataLevel::Full,
            branches: vec![],
            tags: vec![],
            clone_urls: vec![],
            last_updated: 0,
        };
        assert!(needs_update(Some(&record), &RemoteHeadProbe::Resolved("c1".into()), Timestamp::from_secs(3601)));
    }
}
