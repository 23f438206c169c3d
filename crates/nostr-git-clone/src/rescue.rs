// Distributed under the MIT software license

//! Reference Rescuer (§4.H): after a shallow/single-branch clone that
//! produced no local branches, re-materialize a local branch from
//! whichever of several fallback sources yields a commit oid, then write
//! both `refs/heads/<name>` and a symbolic `HEAD` pointing at it.

use std::path::Path;

use nostr_git_objects::{FetchOptions, ObjectStore, ObjectStoreError, ResolveOptions, WriteRefOptions};
use tracing::{debug, warn};

/// Common default branch names tried in order when nothing else names one (§4.G, §4.H).
pub const COMMON_DEFAULT_BRANCHES: &[&str] = &["main", "master", "develop", "dev"];

/// Pick the branch the clone ladder should target: the reconciled
/// RefMap's `HEAD` symbolic target if it names one of the available
/// branches, else the first common default name present, else the
/// first listed branch (§4.H).
pub fn pick_default_branch(head_hint: Option<&str>, available: &[String]) -> Option<String> {
    if let Some(hint) = head_hint {
        if available.iter().any(|b| b == hint) {
            return Some(hint.to_string());
        }
    }
    for candidate in COMMON_DEFAULT_BRANCHES {
        if available.iter().any(|b| b == candidate) {
            return Some((*candidate).to_string());
        }
    }
    available.first().cloned()
}

/// Inputs to the rescuer's last-resort retry-fetch step.
#[derive(Debug, Clone, Default)]
pub struct RescueOptions {
    /// The branch name the clone ladder already believed was the default.
    pub detected_default: Option<String>,
    /// Alternate clone URLs to retry against.
    pub alternate_urls: Vec<String>,
    /// Depth to request on the retry fetch.
    pub depth: Option<u32>,
}

fn is_oid(value: &str) -> bool {
    value.len() == 40 && value.bytes().all(|b| b.is_ascii_hexdigit())
}

async fn finish(
    store: &dyn ObjectStore,
    dest: &Path,
    branch_name: &str,
    oid: String,
) -> Result<Option<String>, ObjectStoreError> {
    store
        .write_ref(dest, &format!("refs/heads/{branch_name}"), &oid, WriteRefOptions::default())
        .await?;
    store
        .write_ref(dest, "HEAD", &format!("ref: refs/heads/{branch_name}"), WriteRefOptions::default())
        .await?;
    debug!(branch = branch_name, oid = %oid, "reference rescuer recovered branch");
    Ok(Some(oid))
}

/// Attempt, in order, to recover a local branch ref: remote-tracking ref,
/// detached `HEAD` oid, `FETCH_HEAD`, first log entry, then a retry-fetch
/// of `{detectedDefault, main, master}` against each alternate clone URL
/// (§4.H). Returns the recovered oid, or `None` if every source was
/// exhausted.
pub async fn rescue_references(
    store: &dyn ObjectStore,
    dest: &Path,
    branch_name: &str,
    opts: &RescueOptions,
) -> Result<Option<String>, ObjectStoreError> {
    if let Ok(branches) = store.list_branches(dest, Some("origin")).await {
        if let Some(first) = branches.first() {
            if let Ok(Some(oid)) = store
                .resolve_ref(dest, &format!("refs/remotes/origin/{first}"), ResolveOptions::default())
                .await
            {
                return finish(store, dest, branch_name, oid).await;
            }
        }
    }

    if let Ok(Some(oid)) = store.resolve_ref(dest, "HEAD", ResolveOptions::default()).await {
        if is_oid(&oid) {
            return finish(store, dest, branch_name, oid).await;
        }
    }

    if let Ok(Some(oid)) = store.resolve_ref(dest, "FETCH_HEAD", ResolveOptions::default()).await {
        return finish(store, dest, branch_name, oid).await;
    }

    if let Ok(log) = store.log(dest, branch_name, 1).await {
        if let Some(commit) = log.first() {
            return finish(store, dest, branch_name, commit.oid.clone()).await;
        }
    }

    let mut candidates = Vec::new();
    if let Some(d) = &opts.detected_default {
        candidates.push(d.clone());
    }
    for common in ["main", "master"] {
        if !candidates.iter().any(|c| c == common) {
            candidates.push(common.to_string());
        }
    }

    for url in &opts.alternate_urls {
        if store.add_remote(dest, "rescue", url).await.is_err() {
            continue;
        }
        let fetch_opts = FetchOptions {
            deepen: opts.depth,
            unshallow: false,
        };
        if let Ok(outcome) = store.fetch(dest, "rescue", fetch_opts).await {
            for candidate in &candidates {
                if let Some(r) = outcome.updated_refs.iter().find(|r| r.name.ends_with(candidate.as_str())) {
                    return finish(store, dest, branch_name, r.oid.clone()).await;
                }
            }
        }
    }

    warn!(branch = branch_name, "reference rescuer exhausted all sources");
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nostr_git_objects::{CloneOptions, MemoryObjectStore};
    use std::path::Path;

    fn seed(store: &MemoryObjectStore, url: &str, branch: &str, oid: &str) {
        store.seed_commit(
            url,
            branch,
            nostr_git_objects::CommitInfo {
                oid: oid.to_string(),
                parents: vec![],
                author_name: "Ada".into(),
                author_email: "ada@example.com".into(),
                author_time: 0,
                message: "seed".into(),
            },
        );
    }

    #[test]
    fn default_branch_prefers_head_hint_then_common_names() {
        let available = vec!["develop".to_string(), "main".to_string()];
        assert_eq!(pick_default_branch(Some("develop"), &available), Some("develop".to_string()));
        assert_eq!(pick_default_branch(None, &available), Some("main".to_string()));
        assert_eq!(pick_default_branch(Some("missing"), &available), Some("main".to_string()));
    }

    #[test]
    fn default_branch_falls_back_to_first_listed() {
        let available = vec!["feature-x".to_string()];
        assert_eq!(pick_default_branch(None, &available), Some("feature-x".to_string()));
    }

    #[tokio::test]
    async fn rescues_from_remote_tracking_ref() {
        let store = MemoryObjectStore::new();
        seed(&store, "https://example.com/repo.git", "main", "c1");
        let dest = Path::new("/work/repo");
        store
            .clone_repo("https://example.com/repo.git", dest, CloneOptions { single_ref: None, ..Default::default() })
            .await
            .unwrap();
        // Simulate a shallow single-branch clone that produced no local `refs/heads/*`
        // by fetching into remote-tracking namespace only.
        store.fetch(dest, "origin", Default::default()).await.unwrap();

        let opts = RescueOptions::default();
        let recovered = rescue_references(&store, dest, "main", &opts).await.unwrap();
        assert_eq!(recovered, Some("c1".to_string()));
        assert_eq!(
            store.resolve_ref(dest, "refs/heads/main", Default::default()).await.unwrap(),
            Some("c1".to_string())
        );
    }
}
