// Distributed under the MIT software license

//! Patch Applier & Pusher (§4.J): turn a unified diff into a commit on
//! a fully-cloned working tree, then push it, falling back to a topic
//! ref when the remote protects the target branch.

use std::path::Path;
use std::sync::Arc;

use nostr_git_objects::{CommitAuthor, FileChange, ObjectStore, ObjectStoreError, PushOptions, ResolveOptions};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::diff::{apply_hunks, parse_unified_diff, FileDiffKind};
use crate::error::MergeError;

/// Substrings in a push rejection that indicate a protected branch or
/// pre-receive hook, rather than an ordinary non-fast-forward refusal
/// (§4.J step 5, §7 `Rejected`).
const PROTECTED_REF_MARKERS: &[&str] = &["protected", "pre-receive", "hook declined", "permission"];

/// Committer identity and commit message the applier uses for the
/// merge commit it produces.
#[derive(Debug, Clone)]
pub struct PatchCommitInfo {
    /// Unified diff content.
    pub diff_content: String,
    /// Commit message for the applied commit.
    pub message: String,
    /// Author identity.
    pub author: CommitAuthor,
    /// First 8 hex chars of the originating patch event id, used to
    /// name the topic fallback ref.
    pub short_event_id: String,
}

/// A non-fatal diagnostic recorded alongside a successful apply/push (§4.J step 5).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushDiagnostic {
    /// Machine-readable code, e.g. `"FALLBACK_TOPIC_PUSH"`.
    pub code: String,
    /// Human-readable detail.
    pub message: String,
}

/// Result of [`PatchApplier::apply_and_push`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyOutcome {
    /// Whether the whole operation (apply + a push to some ref) succeeded.
    pub success: bool,
    /// Oid of the commit the applier produced.
    pub commit_oid: String,
    /// `"origin"` or `"origin:grasp/patch-<short>"` entries, one per
    /// remote the commit actually reached.
    pub pushed_remotes: Vec<String>,
    /// Non-fatal diagnostics (e.g. the topic-fallback notice).
    pub push_errors: Vec<PushDiagnostic>,
}

/// Applies a patch's unified diff to a working tree and pushes the result.
pub struct PatchApplier {
    store: Arc<dyn ObjectStore>,
}

impl PatchApplier {
    /// New applier over `store`.
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Run the full §4.J pipeline against an already fully-cloned `dest`,
    /// checked out to `target_branch`.
    pub async fn apply_and_push(
        &self,
        dest: &Path,
        target_branch: &str,
        patch: &PatchCommitInfo,
    ) -> Result<ApplyOutcome, MergeError> {
        self.store
            .resolve_ref(dest, &format!("refs/heads/{target_branch}"), ResolveOptions::default())
            .await
            .map_err(|e| MergeError::object("resolve_ref", dest, e))?
            .ok_or_else(|| MergeError::InvalidRefspec { refname: target_branch.to_string(), repo_dir: dest.to_path_buf() })?;

        // Step 2: parse, rejecting unsupported change kinds.
        let file_diffs = parse_unified_diff(&patch.diff_content)?;

        // Step 3: apply each file operation; bail if nothing actually changed.
        let mut changes = Vec::with_capacity(file_diffs.len());
        for file_diff in &file_diffs {
            let change = match file_diff.kind {
                FileDiffKind::Delete => FileChange::Delete { path: file_diff.path.clone() },
                FileDiffKind::Add | FileDiffKind::Modify => {
                    let old_content = match self.store.read_blob(dest, target_branch, &file_diff.path).await {
                        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                        Err(ObjectStoreError::UnknownObject(_)) => String::new(),
                        Err(e) => return Err(MergeError::object("read_blob", dest, e)),
                    };
                    let new_content = apply_hunks(&old_content, file_diff);
                    if new_content == old_content {
                        continue;
                    }
                    FileChange::Write { path: file_diff.path.clone(), contents: new_content.into_bytes() }
                }
            };
            changes.push(change);
        }
        if changes.is_empty() {
            return Err(MergeError::NoChangesToApply(dest.to_path_buf()));
        }
        self.store.apply_changes(dest, &changes).await.map_err(|e| MergeError::object("apply_changes", dest, e))?;

        // Step 4: commit.
        let commit_oid = self
            .store
            .commit(dest, &patch.message, patch.author.clone())
            .await
            .map_err(|e| MergeError::object("commit", dest, e))?;
        info!(commit_oid, target_branch, "applied patch");

        // Step 5: push, falling back to a topic ref on protected-branch rejection.
        let refspec = format!("refs/heads/{target_branch}:refs/heads/{target_branch}");
        match self.store.push(dest, "origin", &refspec, PushOptions::default()).await {
            Ok(_) => Ok(ApplyOutcome {
                success: true,
                commit_oid,
                pushed_remotes: vec!["origin".to_string()],
                push_errors: Vec::new(),
            }),
            Err(ObjectStoreError::PushRejected(reason)) if is_protected_rejection(&reason) => {
                let topic = format!("grasp/patch-{}", patch.short_event_id);
                let topic_refspec = format!("refs/heads/{target_branch}:refs/heads/{topic}");
                warn!(reason, topic, "push to target rejected, falling back to topic ref");
                self.store
                    .push(dest, "origin", &topic_refspec, PushOptions::default())
                    .await
                    .map_err(|e| MergeError::object("push", dest, e))?;
                Ok(ApplyOutcome {
                    success: true,
                    commit_oid,
                    pushed_remotes: vec![format!("origin:{topic}")],
                    push_errors: vec![PushDiagnostic {
                        code: "FALLBACK_TOPIC_PUSH".to_string(),
                        message: reason,
                    }],
                })
            }
            Err(ObjectStoreError::PushRejected(reason)) => Err(MergeError::Rejected { remote: "origin".to_string(), reason }),
            Err(e) => Err(MergeError::object("push", dest, e)),
        }
    }
}

fn is_protected_rejection(reason: &str) -> bool {
    let lower = reason.to_lowercase();
    PROTECTED_REF_MARKERS.iter().any(|m| lower.contains(m))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nostr_git_objects::{CloneOptions, CommitInfo, MemoryObjectStore};
    use std::path::PathBuf;

    fn author() -> CommitAuthor {
        CommitAuthor { name: "Ada".into(), email: "a@x.com".into() }
    }

    async fn prepared_repo(store: &MemoryObjectStore, url: &str) -> PathBuf {
        store.seed_commit(
            url,
            "main",
            CommitInfo { oid: "c1".into(), parents: vec![], author_name: "Ada".into(), author_email: "a@x.com".into(), author_time: 0, message: "init".into() },
        );
        store.seed_blob(url, "c1", "file.txt", "line1\nline2\n");
        let dest = PathBuf::from("/work/repo");
        store.clone_repo(url, &dest, CloneOptions::default()).await.unwrap();
        store.checkout(&dest, "main").await.unwrap();
        dest
    }

    #[tokio::test]
    async fn applies_and_pushes_to_origin() {
        let store = Arc::new(MemoryObjectStore::new());
        let url = "https://example.com/repo.git";
        let dest = prepared_repo(&store, url).await;

        let applier = PatchApplier::new(store.clone());
        let patch = PatchCommitInfo {
            diff_content: "diff --git a/file.txt b/file.txt\nindex aaa..bbb 100644\n--- a/file.txt\n+++ b/file.txt\n@@ -1,2 +1,2 @@\n-line1\n+line1 patched\n line2\n".into(),
            message: "apply patch".into(),
            author: author(),
            short_event_id: "deadbeef".into(),
        };
        let outcome = applier.apply_and_push(&dest, "main", &patch).await.unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.pushed_remotes, vec!["origin".to_string()]);
        assert!(outcome.push_errors.is_empty());
    }

    #[tokio::test]
    async fn no_op_diff_is_rejected() {
        let store = Arc::new(MemoryObjectStore::new());
        let url = "https://example.com/repo.git";
        let dest = prepared_repo(&store, url).await;

        let applier = PatchApplier::new(store.clone());
        let patch = PatchCommitInfo {
            diff_content: "diff --git a/file.txt b/file.txt\nindex aaa..bbb 100644\n--- a/file.txt\n+++ b/file.txt\n@@ -1,2 +1,2 @@\n line1\n line2\n".into(),
            message: "no-op".into(),
            author: author(),
            short_event_id: "deadbeef".into(),
        };
        let err = applier.apply_and_push(&dest, "main", &patch).await.unwrap_err();
        assert!(matches!(err, MergeError::NoChangesToApply(_)));
    }

    #[tokio::test]
    async fn ordinary_non_fast_forward_rejection_is_not_silently_retried() {
        let store = Arc::new(MemoryObjectStore::new());
        let url = "https://example.com/repo.git";
        let dest = prepared_repo(&store, url).await;

        // Remote advances past what the clone has, unrelated to the
        // commit the applier is about to produce locally.
        store.seed_commit(
            url,
            "main",
            CommitInfo { oid: "c1-remote".into(), parents: vec!["c1".into()], author_name: "Bob".into(), author_email: "b@x.com".into(), author_time: 0, message: "remote advance".into() },
        );

        let applier = PatchApplier::new(store.clone());
        let patch = PatchCommitInfo {
            diff_content: "diff --git a/other.txt b/other.txt\nnew file mode 100644\nindex 0000000..aaaaaaa\n--- /dev/null\n+++ b/other.txt\n@@ -0,0 +1,1 @@\n+hi\n".into(),
            message: "apply patch".into(),
            author: author(),
            short_event_id: "abcdef0123".into(),
        };
        let err = applier.apply_and_push(&dest, "main", &patch).await.unwrap_err();
        assert!(matches!(err, MergeError::Rejected { .. }), "expected a hard rejection, not a silent fallback: {err:?}");
    }

    struct ProtectedBranchStore {
        inner: Arc<MemoryObjectStore>,
    }

    #[async_trait::async_trait]
    impl ObjectStore for ProtectedBranchStore {
        async fn clone_repo(&self, url: &str, dest: &Path, opts: nostr_git_objects::CloneOptions) -> Result<(), ObjectStoreError> {
            self.inner.clone_repo(url, dest, opts).await
        }
        async fn fetch(&self, dest: &Path, remote: &str, opts: nostr_git_objects::FetchOptions) -> Result<nostr_git_objects::FetchOutcome, ObjectStoreError> {
            self.inner.fetch(dest, remote, opts).await
        }
        async fn push(&self, dest: &Path, remote: &str, refspec: &str, opts: PushOptions) -> Result<nostr_git_objects::PushOutcome, ObjectStoreError> {
            let (_, target) = refspec.split_once(':').unwrap_or((refspec, refspec));
            if target == "refs/heads/main" {
                return Err(ObjectStoreError::PushRejected("remote rejected (protected branch hook declined)".into()));
            }
            self.inner.push(dest, remote, refspec, opts).await
        }
        async fn list_server_refs(&self, url: &str) -> Result<Vec<nostr_git_objects::RemoteRef>, ObjectStoreError> {
            self.inner.list_server_refs(url).await
        }
        async fn resolve_ref(&self, dest: &Path, ref_name: &str, opts: ResolveOptions) -> Result<Option<String>, ObjectStoreError> {
            self.inner.resolve_ref(dest, ref_name, opts).await
        }
        async fn write_ref(&self, dest: &Path, ref_name: &str, value: &str, opts: nostr_git_objects::WriteRefOptions) -> Result<(), ObjectStoreError> {
            self.inner.write_ref(dest, ref_name, value, opts).await
        }
        async fn read_blob(&self, dest: &Path, oid: &str, path: &str) -> Result<Vec<u8>, ObjectStoreError> {
            self.inner.read_blob(dest, oid, path).await
        }
        async fn read_commit(&self, dest: &Path, oid: &str) -> Result<CommitInfo, ObjectStoreError> {
            self.inner.read_commit(dest, oid).await
        }
        async fn walk(&self, dest: &Path, oid: &str) -> Result<Vec<String>, ObjectStoreError> {
            self.inner.walk(dest, oid).await
        }
        async fn log(&self, dest: &Path, branch: &str, depth: usize) -> Result<Vec<CommitInfo>, ObjectStoreError> {
            self.inner.log(dest, branch, depth).await
        }
        async fn find_merge_base(&self, dest: &Path, a: &str, b: &str) -> Result<Option<String>, ObjectStoreError> {
            self.inner.find_merge_base(dest, a, b).await
        }
        async fn list_branches(&self, dest: &Path, remote: Option<&str>) -> Result<Vec<String>, ObjectStoreError> {
            self.inner.list_branches(dest, remote).await
        }
        async fn list_remotes(&self, dest: &Path) -> Result<Vec<String>, ObjectStoreError> {
            self.inner.list_remotes(dest).await
        }
        async fn checkout(&self, dest: &Path, branch: &str) -> Result<(), ObjectStoreError> {
            self.inner.checkout(dest, branch).await
        }
        async fn status_matrix(&self, dest: &Path) -> Result<Vec<nostr_git_objects::StatusRow>, ObjectStoreError> {
            self.inner.status_matrix(dest).await
        }
        async fn set_config(&self, dest: &Path, key: &str, value: &str) -> Result<(), ObjectStoreError> {
            self.inner.set_config(dest, key, value).await
        }
        async fn add_remote(&self, dest: &Path, name: &str, url: &str) -> Result<(), ObjectStoreError> {
            self.inner.add_remote(dest, name, url).await
        }
        async fn is_shallow(&self, dest: &Path) -> Result<bool, ObjectStoreError> {
            self.inner.is_shallow(dest).await
        }
        async fn apply_changes(&self, dest: &Path, changes: &[FileChange]) -> Result<(), ObjectStoreError> {
            self.inner.apply_changes(dest, changes).await
        }
        async fn commit(&self, dest: &Path, message: &str, author: CommitAuthor) -> Result<String, ObjectStoreError> {
            self.inner.commit(dest, message, author).await
        }
    }

    #[tokio::test]
    async fn s7_topic_fallback_on_protected_branch() {
        let inner = Arc::new(MemoryObjectStore::new());
        let url = "https://example.com/repo.git";
        let dest = prepared_repo(&inner, url).await;
        let store: Arc<dyn ObjectStore> = Arc::new(ProtectedBranchStore { inner });

        let applier = PatchApplier::new(store.clone());
        let patch = PatchCommitInfo {
            diff_content: "diff --git a/other.txt b/other.txt\nnew file mode 100644\nindex 0000000..aaaaaaa\n--- /dev/null\n+++ b/other.txt\n@@ -0,0 +1,1 @@\n+hi\n".into(),
            message: "apply patch".into(),
            author: author(),
            short_event_id: "abcdef0123".into(),
        };
        let outcome = applier.apply_and_push(&dest, "main", &patch).await.unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.pushed_remotes, vec!["origin:grasp/patch-abcdef0123".to_string()]);
        assert_eq!(outcome.push_errors[0].code, "FALLBACK_TOPIC_PUSH");
    }

    #[test]
    fn recognizes_protected_ref_rejection_text() {
        assert!(is_protected_rejection("remote rejected (protected branch hook declined)"));
        assert!(is_protected_rejection("pre-receive hook declined"));
        assert!(!is_protected_rejection("non-fast-forward update of refs/heads/main"));
    }
}
