// Distributed under the MIT software license

//! Merge Analyzer (§4.I): dry-run three-way merge classification against
//! a moving target branch, without producing a merge commit.
//!
//! Takes an already-materialized working tree (the clone ladder's job,
//! one layer up in [`nostr-git-clone`]) and an already-fetched origin;
//! this crate only reads local objects, so it stays free of the
//! network-fallback machinery that crate owns.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use nostr_git_objects::{FetchOptions, ObjectStore, ObjectStoreError, ResolveOptions};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::diff::{parse_unified_diff, apply_hunks, FileDiff, FileDiffKind};
use crate::error::MergeError;

/// Depth fetched for the target branch before analysis (§4.I step 2).
const TARGET_FETCH_DEPTH: u32 = 50;
/// Depth searched for idempotent-apply detection by oid (§4.I step 3, §8 invariant 5).
const UP_TO_DATE_OID_DEPTH: usize = 500;
/// Depth searched for idempotent-apply detection by author+message (§4.I step 3).
const UP_TO_DATE_CHERRY_PICK_DEPTH: usize = 50;

/// Everything the analyzer needs to know about the patch under review,
/// independent of how it arrived (a single [`nostr::nips::nip34::GitPatch`]
/// event, or several stacked together).
#[derive(Debug, Clone)]
pub struct PatchInput {
    /// Unified-diff content.
    pub diff_content: String,
    /// Commit oids the patch produces, oldest first. The last entry is
    /// the patch's head commit.
    pub commits: Vec<String>,
    /// Commit the patch was authored against (`parent-commit` tag).
    pub base_commit: String,
    /// Committer email, used for the cherry-pick/rebase idempotence check.
    pub author_email: String,
    /// Commit message, used for the same check.
    pub commit_message: String,
}

/// Coarse merge outcome (§3 `MergeAnalysisResult.analysis`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisKind {
    /// No conflicts; merges (possibly fast-forward).
    Clean,
    /// Conflicting hunks were found.
    Conflicts,
    /// Patch (or an equivalent) is already present on the target.
    UpToDate,
    /// Target has moved ahead with unrelated history since the patch's base.
    Diverged,
    /// Analysis could not complete.
    Error,
}

/// What kind of conflict a file carries (§3 `ConflictDetail.type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConflictFileKind {
    /// Ordinary text conflict.
    Content,
    /// One side renamed the file (not produced today: the diff parser
    /// rejects renames outright, kept for the complete §3 type).
    Rename,
    /// One side deleted the file, the other modified it.
    Delete,
    /// The file's current content isn't valid UTF-8.
    Binary,
}

/// What happened at a conflicting hunk (§3 `ConflictMarker.type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConflictMarkerKind {
    /// Both sides touched the same line range.
    BothModified,
    /// The target (ours) deleted the file; the patch (theirs) modified it.
    DeletedByUs,
    /// The patch (theirs) deleted the file; the target (ours) modified it.
    DeletedByThem,
    /// Both sides independently added the file.
    AddedByBoth,
}

/// A single conflicting range within a file (§3, §4.I "Conflict-marker range").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictMarker {
    /// First old-file line this marker spans.
    pub start: u32,
    /// Last old-file line this marker spans.
    pub end: u32,
    /// The hunk body the marker covers.
    pub content: String,
    /// Why this range conflicts.
    pub kind: ConflictMarkerKind,
}

/// Per-file conflict detail (§3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictDetail {
    /// File path.
    pub file: String,
    /// Kind of conflict.
    pub kind: ConflictFileKind,
    /// Conflicting ranges, in hunk order.
    pub markers: Vec<ConflictMarker>,
    /// Content at the patch's base commit, if the file existed there.
    pub base_content: Option<String>,
    /// Content at the target's current HEAD, if the file exists there.
    pub head_content: Option<String>,
    /// Content the patch alone would produce for this file.
    pub patch_content: Option<String>,
}

/// Result of a merge analysis (§3 `MergeAnalysisResult`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeAnalysisResult {
    /// Whether the patch can be merged onto the target as-is.
    pub can_merge: bool,
    /// Whether any conflicting files were found.
    pub has_conflicts: bool,
    /// Paths of conflicting files.
    pub conflict_files: Vec<String>,
    /// Per-file conflict detail.
    pub conflict_details: Vec<ConflictDetail>,
    /// Whether the patch is already present on the target.
    pub up_to_date: bool,
    /// Whether the merge would be a pure fast-forward.
    pub fast_forward: bool,
    /// Nearest common ancestor of the patch head and the target, if any.
    pub merge_base: Option<String>,
    /// Commit the target branch resolved to for this analysis.
    pub target_commit: Option<String>,
    /// Commit the remote-tracking ref resolved to, if it was consulted.
    pub remote_commit: Option<String>,
    /// The patch's own commit oids, as given.
    pub patch_commits: Vec<String>,
    /// Coarse classification.
    pub analysis: AnalysisKind,
    /// Detail, set only when `analysis == Error`.
    pub error_message: Option<String>,
}

impl MergeAnalysisResult {
    fn error(message: impl Into<String>, patch_commits: Vec<String>) -> Self {
        Self {
            can_merge: false,
            has_conflicts: false,
            conflict_files: Vec::new(),
            conflict_details: Vec::new(),
            up_to_date: false,
            fast_forward: false,
            merge_base: None,
            target_commit: None,
            remote_commit: None,
            patch_commits,
            analysis: AnalysisKind::Error,
            error_message: Some(message.into()),
        }
    }
}

/// Merge Analyzer: classifies a patch against a target branch using only
/// local object-store reads (§4.I).
pub struct MergeAnalyzer {
    store: Arc<dyn ObjectStore>,
}

impl MergeAnalyzer {
    /// New analyzer over `store`.
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    async fn read_optional(&self, dest: &Path, oid: &str, path: &str) -> Result<Option<Vec<u8>>, MergeError> {
        match self.store.read_blob(dest, oid, path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(ObjectStoreError::UnknownObject(_)) => Ok(None),
            Err(e) => Err(MergeError::object("read_blob", dest, e)),
        }
    }

    /// Run the full §4.I pipeline against an already-cloned `dest`.
    #[instrument(skip(self, patch))]
    pub async fn analyze(&self, dest: &Path, patch: &PatchInput, target_branch: &str) -> Result<MergeAnalysisResult, MergeError> {
        let target_ref = format!("refs/heads/{target_branch}");
        let local_target = match self
            .store
            .resolve_ref(dest, &target_ref, ResolveOptions::default())
            .await
            .map_err(|e| MergeError::object("resolve_ref", dest, e))?
        {
            Some(oid) => oid,
            None => {
                return Ok(MergeAnalysisResult::error(
                    format!("target branch {target_branch} has no local ref"),
                    patch.commits.clone(),
                ))
            }
        };

        // Step 2: fetch the target and check for divergence. A failed
        // fetch (offline, CORS) is not fatal here — analysis proceeds
        // against whatever is already local.
        let _ = self.store.fetch(dest, "origin", FetchOptions { deepen: Some(TARGET_FETCH_DEPTH), unshallow: false }).await;
        let remote_oid = self
            .store
            .resolve_ref(dest, &target_ref, ResolveOptions { allow_remote_tracking: true })
            .await
            .map_err(|e| MergeError::object("resolve_ref", dest, e))?;

        let mut target_commit = local_target.clone();
        if let Some(remote) = &remote_oid {
            if remote != &local_target {
                let base = self
                    .store
                    .find_merge_base(dest, &local_target, remote)
                    .await
                    .map_err(|e| MergeError::object("find_merge_base", dest, e))?;
                if base.as_deref() == Some(local_target.as_str()) {
                    // Remote simply advanced past what we had; adopt it.
                    target_commit = remote.clone();
                } else {
                    debug!(target_branch, local = %local_target, remote, "target diverged from local view");
                    return Ok(MergeAnalysisResult {
                        target_commit: Some(local_target),
                        remote_commit: remote_oid,
                        patch_commits: patch.commits.clone(),
                        analysis: AnalysisKind::Diverged,
                        ..MergeAnalysisResult::error("target diverged from local view", patch.commits.clone())
                    });
                }
            }
        }

        // Step 3: idempotence — by oid, then by author+message (cherry-pick/rebase).
        let history = self
            .store
            .log(dest, target_branch, UP_TO_DATE_OID_DEPTH)
            .await
            .map_err(|e| MergeError::object("log", dest, e))?;
        let history_oids: HashSet<&str> = history.iter().map(|c| c.oid.as_str()).collect();
        let already_applied = patch.commits.iter().any(|c| history_oids.contains(c.as_str()))
            || history
                .iter()
                .take(UP_TO_DATE_CHERRY_PICK_DEPTH)
                .any(|c| c.author_email == patch.author_email && c.message.trim() == patch.commit_message.trim());
        if already_applied {
            return Ok(MergeAnalysisResult {
                can_merge: true,
                up_to_date: true,
                target_commit: Some(target_commit),
                remote_commit: remote_oid,
                patch_commits: patch.commits.clone(),
                analysis: AnalysisKind::UpToDate,
                ..MergeAnalysisResult::error("", patch.commits.clone())
            }
            .without_error());
        }

        // Step 4: merge base / fast-forward.
        let patch_head = patch.commits.last().cloned().unwrap_or_else(|| patch.base_commit.clone());
        let merge_base = self
            .store
            .find_merge_base(dest, &patch_head, &target_commit)
            .await
            .map_err(|e| MergeError::object("find_merge_base", dest, e))?;
        if merge_base.as_deref() == Some(target_commit.as_str()) {
            return Ok(MergeAnalysisResult {
                can_merge: true,
                fast_forward: true,
                merge_base,
                target_commit: Some(target_commit),
                remote_commit: remote_oid,
                patch_commits: patch.commits.clone(),
                analysis: AnalysisKind::Clean,
                ..MergeAnalysisResult::error("", patch.commits.clone())
            }
            .without_error());
        }

        // Step 5: dry-run hunk-level conflict detection.
        let diffs = parse_unified_diff(&patch.diff_content)?;
        let mut conflict_details = Vec::new();
        for file_diff in &diffs {
            if let Some(detail) = self.check_file_conflict(dest, &patch.base_commit, &target_commit, file_diff).await? {
                conflict_details.push(detail);
            }
        }

        let conflict_files: Vec<String> = conflict_details.iter().map(|c| c.file.clone()).collect();
        let has_conflicts = !conflict_details.is_empty();
        Ok(MergeAnalysisResult {
            can_merge: !has_conflicts,
            has_conflicts,
            conflict_files,
            conflict_details,
            up_to_date: false,
            fast_forward: false,
            merge_base,
            target_commit: Some(target_commit),
            remote_commit: remote_oid,
            patch_commits: patch.commits.clone(),
            analysis: if has_conflicts { AnalysisKind::Conflicts } else { AnalysisKind::Clean },
            error_message: None,
        })
    }

    /// Step 5 per-file logic: compare the patch's assumed base content
    /// against the target's current content to decide whether the
    /// hunks this patch carries would actually conflict.
    async fn check_file_conflict(
        &self,
        dest: &Path,
        base_commit: &str,
        target_commit: &str,
        file_diff: &FileDiff,
    ) -> Result<Option<ConflictDetail>, MergeError> {
        let base_bytes = self.read_optional(dest, base_commit, &file_diff.path).await?;
        let target_bytes = self.read_optional(dest, target_commit, &file_diff.path).await?;

        let markers_from_hunks = |kind: ConflictMarkerKind| -> Vec<ConflictMarker> {
            file_diff
                .hunks
                .iter()
                .map(|h| {
                    let (start, end) = h.old_range();
                    ConflictMarker { start, end, content: h.lines.join("\n"), kind }
                })
                .collect()
        };

        match file_diff.kind {
            FileDiffKind::Add => {
                let Some(target_bytes) = target_bytes else { return Ok(None) };
                let head_content = String::from_utf8(target_bytes.clone()).ok();
                let kind = if head_content.is_none() { ConflictFileKind::Binary } else { ConflictFileKind::Content };
                Ok(Some(ConflictDetail {
                    file: file_diff.path.clone(),
                    kind,
                    markers: markers_from_hunks(ConflictMarkerKind::AddedByBoth),
                    base_content: None,
                    head_content,
                    patch_content: Some(apply_hunks("", file_diff)),
                }))
            }
            FileDiffKind::Delete => match (&base_bytes, &target_bytes) {
                (Some(base), Some(target)) if base != target => Ok(Some(ConflictDetail {
                    file: file_diff.path.clone(),
                    kind: ConflictFileKind::Delete,
                    markers: vec![ConflictMarker {
                        start: 1,
                        end: 1,
                        content: String::new(),
                        kind: ConflictMarkerKind::DeletedByThem,
                    }],
                    base_content: String::from_utf8(base.clone()).ok(),
                    head_content: String::from_utf8(target.clone()).ok(),
                    patch_content: None,
                })),
                _ => Ok(None),
            },
            FileDiffKind::Modify => {
                let Some(target_bytes) = target_bytes else {
                    return Ok(Some(ConflictDetail {
                        file: file_diff.path.clone(),
                        kind: ConflictFileKind::Delete,
                        markers: vec![ConflictMarker {
                            start: 1,
                            end: 1,
                            content: String::new(),
                            kind: ConflictMarkerKind::DeletedByUs,
                        }],
                        base_content: base_bytes.and_then(|b| String::from_utf8(b).ok()),
                        head_content: None,
                        patch_content: None,
                    }));
                };
                if base_bytes.as_ref() == Some(&target_bytes) {
                    // Target unchanged since the patch's base: hunks apply cleanly.
                    return Ok(None);
                }
                let Ok(head_content) = String::from_utf8(target_bytes.clone()) else {
                    return Ok(Some(ConflictDetail {
                        file: file_diff.path.clone(),
                        kind: ConflictFileKind::Binary,
                        markers: Vec::new(),
                        base_content: None,
                        head_content: None,
                        patch_content: None,
                    }));
                };
                Ok(Some(ConflictDetail {
                    file: file_diff.path.clone(),
                    kind: ConflictFileKind::Content,
                    markers: markers_from_hunks(ConflictMarkerKind::BothModified),
                    base_content: base_bytes.and_then(|b| String::from_utf8(b).ok()),
                    head_content: Some(head_content.clone()),
                    patch_content: Some(apply_hunks(&head_content, file_diff)),
                }))
            }
        }
    }
}

impl MergeAnalysisResult {
    fn without_error(mut self) -> Self {
        self.error_message = None;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nostr_git_objects::{CloneOptions, CommitAuthor, CommitInfo, MemoryObjectStore, WriteRefOptions};
    use std::path::PathBuf;

    fn commit(oid: &str, parents: &[&str], author_email: &str, message: &str) -> CommitInfo {
        CommitInfo {
            oid: oid.into(),
            parents: parents.iter().map(|s| s.to_string()).collect(),
            author_name: "Ada".into(),
            author_email: author_email.into(),
            author_time: 0,
            message: message.into(),
        }
    }

    async fn cloned_repo(store: &MemoryObjectStore, url: &str) -> PathBuf {
        let dest = PathBuf::from("/work/repo");
        store.clone_repo(url, &dest, CloneOptions::default()).await.unwrap();
        dest
    }

    #[tokio::test]
    async fn s2_clean_fast_forward() {
        let store = Arc::new(MemoryObjectStore::new());
        let url = "https://example.com/repo.git";
        store.seed_commit(url, "main", commit("c1", &[], "a@x.com", "init"));
        store.seed_blob(url, "c1", "file.txt", "line1\nline2\n");
        let dest = cloned_repo(&store, url).await;

        let patch = PatchInput {
            diff_content: "diff --git a/new.txt b/new.txt\nnew file mode 100644\nindex 0000000..aaaaaaa\n--- /dev/null\n+++ b/new.txt\n@@ -0,0 +1,1 @@\n+hi\n".into(),
            commits: vec!["c2".into()],
            base_commit: "c1".into(),
            author_email: "a@x.com".into(),
            commit_message: "add new.txt".into(),
        };
        store.write_ref(&dest, "refs/heads/patch-branch", "c2", WriteRefOptions::default()).await.ok();
        // c2 descends from c1 in the object graph (merge_base computed via `ancestors`).
        store.seed_commit(url, "main", commit("c2", &["c1"], "a@x.com", "add new.txt"));
        store.fetch(&dest, "origin", FetchOptions::default()).await.unwrap();
        // Re-seed locally visible commit graph by writing it directly for merge-base lookup.
        store.write_ref(&dest, "refs/heads/main", "c1", WriteRefOptions::default()).await.unwrap();

        let analyzer = MergeAnalyzer::new(store.clone());
        let result = analyzer.analyze(&dest, &patch, "main").await.unwrap();
        assert_eq!(result.analysis, AnalysisKind::Clean);
        assert!(result.fast_forward);
        assert!(result.can_merge);
    }

    #[tokio::test]
    async fn s3_conflict_both_modified() {
        let store = Arc::new(MemoryObjectStore::new());
        let url = "https://example.com/repo.git";
        store.seed_commit(url, "main", commit("base", &[], "a@x.com", "init"));
        store.seed_blob(url, "base", "file.txt", "line1\nline2\n");
        store.seed_commit(url, "main", commit("main2", &["base"], "a@x.com", "main edit"));
        store.seed_blob(url, "main2", "file.txt", "line1 main\nline2\n");
        let dest = cloned_repo(&store, url).await;
        store.write_ref(&dest, "refs/heads/main", "main2", WriteRefOptions::default()).await.unwrap();

        let patch = PatchInput {
            diff_content: "diff --git a/file.txt b/file.txt\nindex aaa..bbb 100644\n--- a/file.txt\n+++ b/file.txt\n@@ -1,2 +1,2 @@\n-line1\n+line1 patched\n line2\n".into(),
            commits: vec!["patch1".into()],
            base_commit: "base".into(),
            author_email: "a@x.com".into(),
            commit_message: "patch edit".into(),
        };
        store.write_ref(&dest, "refs/heads/patch1-branch", "base", WriteRefOptions::default()).await.ok();

        let analyzer = MergeAnalyzer::new(store.clone());
        let result = analyzer.analyze(&dest, &patch, "main").await.unwrap();
        assert_eq!(result.analysis, AnalysisKind::Conflicts);
        assert!(result.has_conflicts);
        assert_eq!(result.conflict_files, vec!["file.txt".to_string()]);
        assert_eq!(result.conflict_details[0].markers[0].kind, ConflictMarkerKind::BothModified);
    }

    #[tokio::test]
    async fn s4_up_to_date_by_oid_no_network_write() {
        let store = Arc::new(MemoryObjectStore::new());
        let url = "https://example.com/repo.git";
        store.seed_commit(url, "main", commit("c1", &[], "a@x.com", "init"));
        store.seed_commit(url, "main", commit("c2", &["c1"], "a@x.com", "already applied"));
        let dest = cloned_repo(&store, url).await;
        store.write_ref(&dest, "refs/heads/main", "c2", WriteRefOptions::default()).await.unwrap();

        let patch = PatchInput {
            diff_content: "diff --git a/f b/f\nindex a..b 100644\n--- a/f\n+++ b/f\n@@ -1 +1 @@\n-x\n+y\n".into(),
            commits: vec!["c2".into()],
            base_commit: "c1".into(),
            author_email: "a@x.com".into(),
            commit_message: "already applied".into(),
        };

        let analyzer = MergeAnalyzer::new(store.clone());
        let result = analyzer.analyze(&dest, &patch, "main").await.unwrap();
        assert_eq!(result.analysis, AnalysisKind::UpToDate);
        assert!(result.can_merge);
    }

    #[tokio::test]
    async fn diverged_target_is_not_mergeable() {
        let store = Arc::new(MemoryObjectStore::new());
        let url = "https://example.com/repo.git";
        store.seed_commit(url, "main", commit("c1", &[], "a@x.com", "init"));
        let dest = cloned_repo(&store, url).await;
        store.write_ref(&dest, "refs/heads/main", "local-only", WriteRefOptions::default()).await.unwrap();
        store.seed_commit(url, "main", commit("remote-only", &["c1"], "a@x.com", "remote advance"));

        let patch = PatchInput {
            diff_content: "diff --git a/f b/f\nindex a..b 100644\n--- a/f\n+++ b/f\n@@ -1 +1 @@\n-x\n+y\n".into(),
            commits: vec!["patchcommit".into()],
            base_commit: "c1".into(),
            author_email: "a@x.com".into(),
            commit_message: "unrelated".into(),
        };

        let analyzer = MergeAnalyzer::new(store.clone());
        let result = analyzer.analyze(&dest, &patch, "main").await.unwrap();
        assert_eq!(result.analysis, AnalysisKind::Diverged);
        assert!(!result.can_merge);
        let _ = CommitAuthor { name: "x".into(), email: "y".into() };
    }
}
