// Distributed under the MIT software license

use std::path::PathBuf;

use nostr_git_objects::ObjectStoreError;
use thiserror::Error;

use crate::diff::DiffError;

/// Merge-analysis / patch-application / safe-push error (§7).
///
/// Every variant carries as much of `{operation, ref, remote, repoDir}`
/// as is meaningful for it, following the same flat-enum-with-context
/// shape as [`nostr_git_objects::ObjectStoreError`] rather than a single
/// generic wrapper.
#[derive(Debug, Error)]
pub enum MergeError {
    /// The diff itself was malformed or used an unsupported feature.
    #[error(transparent)]
    Diff(#[from] DiffError),
    /// The underlying object store failed.
    #[error("{operation} failed in {repo_dir}: {source}")]
    Object {
        /// Operation being performed (`"analyze"`, `"apply"`, `"push"`, ...).
        operation: &'static str,
        /// Working tree the operation was running against.
        repo_dir: PathBuf,
        /// Underlying failure.
        #[source]
        source: ObjectStoreError,
    },
    /// No local ref resolved for the requested target branch (§7 `InvalidRefspec`).
    #[error("no branch resolvable for ref {refname} in {repo_dir}")]
    InvalidRefspec {
        /// Ref name that failed to resolve.
        refname: String,
        /// Working tree the ref was looked up against.
        repo_dir: PathBuf,
    },
    /// The index was identical to HEAD after applying every file change
    /// (§4.J step 3, §8 invariant 5).
    #[error("patch produced no changes to apply in {0}")]
    NoChangesToApply(PathBuf),
    /// The remote refused the push for a reason other than a protected
    /// branch (so no topic-branch fallback was attempted).
    #[error("push to {remote} rejected: {reason}")]
    Rejected {
        /// Remote name.
        remote: String,
        /// Remote's rejection detail.
        reason: String,
    },
    /// Safe-push preflight's first check: no local clone at all (§4.K).
    #[error("repository not cloned locally: {0}")]
    NotCloned(PathBuf),
}

impl MergeError {
    /// Wrap an [`ObjectStoreError`] with the operation/repoDir context
    /// the bare error doesn't carry.
    pub(crate) fn object(operation: &'static str, repo_dir: &std::path::Path, source: ObjectStoreError) -> Self {
        Self::Object {
            operation,
            repo_dir: repo_dir.to_path_buf(),
            source,
        }
    }
}
