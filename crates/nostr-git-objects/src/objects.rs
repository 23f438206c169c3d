// Distributed under the MIT software license

//! Object-store capability: the isomorphic-git-shaped surface that the
//! clone ladder, merge analyzer and patch applier drive a working tree
//! through (`clone`, `fetch`, `push`, `listServerRefs`, `resolveRef`,
//! `writeRef`, `readBlob`, `readCommit`, `walk`, `log`, `findMergeBase`,
//! `listBranches`, `listRemotes`, `checkout`, `statusMatrix`,
//! `setConfig`, `addRemote`).
//!
//! A real backend implements this against `git2` or a shelled-out `git`
//! binary; [`MemoryObjectStore`] is a test double that keeps just enough
//! state (refs and commit parents) to exercise merge-base and
//! fast-forward logic without touching disk.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Object-store error.
#[derive(Debug, Error)]
pub enum ObjectStoreError {
    /// No such repository at `dest`.
    #[error("no repository at {0}")]
    NoRepository(PathBuf),
    /// No such ref.
    #[error("unknown ref: {0}")]
    UnknownRef(String),
    /// No such remote.
    #[error("unknown remote: {0}")]
    UnknownRemote(String),
    /// No such object.
    #[error("unknown object: {0}")]
    UnknownObject(String),
    /// Push rejected (non-fast-forward, protected branch, ...).
    #[error("push rejected: {0}")]
    PushRejected(String),
    /// Network or transport failure reaching a remote.
    #[error("transport error talking to {url}: {message}")]
    Transport {
        /// Remote URL.
        url: String,
        /// Human-readable detail.
        message: String,
    },
    /// Backend-specific failure with no more specific variant.
    #[error("object store backend error: {0}")]
    Backend(String),
}

/// A single ref advertised by a remote or present locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRef {
    /// Fully qualified ref name, e.g. `refs/heads/main`.
    pub name: String,
    /// Commit oid the ref points at.
    pub oid: String,
}

/// Depth/filter knobs for a clone.
#[derive(Debug, Clone, Default)]
pub struct CloneOptions {
    /// `None` means full history.
    pub depth: Option<u32>,
    /// Fetch a single ref only (used by the "refs" clone-ladder rung).
    pub single_ref: Option<String>,
    /// Skip blob bodies (used by the "shallow" rung).
    pub no_blobs: bool,
}

/// Knobs for a fetch against an existing local repository.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// Deepen a shallow clone by this many additional commits, if set.
    pub deepen: Option<u32>,
    /// Convert a shallow clone to a full one.
    pub unshallow: bool,
}

/// Outcome of a fetch.
#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    /// Refs that moved or were created.
    pub updated_refs: Vec<RemoteRef>,
}

/// Knobs for a push.
#[derive(Debug, Clone, Default)]
pub struct PushOptions {
    /// Force-update the remote ref even if not a fast-forward.
    pub force: bool,
}

/// Outcome of a push.
#[derive(Debug, Clone)]
pub struct PushOutcome {
    /// Ref that was updated on the remote.
    pub remote_ref: String,
    /// New oid the remote ref points at.
    pub oid: String,
}

/// How to resolve a ref: local only, or permitting a remote-tracking fallback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Also consult `refs/remotes/<remote>/...` if the plain name is absent.
    pub allow_remote_tracking: bool,
}

/// Knobs for writing a ref.
#[derive(Debug, Clone, Default)]
pub struct WriteRefOptions {
    /// Require the ref's current value to match this oid (optimistic lock).
    pub expected_oid: Option<String>,
}

/// A commit, as much as merge analysis and threading need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    /// Commit oid.
    pub oid: String,
    /// Parent oids, in order; empty for a root commit, 2+ for a merge.
    pub parents: Vec<String>,
    /// Author name.
    pub author_name: String,
    /// Author email.
    pub author_email: String,
    /// Author timestamp, unix seconds.
    pub author_time: i64,
    /// Full commit message.
    pub message: String,
}

/// A row from a working-tree status matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRow {
    /// Path relative to the repository root.
    pub path: String,
    /// Present in HEAD.
    pub head: bool,
    /// Present in the index.
    pub staged: bool,
    /// Present in the working directory.
    pub worktree: bool,
}

/// A single blob-level change to apply to a working tree, as produced by
/// unified-diff parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileChange {
    /// Create or overwrite a path.
    Write {
        /// Path relative to the repository root.
        path: String,
        /// New file contents.
        contents: Vec<u8>,
    },
    /// Remove a path.
    Delete {
        /// Path relative to the repository root.
        path: String,
    },
    /// Rename a path, optionally rewriting its contents in the same step.
    Rename {
        /// Original path.
        from: String,
        /// New path.
        to: String,
        /// New contents, if the rename also changed the file.
        contents: Option<Vec<u8>>,
    },
}

/// Author identity for a commit created through [`ObjectStore::commit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitAuthor {
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
}

/// Capability: drive a working tree through clone, fetch, push and
/// inspection operations.
///
/// `dest` identifies a working tree the way the rest of the engine
/// addresses one — an opaque local path chosen by the clone ladder.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Clone `url` into `dest`.
    async fn clone_repo(&self, url: &str, dest: &Path, opts: CloneOptions) -> Result<(), ObjectStoreError>;
    /// Fetch updates for an existing clone at `dest`.
    async fn fetch(&self, dest: &Path, remote: &str, opts: FetchOptions) -> Result<FetchOutcome, ObjectStoreError>;
    /// Push `refspec` to `remote`.
    async fn push(
        &self,
        dest: &Path,
        remote: &str,
        refspec: &str,
        opts: PushOptions,
    ) -> Result<PushOutcome, ObjectStoreError>;
    /// List refs advertised by a remote URL, without cloning.
    async fn list_server_refs(&self, url: &str) -> Result<Vec<RemoteRef>, ObjectStoreError>;
    /// Resolve a ref name to an oid.
    async fn resolve_ref(
        &self,
        dest: &Path,
        ref_name: &str,
        opts: ResolveOptions,
    ) -> Result<Option<String>, ObjectStoreError>;
    /// Write (create or update) a ref.
    async fn write_ref(
        &self,
        dest: &Path,
        ref_name: &str,
        value: &str,
        opts: WriteRefOptions,
    ) -> Result<(), ObjectStoreError>;
    /// Read a blob's bytes at `path` as of `oid`.
    async fn read_blob(&self, dest: &Path, oid: &str, path: &str) -> Result<Vec<u8>, ObjectStoreError>;
    /// Read a single commit's metadata.
    async fn read_commit(&self, dest: &Path, oid: &str) -> Result<CommitInfo, ObjectStoreError>;
    /// Walk a tree's paths as of `oid` (no content).
    async fn walk(&self, dest: &Path, oid: &str) -> Result<Vec<String>, ObjectStoreError>;
    /// First-parent commit history of `branch`, most recent first, capped at `depth`.
    async fn log(&self, dest: &Path, branch: &str, depth: usize) -> Result<Vec<CommitInfo>, ObjectStoreError>;
    /// Nearest common ancestor of `a` and `b`, if any (unrelated histories: `None`).
    async fn find_merge_base(&self, dest: &Path, a: &str, b: &str) -> Result<Option<String>, ObjectStoreError>;
    /// List local branches, or a remote's tracking branches when `remote` is set.
    async fn list_branches(&self, dest: &Path, remote: Option<&str>) -> Result<Vec<String>, ObjectStoreError>;
    /// List configured remote names.
    async fn list_remotes(&self, dest: &Path) -> Result<Vec<String>, ObjectStoreError>;
    /// Check out a branch into the working directory.
    async fn checkout(&self, dest: &Path, branch: &str) -> Result<(), ObjectStoreError>;
    /// Rows for every path whose head/stage/worktree state differs; a
    /// clean working tree returns an empty vec.
    async fn status_matrix(&self, dest: &Path) -> Result<Vec<StatusRow>, ObjectStoreError>;
    /// Set a local git config key.
    async fn set_config(&self, dest: &Path, key: &str, value: &str) -> Result<(), ObjectStoreError>;
    /// Register a remote.
    async fn add_remote(&self, dest: &Path, name: &str, url: &str) -> Result<(), ObjectStoreError>;
    /// Whether `dest` is a shallow clone.
    async fn is_shallow(&self, dest: &Path) -> Result<bool, ObjectStoreError>;
    /// Apply a set of file changes to the working tree and index.
    async fn apply_changes(&self, dest: &Path, changes: &[FileChange]) -> Result<(), ObjectStoreError>;
    /// Commit the current index on top of HEAD, returning the new oid.
    async fn commit(&self, dest: &Path, message: &str, author: CommitAuthor) -> Result<String, ObjectStoreError>;
}

#[derive(Default)]
struct MemoryRepo {
    refs: BTreeMap<String, String>,
    commits: BTreeMap<String, CommitInfo>,
    /// Full file content as of each commit oid.
    trees: BTreeMap<String, BTreeMap<String, Vec<u8>>>,
    /// Uncommitted working-tree content (no separate index is modeled).
    working: BTreeMap<String, Vec<u8>>,
    remotes: BTreeMap<String, String>,
    config: BTreeMap<String, String>,
    shallow: bool,
    current_branch: Option<String>,
}

/// In-memory [`ObjectStore`] for tests. Commits must be seeded via
/// [`MemoryObjectStore::seed_commit`] and, for tests that read file
/// content, [`MemoryObjectStore::seed_blob`]; `clone_repo`/`fetch`/`push`
/// copy refs, reachable commits and their trees between a server-side and
/// local namespace keyed by `dest`.
#[derive(Default)]
pub struct MemoryObjectStore {
    repos: Mutex<BTreeMap<PathBuf, MemoryRepo>>,
    servers: Mutex<BTreeMap<String, MemoryRepo>>,
}

impl MemoryObjectStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a commit into the server identified by `url`, and advance `branch` to it.
    pub fn seed_commit(&self, url: &str, branch: &str, commit: CommitInfo) {
        let mut servers = self.servers.lock().unwrap();
        let repo = servers.entry(url.to_string()).or_default();
        repo.refs.insert(format!("refs/heads/{branch}"), commit.oid.clone());
        repo.commits.insert(commit.oid.clone(), commit);
    }

    /// Seed a file's content as of `oid` on the server identified by `url`.
    pub fn seed_blob(&self, url: &str, oid: &str, path: &str, contents: impl Into<Vec<u8>>) {
        let mut servers = self.servers.lock().unwrap();
        let repo = servers.entry(url.to_string()).or_default();
        repo.trees.entry(oid.to_string()).or_default().insert(path.to_string(), contents.into());
    }

    fn ancestors(repo: &MemoryRepo, oid: &str) -> Vec<String> {
        let mut seen = Vec::new();
        let mut stack = vec![oid.to_string()];
        while let Some(current) = stack.pop() {
            if seen.contains(&current) {
                continue;
            }
            seen.push(current.clone());
            if let Some(commit) = repo.commits.get(&current) {
                stack.extend(commit.parents.clone());
            }
        }
        seen
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn clone_repo(&self, url: &str, dest: &Path, opts: CloneOptions) -> Result<(), ObjectStoreError> {
        let servers = self.servers.lock().unwrap();
        let server = servers
            .get(url)
            .ok_or_else(|| ObjectStoreError::Transport {
                url: url.to_string(),
                message: "no such server repository".into(),
            })?;
        let mut local = MemoryRepo::default();
        local.refs = match &opts.single_ref {
            Some(r) => server
                .refs
                .iter()
                .filter(|(name, _)| *name == r)
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            None => server.refs.clone(),
        };
        local.commits = server.commits.clone();
        local.trees = server.trees.clone();
        local.remotes.insert("origin".to_string(), url.to_string());
        local.shallow = opts.depth.is_some() || opts.no_blobs;
        local.current_branch = match &opts.single_ref {
            Some(r) => r.strip_prefix("refs/heads/").map(str::to_string),
            None => local.refs.keys().find_map(|k| k.strip_prefix("refs/heads/").map(str::to_string)),
        };
        if let Some(branch) = local.current_branch.clone() {
            if let Some(oid) = local.refs.get(&format!("refs/heads/{branch}")) {
                local.working = local.trees.get(oid).cloned().unwrap_or_default();
            }
        }
        self.repos.lock().unwrap().insert(dest.to_path_buf(), local);
        Ok(())
    }

    async fn fetch(&self, dest: &Path, remote: &str, opts: FetchOptions) -> Result<FetchOutcome, ObjectStoreError> {
        let mut repos = self.repos.lock().unwrap();
        let local = repos
            .get_mut(dest)
            .ok_or_else(|| ObjectStoreError::NoRepository(dest.to_path_buf()))?;
        let url = local
            .remotes
            .get(remote)
            .cloned()
            .ok_or_else(|| ObjectStoreError::UnknownRemote(remote.to_string()))?;
        let servers = self.servers.lock().unwrap();
        let server = servers
            .get(&url)
            .ok_or_else(|| ObjectStoreError::Transport { url: url.clone(), message: "unreachable".into() })?;
        let mut updated = Vec::new();
        for (name, oid) in &server.refs {
            let tracking = format!("refs/remotes/{remote}/{}", name.trim_start_matches("refs/heads/"));
            if local.refs.get(&tracking) != Some(oid) {
                local.refs.insert(tracking.clone(), oid.clone());
                updated.push(RemoteRef { name: tracking, oid: oid.clone() });
            }
        }
        local.commits.extend(server.commits.clone());
        local.trees.extend(server.trees.clone());
        if opts.unshallow {
            local.shallow = false;
        }
        Ok(FetchOutcome { updated_refs: updated })
    }

    async fn push(
        &self,
        dest: &Path,
        remote: &str,
        refspec: &str,
        opts: PushOptions,
    ) -> Result<PushOutcome, ObjectStoreError> {
        let repos = self.repos.lock().unwrap();
        let local = repos
            .get(dest)
            .ok_or_else(|| ObjectStoreError::NoRepository(dest.to_path_buf()))?;
        let url = local
            .remotes
            .get(remote)
            .cloned()
            .ok_or_else(|| ObjectStoreError::UnknownRemote(remote.to_string()))?;
        let (src, dst) = refspec.split_once(':').unwrap_or((refspec, refspec));
        let oid = local
            .refs
            .get(src)
            .cloned()
            .ok_or_else(|| ObjectStoreError::UnknownRef(src.to_string()))?;
        let mut servers = self.servers.lock().unwrap();
        let server = servers.entry(url).or_default();
        if !opts.force {
            if let Some(current) = server.refs.get(dst) {
                let ancestors = Self::ancestors(local, &oid);
                if current != &oid && !ancestors.contains(current) {
                    return Err(ObjectStoreError::PushRejected(format!(
                        "non-fast-forward update of {dst}"
                    )));
                }
            }
        }
        server.refs.insert(dst.to_string(), oid.clone());
        server.commits.extend(local.commits.clone());
        Ok(PushOutcome { remote_ref: dst.to_string(), oid })
    }

    async fn list_server_refs(&self, url: &str) -> Result<Vec<RemoteRef>, ObjectStoreError> {
        let servers = self.servers.lock().unwrap();
        let server = servers
            .get(url)
            .ok_or_else(|| ObjectStoreError::Transport { url: url.to_string(), message: "unreachable".into() })?;
        Ok(server
            .refs
            .iter()
            .map(|(name, oid)| RemoteRef { name: name.clone(), oid: oid.clone() })
            .collect())
    }

    async fn resolve_ref(
        &self,
        dest: &Path,
        ref_name: &str,
        opts: ResolveOptions,
    ) -> Result<Option<String>, ObjectStoreError> {
        let repos = self.repos.lock().unwrap();
        let local = repos
            .get(dest)
            .ok_or_else(|| ObjectStoreError::NoRepository(dest.to_path_buf()))?;
        if let Some(oid) = local.refs.get(ref_name) {
            return Ok(Some(oid.clone()));
        }
        if opts.allow_remote_tracking {
            for (name, oid) in &local.refs {
                if name.ends_with(&format!("/{}", ref_name.trim_start_matches("refs/heads/"))) {
                    return Ok(Some(oid.clone()));
                }
            }
        }
        Ok(None)
    }

    async fn write_ref(
        &self,
        dest: &Path,
        ref_name: &str,
        value: &str,
        opts: WriteRefOptions,
    ) -> Result<(), ObjectStoreError> {
        let mut repos = self.repos.lock().unwrap();
        let local = repos
            .get_mut(dest)
            .ok_or_else(|| ObjectStoreError::NoRepository(dest.to_path_buf()))?;
        if let Some(expected) = &opts.expected_oid {
            if local.refs.get(ref_name) != Some(expected) {
                return Err(ObjectStoreError::PushRejected(format!(
                    "expected-oid mismatch for {ref_name}"
                )));
            }
        }
        local.refs.insert(ref_name.to_string(), value.to_string());
        Ok(())
    }

    async fn read_blob(&self, dest: &Path, oid: &str, path: &str) -> Result<Vec<u8>, ObjectStoreError> {
        let repos = self.repos.lock().unwrap();
        let local = repos.get(dest).ok_or_else(|| ObjectStoreError::NoRepository(dest.to_path_buf()))?;
        local
            .trees
            .get(oid)
            .and_then(|tree| tree.get(path))
            .cloned()
            .ok_or_else(|| ObjectStoreError::UnknownObject(path.to_string()))
    }

    async fn read_commit(&self, dest: &Path, oid: &str) -> Result<CommitInfo, ObjectStoreError> {
        let repos = self.repos.lock().unwrap();
        let local = repos
            .get(dest)
            .ok_or_else(|| ObjectStoreError::NoRepository(dest.to_path_buf()))?;
        local
            .commits
            .get(oid)
            .cloned()
            .ok_or_else(|| ObjectStoreError::UnknownObject(oid.to_string()))
    }

    async fn walk(&self, _dest: &Path, _oid: &str) -> Result<Vec<String>, ObjectStoreError> {
        Ok(Vec::new())
    }

    async fn log(&self, dest: &Path, branch: &str, depth: usize) -> Result<Vec<CommitInfo>, ObjectStoreError> {
        let repos = self.repos.lock().unwrap();
        let local = repos
            .get(dest)
            .ok_or_else(|| ObjectStoreError::NoRepository(dest.to_path_buf()))?;
        let head = local
            .refs
            .get(&format!("refs/heads/{branch}"))
            .ok_or_else(|| ObjectStoreError::UnknownRef(branch.to_string()))?;
        let mut out = Vec::new();
        let mut current = Some(head.clone());
        while let Some(oid) = current {
            if out.len() >= depth {
                break;
            }
            let commit = local
                .commits
                .get(&oid)
                .ok_or_else(|| ObjectStoreError::UnknownObject(oid.clone()))?;
            out.push(commit.clone());
            current = commit.parents.first().cloned();
        }
        Ok(out)
    }

    async fn find_merge_base(&self, dest: &Path, a: &str, b: &str) -> Result<Option<String>, ObjectStoreError> {
        let repos = self.repos.lock().unwrap();
        let local = repos
            .get(dest)
            .ok_or_else(|| ObjectStoreError::NoRepository(dest.to_path_buf()))?;
        let a_ancestors = Self::ancestors(local, a);
        let b_ancestors = Self::ancestors(local, b);
        Ok(a_ancestors.into_iter().find(|oid| b_ancestors.contains(oid)))
    }

    async fn list_branches(&self, dest: &Path, remote: Option<&str>) -> Result<Vec<String>, ObjectStoreError> {
        let repos = self.repos.lock().unwrap();
        let local = repos
            .get(dest)
            .ok_or_else(|| ObjectStoreError::NoRepository(dest.to_path_buf()))?;
        let prefix = match remote {
            Some(r) => format!("refs/remotes/{r}/"),
            None => "refs/heads/".to_string(),
        };
        Ok(local
            .refs
            .keys()
            .filter_map(|name| name.strip_prefix(prefix.as_str()).map(str::to_string))
            .collect())
    }

    async fn list_remotes(&self, dest: &Path) -> Result<Vec<String>, ObjectStoreError> {
        let repos = self.repos.lock().unwrap();
        let local = repos
            .get(dest)
            .ok_or_else(|| ObjectStoreError::NoRepository(dest.to_path_buf()))?;
        Ok(local.remotes.keys().cloned().collect())
    }

    async fn checkout(&self, dest: &Path, branch: &str) -> Result<(), ObjectStoreError> {
        let mut repos = self.repos.lock().unwrap();
        let local = repos
            .get_mut(dest)
            .ok_or_else(|| ObjectStoreError::NoRepository(dest.to_path_buf()))?;
        let oid = local
            .refs
            .get(&format!("refs/heads/{branch}"))
            .cloned()
            .ok_or_else(|| ObjectStoreError::UnknownRef(branch.to_string()))?;
        local.current_branch = Some(branch.to_string());
        local.working = local.trees.get(&oid).cloned().unwrap_or_default();
        Ok(())
    }

    async fn status_matrix(&self, dest: &Path) -> Result<Vec<StatusRow>, ObjectStoreError> {
        let repos = self.repos.lock().unwrap();
        let local = repos
            .get(dest)
            .ok_or_else(|| ObjectStoreError::NoRepository(dest.to_path_buf()))?;
        let head_key = local
            .current_branch
            .as_ref()
            .map(|b| format!("refs/heads/{b}"))
            .unwrap_or_else(|| "HEAD".to_string());
        let head_tree = local
            .refs
            .get(&head_key)
            .and_then(|oid| local.trees.get(oid))
            .cloned()
            .unwrap_or_default();
        let mut paths: std::collections::BTreeSet<&String> = head_tree.keys().collect();
        paths.extend(local.working.keys());
        let mut rows = Vec::new();
        for path in paths {
            let head_content = head_tree.get(path);
            let work_content = local.working.get(path);
            if head_content != work_content {
                rows.push(StatusRow {
                    path: path.clone(),
                    head: head_content.is_some(),
                    staged: work_content.is_some(),
                    worktree: work_content.is_some(),
                });
            }
        }
        Ok(rows)
    }

    async fn set_config(&self, dest: &Path, key: &str, value: &str) -> Result<(), ObjectStoreError> {
        let mut repos = self.repos.lock().unwrap();
        let local = repos
            .get_mut(dest)
            .ok_or_else(|| ObjectStoreError::NoRepository(dest.to_path_buf()))?;
        local.config.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn add_remote(&self, dest: &Path, name: &str, url: &str) -> Result<(), ObjectStoreError> {
        let mut repos = self.repos.lock().unwrap();
        let local = repos
            .get_mut(dest)
            .ok_or_else(|| ObjectStoreError::NoRepository(dest.to_path_buf()))?;
        local.remotes.insert(name.to_string(), url.to_string());
        Ok(())
    }

    async fn is_shallow(&self, dest: &Path) -> Result<bool, ObjectStoreError> {
        let repos = self.repos.lock().unwrap();
        let local = repos
            .get(dest)
            .ok_or_else(|| ObjectStoreError::NoRepository(dest.to_path_buf()))?;
        Ok(local.shallow)
    }

    async fn apply_changes(&self, dest: &Path, changes: &[FileChange]) -> Result<(), ObjectStoreError> {
        let mut repos = self.repos.lock().unwrap();
        let local = repos
            .get_mut(dest)
            .ok_or_else(|| ObjectStoreError::NoRepository(dest.to_path_buf()))?;
        for change in changes {
            match change {
                FileChange::Write { path, contents } => {
                    local.working.insert(path.clone(), contents.clone());
                }
                FileChange::Delete { path } => {
                    local.working.remove(path);
                }
                FileChange::Rename { from, to, contents } => {
                    let existing = local.working.remove(from);
                    local.working.insert(to.clone(), contents.clone().or(existing).unwrap_or_default());
                }
            }
        }
        Ok(())
    }

    async fn commit(&self, dest: &Path, message: &str, author: CommitAuthor) -> Result<String, ObjectStoreError> {
        let mut repos = self.repos.lock().unwrap();
        let local = repos
            .get_mut(dest)
            .ok_or_else(|| ObjectStoreError::NoRepository(dest.to_path_buf()))?;
        let head_key = local
            .current_branch
            .as_ref()
            .map(|b| format!("refs/heads/{b}"))
            .unwrap_or_else(|| "HEAD".to_string());
        let parent = local.refs.get(&head_key).cloned();
        let oid = format!("mem-{:x}", local.commits.len() as u64 + 1);
        let commit = CommitInfo {
            oid: oid.clone(),
            parents: parent.into_iter().collect(),
            author_name: author.name,
            author_email: author.email,
            author_time: 0,
            message: message.to_string(),
        };
        local.commits.insert(oid.clone(), commit);
        local.trees.insert(oid.clone(), local.working.clone());
        local.refs.insert(head_key, oid.clone());
        Ok(oid)
    }
}
