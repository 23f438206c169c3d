// Distributed under the MIT software license

use serde::{Deserialize, Serialize};

/// A repository, normalized across vendors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoRecord {
    /// `<owner>/<repo>`.
    pub full_name: String,
    /// Human-readable description, if set.
    pub description: Option<String>,
    /// Default branch name.
    pub default_branch: String,
    /// Clone URL the vendor advertises for this repo.
    pub clone_url: String,
    /// Whether the repo is private.
    pub private: bool,
}

/// Fields accepted when creating or updating a repository.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepoEdit {
    /// New description.
    pub description: Option<String>,
    /// New default branch.
    pub default_branch: Option<String>,
    /// New visibility.
    pub private: Option<bool>,
}

/// A commit, normalized across vendors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitRecord {
    /// Commit sha/oid.
    pub sha: String,
    /// Full commit message.
    pub message: String,
    /// Author display name.
    pub author_name: String,
    /// Author email.
    pub author_email: String,
    /// Author timestamp, unix seconds.
    pub authored_at: i64,
    /// Parent shas.
    pub parents: Vec<String>,
}

/// Paging/filter options for `listCommits`.
#[derive(Debug, Clone, Default)]
pub struct ListCommitsOptions {
    /// Restrict to this branch/ref.
    pub branch: Option<String>,
    /// Only commits after this path changed.
    pub path: Option<String>,
    /// Max commits to return.
    pub per_page: Option<u32>,
    /// Page number, 1-based.
    pub page: Option<u32>,
}

/// Lifecycle state shared by issues and pull requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemState {
    /// Still open.
    Open,
    /// Closed (merged, for a PR).
    Closed,
}

/// An issue, normalized across vendors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueRecord {
    /// Vendor-assigned issue number.
    pub number: u64,
    /// Title.
    pub title: String,
    /// Body/description.
    pub body: String,
    /// Open or closed.
    pub state: ItemState,
    /// Label names.
    pub labels: Vec<String>,
}

/// Fields accepted when creating or updating an issue.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssueEdit {
    /// New or initial title.
    pub title: Option<String>,
    /// New or initial body.
    pub body: Option<String>,
    /// Labels to set.
    pub labels: Option<Vec<String>>,
}

/// A pull/merge request, normalized across vendors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestRecord {
    /// Vendor-assigned PR number.
    pub number: u64,
    /// Title.
    pub title: String,
    /// Body/description.
    pub body: String,
    /// Open or closed.
    pub state: ItemState,
    /// Source branch.
    pub head_branch: String,
    /// Destination branch.
    pub base_branch: String,
    /// Whether the vendor reports this PR as merged.
    pub merged: bool,
}

/// Fields accepted when creating or updating a pull request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PullRequestEdit {
    /// New or initial title.
    pub title: Option<String>,
    /// New or initial body.
    pub body: Option<String>,
    /// Source branch (create only).
    pub head_branch: Option<String>,
    /// Destination branch (create only).
    pub base_branch: Option<String>,
}

/// How a pull request should be integrated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMethod {
    /// Ordinary merge commit.
    Merge,
    /// Squash into a single commit.
    Squash,
    /// Rebase onto the base branch.
    Rebase,
}

impl MergeMethod {
    /// The string GitHub's merge endpoint expects.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Merge => "merge",
            Self::Squash => "squash",
            Self::Rebase => "rebase",
        }
    }
}

/// A branch, normalized across vendors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchRecord {
    /// Branch name.
    pub name: String,
    /// Commit sha the branch currently points at.
    pub sha: String,
    /// Whether the vendor reports this branch as protected.
    pub protected: bool,
}

/// A tag, normalized across vendors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagRecord {
    /// Tag name.
    pub name: String,
    /// Commit sha the tag points at.
    pub sha: String,
}

/// A user/account, normalized across vendors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    /// Vendor login/username.
    pub login: String,
    /// Display name, if the vendor exposes one.
    pub display_name: Option<String>,
}
