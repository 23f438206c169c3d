// Distributed under the MIT software license

//! The `GitServiceApi` contract (§4.D, §6): a uniform repo/commit/
//! issue/PR/branch/tag/user surface every vendor adapter implements.

use async_trait::async_trait;

use crate::error::VendorError;
use crate::types::{
    BranchRecord, CommitRecord, IssueEdit, IssueRecord, ItemState, ListCommitsOptions, MergeMethod,
    PullRequestEdit, PullRequestRecord, RepoEdit, RepoRecord, TagRecord, UserRecord,
};

/// Uniform repository/commit/issue/PR/branch/tag surface across vendors.
///
/// Every method is fallible with a vendor-tagged [`VendorError`]; an
/// adapter that has no mapping for an operation (REST `listIssues`
/// against a bare relay, say) returns [`VendorError::NotSupported`]
/// rather than panicking or silently no-op'ing.
#[async_trait]
pub trait GitServiceApi: Send + Sync {
    /// This adapter's vendor tag, used in error messages and logging.
    fn vendor(&self) -> &'static str;

    /// Fetch a repository by `<owner>/<repo>`.
    async fn get_repo(&self, full_name: &str) -> Result<RepoRecord, VendorError>;
    /// Create a repository named `name`, applying `edit`.
    async fn create_repo(&self, name: &str, edit: RepoEdit) -> Result<RepoRecord, VendorError>;
    /// Update an existing repository's metadata.
    async fn update_repo(&self, full_name: &str, edit: RepoEdit) -> Result<RepoRecord, VendorError>;
    /// Fork a repository into the authenticated account.
    async fn fork_repo(&self, full_name: &str) -> Result<RepoRecord, VendorError>;

    /// List commits reachable from `opts.branch` (default branch if unset).
    async fn list_commits(&self, full_name: &str, opts: ListCommitsOptions) -> Result<Vec<CommitRecord>, VendorError>;
    /// Fetch a single commit by sha.
    async fn get_commit(&self, full_name: &str, sha: &str) -> Result<CommitRecord, VendorError>;

    /// List issues, optionally filtered by open/closed state.
    async fn list_issues(&self, full_name: &str, state: Option<ItemState>) -> Result<Vec<IssueRecord>, VendorError>;
    /// Fetch a single issue by number.
    async fn get_issue(&self, full_name: &str, number: u64) -> Result<IssueRecord, VendorError>;
    /// Create an issue.
    async fn create_issue(&self, full_name: &str, edit: IssueEdit) -> Result<IssueRecord, VendorError>;
    /// Update an issue's fields.
    async fn update_issue(&self, full_name: &str, number: u64, edit: IssueEdit) -> Result<IssueRecord, VendorError>;
    /// Close an issue.
    async fn close_issue(&self, full_name: &str, number: u64) -> Result<IssueRecord, VendorError>;

    /// List pull/merge requests, optionally filtered by state.
    async fn list_pull_requests(
        &self,
        full_name: &str,
        state: Option<ItemState>,
    ) -> Result<Vec<PullRequestRecord>, VendorError>;
    /// Fetch a single pull request by number.
    async fn get_pull_request(&self, full_name: &str, number: u64) -> Result<PullRequestRecord, VendorError>;
    /// Open a pull request.
    async fn create_pull_request(
        &self,
        full_name: &str,
        edit: PullRequestEdit,
    ) -> Result<PullRequestRecord, VendorError>;
    /// Update a pull request's fields.
    async fn update_pull_request(
        &self,
        full_name: &str,
        number: u64,
        edit: PullRequestEdit,
    ) -> Result<PullRequestRecord, VendorError>;
    /// Merge a pull request using the given method.
    async fn merge_pull_request(
        &self,
        full_name: &str,
        number: u64,
        method: MergeMethod,
    ) -> Result<PullRequestRecord, VendorError>;

    /// Fetch a file's raw content at `path`, optionally pinned to `git_ref`.
    async fn get_file_content(
        &self,
        full_name: &str,
        path: &str,
        git_ref: Option<&str>,
    ) -> Result<Vec<u8>, VendorError>;

    /// List branches.
    async fn list_branches(&self, full_name: &str) -> Result<Vec<BranchRecord>, VendorError>;
    /// Fetch a single branch.
    async fn get_branch(&self, full_name: &str, name: &str) -> Result<BranchRecord, VendorError>;
    /// List tags.
    async fn list_tags(&self, full_name: &str) -> Result<Vec<TagRecord>, VendorError>;
    /// Fetch a single tag.
    async fn get_tag(&self, full_name: &str, name: &str) -> Result<TagRecord, VendorError>;

    /// Fetch the authenticated user.
    async fn get_current_user(&self) -> Result<UserRecord, VendorError>;
    /// Fetch a user by login.
    async fn get_user(&self, login: &str) -> Result<UserRecord, VendorError>;
}
