// Distributed under the MIT software license

//! Uniform repo/commit/issue/PR/branch/tag/user surface across GitHub,
//! GitLab, Gitea, Bitbucket and native relays (§4.D).
//!
//! [`api::GitServiceApi`] is the capability every caller codes against;
//! [`adapters`] holds one implementation per vendor, normalizing each
//! REST dialect's response shapes into the [`types`] DTOs.

pub mod adapters;
pub mod api;
pub mod error;
pub mod types;

pub use adapters::{BitbucketAdapter, GiteaAdapter, GitHubAdapter, GitLabAdapter, NativeRelayAdapter};
pub use api::GitServiceApi;
pub use error::VendorError;
pub use types::{
    BranchRecord, CommitRecord, IssueEdit, IssueRecord, ItemState, ListCommitsOptions, MergeMethod,
    PullRequestEdit, PullRequestRecord, RepoEdit, RepoRecord, TagRecord, UserRecord,
};
