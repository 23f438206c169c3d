// Distributed under the MIT software license

//! Native-relay adapter: derives a repository's HEAD from its reconciled
//! kind-30618 repo-state event and builds clone URLs from the
//! announcement's `clone` tags. There is no REST surface behind a
//! relay, so everything outside repo/branch/tag lookup returns
//! [`crate::error::VendorError::NotSupported`] (§4.D).

use async_trait::async_trait;
use nostr::nips::nip34::{RepoAnnouncement, RepoState};

use crate::api::GitServiceApi;
use crate::error::VendorError;
use crate::types::{
    BranchRecord, CommitRecord, IssueEdit, IssueRecord, ItemState, ListCommitsOptions, MergeMethod,
    PullRequestEdit, PullRequestRecord, RepoEdit, RepoRecord, TagRecord, UserRecord,
};

const VENDOR: &str = "native-relay";

fn not_supported(operation: &'static str) -> VendorError {
    VendorError::NotSupported { vendor: VENDOR, operation }
}

/// `GitServiceApi` view over an already-reconciled repo announcement and
/// ref map. Built by the caller (the reconciler owns fetching and
/// merging the underlying events); this adapter only projects what it's
/// given into the normalized vendor shape.
pub struct NativeRelayAdapter {
    announcement: RepoAnnouncement,
    state: RepoState,
}

impl NativeRelayAdapter {
    /// New adapter over a reconciled announcement and ref map.
    pub fn new(announcement: RepoAnnouncement, state: RepoState) -> Self {
        Self { announcement, state }
    }

    fn head_branch(&self) -> Option<&str> {
        self.state
            .refs
            .iter()
            .find(|r| r.name == "HEAD")
            .and_then(|r| r.value.strip_prefix("ref: refs/heads/"))
    }

    fn branch_commit(&self, name: &str) -> Option<&str> {
        self.state
            .refs
            .iter()
            .find(|r| r.name == format!("refs/heads/{name}"))
            .map(|r| r.value.as_str())
    }
}

#[async_trait]
impl GitServiceApi for NativeRelayAdapter {
    fn vendor(&self) -> &'static str {
        VENDOR
    }

    async fn get_repo(&self, full_name: &str) -> Result<RepoRecord, VendorError> {
        let default_branch = self.head_branch().unwrap_or("main").to_string();
        let clone_url = self
            .announcement
            .clone
            .first()
            .map(|u| u.to_string())
            .unwrap_or_default();
        Ok(RepoRecord {
            full_name: full_name.to_string(),
            description: self.announcement.description.clone(),
            default_branch,
            clone_url,
            private: false,
        })
    }

    async fn create_repo(&self, _name: &str, _edit: RepoEdit) -> Result<RepoRecord, VendorError> {
        Err(not_supported("createRepo"))
    }

    async fn update_repo(&self, _full_name: &str, _edit: RepoEdit) -> Result<RepoRecord, VendorError> {
        Err(not_supported("updateRepo"))
    }

    async fn fork_repo(&self, _full_name: &str) -> Result<RepoRecord, VendorError> {
        Err(not_supported("forkRepo"))
    }

    async fn list_commits(
        &self,
        _full_name: &str,
        _opts: ListCommitsOptions,
    ) -> Result<Vec<CommitRecord>, VendorError> {
        Err(not_supported("listCommits"))
    }

    async fn get_commit(&self, _full_name: &str, _sha: &str) -> Result<CommitRecord, VendorError> {
        Err(not_supported("getCommit"))
    }

    async fn list_issues(&self, _full_name: &str, _state: Option<ItemState>) -> Result<Vec<IssueRecord>, VendorError> {
        Err(not_supported("listIssues"))
    }

    async fn get_issue(&self, _full_name: &str, _number: u64) -> Result<IssueRecord, VendorError> {
        Err(not_supported("getIssue"))
    }

    async fn create_issue(&self, _full_name: &str, _edit: IssueEdit) -> Result<IssueRecord, VendorError> {
        Err(not_supported("createIssue"))
    }

    async fn update_issue(&self, _full_name: &str, _number: u64, _edit: IssueEdit) -> Result<IssueRecord, VendorError> {
        Err(not_supported("updateIssue"))
    }

    async fn close_issue(&self, _full_name: &str, _number: u64) -> Result<IssueRecord, VendorError> {
        Err(not_supported("closeIssue"))
    }

    async fn list_pull_requests(
        &self,
        _full_name: &str,
        _state: Option<ItemState>,
    ) -> Result<Vec<PullRequestRecord>, VendorError> {
        Err(not_supported("listPullRequests"))
    }

    async fn get_pull_request(&self, _full_name: &str, _number: u64) -> Result<PullRequestRecord, VendorError> {
        Err(not_supported("getPullRequest"))
    }

    async fn create_pull_request(
        &self,
        _full_name: &str,
        _edit: PullRequestEdit,
    ) -> Result<PullRequestRecord, VendorError> {
        Err(not_supported("createPullRequest"))
    }

    async fn update_pull_request(
        &self,
        _full_name: &str,
        _number: u64,
        _edit: PullRequestEdit,
    ) -> Result<PullRequestRecord, VendorError> {
        Err(not_supported("updatePullRequest"))
    }

    async fn merge_pull_request(
        &self,
        _full_name: &str,
        _number: u64,
        _method: MergeMethod,
    ) -> Result<PullRequestRecord, VendorError> {
        Err(not_supported("mergePullRequest"))
    }

    async fn get_file_content(
        &self,
        _full_name: &str,
        _path: &str,
        _git_ref: Option<&str>,
    ) -> Result<Vec<u8>, VendorError> {
        Err(not_supported("getFileContent"))
    }

    async fn list_branches(&self, _full_name: &str) -> Result<Vec<BranchRecord>, VendorError> {
        Ok(self
            .state
            .refs
            .iter()
            .filter_map(|r| r.name.strip_prefix("refs/heads/"))
            .map(|name| BranchRecord {
                name: name.to_string(),
                sha: self.branch_commit(name).unwrap_or_default().to_string(),
                protected: false,
            })
            .collect())
    }

    async fn get_branch(&self, _full_name: &str, name: &str) -> Result<BranchRecord, VendorError> {
        self.branch_commit(name)
            .map(|sha| BranchRecord { name: name.to_string(), sha: sha.to_string(), protected: false })
            .ok_or_else(|| VendorError::Http { vendor: VENDOR, status: 404, body: format!("branch {name} not found") })
    }

    async fn list_tags(&self, _full_name: &str) -> Result<Vec<TagRecord>, VendorError> {
        Ok(self
            .state
            .refs
            .iter()
            .filter_map(|r| r.name.strip_prefix("refs/tags/").map(|name| TagRecord { name: name.to_string(), sha: r.value.clone() }))
            .collect())
    }

    async fn get_tag(&self, full_name: &str, name: &str) -> Result<TagRecord, VendorError> {
        self.list_tags(full_name)
            .await?
            .into_iter()
            .find(|t| t.name == name)
            .ok_or_else(|| VendorError::Http { vendor: VENDOR, status: 404, body: format!("tag {name} not found") })
    }

    async fn get_current_user(&self) -> Result<UserRecord, VendorError> {
        Err(not_supported("getCurrentUser"))
    }

    async fn get_user(&self, _login: &str) -> Result<UserRecord, VendorError> {
        Err(not_supported("getUser"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nostr::nips::nip34::RefEntry;
    use url::Url;

    fn fixture() -> NativeRelayAdapter {
        let announcement = RepoAnnouncement {
            id: "widgets".into(),
            name: Some("Widgets".into()),
            description: Some("a repo".into()),
            web: vec![],
            clone: vec![Url::parse("https://relay.example/alice/widgets.git").unwrap()],
            relays: vec![],
            euc: None,
            maintainers: vec![],
            topics: vec![],
        };
        let state = RepoState {
            repo_id: "widgets".into(),
            refs: vec![
                RefEntry { name: "HEAD".into(), value: "ref: refs/heads/main".into(), ancestry: vec![] },
                RefEntry { name: "refs/heads/main".into(), value: "deadbeef".into(), ancestry: vec![] },
                RefEntry { name: "refs/tags/v1".into(), value: "cafef00d".into(), ancestry: vec![] },
            ],
        };
        NativeRelayAdapter::new(announcement, state)
    }

    #[tokio::test]
    async fn get_repo_derives_default_branch_from_head_and_first_clone_url() {
        let adapter = fixture();
        let repo = adapter.get_repo("alice/widgets").await.unwrap();
        assert_eq!(repo.default_branch, "main");
        assert_eq!(repo.clone_url, "https://relay.example/alice/widgets.git");
    }

    #[tokio::test]
    async fn list_branches_and_tags_project_from_the_ref_map() {
        let adapter = fixture();
        let branches = adapter.list_branches("alice/widgets").await.unwrap();
        assert_eq!(branches.len(), 1);
        assert_eq!(branches[0].sha, "deadbeef");

        let tags = adapter.list_tags("alice/widgets").await.unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].name, "v1");
        assert_eq!(tags[0].sha, "cafef00d");
    }

    #[tokio::test]
    async fn operations_with_no_relay_mapping_fail_not_supported() {
        let adapter = fixture();
        let err = adapter.list_issues("alice/widgets", None).await.unwrap_err();
        assert!(matches!(err, VendorError::NotSupported { vendor: "native-relay", operation: "listIssues" }));
    }
}
