// Distributed under the MIT software license

//! GitHub adapter: `https://api.github.com`, `Authorization: token <t>`,
//! `Accept: application/vnd.github.v3+json` (§6).

use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::adapters::http::RestClient;
use crate::api::GitServiceApi;
use crate::error::VendorError;
use crate::types::{
    BranchRecord, CommitRecord, IssueEdit, IssueRecord, ItemState, ListCommitsOptions, MergeMethod,
    PullRequestEdit, PullRequestRecord, RepoEdit, RepoRecord, TagRecord, UserRecord,
};

const VENDOR: &str = "github";

/// `GitServiceApi` backed by the GitHub REST v3 API.
pub struct GitHubAdapter {
    rest: RestClient,
    token: String,
}

impl GitHubAdapter {
    /// New adapter against GitHub.com (or a GitHub Enterprise `base_url`).
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base_url(token, "https://api.github.com")
    }

    /// New adapter against a custom base URL (GitHub Enterprise).
    pub fn with_base_url(token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            rest: RestClient::new(VENDOR, base_url),
            token: token.into(),
        }
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        self.rest
            .request(method, path)
            .header("Authorization", format!("token {}", self.token))
            .header("Accept", "application/vnd.github.v3+json")
            .header("User-Agent", "nostr-git")
    }
}

#[derive(Debug, Deserialize)]
struct GhRepo {
    full_name: String,
    description: Option<String>,
    default_branch: String,
    clone_url: String,
    private: bool,
}

impl From<GhRepo> for RepoRecord {
    fn from(r: GhRepo) -> Self {
        RepoRecord {
            full_name: r.full_name,
            description: r.description,
            default_branch: r.default_branch,
            clone_url: r.clone_url,
            private: r.private,
        }
    }
}

#[derive(Debug, Serialize)]
struct GhRepoEdit {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    default_branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    private: Option<bool>,
}

impl From<RepoEdit> for GhRepoEdit {
    fn from(e: RepoEdit) -> Self {
        GhRepoEdit {
            name: None,
            description: e.description,
            default_branch: e.default_branch,
            private: e.private,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GhCommitAuthor {
    name: String,
    email: String,
    date: String,
}

#[derive(Debug, Deserialize)]
struct GhCommitDetail {
    message: String,
    author: GhCommitAuthor,
}

#[derive(Debug, Deserialize)]
struct GhCommitParent {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct GhCommit {
    sha: String,
    commit: GhCommitDetail,
    parents: Vec<GhCommitParent>,
}

impl From<GhCommit> for CommitRecord {
    fn from(c: GhCommit) -> Self {
        let authored_at = chrono::DateTime::parse_from_rfc3339(&c.commit.author.date)
            .map(|d| d.timestamp())
            .unwrap_or(0);
        CommitRecord {
            sha: c.sha,
            message: c.commit.message,
            author_name: c.commit.author.name,
            author_email: c.commit.author.email,
            authored_at,
            parents: c.parents.into_iter().map(|p| p.sha).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GhLabel {
    name: String,
}

#[derive(Debug, Deserialize)]
struct GhIssue {
    number: u64,
    title: String,
    #[serde(default)]
    body: Option<String>,
    state: String,
    #[serde(default)]
    labels: Vec<GhLabel>,
    #[serde(default)]
    pull_request: Option<serde_json::Value>,
}

impl From<GhIssue> for IssueRecord {
    fn from(i: GhIssue) -> Self {
        IssueRecord {
            number: i.number,
            title: i.title,
            body: i.body.unwrap_or_default(),
            state: if i.state == "closed" { ItemState::Closed } else { ItemState::Open },
            labels: i.labels.into_iter().map(|l| l.name).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct GhIssueEdit {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    labels: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct GhPullRequestHead {
    #[serde(rename = "ref")]
    branch: String,
}

#[derive(Debug, Deserialize)]
struct GhPullRequest {
    number: u64,
    title: String,
    #[serde(default)]
    body: Option<String>,
    state: String,
    head: GhPullRequestHead,
    base: GhPullRequestHead,
    #[serde(default)]
    merged: bool,
}

impl From<GhPullRequest> for PullRequestRecord {
    fn from(p: GhPullRequest) -> Self {
        PullRequestRecord {
            number: p.number,
            title: p.title,
            body: p.body.unwrap_or_default(),
            state: if p.state == "closed" { ItemState::Closed } else { ItemState::Open },
            head_branch: p.head.branch,
            base_branch: p.base.branch,
            merged: p.merged,
        }
    }
}

#[derive(Debug, Serialize)]
struct GhPullRequestEdit {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    head: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    base: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GhBranchCommit {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct GhBranch {
    name: String,
    commit: GhBranchCommit,
    #[serde(default)]
    protected: bool,
}

impl From<GhBranch> for BranchRecord {
    fn from(b: GhBranch) -> Self {
        BranchRecord { name: b.name, sha: b.commit.sha, protected: b.protected }
    }
}

#[derive(Debug, Deserialize)]
struct GhTag {
    name: String,
    commit: GhBranchCommit,
}

impl From<GhTag> for TagRecord {
    fn from(t: GhTag) -> Self {
        TagRecord { name: t.name, sha: t.commit.sha }
    }
}

#[derive(Debug, Deserialize)]
struct GhUser {
    login: String,
    #[serde(default)]
    name: Option<String>,
}

impl From<GhUser> for UserRecord {
    fn from(u: GhUser) -> Self {
        UserRecord { login: u.login, display_name: u.name }
    }
}

#[async_trait]
impl GitServiceApi for GitHubAdapter {
    fn vendor(&self) -> &'static str {
        VENDOR
    }

    async fn get_repo(&self, full_name: &str) -> Result<RepoRecord, VendorError> {
        let repo: GhRepo = self
            .rest
            .send_json(self.request(Method::GET, &format!("/repos/{full_name}")))
            .await?;
        Ok(repo.into())
    }

    async fn create_repo(&self, name: &str, edit: RepoEdit) -> Result<RepoRecord, VendorError> {
        let mut body: GhRepoEdit = edit.into();
        body.name = Some(name.to_string());
        let repo: GhRepo = self
            .rest
            .send_json(self.request(Method::POST, "/user/repos").json(&body))
            .await?;
        Ok(repo.into())
    }

    async fn update_repo(&self, full_name: &str, edit: RepoEdit) -> Result<RepoRecord, VendorError> {
        let body: GhRepoEdit = edit.into();
        let repo: GhRepo = self
            .rest
            .send_json(self.request(Method::PATCH, &format!("/repos/{full_name}")).json(&body))
            .await?;
        Ok(repo.into())
    }

    async fn fork_repo(&self, full_name: &str) -> Result<RepoRecord, VendorError> {
        let repo: GhRepo = self
            .rest
            .send_json(self.request(Method::POST, &format!("/repos/{full_name}/forks")))
            .await?;
        Ok(repo.into())
    }

    async fn list_commits(&self, full_name: &str, opts: ListCommitsOptions) -> Result<Vec<CommitRecord>, VendorError> {
        let mut path = format!("/repos/{full_name}/commits?");
        if let Some(branch) = &opts.branch {
            path.push_str(&format!("sha={branch}&"));
        }
        if let Some(p) = &opts.path {
            path.push_str(&format!("path={p}&"));
        }
        if let Some(per_page) = opts.per_page {
            path.push_str(&format!("per_page={per_page}&"));
        }
        if let Some(page) = opts.page {
            path.push_str(&format!("page={page}&"));
        }
        let commits: Vec<GhCommit> = self.rest.send_json(self.request(Method::GET, &path)).await?;
        Ok(commits.into_iter().map(Into::into).collect())
    }

    async fn get_commit(&self, full_name: &str, sha: &str) -> Result<CommitRecord, VendorError> {
        let commit: GhCommit = self
            .rest
            .send_json(self.request(Method::GET, &format!("/repos/{full_name}/commits/{sha}")))
            .await?;
        Ok(commit.into())
    }

    async fn list_issues(&self, full_name: &str, state: Option<ItemState>) -> Result<Vec<IssueRecord>, VendorError> {
        let state_param = match state {
            Some(ItemState::Open) => "open",
            Some(ItemState::Closed) => "closed",
            None => "all",
        };
        let issues: Vec<GhIssue> = self
            .rest
            .send_json(self.request(Method::GET, &format!("/repos/{full_name}/issues?state={state_param}")))
            .await?;
        Ok(issues.into_iter().filter(|i| i.pull_request.is_none()).map(Into::into).collect())
    }

    async fn get_issue(&self, full_name: &str, number: u64) -> Result<IssueRecord, VendorError> {
        let issue: GhIssue = self
            .rest
            .send_json(self.request(Method::GET, &format!("/repos/{full_name}/issues/{number}")))
            .await?;
        Ok(issue.into())
    }

    async fn create_issue(&self, full_name: &str, edit: IssueEdit) -> Result<IssueRecord, VendorError> {
        let body = GhIssueEdit { title: edit.title, body: edit.body, labels: edit.labels, state: None };
        let issue: GhIssue = self
            .rest
            .send_json(self.request(Method::POST, &format!("/repos/{full_name}/issues")).json(&body))
            .await?;
        Ok(issue.into())
    }

    async fn update_issue(&self, full_name: &str, number: u64, edit: IssueEdit) -> Result<IssueRecord, VendorError> {
        let body = GhIssueEdit { title: edit.title, body: edit.body, labels: edit.labels, state: None };
        let issue: GhIssue = self
            .rest
            .send_json(self.request(Method::PATCH, &format!("/repos/{full_name}/issues/{number}")).json(&body))
            .await?;
        Ok(issue.into())
    }

    async fn close_issue(&self, full_name: &str, number: u64) -> Result<IssueRecord, VendorError> {
        let body = GhIssueEdit { title: None, body: None, labels: None, state: Some("closed") };
        let issue: GhIssue = self
            .rest
            .send_json(self.request(Method::PATCH, &format!("/repos/{full_name}/issues/{number}")).json(&body))
            .await?;
        Ok(issue.into())
    }

    async fn list_pull_requests(
        &self,
        full_name: &str,
        state: Option<ItemState>,
    ) -> Result<Vec<PullRequestRecord>, VendorError> {
        let state_param = match state {
            Some(ItemState::Open) => "open",
            Some(ItemState::Closed) => "closed",
            None => "all",
        };
        let prs: Vec<GhPullRequest> = self
            .rest
            .send_json(self.request(Method::GET, &format!("/repos/{full_name}/pulls?state={state_param}")))
            .await?;
        Ok(prs.into_iter().map(Into::into).collect())
    }

    async fn get_pull_request(&self, full_name: &str, number: u64) -> Result<PullRequestRecord, VendorError> {
        let pr: GhPullRequest = self
            .rest
            .send_json(self.request(Method::GET, &format!("/repos/{full_name}/pulls/{number}")))
            .await?;
        Ok(pr.into())
    }

    async fn create_pull_request(
        &self,
        full_name: &str,
        edit: PullRequestEdit,
    ) -> Result<PullRequestRecord, VendorError> {
        let body = GhPullRequestEdit {
            title: edit.title,
            body: edit.body,
            head: edit.head_branch,
            base: edit.base_branch,
        };
        let pr: GhPullRequest = self
            .rest
            .send_json(self.request(Method::POST, &format!("/repos/{full_name}/pulls")).json(&body))
            .await?;
        Ok(pr.into())
    }

    async fn update_pull_request(
        &self,
        full_name: &str,
        number: u64,
        edit: PullRequestEdit,
    ) -> Result<PullRequestRecord, VendorError> {
        let body = GhPullRequestEdit {
            title: edit.title,
            body: edit.body,
            head: edit.head_branch,
            base: edit.base_branch,
        };
        let pr: GhPullRequest = self
            .rest
            .send_json(self.request(Method::PATCH, &format!("/repos/{full_name}/pulls/{number}")).json(&body))
            .await?;
        Ok(pr.into())
    }

    async fn merge_pull_request(
        &self,
        full_name: &str,
        number: u64,
        method: MergeMethod,
    ) -> Result<PullRequestRecord, VendorError> {
        #[derive(Serialize)]
        struct MergeBody {
            merge_method: &'static str,
        }
        let body = MergeBody { merge_method: method.as_str() };
        let _: serde_json::Value = self
            .rest
            .send_json(self.request(Method::PUT, &format!("/repos/{full_name}/pulls/{number}/merge")).json(&body))
            .await?;
        self.get_pull_request(full_name, number).await
    }

    async fn get_file_content(
        &self,
        full_name: &str,
        path: &str,
        git_ref: Option<&str>,
    ) -> Result<Vec<u8>, VendorError> {
        let mut req = self
            .rest
            .request(Method::GET, &format!("/repos/{full_name}/contents/{path}"))
            .header("Authorization", format!("token {}", self.token))
            .header("Accept", "application/vnd.github.v3.raw");
        if let Some(r) = git_ref {
            req = req.query(&[("ref", r)]);
        }
        self.rest.send_bytes(req).await
    }

    async fn list_branches(&self, full_name: &str) -> Result<Vec<BranchRecord>, VendorError> {
        let branches: Vec<GhBranch> = self
            .rest
            .send_json(self.request(Method::GET, &format!("/repos/{full_name}/branches")))
            .await?;
        Ok(branches.into_iter().map(Into::into).collect())
    }

    async fn get_branch(&self, full_name: &str, name: &str) -> Result<BranchRecord, VendorError> {
        let branch: GhBranch = self
            .rest
            .send_json(self.request(Method::GET, &format!("/repos/{full_name}/branches/{name}")))
            .await?;
        Ok(branch.into())
    }

    async fn list_tags(&self, full_name: &str) -> Result<Vec<TagRecord>, VendorError> {
        let tags: Vec<GhTag> = self
            .rest
            .send_json(self.request(Method::GET, &format!("/repos/{full_name}/tags")))
            .await?;
        Ok(tags.into_iter().map(Into::into).collect())
    }

    async fn get_tag(&self, full_name: &str, name: &str) -> Result<TagRecord, VendorError> {
        self.list_tags(full_name)
            .await?
            .into_iter()
            .find(|t| t.name == name)
            .ok_or_else(|| VendorError::Http {
                vendor: VENDOR,
                status: 404,
                body: format!("tag {name} not found"),
            })
    }

    async fn get_current_user(&self) -> Result<UserRecord, VendorError> {
        let user: GhUser = self.rest.send_json(self.request(Method::GET, "/user")).await?;
        Ok(user.into())
    }

    async fn get_user(&self, login: &str) -> Result<UserRecord, VendorError> {
        let user: GhUser = self
            .rest
            .send_json(self.request(Method::GET, &format!("/users/{login}")))
            .await?;
        Ok(user.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_repo_json_into_normalized_record() {
        let raw = r#"{"full_name":"alice/widgets","description":"a repo","default_branch":"main","clone_url":"https://github.com/alice/widgets.git","private":false}"#;
        let repo: GhRepo = serde_json::from_str(raw).unwrap();
        let record: RepoRecord = repo.into();
        assert_eq!(record.full_name, "alice/widgets");
        assert_eq!(record.default_branch, "main");
        assert!(!record.private);
    }

    #[test]
    fn maps_commit_json_and_parses_rfc3339_author_date() {
        let raw = r#"{"sha":"abc123","commit":{"message":"fix bug","author":{"name":"Ada","email":"ada@example.com","date":"2024-01-15T12:00:00Z"}},"parents":[{"sha":"parent1"}]}"#;
        let commit: GhCommit = serde_json::from_str(raw).unwrap();
        let record: CommitRecord = commit.into();
        assert_eq!(record.sha, "abc123");
        assert_eq!(record.parents, vec!["parent1".to_string()]);
        assert_eq!(record.authored_at, 1_705_320_000);
    }

    #[test]
    fn issue_list_filters_out_pull_requests() {
        let issue_raw = r#"{"number":1,"title":"bug","state":"open","labels":[{"name":"bug"}]}"#;
        let pr_raw = r#"{"number":2,"title":"pr","state":"open","labels":[],"pull_request":{"url":"x"}}"#;
        let issue: GhIssue = serde_json::from_str(issue_raw).unwrap();
        let pr_as_issue: GhIssue = serde_json::from_str(pr_raw).unwrap();
        assert!(issue.pull_request.is_none());
        assert!(pr_as_issue.pull_request.is_some());
        let record: IssueRecord = issue.into();
        assert_eq!(record.state, ItemState::Open);
        assert_eq!(record.labels, vec!["bug".to_string()]);
    }

    #[test]
    fn pull_request_closed_state_maps_to_item_state_closed() {
        let raw = r#"{"number":7,"title":"feat","state":"closed","head":{"ref":"feature"},"base":{"ref":"main"},"merged":true}"#;
        let pr: GhPullRequest = serde_json::from_str(raw).unwrap();
        let record: PullRequestRecord = pr.into();
        assert_eq!(record.state, ItemState::Closed);
        assert!(record.merged);
        assert_eq!(record.head_branch, "feature");
        assert_eq!(record.base_branch, "main");
    }
}
