// Distributed under the MIT software license

//! Gitea adapter: requires an explicit base URL, `token <t>` auth (§6).
//! Gitea's API v1 mirrors GitHub's v3 shape closely enough that the
//! response structs below are near-duplicates of the GitHub ones.

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

const VENDOR: &str = "gitea";

/// `GitServiceApi` backed by a Gitea instance's API v1.
pub struct GiteaAdapter {
    rest: RestClient,
    token: String,
}

impl GiteaAdapter {
    /// New adapter. Gitea has no fixed hosted instance, so `base_url` is mandatory.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            rest: RestClient::new(VENDOR, base_url),
            token: token.into(),
        }
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        self.rest
            .request(method, &format!("/api/v1{path}"))
            .header("Authorization", format!("token {}", self.token))
    }
}

#[derive(Debug, Deserialize)]
struct GtRepo {
    full_name: String,
    description: Option<String>,
    default_branch: String,
    clone_url: String,
    private: bool,
}

impl From<GtRepo> for RepoRecord {
    fn from(r: GtRepo) -> Self {
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
struct GtRepoEdit {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    default_branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    private: Option<bool>,
}

impl From<RepoEdit> for GtRepoEdit {
    fn from(e: RepoEdit) -> Self {
        GtRepoEdit { name: None, description: e.description, default_branch: e.default_branch, private: e.private }
    }
}

#[derive(Debug, Deserialize)]
struct GtCommitAuthor {
    name: String,
    email: String,
    date: String,
}

#[derive(Debug, Deserialize)]
struct GtCommitDetail {
    message: String,
    author: GtCommitAuthor,
}

#[derive(Debug, Deserialize)]
struct GtCommitParent {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct GtCommit {
    sha: String,
    commit: GtCommitDetail,
    #[serde(default)]
    parents: Vec<GtCommitParent>,
}

impl From<GtCommit> for CommitRecord {
    fn from(c: GtCommit) -> Self {
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
struct GtLabel {
    name: String,
}

#[derive(Debug, Deserialize)]
struct GtIssue {
    number: u64,
    title: String,
    #[serde(default)]
    body: String,
    state: String,
    #[serde(default)]
    labels: Vec<GtLabel>,
    #[serde(default)]
    pull_request: Option<serde_json::Value>,
}

impl From<GtIssue> for IssueRecord {
    fn from(i: GtIssue) -> Self {
        IssueRecord {
            number: i.number,
            title: i.title,
            body: i.body,
            state: if i.state == "closed" { ItemState::Closed } else { ItemState::Open },
            labels: i.labels.into_iter().map(|l| l.name).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct GtIssueEdit {
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
struct GtPullRequest {
    number: u64,
    title: String,
    #[serde(default)]
    body: String,
    state: String,
    head: GtBranchRef,
    base: GtBranchRef,
    #[serde(default)]
    merged: bool,
}

#[derive(Debug, Deserialize)]
struct GtBranchRef {
    #[serde(rename = "ref")]
    branch: String,
}

impl From<GtPullRequest> for PullRequestRecord {
    fn from(p: GtPullRequest) -> Self {
        PullRequestRecord {
            number: p.number,
            title: p.title,
            body: p.body,
            state: if p.state == "closed" { ItemState::Closed } else { ItemState::Open },
            head_branch: p.head.branch,
            base_branch: p.base.branch,
            merged: p.merged,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GtBranch {
    name: String,
    commit: GtBranchCommit,
    #[serde(default)]
    protected: bool,
}

#[derive(Debug, Deserialize)]
struct GtBranchCommit {
    id: String,
}

impl From<GtBranch> for BranchRecord {
    fn from(b: GtBranch) -> Self {
        BranchRecord { name: b.name, sha: b.commit.id, protected: b.protected }
    }
}

#[derive(Debug, Deserialize)]
struct GtTag {
    name: String,
    commit: GtBranchCommit,
}

impl From<GtTag> for TagRecord {
    fn from(t: GtTag) -> Self {
        TagRecord { name: t.name, sha: t.commit.id }
    }
}

#[derive(Debug, Deserialize)]
struct GtUser {
    login: String,
    #[serde(default)]
    full_name: String,
}

impl From<GtUser> for UserRecord {
    fn from(u: GtUser) -> Self {
        UserRecord {
            login: u.login,
            display_name: if u.full_name.is_empty() { None } else { Some(u.full_name) },
        }
    }
}

#[async_trait]
impl GitServiceApi for GiteaAdapter {
    fn vendor(&self) -> &'static str {
        VENDOR
    }

    async fn get_repo(&self, full_name: &str) -> Result<RepoRecord, VendorError> {
        let repo: GtRepo = self.rest.send_json(self.request(Method::GET, &format!("/repos/{full_name}"))).await?;
        Ok(repo.into())
    }

    async fn create_repo(&self, name: &str, edit: RepoEdit) -> Result<RepoRecord, VendorError> {
        let mut body: GtRepoEdit = edit.into();
        body.name = Some(name.to_string());
        let repo: GtRepo = self.rest.send_json(self.request(Method::POST, "/user/repos").json(&body)).await?;
        Ok(repo.into())
    }

    async fn update_repo(&self, full_name: &str, edit: RepoEdit) -> Result<RepoRecord, VendorError> {
        let body: GtRepoEdit = edit.into();
        let repo: GtRepo = self
            .rest
            .send_json(self.request(Method::PATCH, &format!("/repos/{full_name}")).json(&body))
            .await?;
        Ok(repo.into())
    }

    async fn fork_repo(&self, full_name: &str) -> Result<RepoRecord, VendorError> {
        let repo: GtRepo = self
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
        if let Some(p) = &opts.page {
            path.push_str(&format!("page={p}&"));
        }
        if let Some(per_page) = opts.per_page {
            path.push_str(&format!("limit={per_page}&"));
        }
        let commits: Vec<GtCommit> = self.rest.send_json(self.request(Method::GET, &path)).await?;
        Ok(commits.into_iter().map(Into::into).collect())
    }

    async fn get_commit(&self, full_name: &str, sha: &str) -> Result<CommitRecord, VendorError> {
        let commit: GtCommit = self
            .rest
            .send_json(self.request(Method::GET, &format!("/repos/{full_name}/git/commits/{sha}")))
            .await?;
        Ok(commit.into())
    }

    async fn list_issues(&self, full_name: &str, state: Option<ItemState>) -> Result<Vec<IssueRecord>, VendorError> {
        let state_param = match state {
            Some(ItemState::Open) => "open",
            Some(ItemState::Closed) => "closed",
            None => "all",
        };
        let issues: Vec<GtIssue> = self
            .rest
            .send_json(self.request(Method::GET, &format!("/repos/{full_name}/issues?state={state_param}")))
            .await?;
        Ok(issues.into_iter().filter(|i| i.pull_request.is_none()).map(Into::into).collect())
    }

    async fn get_issue(&self, full_name: &str, number: u64) -> Result<IssueRecord, VendorError> {
        let issue: GtIssue = self
            .rest
            .send_json(self.request(Method::GET, &format!("/repos/{full_name}/issues/{number}")))
            .await?;
        Ok(issue.into())
    }

    async fn create_issue(&self, full_name: &str, edit: IssueEdit) -> Result<IssueRecord, VendorError> {
        let body = GtIssueEdit { title: edit.title, body: edit.body, labels: edit.labels, state: None };
        let issue: GtIssue = self
            .rest
            .send_json(self.request(Method::POST, &format!("/repos/{full_name}/issues")).json(&body))
            .await?;
        Ok(issue.into())
    }

    async fn update_issue(&self, full_name: &str, number: u64, edit: IssueEdit) -> Result<IssueRecord, VendorError> {
        let body = GtIssueEdit { title: edit.title, body: edit.body, labels: edit.labels, state: None };
        let issue: GtIssue = self
            .rest
            .send_json(self.request(Method::PATCH, &format!("/repos/{full_name}/issues/{number}")).json(&body))
            .await?;
        Ok(issue.into())
    }

    async fn close_issue(&self, full_name: &str, number: u64) -> Result<IssueRecord, VendorError> {
        let body = GtIssueEdit { title: None, body: None, labels: None, state: Some("closed") };
        let issue: GtIssue = self
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
        let prs: Vec<GtPullRequest> = self
            .rest
            .send_json(self.request(Method::GET, &format!("/repos/{full_name}/pulls?state={state_param}")))
            .await?;
        Ok(prs.into_iter().map(Into::into).collect())
    }

    async fn get_pull_request(&self, full_name: &str, number: u64) -> Result<PullRequestRecord, VendorError> {
        let pr: GtPullRequest = self
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
        #[derive(Serialize)]
        struct Body {
            #[serde(skip_serializing_if = "Option::is_none")]
            title: Option<String>,
            #[serde(skip_serializing_if = "Option::is_none")]
            body: Option<String>,
            #[serde(skip_serializing_if = "Option::is_none")]
            head: Option<String>,
            #[serde(skip_serializing_if = "Option::is_none")]
            base: Option<String>,
        }
        let body = Body { title: edit.title, body: edit.body, head: edit.head_branch, base: edit.base_branch };
        let pr: GtPullRequest = self
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
        #[derive(Serialize)]
        struct Body {
            #[serde(skip_serializing_if = "Option::is_none")]
            title: Option<String>,
            #[serde(skip_serializing_if = "Option::is_none")]
            body: Option<String>,
        }
        let body = Body { title: edit.title, body: edit.body };
        let pr: GtPullRequest = self
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
        struct Body {
            #[serde(rename = "Do")]
            do_method: &'static str,
        }
        let body = Body { do_method: method.as_str() };
        let _: serde_json::Value = self
            .rest
            .send_json(self.request(Method::POST, &format!("/repos/{full_name}/pulls/{number}/merge")).json(&body))
            .await?;
        self.get_pull_request(full_name, number).await
    }

    async fn get_file_content(
        &self,
        full_name: &str,
        path: &str,
        git_ref: Option<&str>,
    ) -> Result<Vec<u8>, VendorError> {
        let mut path_with_query = format!("/repos/{full_name}/raw/{path}");
        if let Some(r) = git_ref {
            path_with_query.push_str(&format!("?ref={r}"));
        }
        self.rest.send_bytes(self.request(Method::GET, &path_with_query)).await
    }

    async fn list_branches(&self, full_name: &str) -> Result<Vec<BranchRecord>, VendorError> {
        let branches: Vec<GtBranch> = self
            .rest
            .send_json(self.request(Method::GET, &format!("/repos/{full_name}/branches")))
            .await?;
        Ok(branches.into_iter().map(Into::into).collect())
    }

    async fn get_branch(&self, full_name: &str, name: &str) -> Result<BranchRecord, VendorError> {
        let branch: GtBranch = self
            .rest
            .send_json(self.request(Method::GET, &format!("/repos/{full_name}/branches/{name}")))
            .await?;
        Ok(branch.into())
    }

    async fn list_tags(&self, full_name: &str) -> Result<Vec<TagRecord>, VendorError> {
        let tags: Vec<GtTag> =
            self.rest.send_json(self.request(Method::GET, &format!("/repos/{full_name}/tags"))).await?;
        Ok(tags.into_iter().map(Into::into).collect())
    }

    async fn get_tag(&self, full_name: &str, name: &str) -> Result<TagRecord, VendorError> {
        let tag: GtTag = self
            .rest
            .send_json(self.request(Method::GET, &format!("/repos/{full_name}/tags/{name}")))
            .await?;
        Ok(tag.into())
    }

    async fn get_current_user(&self) -> Result<UserRecord, VendorError> {
        let user: GtUser = self.rest.send_json(self.request(Method::GET, "/user")).await?;
        Ok(user.into())
    }

    async fn get_user(&self, login: &str) -> Result<UserRecord, VendorError> {
        let user: GtUser =
            self.rest.send_json(self.request(Method::GET, &format!("/users/{login}"))).await?;
        Ok(user.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_repo_json_like_github_shape() {
        let raw = r#"{"full_name":"alice/widgets","description":null,"default_branch":"main","clone_url":"https://gitea.example/alice/widgets.git","private":true}"#;
        let repo: GtRepo = serde_json::from_str(raw).unwrap();
        let record: RepoRecord = repo.into();
        assert!(record.private);
        assert_eq!(record.clone_url, "https://gitea.example/alice/widgets.git");
    }

    #[test]
    fn issue_list_excludes_entries_carrying_a_pull_request_field() {
        let raw = r#"{"number":4,"title":"t","state":"open","labels":[],"pull_request":{}}"#;
        let issue: GtIssue = serde_json::from_str(raw).unwrap();
        assert!(issue.pull_request.is_some());
    }

    #[test]
    fn branch_and_tag_share_the_same_commit_shape() {
        let branch_raw = r#"{"name":"main","commit":{"id":"deadbeef"},"protected":true}"#;
        let branch: GtBranch = serde_json::from_str(branch_raw).unwrap();
        let record: BranchRecord = branch.into();
        assert_eq!(record.sha, "deadbeef");
        assert!(record.protected);
    }
}
