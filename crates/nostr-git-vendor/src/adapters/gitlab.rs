// Distributed under the MIT software license

//! GitLab adapter: `https://gitlab.com/api/v4`, `PRIVATE-TOKEN: <t>` auth
//! (§6's "vendor-specific for GitLab"). Projects are addressed by their
//! URL-encoded `<owner>/<repo>` path; "merge requests" are this vendor's
//! name for pull requests.

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

const VENDOR: &str = "gitlab";

/// `GitServiceApi` backed by the GitLab REST v4 API.
pub struct GitLabAdapter {
    rest: RestClient,
    token: String,
}

impl GitLabAdapter {
    /// New adapter against gitlab.com (or a self-hosted `base_url`).
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base_url(token, "https://gitlab.com/api/v4")
    }

    /// New adapter against a self-hosted GitLab instance.
    pub fn with_base_url(token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self { rest: RestClient::new(VENDOR, base_url), token: token.into() }
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        self.rest.request(method, path).header("PRIVATE-TOKEN", &self.token)
    }

    fn project_id(full_name: &str) -> String {
        urlencoding_percent_encode(full_name)
    }
}

/// Minimal percent-encoding: GitLab project paths only contain `/` that
/// needs escaping for this adapter's purposes.
fn urlencoding_percent_encode(s: &str) -> String {
    s.replace('/', "%2F")
}

#[derive(Debug, Deserialize)]
struct GlProject {
    path_with_namespace: String,
    description: Option<String>,
    default_branch: Option<String>,
    http_url_to_repo: String,
    visibility: String,
}

impl From<GlProject> for RepoRecord {
    fn from(p: GlProject) -> Self {
        RepoRecord {
            full_name: p.path_with_namespace,
            description: p.description,
            default_branch: p.default_branch.unwrap_or_else(|| "main".to_string()),
            clone_url: p.http_url_to_repo,
            private: p.visibility != "public",
        }
    }
}

#[derive(Debug, Serialize)]
struct GlProjectEdit {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    default_branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    visibility: Option<&'static str>,
}

impl From<RepoEdit> for GlProjectEdit {
    fn from(e: RepoEdit) -> Self {
        GlProjectEdit {
            name: None,
            path: None,
            description: e.description,
            default_branch: e.default_branch,
            visibility: e.private.map(|p| if p { "private" } else { "public" }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GlCommit {
    id: String,
    message: String,
    author_name: String,
    author_email: String,
    authored_date: String,
    #[serde(default)]
    parent_ids: Vec<String>,
}

impl From<GlCommit> for CommitRecord {
    fn from(c: GlCommit) -> Self {
        let authored_at = chrono::DateTime::parse_from_rfc3339(&c.authored_date)
            .map(|d| d.timestamp())
            .unwrap_or(0);
        CommitRecord {
            sha: c.id,
            message: c.message,
            author_name: c.author_name,
            author_email: c.author_email,
            authored_at,
            parents: c.parent_ids,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GlIssue {
    iid: u64,
    title: String,
    #[serde(default)]
    description: String,
    state: String,
    #[serde(default)]
    labels: Vec<String>,
}

impl From<GlIssue> for IssueRecord {
    fn from(i: GlIssue) -> Self {
        IssueRecord {
            number: i.iid,
            title: i.title,
            body: i.description,
            state: if i.state == "closed" { ItemState::Closed } else { ItemState::Open },
            labels: i.labels,
        }
    }
}

#[derive(Debug, Serialize)]
struct GlIssueEdit {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    labels: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    state_event: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct GlMergeRequest {
    iid: u64,
    title: String,
    #[serde(default)]
    description: String,
    state: String,
    source_branch: String,
    target_branch: String,
    #[serde(default)]
    merged_at: Option<String>,
}

impl From<GlMergeRequest> for PullRequestRecord {
    fn from(m: GlMergeRequest) -> Self {
        PullRequestRecord {
            number: m.iid,
            title: m.title,
            body: m.description,
            state: if m.state == "closed" || m.state == "merged" { ItemState::Closed } else { ItemState::Open },
            head_branch: m.source_branch,
            base_branch: m.target_branch,
            merged: m.merged_at.is_some(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GlBranch {
    name: String,
    commit: GlBranchCommit,
    protected: bool,
}

#[derive(Debug, Deserialize)]
struct GlBranchCommit {
    id: String,
}

impl From<GlBranch> for BranchRecord {
    fn from(b: GlBranch) -> Self {
        BranchRecord { name: b.name, sha: b.commit.id, protected: b.protected }
    }
}

#[derive(Debug, Deserialize)]
struct GlTag {
    name: String,
    commit: GlBranchCommit,
}

impl From<GlTag> for TagRecord {
    fn from(t: GlTag) -> Self {
        TagRecord { name: t.name, sha: t.commit.id }
    }
}

#[derive(Debug, Deserialize)]
struct GlUser {
    username: String,
    #[serde(default)]
    name: Option<String>,
}

impl From<GlUser> for UserRecord {
    fn from(u: GlUser) -> Self {
        UserRecord { login: u.username, display_name: u.name }
    }
}

#[async_trait]
impl GitServiceApi for GitLabAdapter {
    fn vendor(&self) -> &'static str {
        VENDOR
    }

    async fn get_repo(&self, full_name: &str) -> Result<RepoRecord, VendorError> {
        let project: GlProject = self
            .rest
            .send_json(self.request(Method::GET, &format!("/projects/{}", Self::project_id(full_name))))
            .await?;
        Ok(project.into())
    }

    async fn create_repo(&self, name: &str, edit: RepoEdit) -> Result<RepoRecord, VendorError> {
        let mut body: GlProjectEdit = edit.into();
        body.name = Some(name.to_string());
        body.path = Some(name.to_string());
        let project: GlProject = self.rest.send_json(self.request(Method::POST, "/projects").json(&body)).await?;
        Ok(project.into())
    }

    async fn update_repo(&self, full_name: &str, edit: RepoEdit) -> Result<RepoRecord, VendorError> {
        let body: GlProjectEdit = edit.into();
        let project: GlProject = self
            .rest
            .send_json(self.request(Method::PUT, &format!("/projects/{}", Self::project_id(full_name))).json(&body))
            .await?;
        Ok(project.into())
    }

    async fn fork_repo(&self, full_name: &str) -> Result<RepoRecord, VendorError> {
        let project: GlProject = self
            .rest
            .send_json(self.request(Method::POST, &format!("/projects/{}/fork", Self::project_id(full_name))))
            .await?;
        Ok(project.into())
    }

    async fn list_commits(&self, full_name: &str, opts: ListCommitsOptions) -> Result<Vec<CommitRecord>, VendorError> {
        let mut path = format!("/projects/{}/repository/commits?", Self::project_id(full_name));
        if let Some(branch) = &opts.branch {
            path.push_str(&format!("ref_name={branch}&"));
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
        let commits: Vec<GlCommit> = self.rest.send_json(self.request(Method::GET, &path)).await?;
        Ok(commits.into_iter().map(Into::into).collect())
    }

    async fn get_commit(&self, full_name: &str, sha: &str) -> Result<CommitRecord, VendorError> {
        let commit: GlCommit = self
            .rest
            .send_json(self.request(
                Method::GET,
                &format!("/projects/{}/repository/commits/{sha}", Self::project_id(full_name)),
            ))
            .await?;
        Ok(commit.into())
    }

    async fn list_issues(&self, full_name: &str, state: Option<ItemState>) -> Result<Vec<IssueRecord>, VendorError> {
        let state_param = match state {
            Some(ItemState::Open) => "opened",
            Some(ItemState::Closed) => "closed",
            None => "all",
        };
        let issues: Vec<GlIssue> = self
            .rest
            .send_json(self.request(
                Method::GET,
                &format!("/projects/{}/issues?state={state_param}", Self::project_id(full_name)),
            ))
            .await?;
        Ok(issues.into_iter().map(Into::into).collect())
    }

    async fn get_issue(&self, full_name: &str, number: u64) -> Result<IssueRecord, VendorError> {
        let issue: GlIssue = self
            .rest
            .send_json(self.request(
                Method::GET,
                &format!("/projects/{}/issues/{number}", Self::project_id(full_name)),
            ))
            .await?;
        Ok(issue.into())
    }

    async fn create_issue(&self, full_name: &str, edit: IssueEdit) -> Result<IssueRecord, VendorError> {
        let body = GlIssueEdit {
            title: edit.title,
            description: edit.body,
            labels: edit.labels.map(|l| l.join(",")),
            state_event: None,
        };
        let issue: GlIssue = self
            .rest
            .send_json(self.request(Method::POST, &format!("/projects/{}/issues", Self::project_id(full_name))).json(&body))
            .await?;
        Ok(issue.into())
    }

    async fn update_issue(&self, full_name: &str, number: u64, edit: IssueEdit) -> Result<IssueRecord, VendorError> {
        let body = GlIssueEdit {
            title: edit.title,
            description: edit.body,
            labels: edit.labels.map(|l| l.join(",")),
            state_event: None,
        };
        let issue: GlIssue = self
            .rest
            .send_json(
                self.request(Method::PUT, &format!("/projects/{}/issues/{number}", Self::project_id(full_name)))
                    .json(&body),
            )
            .await?;
        Ok(issue.into())
    }

    async fn close_issue(&self, full_name: &str, number: u64) -> Result<IssueRecord, VendorError> {
        let body = GlIssueEdit { title: None, description: None, labels: None, state_event: Some("close") };
        let issue: GlIssue = self
            .rest
            .send_json(
                self.request(Method::PUT, &format!("/projects/{}/issues/{number}", Self::project_id(full_name)))
                    .json(&body),
            )
            .await?;
        Ok(issue.into())
    }

    async fn list_pull_requests(
        &self,
        full_name: &str,
        state: Option<ItemState>,
    ) -> Result<Vec<PullRequestRecord>, VendorError> {
        let state_param = match state {
            Some(ItemState::Open) => "opened",
            Some(ItemState::Closed) => "closed",
            None => "all",
        };
        let mrs: Vec<GlMergeRequest> = self
            .rest
            .send_json(self.request(
                Method::GET,
                &format!("/projects/{}/merge_requests?state={state_param}", Self::project_id(full_name)),
            ))
            .await?;
        Ok(mrs.into_iter().map(Into::into).collect())
    }

    async fn get_pull_request(&self, full_name: &str, number: u64) -> Result<PullRequestRecord, VendorError> {
        let mr: GlMergeRequest = self
            .rest
            .send_json(self.request(
                Method::GET,
                &format!("/projects/{}/merge_requests/{number}", Self::project_id(full_name)),
            ))
            .await?;
        Ok(mr.into())
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
            description: Option<String>,
            source_branch: String,
            target_branch: String,
        }
        let body = Body {
            title: edit.title,
            description: edit.body,
            source_branch: edit.head_branch.unwrap_or_default(),
            target_branch: edit.base_branch.unwrap_or_default(),
        };
        let mr: GlMergeRequest = self
            .rest
            .send_json(
                self.request(Method::POST, &format!("/projects/{}/merge_requests", Self::project_id(full_name)))
                    .json(&body),
            )
            .await?;
        Ok(mr.into())
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
            description: Option<String>,
        }
        let body = Body { title: edit.title, description: edit.body };
        let mr: GlMergeRequest = self
            .rest
            .send_json(
                self.request(Method::PUT, &format!("/projects/{}/merge_requests/{number}", Self::project_id(full_name)))
                    .json(&body),
            )
            .await?;
        Ok(mr.into())
    }

    async fn merge_pull_request(
        &self,
        full_name: &str,
        number: u64,
        method: MergeMethod,
    ) -> Result<PullRequestRecord, VendorError> {
        #[derive(Serialize)]
        struct Body {
            squash: bool,
        }
        let body = Body { squash: matches!(method, MergeMethod::Squash) };
        let mr: GlMergeRequest = self
            .rest
            .send_json(
                self.request(Method::PUT, &format!("/projects/{}/merge_requests/{number}/merge", Self::project_id(full_name)))
                    .json(&body),
            )
            .await?;
        Ok(mr.into())
    }

    async fn get_file_content(
        &self,
        full_name: &str,
        path: &str,
        git_ref: Option<&str>,
    ) -> Result<Vec<u8>, VendorError> {
        let git_ref = git_ref.unwrap_or("HEAD");
        let encoded_path = urlencoding_percent_encode(path);
        self.rest
            .send_bytes(self.request(
                Method::GET,
                &format!(
                    "/projects/{}/repository/files/{encoded_path}/raw?ref={git_ref}",
                    Self::project_id(full_name)
                ),
            ))
            .await
    }

    async fn list_branches(&self, full_name: &str) -> Result<Vec<BranchRecord>, VendorError> {
        let branches: Vec<GlBranch> = self
            .rest
            .send_json(self.request(Method::GET, &format!("/projects/{}/repository/branches", Self::project_id(full_name))))
            .await?;
        Ok(branches.into_iter().map(Into::into).collect())
    }

    async fn get_branch(&self, full_name: &str, name: &str) -> Result<BranchRecord, VendorError> {
        let branch: GlBranch = self
            .rest
            .send_json(self.request(
                Method::GET,
                &format!("/projects/{}/repository/branches/{name}", Self::project_id(full_name)),
            ))
            .await?;
        Ok(branch.into())
    }

    async fn list_tags(&self, full_name: &str) -> Result<Vec<TagRecord>, VendorError> {
        let tags: Vec<GlTag> = self
            .rest
            .send_json(self.request(Method::GET, &format!("/projects/{}/repository/tags", Self::project_id(full_name))))
            .await?;
        Ok(tags.into_iter().map(Into::into).collect())
    }

    async fn get_tag(&self, full_name: &str, name: &str) -> Result<TagRecord, VendorError> {
        let tag: GlTag = self
            .rest
            .send_json(self.request(
                Method::GET,
                &format!("/projects/{}/repository/tags/{name}", Self::project_id(full_name)),
            ))
            .await?;
        Ok(tag.into())
    }

    async fn get_current_user(&self) -> Result<UserRecord, VendorError> {
        let user: GlUser = self.rest.send_json(self.request(Method::GET, "/user")).await?;
        Ok(user.into())
    }

    async fn get_user(&self, login: &str) -> Result<UserRecord, VendorError> {
        let mut users: Vec<GlUser> = self
            .rest
            .send_json(self.request(Method::GET, &format!("/users?username={login}")))
            .await?;
        users
            .pop()
            .map(Into::into)
            .ok_or_else(|| VendorError::Http { vendor: VENDOR, status: 404, body: format!("user {login} not found") })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_id_percent_encodes_the_namespace_slash() {
        assert_eq!(GitLabAdapter::project_id("alice/widgets"), "alice%2Fwidgets");
    }

    #[test]
    fn maps_project_json_private_when_visibility_is_not_public() {
        let raw = r#"{"path_with_namespace":"alice/widgets","description":null,"default_branch":"main","http_url_to_repo":"https://gitlab.com/alice/widgets.git","visibility":"private"}"#;
        let project: GlProject = serde_json::from_str(raw).unwrap();
        let record: RepoRecord = project.into();
        assert_eq!(record.full_name, "alice/widgets");
        assert!(record.private);
    }

    #[test]
    fn merge_request_merged_state_counts_as_closed_and_merged() {
        let raw = r#"{"iid":3,"title":"t","state":"merged","source_branch":"feature","target_branch":"main","merged_at":"2024-02-01T00:00:00Z"}"#;
        let mr: GlMergeRequest = serde_json::from_str(raw).unwrap();
        let record: PullRequestRecord = mr.into();
        assert_eq!(record.state, ItemState::Closed);
        assert!(record.merged);
    }

    #[test]
    fn commit_maps_parent_ids_directly() {
        let raw = r#"{"id":"sha1","message":"msg","author_name":"Ada","author_email":"ada@example.com","authored_date":"2024-01-01T00:00:00Z","parent_ids":["p1","p2"]}"#;
        let commit: GlCommit = serde_json::from_str(raw).unwrap();
        let record: CommitRecord = commit.into();
        assert_eq!(record.parents, vec!["p1".to_string(), "p2".to_string()]);
    }
}
