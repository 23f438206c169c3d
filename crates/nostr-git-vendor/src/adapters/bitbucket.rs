// Distributed under the MIT software license

//! Bitbucket adapter: 2.0 API, `Bearer <t>` auth, issue content lives
//! under `content.raw` (§6).

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

const VENDOR: &str = "bitbucket";

/// `GitServiceApi` backed by the Bitbucket Cloud 2.0 API.
pub struct BitbucketAdapter {
    rest: RestClient,
    token: String,
}

impl BitbucketAdapter {
    /// New adapter against `https://api.bitbucket.org/2.0`.
    pub fn new(token: impl Into<String>) -> Self {
        Self { rest: RestClient::new(VENDOR, "https://api.bitbucket.org/2.0"), token: token.into() }
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        self.rest.request(method, path).header("Authorization", format!("Bearer {}", self.token))
    }
}

#[derive(Debug, Deserialize)]
struct BbCloneLink {
    href: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct BbLinks {
    #[serde(default)]
    clone: Vec<BbCloneLink>,
}

#[derive(Debug, Deserialize)]
struct BbMainBranch {
    name: String,
}

#[derive(Debug, Deserialize)]
struct BbRepo {
    full_name: String,
    description: Option<String>,
    #[serde(default)]
    mainbranch: Option<BbMainBranch>,
    links: BbLinks,
    is_private: bool,
}

impl From<BbRepo> for RepoRecord {
    fn from(r: BbRepo) -> Self {
        let clone_url = r
            .links
            .clone
            .iter()
            .find(|l| l.name == "https")
            .map(|l| l.href.clone())
            .unwrap_or_default();
        RepoRecord {
            full_name: r.full_name,
            description: r.description,
            default_branch: r.mainbranch.map(|b| b.name).unwrap_or_else(|| "main".to_string()),
            clone_url,
            private: r.is_private,
        }
    }
}

#[derive(Debug, Serialize)]
struct BbRepoEdit {
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_private: Option<bool>,
}

impl From<RepoEdit> for BbRepoEdit {
    fn from(e: RepoEdit) -> Self {
        BbRepoEdit { description: e.description, is_private: e.private }
    }
}

#[derive(Debug, Deserialize)]
struct BbAuthorRaw {
    raw: String,
}

#[derive(Debug, Deserialize)]
struct BbCommitParent {
    hash: String,
}

#[derive(Debug, Deserialize)]
struct BbCommit {
    hash: String,
    message: String,
    author: BbAuthorRaw,
    date: String,
    #[serde(default)]
    parents: Vec<BbCommitParent>,
}

/// Bitbucket's author is a single "Name <email>" string; split it.
fn split_author_raw(raw: &str) -> (String, String) {
    match raw.split_once('<') {
        Some((name, rest)) => (name.trim().to_string(), rest.trim_end_matches('>').to_string()),
        None => (raw.to_string(), String::new()),
    }
}

impl From<BbCommit> for CommitRecord {
    fn from(c: BbCommit) -> Self {
        let (author_name, author_email) = split_author_raw(&c.author.raw);
        let authored_at = chrono::DateTime::parse_from_rfc3339(&c.date).map(|d| d.timestamp()).unwrap_or(0);
        CommitRecord {
            sha: c.hash,
            message: c.message,
            author_name,
            author_email,
            authored_at,
            parents: c.parents.into_iter().map(|p| p.hash).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct BbContent {
    raw: String,
}

#[derive(Debug, Deserialize)]
struct BbIssue {
    id: u64,
    title: String,
    #[serde(default)]
    content: Option<BbContent>,
    state: String,
}

impl From<BbIssue> for IssueRecord {
    fn from(i: BbIssue) -> Self {
        IssueRecord {
            number: i.id,
            title: i.title,
            body: i.content.map(|c| c.raw).unwrap_or_default(),
            state: if i.state == "new" || i.state == "open" { ItemState::Open } else { ItemState::Closed },
            labels: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize)]
struct BbIssueEdit {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<BbContentEdit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<&'static str>,
}

#[derive(Debug, Serialize)]
struct BbContentEdit {
    raw: String,
}

#[derive(Debug, Deserialize)]
struct BbPrBranchRef {
    name: String,
}

#[derive(Debug, Deserialize)]
struct BbPrEndpoint {
    branch: BbPrBranchRef,
}

#[derive(Debug, Deserialize)]
struct BbPullRequest {
    id: u64,
    title: String,
    #[serde(default)]
    description: String,
    state: String,
    source: BbPrEndpoint,
    destination: BbPrEndpoint,
}

impl From<BbPullRequest> for PullRequestRecord {
    fn from(p: BbPullRequest) -> Self {
        PullRequestRecord {
            number: p.id,
            title: p.title,
            body: p.description,
            state: if p.state == "OPEN" { ItemState::Open } else { ItemState::Closed },
            head_branch: p.source.branch.name,
            base_branch: p.destination.branch.name,
            merged: p.state == "MERGED",
        }
    }
}

#[derive(Debug, Deserialize)]
struct BbBranchTarget {
    hash: String,
}

#[derive(Debug, Deserialize)]
struct BbBranch {
    name: String,
    target: BbBranchTarget,
}

impl From<BbBranch> for BranchRecord {
    fn from(b: BbBranch) -> Self {
        BranchRecord { name: b.name, sha: b.target.hash, protected: false }
    }
}

impl From<BbBranch> for TagRecord {
    fn from(b: BbBranch) -> Self {
        TagRecord { name: b.name, sha: b.target.hash }
    }
}

#[derive(Debug, Deserialize)]
struct BbPage<T> {
    values: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct BbUser {
    username: String,
    #[serde(default)]
    display_name: Option<String>,
}

impl From<BbUser> for UserRecord {
    fn from(u: BbUser) -> Self {
        UserRecord { login: u.username, display_name: u.display_name }
    }
}

#[async_trait]
impl GitServiceApi for BitbucketAdapter {
    fn vendor(&self) -> &'static str {
        VENDOR
    }

    async fn get_repo(&self, full_name: &str) -> Result<RepoRecord, VendorError> {
        let repo: BbRepo = self.rest.send_json(self.request(Method::GET, &format!("/repositories/{full_name}"))).await?;
        Ok(repo.into())
    }

    async fn create_repo(&self, name: &str, edit: RepoEdit) -> Result<RepoRecord, VendorError> {
        let body: BbRepoEdit = edit.into();
        let repo: BbRepo = self
            .rest
            .send_json(self.request(Method::POST, &format!("/repositories/{name}")).json(&body))
            .await?;
        Ok(repo.into())
    }

    async fn update_repo(&self, full_name: &str, edit: RepoEdit) -> Result<RepoRecord, VendorError> {
        let body: BbRepoEdit = edit.into();
        let repo: BbRepo = self
            .rest
            .send_json(self.request(Method::PUT, &format!("/repositories/{full_name}")).json(&body))
            .await?;
        Ok(repo.into())
    }

    async fn fork_repo(&self, full_name: &str) -> Result<RepoRecord, VendorError> {
        let repo: BbRepo = self
            .rest
            .send_json(self.request(Method::POST, &format!("/repositories/{full_name}/forks")))
            .await?;
        Ok(repo.into())
    }

    async fn list_commits(&self, full_name: &str, opts: ListCommitsOptions) -> Result<Vec<CommitRecord>, VendorError> {
        let path = match &opts.branch {
            Some(branch) => format!("/repositories/{full_name}/commits/{branch}"),
            None => format!("/repositories/{full_name}/commits"),
        };
        let page: BbPage<BbCommit> = self.rest.send_json(self.request(Method::GET, &path)).await?;
        Ok(page.values.into_iter().map(Into::into).collect())
    }

    async fn get_commit(&self, full_name: &str, sha: &str) -> Result<CommitRecord, VendorError> {
        let commit: BbCommit = self
            .rest
            .send_json(self.request(Method::GET, &format!("/repositories/{full_name}/commit/{sha}")))
            .await?;
        Ok(commit.into())
    }

    async fn list_issues(&self, full_name: &str, state: Option<ItemState>) -> Result<Vec<IssueRecord>, VendorError> {
        let path = format!("/repositories/{full_name}/issues");
        let page: BbPage<BbIssue> = self.rest.send_json(self.request(Method::GET, &path)).await?;
        let issues = page.values.into_iter().map(IssueRecord::from);
        Ok(match state {
            Some(s) => issues.filter(|i| i.state == s).collect(),
            None => issues.collect(),
        })
    }

    async fn get_issue(&self, full_name: &str, number: u64) -> Result<IssueRecord, VendorError> {
        let issue: BbIssue = self
            .rest
            .send_json(self.request(Method::GET, &format!("/repositories/{full_name}/issues/{number}")))
            .await?;
        Ok(issue.into())
    }

    async fn create_issue(&self, full_name: &str, edit: IssueEdit) -> Result<IssueRecord, VendorError> {
        let body = BbIssueEdit {
            title: edit.title,
            content: edit.body.map(|raw| BbContentEdit { raw }),
            state: None,
        };
        let issue: BbIssue = self
            .rest
            .send_json(self.request(Method::POST, &format!("/repositories/{full_name}/issues")).json(&body))
            .await?;
        Ok(issue.into())
    }

    async fn update_issue(&self, full_name: &str, number: u64, edit: IssueEdit) -> Result<IssueRecord, VendorError> {
        let body = BbIssueEdit {
            title: edit.title,
            content: edit.body.map(|raw| BbContentEdit { raw }),
            state: None,
        };
        let issue: BbIssue = self
            .rest
            .send_json(self.request(Method::PUT, &format!("/repositories/{full_name}/issues/{number}")).json(&body))
            .await?;
        Ok(issue.into())
    }

    async fn close_issue(&self, full_name: &str, number: u64) -> Result<IssueRecord, VendorError> {
        let body = BbIssueEdit { title: None, content: None, state: Some("resolved") };
        let issue: BbIssue = self
            .rest
            .send_json(self.request(Method::PUT, &format!("/repositories/{full_name}/issues/{number}")).json(&body))
            .await?;
        Ok(issue.into())
    }

    async fn list_pull_requests(
        &self,
        full_name: &str,
        state: Option<ItemState>,
    ) -> Result<Vec<PullRequestRecord>, VendorError> {
        let path = format!("/repositories/{full_name}/pullrequests");
        let page: BbPage<BbPullRequest> = self.rest.send_json(self.request(Method::GET, &path)).await?;
        let prs = page.values.into_iter().map(PullRequestRecord::from);
        Ok(match state {
            Some(s) => prs.filter(|p| p.state == s).collect(),
            None => prs.collect(),
        })
    }

    async fn get_pull_request(&self, full_name: &str, number: u64) -> Result<PullRequestRecord, VendorError> {
        let pr: BbPullRequest = self
            .rest
            .send_json(self.request(Method::GET, &format!("/repositories/{full_name}/pullrequests/{number}")))
            .await?;
        Ok(pr.into())
    }

    async fn create_pull_request(
        &self,
        full_name: &str,
        edit: PullRequestEdit,
    ) -> Result<PullRequestRecord, VendorError> {
        #[derive(Serialize)]
        struct BranchRef {
            name: String,
        }
        #[derive(Serialize)]
        struct Body {
            #[serde(skip_serializing_if = "Option::is_none")]
            title: Option<String>,
            #[serde(skip_serializing_if = "Option::is_none")]
            description: Option<String>,
            source: BranchRefWrapper,
            destination: BranchRefWrapper,
        }
        #[derive(Serialize)]
        struct BranchRefWrapper {
            branch: BranchRef,
        }
        let body = Body {
            title: edit.title,
            description: edit.body,
            source: BranchRefWrapper { branch: BranchRef { name: edit.head_branch.unwrap_or_default() } },
            destination: BranchRefWrapper { branch: BranchRef { name: edit.base_branch.unwrap_or_default() } },
        };
        let pr: BbPullRequest = self
            .rest
            .send_json(self.request(Method::POST, &format!("/repositories/{full_name}/pullrequests")).json(&body))
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
            description: Option<String>,
        }
        let body = Body { title: edit.title, description: edit.body };
        let pr: BbPullRequest = self
            .rest
            .send_json(
                self.request(Method::PUT, &format!("/repositories/{full_name}/pullrequests/{number}")).json(&body),
            )
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
            merge_strategy: &'static str,
        }
        let merge_strategy = match method {
            MergeMethod::Merge => "merge_commit",
            MergeMethod::Squash => "squash",
            MergeMethod::Rebase => "fast_forward",
        };
        let body = Body { merge_strategy };
        let pr: BbPullRequest = self
            .rest
            .send_json(
                self.request(Method::POST, &format!("/repositories/{full_name}/pullrequests/{number}/merge"))
                    .json(&body),
            )
            .await?;
        Ok(pr.into())
    }

    async fn get_file_content(
        &self,
        full_name: &str,
        path: &str,
        git_ref: Option<&str>,
    ) -> Result<Vec<u8>, VendorError> {
        let git_ref = git_ref.unwrap_or("HEAD");
        self.rest
            .send_bytes(self.request(Method::GET, &format!("/repositories/{full_name}/src/{git_ref}/{path}")))
            .await
    }

    async fn list_branches(&self, full_name: &str) -> Result<Vec<BranchRecord>, VendorError> {
        let page: BbPage<BbBranch> = self
            .rest
            .send_json(self.request(Method::GET, &format!("/repositories/{full_name}/refs/branches")))
            .await?;
        Ok(page.values.into_iter().map(Into::into).collect())
    }

    async fn get_branch(&self, full_name: &str, name: &str) -> Result<BranchRecord, VendorError> {
        let branch: BbBranch = self
            .rest
            .send_json(self.request(Method::GET, &format!("/repositories/{full_name}/refs/branches/{name}")))
            .await?;
        Ok(branch.into())
    }

    async fn list_tags(&self, full_name: &str) -> Result<Vec<TagRecord>, VendorError> {
        let page: BbPage<BbBranch> = self
            .rest
            .send_json(self.request(Method::GET, &format!("/repositories/{full_name}/refs/tags")))
            .await?;
        Ok(page.values.into_iter().map(Into::into).collect())
    }

    async fn get_tag(&self, full_name: &str, name: &str) -> Result<TagRecord, VendorError> {
        let tag: BbBranch = self
            .rest
            .send_json(self.request(Method::GET, &format!("/repositories/{full_name}/refs/tags/{name}")))
            .await?;
        Ok(tag.into())
    }

    async fn get_current_user(&self) -> Result<UserRecord, VendorError> {
        let user: BbUser = self.rest.send_json(self.request(Method::GET, "/user")).await?;
        Ok(user.into())
    }

    async fn get_user(&self, login: &str) -> Result<UserRecord, VendorError> {
        let user: BbUser =
            self.rest.send_json(self.request(Method::GET, &format!("/users/{login}"))).await?;
        Ok(user.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_the_combined_author_raw_field() {
        assert_eq!(
            split_author_raw("Ada Lovelace <ada@example.com>"),
            ("Ada Lovelace".to_string(), "ada@example.com".to_string())
        );
        assert_eq!(split_author_raw("noemail"), ("noemail".to_string(), String::new()));
    }

    #[test]
    fn picks_the_https_clone_link_out_of_the_links_array() {
        let raw = r#"{"full_name":"alice/widgets","description":"d","mainbranch":{"name":"main"},"links":{"clone":[{"href":"ssh://git@bitbucket.org/alice/widgets.git","name":"ssh"},{"href":"https://bitbucket.org/alice/widgets.git","name":"https"}]},"is_private":false}"#;
        let repo: BbRepo = serde_json::from_str(raw).unwrap();
        let record: RepoRecord = repo.into();
        assert_eq!(record.clone_url, "https://bitbucket.org/alice/widgets.git");
    }

    #[test]
    fn issue_content_raw_becomes_the_body() {
        let raw = r#"{"id":9,"title":"bug","content":{"raw":"details here"},"state":"open"}"#;
        let issue: BbIssue = serde_json::from_str(raw).unwrap();
        let record: IssueRecord = issue.into();
        assert_eq!(record.body, "details here");
        assert_eq!(record.state, ItemState::Open);
    }

    #[test]
    fn pull_request_merged_state_sets_the_merged_flag() {
        let raw = r#"{"id":1,"title":"t","description":"","state":"MERGED","source":{"branch":{"name":"feature"}},"destination":{"branch":{"name":"main"}}}"#;
        let pr: BbPullRequest = serde_json::from_str(raw).unwrap();
        let record: PullRequestRecord = pr.into();
        assert!(record.merged);
        assert_eq!(record.state, ItemState::Closed);
    }
}
