// Distributed under the MIT software license

//! NIP34: git collaboration over Nostr.
//!
//! <https://github.com/nostr-protocol/nips/blob/master/34.md>
//!
//! Covers the full event family used by the reconciliation engine (§3):
//! repo announcements/state, patches, issues, pull requests, status
//! events, and the stack/merge/conflict metadata sidecars.

use std::fmt;

use url::Url;

use crate::event::tag::{Tag, TagListExt};
use crate::nips::nip01::Coordinate;
use crate::nips::nip10::Marker;
use crate::{Event, EventBuilder, EventId, Kind, PublicKey};

/// Earliest-unique-commit tag marker.
pub const EUC: &str = "euc";

const GIT_REPO_ANNOUNCEMENT_ALT: &str = "git repository";
const GIT_ISSUE_ALT: &str = "git issue";
const GIT_PATCH_ALT: &str = "git patch";
const GIT_PR_ALT: &str = "git pull request";

/// Whether the codec validates mandatory tags while parsing (§4.A).
///
/// Production paths may skip validation for throughput; dev paths should
/// always validate. Kept explicit rather than a global so parsing stays
/// referentially transparent (§9 Design Notes).
#[derive(Debug, Clone, Copy, Default)]
pub struct CodecOptions {
    /// Reject events missing their mandatory identity tag.
    pub validate: bool,
}

impl CodecOptions {
    /// Validation always on — the conservative default for tests and tools.
    pub fn strict() -> Self {
        Self { validate: true }
    }

    /// Validation off — the fast path for trusted, already-filtered streams.
    pub fn lenient() -> Self {
        Self { validate: false }
    }
}

fn require_tag_value<'a>(event: &'a Event, name: &'static str, opts: CodecOptions) -> Result<&'a str, Error> {
    match event.get_tag_value(name) {
        Some(v) => Ok(v),
        None if opts.validate => Err(Error::MissingTag(name)),
        None => Ok(""),
    }
}

/// Codec error.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// A mandatory tag is absent.
    #[error("missing mandatory tag: {0}")]
    MissingTag(&'static str),
    /// A tag value failed to parse into its expected shape.
    #[error("malformed tag `{0}`: {1}")]
    Malformed(&'static str, String),
    /// Wrong event kind handed to a parser.
    #[error("unexpected kind: expected {expected}, found {found}")]
    UnexpectedKind {
        /// Kind the parser wanted.
        expected: Kind,
        /// Kind actually present.
        found: Kind,
    },
}

fn check_kind(event: &Event, expected: Kind) -> Result<(), Error> {
    if event.kind != expected {
        return Err(Error::UnexpectedKind {
            expected,
            found: event.kind,
        });
    }
    Ok(())
}

fn parse_urls(event: &Event, name: &str) -> Vec<Url> {
    event
        .get_tags(name)
        .into_iter()
        .flat_map(|t| t.values().iter())
        .filter_map(|s| Url::parse(s).ok())
        .collect()
}

fn parse_pubkeys(event: &Event, name: &str) -> Vec<PublicKey> {
    event
        .get_tags(name)
        .into_iter()
        .flat_map(|t| t.values().iter())
        .filter_map(|s| PublicKey::from_hex(s).ok())
        .collect()
}

// ---------------------------------------------------------------------
// Repo announcement (30617)
// ---------------------------------------------------------------------

/// Git repository announcement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoAnnouncement {
    /// `d`-tag repo-id.
    pub id: String,
    /// Human-readable name.
    pub name: Option<String>,
    /// Human-readable description.
    pub description: Option<String>,
    /// Webpage urls.
    pub web: Vec<Url>,
    /// Git-clone urls.
    pub clone: Vec<Url>,
    /// Relays this repo monitors for patches/issues.
    pub relays: Vec<Url>,
    /// Earliest-unique-commit identity (`r` tag, `euc` marker).
    pub euc: Option<String>,
    /// Recognized maintainers (owner pubkey is implicitly included, §4.C).
    pub maintainers: Vec<PublicKey>,
    /// `t` topic tags.
    pub topics: Vec<String>,
}

impl RepoAnnouncement {
    /// Build the signing-ready [`EventBuilder`].
    pub fn to_event_builder(&self) -> EventBuilder {
        let mut tags: Vec<Tag> = vec![Tag::identifier(self.id.clone())];

        if let Some(name) = &self.name {
            tags.push(Tag::custom("name", vec![name.clone()]));
        }
        if let Some(description) = &self.description {
            tags.push(Tag::custom("description", vec![description.clone()]));
        }
        if !self.web.is_empty() {
            tags.push(Tag::custom("web", self.web.iter().map(Url::to_string).collect()));
        }
        if !self.clone.is_empty() {
            tags.push(Tag::custom("clone", self.clone.iter().map(Url::to_string).collect()));
        }
        if !self.relays.is_empty() {
            tags.push(Tag::custom("relays", self.relays.iter().map(Url::to_string).collect()));
        }
        if let Some(euc) = &self.euc {
            tags.push(Tag::reference(euc.clone(), Some(EUC)));
        }
        if !self.maintainers.is_empty() {
            tags.push(Tag::custom(
                "maintainers",
                self.maintainers.iter().map(PublicKey::to_hex).collect(),
            ));
        }
        for topic in &self.topics {
            tags.push(Tag::hashtag(topic.clone()));
        }
        tags.push(Tag::alt(GIT_REPO_ANNOUNCEMENT_ALT));

        EventBuilder::new(Kind::GitRepoAnnouncement, "").tags(tags)
    }

    /// Parse from a signed event.
    pub fn from_event(event: &Event, opts: CodecOptions) -> Result<Self, Error> {
        check_kind(event, Kind::GitRepoAnnouncement)?;
        let id = require_tag_value(event, "d", opts)?.to_string();

        let euc = event
            .get_tags("r")
            .into_iter()
            .find(|t| t.values().get(1).map(String::as_str) == Some(EUC))
            .and_then(Tag::content)
            .map(str::to_string);

        Ok(Self {
            id,
            name: event.get_tag_value("name").map(str::to_string),
            description: event.get_tag_value("description").map(str::to_string),
            web: parse_urls(event, "web"),
            clone: parse_urls(event, "clone"),
            relays: parse_urls(event, "relays"),
            euc,
            maintainers: parse_pubkeys(event, "maintainers"),
            topics: event.get_tags("t").into_iter().filter_map(Tag::content).map(str::to_string).collect(),
        })
    }

    /// This repo's address, as other events point back at it.
    pub fn address(&self, owner: PublicKey) -> Coordinate {
        Coordinate::new(Kind::GitRepoAnnouncement, owner, self.id.clone())
    }
}

// ---------------------------------------------------------------------
// Repo state (30618)
// ---------------------------------------------------------------------

/// One ref entry within a repo-state announcement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefEntry {
    /// `refs/heads/<name>`, `refs/tags/<name>`, or `HEAD`.
    pub name: String,
    /// Commit id, or for `HEAD`, the symbolic target (`ref: refs/heads/<name>`).
    pub value: String,
    /// Optional trailing ancestry values a maintainer chose to include.
    pub ancestry: Vec<String>,
}

/// Repo state announcement: a maintainer's view of all refs (§3, §4.C).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoState {
    /// Repo-id (`d` tag), matching a [`RepoAnnouncement`].
    pub repo_id: String,
    /// Ref entries, in tag order.
    pub refs: Vec<RefEntry>,
}

fn is_ref_tag_name(name: &str) -> bool {
    name.starts_with("refs/heads/") || name.starts_with("refs/tags/") || name == "HEAD"
}

impl RepoState {
    /// Build the signing-ready [`EventBuilder`].
    pub fn to_event_builder(&self) -> EventBuilder {
        let mut tags: Vec<Tag> = vec![Tag::identifier(self.repo_id.clone())];
        for r in &self.refs {
            let mut buf = vec![r.name.clone(), r.value.clone()];
            buf.extend(r.ancestry.clone());
            tags.push(Tag::custom(r.name.clone(), buf[1..].to_vec()));
        }
        EventBuilder::new(Kind::GitRepoState, "").tags(tags)
    }

    /// Parse from a signed event.
    pub fn from_event(event: &Event, opts: CodecOptions) -> Result<Self, Error> {
        check_kind(event, Kind::GitRepoState)?;
        let repo_id = require_tag_value(event, "d", opts)?.to_string();

        let refs = event
            .tags
            .iter()
            .filter(|t| is_ref_tag_name(t.name()))
            .map(|t| RefEntry {
                name: t.name().to_string(),
                value: t.content().unwrap_or_default().to_string(),
                ancestry: t.values().get(1..).map(<[String]>::to_vec).unwrap_or_default(),
            })
            .collect();

        Ok(Self { repo_id, refs })
    }
}

// ---------------------------------------------------------------------
// Patch status, derived from `t` tags (§4.A)
// ---------------------------------------------------------------------

/// Lifecycle status of a patch, issue, or pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStatus {
    /// Newly opened, awaiting review.
    Open,
    /// Applied to the target branch.
    Applied,
    /// Closed without applying.
    Closed,
    /// Work in progress, not ready for review.
    Draft,
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Open => "open",
            Self::Applied => "applied",
            Self::Closed => "closed",
            Self::Draft => "draft",
        };
        f.write_str(s)
    }
}

/// Derive a patch's status from its `t` tags, defaulting to [`ItemStatus::Open`].
pub fn patch_status_from_tags(event: &Event) -> ItemStatus {
    let topics: Vec<&str> = event.get_tags("t").into_iter().filter_map(Tag::content).collect();
    if topics.contains(&"applied") {
        ItemStatus::Applied
    } else if topics.contains(&"closed") {
        ItemStatus::Closed
    } else if topics.contains(&"draft") {
        ItemStatus::Draft
    } else {
        ItemStatus::Open
    }
}

// ---------------------------------------------------------------------
// Patch (1617)
// ---------------------------------------------------------------------

/// Patch committer identity, as carried in the `committer` tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchCommitter {
    /// Name.
    pub name: Option<String>,
    /// Email.
    pub email: Option<String>,
    /// Author timestamp (unix seconds).
    pub timestamp: u64,
    /// Timezone offset in minutes.
    pub offset_minutes: i32,
}

/// A git patch event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitPatch {
    /// Repo-address this patch targets.
    pub repository: Coordinate,
    /// Unified diff content.
    pub content: String,
    /// Commit id this patch produces.
    pub commit: String,
    /// Parent commit id.
    pub parent_commit: String,
    /// Committer metadata.
    pub committer: Option<PatchCommitter>,
    /// Lifecycle status, derived from `t` tags.
    pub status: ItemStatus,
    /// `stack` tag: logical stack this patch belongs to.
    pub stack: Option<String>,
    /// `rev` tag: revision number within its stack/series.
    pub rev: Option<u32>,
    /// `supersedes` tag: prior revision's event id, if any.
    pub supersedes: Option<EventId>,
    /// `depends` tags: other patch event ids this one depends on.
    pub depends: Vec<EventId>,
}

impl GitPatch {
    /// Build the signing-ready [`EventBuilder`].
    pub fn to_event_builder(&self) -> EventBuilder {
        let mut tags: Vec<Tag> = vec![
            Tag::address(&self.repository),
            Tag::reference(self.commit.clone(), None),
            Tag::custom("commit", vec![self.commit.clone()]),
            Tag::custom("parent-commit", vec![self.parent_commit.clone()]),
        ];
        if let Some(c) = &self.committer {
            tags.push(Tag::custom(
                "committer",
                vec![
                    c.name.clone().unwrap_or_default(),
                    c.email.clone().unwrap_or_default(),
                    c.timestamp.to_string(),
                    c.offset_minutes.to_string(),
                ],
            ));
        }
        tags.push(Tag::hashtag(self.status.to_string()));
        if let Some(stack) = &self.stack {
            tags.push(Tag::custom("stack", vec![stack.clone()]));
        }
        if let Some(rev) = self.rev {
            tags.push(Tag::custom("rev", vec![rev.to_string()]));
        }
        if let Some(supersedes) = self.supersedes {
            tags.push(Tag::custom("supersedes", vec![supersedes.to_hex()]));
        }
        for dep in &self.depends {
            tags.push(Tag::custom("depends", vec![dep.to_hex()]));
        }
        tags.push(Tag::alt(GIT_PATCH_ALT));

        EventBuilder::new(Kind::GitPatch, self.content.clone()).tags(tags)
    }

    /// Parse from a signed event.
    pub fn from_event(event: &Event, opts: CodecOptions) -> Result<Self, Error> {
        check_kind(event, Kind::GitPatch)?;
        let address_str = require_tag_value(event, "a", opts)?;
        let repository = if address_str.is_empty() {
            Coordinate::new(Kind::GitRepoAnnouncement, event.pubkey, String::new())
        } else {
            address_str.parse().map_err(|_| Error::Malformed("a", address_str.to_string()))?
        };

        let committer = event.get_tag("committer").map(|t| {
            let v = t.values();
            PatchCommitter {
                name: v.first().filter(|s| !s.is_empty()).cloned(),
                email: v.get(1).filter(|s| !s.is_empty()).cloned(),
                timestamp: v.get(2).and_then(|s| s.parse().ok()).unwrap_or_default(),
                offset_minutes: v.get(3).and_then(|s| s.parse().ok()).unwrap_or_default(),
            }
        });

        Ok(Self {
            repository,
            content: event.content.clone(),
            commit: event.get_tag_value("commit").unwrap_or_default().to_string(),
            parent_commit: event.get_tag_value("parent-commit").unwrap_or_default().to_string(),
            committer,
            status: patch_status_from_tags(event),
            stack: event.get_tag_value("stack").map(str::to_string),
            rev: event.get_tag_value("rev").and_then(|v| v.parse().ok()),
            supersedes: event.get_tag_value("supersedes").and_then(|v| v.parse().ok()),
            depends: event
                .get_tags("depends")
                .into_iter()
                .filter_map(Tag::content)
                .filter_map(|v| v.parse().ok())
                .collect(),
        })
    }
}

// ---------------------------------------------------------------------
// Pull request (1618 open / 1619 update)
// ---------------------------------------------------------------------

/// A pull-request open or update event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitPullRequest {
    /// Repo-address this PR targets.
    pub repository: Coordinate,
    /// Description (markdown).
    pub content: String,
    /// Title/subject.
    pub subject: Option<String>,
    /// Source branch name/commit.
    pub base_branch: Option<String>,
    /// Branch the PR merges into.
    pub target_branch: Option<String>,
    /// `true` for an update (kind 1619) rather than the initial open (1618).
    pub is_update: bool,
    /// Root event id this update amends, when `is_update`.
    pub root: Option<EventId>,
}

impl GitPullRequest {
    /// Build the signing-ready [`EventBuilder`].
    pub fn to_event_builder(&self) -> EventBuilder {
        let kind = if self.is_update { Kind::GitPullRequestUpdate } else { Kind::GitPullRequest };
        let mut tags: Vec<Tag> = vec![Tag::address(&self.repository)];
        if let Some(subject) = &self.subject {
            tags.push(Tag::custom("subject", vec![subject.clone()]));
        }
        if let Some(base) = &self.base_branch {
            tags.push(Tag::custom("base-branch", vec![base.clone()]));
        }
        if let Some(target) = &self.target_branch {
            tags.push(Tag::custom("target-branch", vec![target.clone()]));
        }
        if let Some(root) = self.root {
            tags.push(Tag::event(root, None, Some(Marker::Root)));
        }
        tags.push(Tag::alt(GIT_PR_ALT));

        EventBuilder::new(kind, self.content.clone()).tags(tags)
    }

    /// Parse from a signed event.
    pub fn from_event(event: &Event, opts: CodecOptions) -> Result<Self, Error> {
        let is_update = match event.kind {
            Kind::GitPullRequest => false,
            Kind::GitPullRequestUpdate => true,
            found => {
                return Err(Error::UnexpectedKind {
                    expected: Kind::GitPullRequest,
                    found,
                })
            }
        };
        let address_str = require_tag_value(event, "a", opts)?;
        let repository = if address_str.is_empty() {
            Coordinate::new(Kind::GitRepoAnnouncement, event.pubkey, String::new())
        } else {
            address_str.parse().map_err(|_| Error::Malformed("a", address_str.to_string()))?
        };

        Ok(Self {
            repository,
            content: event.content.clone(),
            subject: event.get_tag_value("subject").map(str::to_string),
            base_branch: event.get_tag_value("base-branch").map(str::to_string),
            target_branch: event.get_tag_value("target-branch").map(str::to_string),
            is_update,
            root: event
                .get_tags("e")
                .into_iter()
                .find(|t| t.values().get(2).map(String::as_str) == Some("root"))
                .and_then(Tag::content)
                .and_then(|v| v.parse().ok()),
        })
    }
}

// ---------------------------------------------------------------------
// Issue (1621)
// ---------------------------------------------------------------------

/// A git issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitIssue {
    /// Issue content (markdown).
    pub content: String,
    /// Repo-address.
    pub repository: Coordinate,
    /// Owners/other users cc'd.
    pub public_keys: Vec<PublicKey>,
    /// Subject line.
    pub subject: Option<String>,
    /// Self-labels (`t` tags).
    pub labels: Vec<String>,
}

impl GitIssue {
    /// Build the signing-ready [`EventBuilder`].
    pub fn to_event_builder(&self) -> EventBuilder {
        let mut tags: Vec<Tag> = vec![Tag::address(&self.repository)];
        tags.extend(self.public_keys.iter().copied().map(Tag::public_key));
        if let Some(subject) = &self.subject {
            tags.push(Tag::custom("subject", vec![subject.clone()]));
        }
        tags.extend(self.labels.iter().cloned().map(Tag::hashtag));
        tags.push(Tag::alt(GIT_ISSUE_ALT));

        EventBuilder::new(Kind::GitIssue, self.content.clone()).tags(tags)
    }

    /// Parse from a signed event.
    pub fn from_event(event: &Event, opts: CodecOptions) -> Result<Self, Error> {
        check_kind(event, Kind::GitIssue)?;
        let address_str = require_tag_value(event, "a", opts)?;
        let repository = if address_str.is_empty() {
            Coordinate::new(Kind::GitRepoAnnouncement, event.pubkey, String::new())
        } else {
            address_str.parse().map_err(|_| Error::Malformed("a", address_str.to_string()))?
        };

        Ok(Self {
            content: event.content.clone(),
            repository,
            public_keys: parse_pubkeys(event, "p"),
            subject: event.get_tag_value("subject").map(str::to_string),
            labels: event.get_tags("t").into_iter().filter_map(Tag::content).map(str::to_string).collect(),
        })
    }
}

// ---------------------------------------------------------------------
// Status events (1630-1633)
// ---------------------------------------------------------------------

/// A status update on an issue, patch, or PR.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitStatus {
    /// Repo-address.
    pub repository: Coordinate,
    /// The thread root this status applies to.
    pub root: EventId,
    /// Resolved status.
    pub status: ItemStatus,
    /// Merge commit, set on `applied` statuses.
    pub merge_commit: Option<String>,
}

impl GitStatus {
    fn kind_for(status: ItemStatus) -> Kind {
        match status {
            ItemStatus::Open => Kind::GitStatusOpen,
            ItemStatus::Applied => Kind::GitStatusApplied,
            ItemStatus::Closed => Kind::GitStatusClosed,
            ItemStatus::Draft => Kind::GitStatusDraft,
        }
    }

    /// Build the signing-ready [`EventBuilder`].
    pub fn to_event_builder(&self) -> EventBuilder {
        let mut tags: Vec<Tag> = vec![Tag::address(&self.repository), Tag::event(self.root, None, Some(Marker::Root))];
        if let Some(mc) = &self.merge_commit {
            tags.push(Tag::custom("merge-commit", vec![mc.clone()]));
        }
        EventBuilder::new(Self::kind_for(self.status), "").tags(tags)
    }

    /// Parse from a signed event.
    pub fn from_event(event: &Event, opts: CodecOptions) -> Result<Self, Error> {
        let status = match event.kind {
            Kind::GitStatusOpen => ItemStatus::Open,
            Kind::GitStatusApplied => ItemStatus::Applied,
            Kind::GitStatusClosed => ItemStatus::Closed,
            Kind::GitStatusDraft => ItemStatus::Draft,
            found => {
                return Err(Error::UnexpectedKind {
                    expected: Kind::GitStatusOpen,
                    found,
                })
            }
        };
        let address_str = require_tag_value(event, "a", opts)?;
        let repository = if address_str.is_empty() {
            Coordinate::new(Kind::GitRepoAnnouncement, event.pubkey, String::new())
        } else {
            address_str.parse().map_err(|_| Error::Malformed("a", address_str.to_string()))?
        };
        let root = event
            .get_tags("e")
            .into_iter()
            .next()
            .and_then(Tag::content)
            .and_then(|v| v.parse().ok())
            .ok_or(Error::MissingTag("e"))?;

        Ok(Self {
            repository,
            root,
            status,
            merge_commit: event.get_tag_value("merge-commit").map(str::to_string),
        })
    }
}

// ---------------------------------------------------------------------
// Stack (30410)
// ---------------------------------------------------------------------

/// A stack grouping patch/commit ids into a review unit (§4.L).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitStack {
    /// Repo-address.
    pub repository: Coordinate,
    /// Stack id (`d`/`stack` tag).
    pub id: String,
    /// Member patch/commit ids.
    pub members: Vec<String>,
    /// Explicit ordering, if provided.
    pub order: Option<Vec<String>>,
}

impl GitStack {
    /// Build the signing-ready [`EventBuilder`].
    pub fn to_event_builder(&self) -> EventBuilder {
        let mut tags: Vec<Tag> = vec![
            Tag::identifier(self.id.clone()),
            Tag::address(&self.repository),
            Tag::custom("stack", vec![self.id.clone()]),
        ];
        for m in &self.members {
            tags.push(Tag::custom("member", vec![m.clone()]));
        }
        if let Some(order) = &self.order {
            tags.push(Tag::custom("order", order.clone()));
        }
        EventBuilder::new(Kind::GitStack, "").tags(tags)
    }

    /// Parse from a signed event.
    pub fn from_event(event: &Event, opts: CodecOptions) -> Result<Self, Error> {
        check_kind(event, Kind::GitStack)?;
        let address_str = require_tag_value(event, "a", opts)?;
        let repository = if address_str.is_empty() {
            Coordinate::new(Kind::GitRepoAnnouncement, event.pubkey, String::new())
        } else {
            address_str.parse().map_err(|_| Error::Malformed("a", address_str.to_string()))?
        };
        let id = event
            .get_tag_value("stack")
            .or_else(|| event.get_tag_value("d"))
            .unwrap_or_default()
            .to_string();

        Ok(Self {
            repository,
            id,
            members: event.get_tags("member").into_iter().filter_map(Tag::content).map(str::to_string).collect(),
            order: event.get_tag("order").map(|t| t.values().to_vec()),
        })
    }
}

// ---------------------------------------------------------------------
// Merge-analysis metadata (30411)
// ---------------------------------------------------------------------

/// Published result of a merge analysis (§4.I, §4.L).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitMergeMetadata {
    /// Repo-address.
    pub repository: Coordinate,
    /// The patch/PR root this analysis concerns.
    pub root: EventId,
    /// Base branch the patch was authored against.
    pub base_branch: Option<String>,
    /// Branch the patch was analyzed against.
    pub target_branch: Option<String>,
    /// Coarse result.
    pub result: MergeResultKind,
    /// Resulting merge-commit, if applied.
    pub merge_commit: Option<String>,
}

/// Coarse merge outcome carried in sidecar events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeResultKind {
    /// Clean, non-fast-forward merge.
    Clean,
    /// Clean fast-forward.
    FastForward,
    /// Conflicts detected.
    Conflict,
}

impl fmt::Display for MergeResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Clean => "clean",
            Self::FastForward => "ff",
            Self::Conflict => "conflict",
        };
        f.write_str(s)
    }
}

impl MergeResultKind {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "clean" => Some(Self::Clean),
            "ff" => Some(Self::FastForward),
            "conflict" => Some(Self::Conflict),
            _ => None,
        }
    }
}

impl GitMergeMetadata {
    /// Build the signing-ready [`EventBuilder`].
    pub fn to_event_builder(&self) -> EventBuilder {
        let mut tags: Vec<Tag> = vec![Tag::address(&self.repository), Tag::event(self.root, None, Some(Marker::Root))];
        if let Some(base) = &self.base_branch {
            tags.push(Tag::custom("base-branch", vec![base.clone()]));
        }
        if let Some(target) = &self.target_branch {
            tags.push(Tag::custom("target-branch", vec![target.clone()]));
        }
        tags.push(Tag::custom("result", vec![self.result.to_string()]));
        if let Some(mc) = &self.merge_commit {
            tags.push(Tag::custom("merge-commit", vec![mc.clone()]));
        }
        EventBuilder::new(Kind::GitMergeMetadata, "").tags(tags)
    }

    /// Parse from a signed event.
    pub fn from_event(event: &Event, opts: CodecOptions) -> Result<Self, Error> {
        check_kind(event, Kind::GitMergeMetadata)?;
        let address_str = require_tag_value(event, "a", opts)?;
        let repository = if address_str.is_empty() {
            Coordinate::new(Kind::GitRepoAnnouncement, event.pubkey, String::new())
        } else {
            address_str.parse().map_err(|_| Error::Malformed("a", address_str.to_string()))?
        };
        let root = event
            .get_tags("e")
            .into_iter()
            .next()
            .and_then(Tag::content)
            .and_then(|v| v.parse().ok())
            .ok_or(Error::MissingTag("e"))?;
        let result = event
            .get_tag_value("result")
            .and_then(MergeResultKind::parse)
            .unwrap_or(MergeResultKind::Conflict);

        Ok(Self {
            repository,
            root,
            base_branch: event.get_tag_value("base-branch").map(str::to_string),
            target_branch: event.get_tag_value("target-branch").map(str::to_string),
            result,
            merge_commit: event.get_tag_value("merge-commit").map(str::to_string),
        })
    }
}

// ---------------------------------------------------------------------
// Conflict-details metadata (30412)
// ---------------------------------------------------------------------

/// Published conflict details (§4.I, §4.L). The per-file marker payload is
/// kept as an opaque JSON string here; [`nostr-git-merge`] owns the typed
/// `ConflictDetail` model and (de)serializes this field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitConflictMetadata {
    /// Repo-address.
    pub repository: Coordinate,
    /// The patch/PR root this conflict report concerns.
    pub root: EventId,
    /// Conflicted file paths, in document order.
    pub files: Vec<String>,
    /// JSON payload with the per-file conflict markers.
    pub payload: String,
}

impl GitConflictMetadata {
    /// Build the signing-ready [`EventBuilder`].
    pub fn to_event_builder(&self) -> EventBuilder {
        let mut tags: Vec<Tag> = vec![Tag::address(&self.repository), Tag::event(self.root, None, Some(Marker::Root))];
        for f in &self.files {
            tags.push(Tag::custom("file", vec![f.clone()]));
        }
        EventBuilder::new(Kind::GitConflictMetadata, self.payload.clone()).tags(tags)
    }

    /// Parse from a signed event.
    pub fn from_event(event: &Event, opts: CodecOptions) -> Result<Self, Error> {
        check_kind(event, Kind::GitConflictMetadata)?;
        let address_str = require_tag_value(event, "a", opts)?;
        let repository = if address_str.is_empty() {
            Coordinate::new(Kind::GitRepoAnnouncement, event.pubkey, String::new())
        } else {
            address_str.parse().map_err(|_| Error::Malformed("a", address_str.to_string()))?
        };
        let root = event
            .get_tags("e")
            .into_iter()
            .next()
            .and_then(Tag::content)
            .and_then(|v| v.parse().ok())
            .ok_or(Error::MissingTag("e"))?;

        Ok(Self {
            repository,
            root,
            files: event.get_tags("file").into_iter().filter_map(Tag::content).map(str::to_string).collect(),
            payload: event.content.clone(),
        })
    }
}

// ---------------------------------------------------------------------
// Preferred mirror list (10317)
// ---------------------------------------------------------------------

/// A user's preferred mirror list (replaceable, one per author).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MirrorList {
    /// Preferred mirror base urls, in priority order.
    pub urls: Vec<Url>,
}

impl MirrorList {
    /// Build the signing-ready [`EventBuilder`].
    pub fn to_event_builder(&self) -> EventBuilder {
        let tags = self.urls.iter().map(|u| Tag::custom("relay", vec![u.to_string()])).collect();
        EventBuilder::new(Kind::MirrorList, "").tags(tags)
    }

    /// Parse from a signed event.
    pub fn from_event(event: &Event) -> Result<Self, Error> {
        check_kind(event, Kind::MirrorList)?;
        Ok(Self {
            urls: parse_urls(event, "relay"),
        })
    }
}

// ---------------------------------------------------------------------
// External label (1985, NIP-32-style)
// ---------------------------------------------------------------------

/// An externally-applied label event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalLabel {
    /// Label namespace (`L` tag), if any.
    pub namespace: Option<String>,
    /// Label values (`l` tags).
    pub labels: Vec<String>,
    /// Event id this label applies to, if by id.
    pub target_event: Option<EventId>,
    /// Coordinate this label applies to, if by address.
    pub target_address: Option<Coordinate>,
}

impl ExternalLabel {
    /// Parse from a signed event.
    pub fn from_event(event: &Event) -> Result<Self, Error> {
        check_kind(event, Kind::Label)?;
        Ok(Self {
            namespace: event.get_tag_value("L").map(str::to_string),
            labels: event.get_tags("l").into_iter().filter_map(Tag::content).map(str::to_string).collect(),
            target_event: event.get_tag_value("e").and_then(|v| v.parse().ok()),
            target_address: event.get_tag_value("a").and_then(|v| v.parse().ok()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Keys, Timestamp};

    fn sign(builder: EventBuilder, keys: &Keys) -> Event {
        builder.sign(keys, Timestamp::from_secs(1_700_000_000)).expect("sign")
    }

    #[test]
    fn repo_announcement_round_trip() {
        let keys = Keys::generate();
        let original = RepoAnnouncement {
            id: "my-repo".into(),
            name: Some("My Repo".into()),
            description: Some("a test repo".into()),
            web: vec![Url::parse("https://example.com/my-repo").unwrap()],
            clone: vec![Url::parse("https://example.com/my-repo.git").unwrap()],
            relays: vec![Url::parse("wss://relay.example.com").unwrap()],
            euc: Some("abc123".into()),
            maintainers: vec![keys.public_key()],
            topics: vec!["rust".into()],
        };

        let event = sign(original.to_event_builder(), &keys);
        assert!(event.verify_id());

        let parsed = RepoAnnouncement::from_event(&event, CodecOptions::strict()).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn patch_content_round_trips() {
        let keys = Keys::generate();
        let repo = Coordinate::new(Kind::GitRepoAnnouncement, keys.public_key(), "my-repo");
        let original = GitPatch {
            repository: repo,
            content: "diff --git a/f b/f\n".into(),
            commit: "c".repeat(40),
            parent_commit: "p".repeat(40),
            committer: Some(PatchCommitter {
                name: Some("Alice".into()),
                email: Some("alice@example.com".into()),
                timestamp: 1_700_000_000,
                offset_minutes: -420,
            }),
            status: ItemStatus::Open,
            stack: Some("stack-1".into()),
            rev: Some(2),
            supersedes: None,
            depends: vec![],
        };

        let event = sign(original.to_event_builder(), &keys);
        assert_eq!(event.content, original.content);

        let parsed = GitPatch::from_event(&event, CodecOptions::strict()).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn patch_status_defaults_to_open() {
        let keys = Keys::generate();
        let repo = Coordinate::new(Kind::GitRepoAnnouncement, keys.public_key(), "my-repo");
        let builder = EventBuilder::new(Kind::GitPatch, "diff").tags(vec![Tag::address(&repo)]);
        let event = sign(builder, &keys);
        assert_eq!(patch_status_from_tags(&event), ItemStatus::Open);
    }

    #[test]
    fn missing_mandatory_tag_is_rejected_in_strict_mode() {
        let keys = Keys::generate();
        let builder = EventBuilder::new(Kind::GitRepoAnnouncement, "");
        let event = sign(builder, &keys);
        let err = RepoAnnouncement::from_event(&event, CodecOptions::strict()).unwrap_err();
        assert_eq!(err, Error::MissingTag("d"));
    }

    #[test]
    fn repo_state_collects_ref_tags_only() {
        let keys = Keys::generate();
        let builder = EventBuilder::new(Kind::GitRepoState, "").tags(vec![
            Tag::identifier("my-repo"),
            Tag::custom("refs/heads/main", vec!["deadbeef".into()]),
            Tag::custom("HEAD", vec!["ref: refs/heads/main".into()]),
            Tag::alt("git repository state"),
        ]);
        let event = sign(builder, &keys);
        let state = RepoState::from_event(&event, CodecOptions::strict()).unwrap();
        assert_eq!(state.refs.len(), 2);
        assert_eq!(state.refs[0].name, "refs/heads/main");
        assert_eq!(state.refs[0].value, "deadbeef");
        assert_eq!(state.refs[1].value, "ref: refs/heads/main");
    }
}
